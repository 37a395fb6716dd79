//! Ranking tabs and search results

use std::fmt::Write;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use novelvault_core::RankingCategory;

use super::layout::{self, card_section, escape_html, format_rating};
use super::PageResult;
use crate::auth::MaybeUser;
use crate::db::repos::{NovelCard, NovelRepo};
use crate::http::routes::search::SearchParams;
use crate::state::AppState;

/// GET /rankings
pub async fn overall(State(state): State<Arc<AppState>>, user: MaybeUser) -> PageResult {
    render_ranking(&state, user, RankingCategory::Rank).await
}

/// GET /rankings/{category}
pub async fn category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
    user: MaybeUser,
) -> PageResult {
    let category: RankingCategory = category.parse()?;
    render_ranking(&state, user, category).await
}

async fn render_ranking(state: &AppState, user: MaybeUser, category: RankingCategory) -> PageResult {
    let novels = NovelRepo::new(&state.pool).rankings(category).await?;

    let mut body = String::from("<nav class=\"tabs\">");
    for tab in RankingCategory::ALL {
        let _ = write!(
            body,
            r#"<a href="/rankings/{}"{} title="{}">{}</a>"#,
            tab.as_str(),
            if tab == category { r#" class="selected""# } else { "" },
            escape_html(tab.tab_hint()),
            tab.label()
        );
    }
    let _ = write!(
        body,
        "</nav>\n<h1>{}</h1>\n<p>{}</p>\n",
        escape_html(category.title()),
        escape_html(category.description())
    );

    if novels.is_empty() {
        body.push_str("<p class=\"empty\">No novels ranked yet.</p>");
    } else {
        body.push_str("<ol class=\"ranking\">\n");
        for novel in &novels {
            let stat = match category.stat_label() {
                Some(label) => format!(
                    r#" <span class="stat">{label}: {}</span>"#,
                    stat_value(category, novel)
                ),
                None => String::new(),
            };
            let _ = writeln!(
                body,
                r#"<li><a href="/novels/{}">{}</a> <span class="meta">{}</span>{stat}</li>"#,
                escape_html(&novel.slug),
                escape_html(&novel.title),
                escape_html(novel.author.as_deref().unwrap_or("Unknown")),
            );
        }
        body.push_str("</ol>");
    }

    Ok(layout::render(category.title(), user.user(), &body))
}

/// The number shown next to a ranked novel
fn stat_value(category: RankingCategory, novel: &NovelCard) -> String {
    match category {
        RankingCategory::Rating => format_rating(novel.average_rating),
        RankingCategory::Reads | RankingCategory::Rank => novel.view_count.to_string(),
        RankingCategory::Comments => novel.total_comments.to_string(),
        RankingCategory::Bookmarks => novel.total_bookmarks.to_string(),
    }
}

/// GET /search?q=
pub async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
    user: MaybeUser,
) -> PageResult {
    let Some(term) = params.term() else {
        let body = "<h1>Search</h1>\n<p>Enter a title, author or description to search.</p>";
        return Ok(layout::render("Search", user.user(), body));
    };

    let novels = NovelRepo::new(&state.pool).search(&term).await?;
    let heading = format!("Results for \"{term}\"");
    let body = card_section(&heading, &novels, "No novels found.");
    Ok(layout::render(&heading, user.user(), &body))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn card() -> NovelCard {
        NovelCard {
            novel_id: 1,
            title: "Sword".into(),
            author: None,
            cover_image_url: None,
            status: "ongoing".into(),
            average_rating: None,
            slug: "sword".into(),
            view_count: 120,
            is_featured: false,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            total_chapters: 3,
            total_ratings: 0,
            total_bookmarks: 4,
            total_comments: 9,
            genres: Vec::new(),
        }
    }

    #[test]
    fn stat_follows_category() {
        let novel = card();
        assert_eq!(stat_value(RankingCategory::Rating, &novel), "N/A");
        assert_eq!(stat_value(RankingCategory::Reads, &novel), "120");
        assert_eq!(stat_value(RankingCategory::Comments, &novel), "9");
        assert_eq!(stat_value(RankingCategory::Bookmarks, &novel), "4");
    }
}
