//! Home, browse, novel and chapter pages

use std::fmt::Write;
use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use novelvault_core::browse::BrowseSort;
use novelvault_core::reading_progress;
use serde::Deserialize;

use super::layout::{self, browse_href, card_section, escape_html, format_rating, pagination, paragraphs};
use super::{login_redirect, PageError, PageResult};
use crate::auth::MaybeUser;
use crate::db::repos::chapters::neighbours;
use crate::db::repos::{
    BookmarkRepo, BookmarkView, Chapter, ChapterNovel, ChapterRepo, ChapterSummary, Comment, CommentRepo, CommentTarget,
    CommentThread, GenreRepo, HistoryRepo, NovelRepo, SessionUser,
};
use crate::http::extractors::parse_id;
use crate::http::routes::novels::{browse_novels, BrowseParams};
use crate::models::CommentBody;
use crate::state::AppState;

const STATUS_OPTIONS: [(&str, &str); 3] = [("all", "All"), ("ongoing", "Ongoing"), ("completed", "Completed")];

const SORT_OPTIONS: [(BrowseSort, &str); 3] = [
    (BrowseSort::Newest, "New"),
    (BrowseSort::Popular, "Popular"),
    (BrowseSort::Rating, "Highest Rated"),
];

/// GET /
pub async fn home(State(state): State<Arc<AppState>>, user: MaybeUser) -> PageResult {
    let sections = NovelRepo::new(&state.pool).home_sections().await;

    let body = [
        card_section("Featured", &sections.featured, "No featured novels yet."),
        card_section("New Releases", &sections.newest, "No novels yet."),
        card_section("Popular", &sections.popular, "No novels yet."),
        card_section("Completed", &sections.completed, "No completed novels yet."),
    ]
    .join("\n");

    Ok(layout::render("Home", user.user(), &body))
}

/// GET /novels
pub async fn browse(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
    params: Result<Query<BrowseParams>, QueryRejection>,
) -> PageResult {
    let Query(params) = params?;
    let query = params.to_query();
    let page = browse_novels(&state, &query).await?;
    let genres = GenreRepo::new(&state.pool).list().await?;
    let status = query.status.as_deref();

    let mut body = String::from("<h1>Browse Novels</h1>\n<section class=\"filters\">\n<div class=\"genres\">");
    for genre in &genres {
        let selected = query.genres.contains(&genre.name);
        let toggled: Vec<String> = if selected {
            query.genres.iter().filter(|g| **g != genre.name).cloned().collect()
        } else {
            query.genres.iter().cloned().chain([genre.name.clone()]).collect()
        };
        let _ = write!(
            body,
            r#"<a href="{}"{}>{}</a>"#,
            escape_html(&browse_href(&toggled, status, query.sort, 1)),
            if selected { r#" class="selected""# } else { "" },
            escape_html(&genre.name)
        );
    }
    body.push_str("</div>\n<div class=\"status\">");
    for (value, label) in STATUS_OPTIONS {
        let target = (value != "all").then_some(value);
        let selected = target == status;
        let _ = write!(
            body,
            r#"<a href="{}"{}>{label}</a>"#,
            escape_html(&browse_href(&query.genres, target, query.sort, 1)),
            if selected { r#" class="selected""# } else { "" },
        );
    }
    body.push_str("</div>\n<div class=\"sort\">");
    for (sort, label) in SORT_OPTIONS {
        let _ = write!(
            body,
            r#"<a href="{}"{}>{label}</a>"#,
            escape_html(&browse_href(&query.genres, status, sort, 1)),
            if sort == query.sort { r#" class="selected""# } else { "" },
        );
    }
    body.push_str("</div>\n</section>\n");

    let _ = writeln!(body, r#"<p class="count">{} novels</p>"#, page.total);
    body.push_str(&card_section("Results", &page.novels, "No novels match these filters."));
    body.push_str(&pagination(page.page, page.total_pages(), |p| {
        browse_href(&query.genres, status, query.sort, p)
    }));

    Ok(layout::render("Browse Novels", user.user(), &body))
}

/// GET /novels/{slug}
pub async fn novel(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    user: MaybeUser,
) -> PageResult {
    let detail = NovelRepo::new(&state.pool).get_by_slug(&slug).await?;
    let comments = CommentRepo::new(&state.pool)
        .threads(CommentTarget::Novel(detail.novel_id))
        .await?;
    let bookmark = match user.user() {
        Some(u) => BookmarkRepo::new(&state.pool).get(u.user_id, detail.novel_id).await?,
        None => None,
    };

    let slug_html = escape_html(&detail.slug);
    let mut body = format!(
        r#"<article class="novel">
{cover}
<h1>{title}</h1>
<p class="meta">by {author} · {status} · {views} views · ★ {rating} ({ratings} ratings)</p>
"#,
        cover = layout::cover(detail.cover_image_url.as_deref(), &detail.title),
        title = escape_html(&detail.title),
        author = escape_html(detail.author.as_deref().unwrap_or("Unknown")),
        status = escape_html(&detail.status),
        views = detail.view_count,
        rating = format_rating(detail.average_rating),
        ratings = detail.ratings_count,
    );

    if !detail.genres.is_empty() {
        body.push_str(r#"<p class="genres">"#);
        for genre in &detail.genres {
            let _ = write!(
                body,
                r#"<a href="/novels?genre={}">{}</a> "#,
                escape_html(&urlencoding::encode(&genre.name)),
                escape_html(&genre.name)
            );
        }
        body.push_str("</p>\n");
    }
    if !detail.tags.is_empty() {
        let tags: Vec<String> = detail.tags.iter().map(|t| escape_html(&t.name)).collect();
        let _ = writeln!(body, r#"<p class="tags">{}</p>"#, tags.join(", "));
    }
    if let Some(description) = detail.description.as_deref() {
        body.push_str(&paragraphs(description));
        body.push('\n');
    }

    body.push_str(&reading_actions(&slug_html, &detail.chapters, bookmark.as_ref()));

    let _ = writeln!(body, "<section class=\"chapters\">\n<h2>Chapters ({})</h2>\n<ol>", detail.total_chapters);
    for chapter in &detail.chapters {
        let _ = writeln!(
            body,
            r#"<li><a href="/novels/{slug_html}/chapters/{}">Chapter {}: {}</a></li>"#,
            chapter.chapter_id,
            chapter.chapter_number,
            escape_html(&chapter.title)
        );
    }
    body.push_str("</ol>\n</section>\n</article>\n");

    let action = format!("/novels/{}/comments", detail.slug);
    body.push_str(&comments_section(&comments, &action, user.user()));

    Ok(layout::render(&detail.title, user.user(), &body))
}

fn reading_actions(
    slug_html: &str,
    chapters: &[ChapterSummary],
    bookmark: Option<&BookmarkView>,
) -> String {
    let mut out = String::from(r#"<p class="actions">"#);
    if let Some(first) = chapters.first() {
        let _ = write!(
            out,
            r#"<a href="/novels/{slug_html}/chapters/{}">Start reading</a>"#,
            first.chapter_id
        );
    }
    if let Some(last_read) = bookmark.and_then(|b| b.chapter.as_ref()) {
        let _ = write!(
            out,
            r#" <a href="/novels/{slug_html}/chapters/{}">Continue: Chapter {}</a> <span>{}% read</span>"#,
            last_read.chapter_id,
            last_read.chapter_number,
            bookmark.map_or(0, |b| b.reading.progress)
        );
    } else if bookmark.is_some() {
        out.push_str(" <span>Bookmarked</span>");
    }
    out.push_str("</p>\n");
    out
}

/// A chapter only exists under its own novel's slug
fn ensure_slug(novel: &ChapterNovel, slug: &str, chapter_id: i64) -> Result<(), PageError> {
    if novel.slug == slug {
        Ok(())
    } else {
        Err(PageError::not_found("chapter", chapter_id))
    }
}

async fn chapter_under_slug(
    state: &AppState,
    slug: &str,
    chapter_id: i64,
) -> Result<(Chapter, ChapterNovel), PageError> {
    let repo = ChapterRepo::new(&state.pool);
    let chapter = repo.get(chapter_id).await?;
    let novel = repo.novel_of(&chapter).await?;
    ensure_slug(&novel, slug, chapter_id)?;
    Ok((chapter, novel))
}

/// GET /novels/{slug}/chapters/{chapter_id}
pub async fn chapter(
    State(state): State<Arc<AppState>>,
    Path((slug, raw_id)): Path<(String, String)>,
    user: MaybeUser,
) -> PageResult {
    let chapter_id = parse_id(&raw_id).ok_or_else(|| PageError::not_found("chapter", &raw_id))?;
    let (chapter, novel) = chapter_under_slug(&state, &slug, chapter_id).await?;

    let heading = format!("Chapter {}: {}", chapter.chapter_number, chapter.title);
    let novel_link = format!(
        r#"<p class="crumb"><a href="/novels/{}">{}</a></p>"#,
        escape_html(&novel.slug),
        escape_html(&novel.title)
    );

    if !chapter.is_free && user.user().is_none() {
        let path = format!("/novels/{}/chapters/{}", novel.slug, chapter.chapter_id);
        let body = format!(
            r#"{novel_link}
<h1>{}</h1>
<section class="locked">
<p>This chapter is for registered readers.</p>
<p><a href="/login?callbackUrl={}">Log in to continue reading</a></p>
</section>"#,
            escape_html(&heading),
            escape_html(&urlencoding::encode(&path)),
        );
        return Ok(layout::render(&heading, None, &body));
    }

    let chapters = ChapterRepo::new(&state.pool).list_for_novel(novel.novel_id).await?;
    let comments = CommentRepo::new(&state.pool)
        .threads(CommentTarget::Chapter(chapter.chapter_id))
        .await?;
    track_read(&state, user.user(), &chapter, chapters.len() as i64).await;

    let slug_html = escape_html(&novel.slug);
    let (prev, next) = neighbours(&chapters, chapter.chapter_id);
    let mut nav = String::from(r#"<nav class="chapter-nav">"#);
    if let Some(prev) = prev {
        let _ = write!(nav, r#"<a href="/novels/{slug_html}/chapters/{}" rel="prev">Previous</a>"#, prev.chapter_id);
    }
    let _ = write!(nav, r#" <a href="/novels/{slug_html}">Contents</a> "#);
    if let Some(next) = next {
        let _ = write!(nav, r#"<a href="/novels/{slug_html}/chapters/{}" rel="next">Next</a>"#, next.chapter_id);
    }
    nav.push_str("</nav>");

    let action = format!("/novels/{}/chapters/{}/comments", novel.slug, chapter.chapter_id);
    let body = format!(
        r#"{novel_link}
<article class="chapter">
<h1>{}</h1>
{nav}
{}
{nav}
</article>
{}"#,
        escape_html(&heading),
        paragraphs(&chapter.content),
        comments_section(&comments, &action, user.user()),
    );

    Ok(layout::render(&heading, user.user(), &body))
}

/// Count the view and, for signed-in readers, update history and an
/// existing bookmark. Failures are logged; the page still renders.
async fn track_read(state: &AppState, user: Option<&SessionUser>, chapter: &Chapter, total_chapters: i64) {
    if let Err(e) = ChapterRepo::new(&state.pool).record_view(chapter).await {
        tracing::warn!(chapter_id = chapter.chapter_id, error = %e, "failed to count chapter view");
    }

    let Some(user) = user else { return };

    let progress = reading_progress(Some(chapter.chapter_number), total_chapters).min(100);
    if let Err(e) = HistoryRepo::new(&state.pool)
        .record(user.user_id, chapter.chapter_id, f64::from(progress))
        .await
    {
        tracing::warn!(user_id = user.user_id, error = %e, "failed to record reading history");
    }

    let bookmarks = BookmarkRepo::new(&state.pool);
    match bookmarks.get(user.user_id, chapter.novel_id).await {
        Ok(Some(_)) => {
            if let Err(e) = bookmarks
                .upsert(user.user_id, chapter.novel_id, Some(chapter.chapter_id))
                .await
            {
                tracing::warn!(user_id = user.user_id, error = %e, "failed to save last read chapter");
            }
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(user_id = user.user_id, error = %e, "bookmark lookup failed"),
    }
}

fn comments_section(threads: &[CommentThread], action: &str, user: Option<&SessionUser>) -> String {
    let mut out = format!("<section id=\"comments\">\n<h2>Comments ({})</h2>\n", threads.len());

    match user {
        Some(_) => {
            let _ = writeln!(
                out,
                r#"<form method="post" action="{}">
<textarea name="content" rows="4" maxlength="5000" required></textarea>
<button type="submit">Post comment</button>
</form>"#,
                escape_html(action)
            );
        }
        None => out.push_str("<p><a href=\"/login\">Log in</a> to join the discussion.</p>\n"),
    }

    if threads.is_empty() {
        out.push_str("<p class=\"empty\">No comments yet.</p>\n");
    }
    for thread in threads {
        out.push_str("<div class=\"thread\">\n");
        out.push_str(&comment_html(&thread.comment));
        for reply in &thread.replies {
            out.push_str("<div class=\"reply\">");
            out.push_str(&comment_html(reply));
            out.push_str("</div>\n");
        }
        if user.is_some() {
            let _ = writeln!(
                out,
                r#"<form method="post" action="{}" class="reply-form">
<input type="hidden" name="parent_id" value="{}">
<textarea name="content" rows="2" maxlength="5000" required></textarea>
<button type="submit">Reply</button>
</form>"#,
                escape_html(action),
                thread.comment.comment_id
            );
        }
        out.push_str("</div>\n");
    }
    out.push_str("</section>");
    out
}

fn comment_html(comment: &Comment) -> String {
    format!(
        "<p class=\"comment\"><strong>{}</strong> <time>{}</time><br>{}</p>\n",
        escape_html(comment.user.shown_name()),
        comment.created_at.format("%Y-%m-%d %H:%M"),
        escape_html(&comment.content)
    )
}

#[derive(Debug, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub content: String,
    pub parent_id: Option<String>,
}

impl CommentForm {
    fn parent(&self) -> Option<i64> {
        self.parent_id.as_deref().and_then(parse_id)
    }
}

/// POST /novels/{slug}/comments
pub async fn post_comment(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
    user: MaybeUser,
    Form(form): Form<CommentForm>,
) -> Result<Response, PageError> {
    let back = format!("/novels/{slug}");
    let Some(user) = user.user() else {
        return Ok(login_redirect(&back));
    };
    let body = CommentBody::new(&form.content)?;
    let novel = NovelRepo::new(&state.pool).get_by_slug(&slug).await?;
    CommentRepo::new(&state.pool)
        .create(CommentTarget::Novel(novel.novel_id), user.user_id, &body, form.parent())
        .await?;
    Ok(Redirect::to(&format!("{back}#comments")).into_response())
}

/// POST /novels/{slug}/chapters/{chapter_id}/comments
pub async fn post_chapter_comment(
    State(state): State<Arc<AppState>>,
    Path((slug, raw_id)): Path<(String, String)>,
    user: MaybeUser,
    Form(form): Form<CommentForm>,
) -> Result<Response, PageError> {
    let chapter_id = parse_id(&raw_id).ok_or_else(|| PageError::not_found("chapter", &raw_id))?;
    let back = format!("/novels/{slug}/chapters/{chapter_id}");
    let Some(user) = user.user() else {
        return Ok(login_redirect(&back));
    };
    let body = CommentBody::new(&form.content)?;
    chapter_under_slug(&state, &slug, chapter_id).await?;
    CommentRepo::new(&state.pool)
        .create(CommentTarget::Chapter(chapter_id), user.user_id, &body, form.parent())
        .await?;
    Ok(Redirect::to(&format!("{back}#comments")).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repos::CommentAuthor;
    use chrono::Utc;

    fn comment(id: i64, content: &str) -> Comment {
        Comment {
            comment_id: id,
            parent_comment_id: None,
            content: content.into(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            user: CommentAuthor {
                user_id: 1,
                username: "reader".into(),
                display_name: None,
                avatar_url: None,
            },
        }
    }

    #[test]
    fn comment_content_is_escaped() {
        let threads = vec![CommentThread {
            comment: comment(1, "<script>alert(1)</script>"),
            replies: vec![comment(2, "reply & more")],
            reply_count: 1,
        }];
        let html = comments_section(&threads, "/novels/x/comments", None);
        assert!(!html.contains("<script>"));
        assert!(html.contains("reply &amp; more"));
        assert!(!html.contains("<form"));
    }

    #[test]
    fn signed_in_readers_get_reply_forms() {
        let reader = SessionUser {
            user_id: 1,
            username: "reader".into(),
            display_name: None,
            avatar_url: None,
            role: "user".into(),
        };
        let threads = vec![CommentThread {
            comment: comment(5, "hello"),
            replies: Vec::new(),
            reply_count: 0,
        }];
        let html = comments_section(&threads, "/novels/x/comments", Some(&reader));
        assert!(html.contains(r#"name="parent_id" value="5""#));
    }

    #[test]
    fn chapter_slug_must_match_its_novel() {
        let novel = ChapterNovel {
            novel_id: 3,
            title: "The Last Sword".into(),
            slug: "the-last-sword".into(),
            cover_image_url: None,
            description: None,
        };
        assert!(ensure_slug(&novel, "the-last-sword", 9).is_ok());

        let err = ensure_slug(&novel, "another-novel", 9).unwrap_err();
        assert_eq!(err.0.status(), axum::http::StatusCode::NOT_FOUND);
    }

    #[test]
    fn blank_parent_is_top_level() {
        let form = CommentForm {
            content: "hi".into(),
            parent_id: Some(String::new()),
        };
        assert_eq!(form.parent(), None);
        let reply = CommentForm {
            content: "hi".into(),
            parent_id: Some("12".into()),
        };
        assert_eq!(reply.parent(), Some(12));
    }
}
