//! Page shell and shared fragments

use std::fmt::Write;

use axum::response::Html;
use novelvault_core::browse::BrowseSort;

use crate::db::repos::{NovelCard, SessionUser};
use crate::models::page_window;

const SITE_NAME: &str = "Novelvault";

/// Escape text for HTML element content and quoted attributes
pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Full document around `body`
pub fn render(title: &str, user: Option<&SessionUser>, body: &str) -> Html<String> {
    let account = match user {
        Some(user) => format!(
            r#"<a href="/library">Library</a> <a href="/profile">{}</a>
<form method="post" action="/logout" class="inline"><button type="submit">Logout</button></form>"#,
            escape_html(user.shown_name())
        ),
        None => r#"<a href="/login">Login</a> <a href="/register">Register</a>"#.to_string(),
    };

    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | {SITE_NAME}</title>
</head>
<body>
<header>
<nav>
<a href="/" class="brand">{SITE_NAME}</a>
<a href="/novels">Browse</a>
<a href="/rankings">Rankings</a>
<form method="get" action="/search" class="inline"><input type="search" name="q" placeholder="Search novels"></form>
{account}
</nav>
</header>
<main>
{body}
</main>
<footer>
<a href="/contact">Contact</a> <a href="/sitemap.xml">Sitemap</a>
</footer>
</body>
</html>"#,
        title = escape_html(title),
    ))
}

/// Average rating for display, "N/A" when unrated
pub fn format_rating(rating: Option<f64>) -> String {
    match rating {
        Some(r) => format!("{r:.2}"),
        None => "N/A".to_string(),
    }
}

/// Cover image or a placeholder block
pub fn cover(url: Option<&str>, alt: &str) -> String {
    match url {
        Some(url) => format!(
            r#"<img class="cover" src="{}" alt="{}">"#,
            escape_html(url),
            escape_html(alt)
        ),
        None => r#"<div class="cover placeholder"></div>"#.to_string(),
    }
}

pub fn novel_card(card: &NovelCard) -> String {
    format!(
        r#"<article class="novel-card">
<a href="/novels/{slug}">{cover}<h3>{title}</h3></a>
<p class="meta">{author} · {status} · {chapters} chapters · ★ {rating}</p>
</article>"#,
        slug = escape_html(&card.slug),
        cover = cover(card.cover_image_url.as_deref(), &card.title),
        title = escape_html(&card.title),
        author = escape_html(card.author.as_deref().unwrap_or("Unknown")),
        status = escape_html(&card.status),
        chapters = card.total_chapters,
        rating = format_rating(card.average_rating),
    )
}

/// A titled grid of cards, or a placeholder line when empty
pub fn card_section(heading: &str, cards: &[NovelCard], empty: &str) -> String {
    let mut out = format!("<section>\n<h2>{}</h2>\n", escape_html(heading));
    if cards.is_empty() {
        let _ = writeln!(out, r#"<p class="empty">{}</p>"#, escape_html(empty));
    } else {
        out.push_str("<div class=\"grid\">\n");
        for card in cards {
            out.push_str(&novel_card(card));
            out.push('\n');
        }
        out.push_str("</div>\n");
    }
    out.push_str("</section>");
    out
}

/// Pager links with ellipses; nothing for a single page
pub fn pagination<F>(current: u32, total_pages: u32, href: F) -> String
where
    F: Fn(u32) -> String,
{
    if total_pages <= 1 {
        return String::new();
    }

    let mut out = String::from(r#"<nav class="pagination">"#);
    if current > 1 {
        let _ = write!(out, r#"<a href="{}">Previous</a>"#, escape_html(&href(current - 1)));
    }
    for slot in page_window(current, total_pages) {
        match slot {
            Some(page) if page == current => {
                let _ = write!(out, r#"<span class="current">{page}</span>"#);
            }
            Some(page) => {
                let _ = write!(out, r#"<a href="{}">{page}</a>"#, escape_html(&href(page)));
            }
            None => out.push_str("<span>…</span>"),
        }
    }
    if current < total_pages {
        let _ = write!(out, r#"<a href="{}">Next</a>"#, escape_html(&href(current + 1)));
    }
    out.push_str("</nav>");
    out
}

/// Browse URL keeping the current filters
pub fn browse_href(genres: &[String], status: Option<&str>, sort: BrowseSort, page: u32) -> String {
    let mut params = Vec::new();
    if !genres.is_empty() {
        params.push(format!("genre={}", urlencoding::encode(&genres.join(","))));
    }
    if let Some(status) = status {
        params.push(format!("status={}", urlencoding::encode(status)));
    }
    if sort != BrowseSort::Newest {
        params.push(format!("sort={}", sort.as_str()));
    }
    if page > 1 {
        params.push(format!("page={page}"));
    }
    if params.is_empty() {
        "/novels".to_string()
    } else {
        format!("/novels?{}", params.join("&"))
    }
}

/// Paragraphs from plain chapter text, blank lines separating them
pub fn paragraphs(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| format!("<p>{}</p>", escape_html(p).replace('\n', "<br>")))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_and_quotes() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & 'Jerry'</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; &#39;Jerry&#39;&lt;/a&gt;"
        );
    }

    #[test]
    fn shell_shows_account_links() {
        let Html(anon) = render("Home", None, "<p>hi</p>");
        assert!(anon.contains(r#"href="/login""#));
        assert!(anon.contains("<title>Home | Novelvault</title>"));

        let user = SessionUser {
            user_id: 7,
            username: "reader".into(),
            display_name: Some("<b>Reader</b>".into()),
            avatar_url: None,
            role: "user".into(),
        };
        let Html(signed_in) = render("Home", Some(&user), "");
        assert!(signed_in.contains("&lt;b&gt;Reader&lt;/b&gt;"));
        assert!(!signed_in.contains(r#"href="/login""#));
    }

    #[test]
    fn pager_marks_gaps() {
        let html = pagination(5, 10, |p| format!("/novels?page={p}"));
        assert!(html.contains(r#"<a href="/novels?page=1">1</a>"#));
        assert!(html.contains(r#"<span class="current">5</span>"#));
        assert_eq!(html.matches('…').count(), 2);
        assert!(pagination(1, 1, |p| p.to_string()).is_empty());
    }

    #[test]
    fn browse_href_keeps_filters() {
        let genres = vec!["Sci Fi".to_string(), "Action".to_string()];
        assert_eq!(
            browse_href(&genres, Some("ongoing"), BrowseSort::Rating, 2),
            "/novels?genre=Sci%20Fi%2CAction&status=ongoing&sort=rating&page=2"
        );
        assert_eq!(browse_href(&[], None, BrowseSort::Newest, 1), "/novels");
    }

    #[test]
    fn paragraphs_escape_content() {
        assert_eq!(
            paragraphs("First <line>\nsame para\n\n\nSecond"),
            "<p>First &lt;line&gt;<br>same para</p>\n<p>Second</p>"
        );
    }
}
