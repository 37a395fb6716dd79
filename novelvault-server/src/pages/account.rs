//! Login, registration, library, profile and contact pages

use std::fmt::Write;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, Html, IntoResponse, Redirect, Response};
use axum::Form;
use serde::Deserialize;

use super::layout::{self, escape_html};
use super::{login_redirect, safe_callback, PageError};
use crate::auth::{self, clear_session_cookie, session_cookie, session_token, MaybeUser};
use crate::db::repos::{BookmarkRepo, CommentRepo, HistoryRepo, SessionUser, UserRepo};
use crate::http::error::ApiError;
use crate::models::{Email, Pagination, ProfileUpdate};
use crate::state::AppState;

/// Comments per profile page
const PROFILE_COMMENTS_PER_PAGE: u32 = 10;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallbackParams {
    pub callback_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub callback_url: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: String,
    pub callback_url: Option<String>,
}

fn error_banner(error: Option<&str>) -> String {
    error
        .map(|e| format!(r#"<p class="error">{}</p>"#, escape_html(e)))
        .unwrap_or_default()
}

fn login_page(email: &str, callback: &str, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<h1>Log in</h1>
{}
<form method="post" action="/login">
<input type="hidden" name="callbackUrl" value="{}">
<label>Email <input type="email" name="email" value="{}" required></label>
<label>Password <input type="password" name="password" required></label>
<button type="submit">Log in</button>
</form>
<p>No account? <a href="/register?callbackUrl={}">Register</a></p>"#,
        error_banner(error),
        escape_html(callback),
        escape_html(email),
        escape_html(&urlencoding::encode(callback)),
    );
    layout::render("Log in", None, &body)
}

fn register_page(username: &str, email: &str, callback: &str, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<h1>Create an account</h1>
{}
<form method="post" action="/register">
<input type="hidden" name="callbackUrl" value="{}">
<label>Username <input type="text" name="username" value="{}" minlength="3" maxlength="30" required></label>
<label>Email <input type="email" name="email" value="{}" required></label>
<label>Password <input type="password" name="password" minlength="8" required></label>
<label>Confirm password <input type="password" name="confirmPassword" minlength="8" required></label>
<button type="submit">Register</button>
</form>
<p>Already registered? <a href="/login">Log in</a></p>"#,
        error_banner(error),
        escape_html(callback),
        escape_html(username),
        escape_html(email),
    );
    layout::render("Register", None, &body)
}

/// Session cookie plus a redirect to the callback
fn signed_in_redirect(token: &str, max_age_secs: i64, target: &str) -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, session_cookie(token, max_age_secs))]),
        Redirect::to(target),
    )
        .into_response()
}

/// Re-render a form with the error's message and status
fn form_error(err: ApiError, render: impl FnOnce(&str) -> Html<String>) -> Response {
    err.log();
    (err.status(), render(&err.public_message())).into_response()
}

/// GET /login
pub async fn login_form(user: MaybeUser, Query(params): Query<CallbackParams>) -> Response {
    let callback = safe_callback(params.callback_url.as_deref());
    if user.user().is_some() {
        return Redirect::to(&callback).into_response();
    }
    login_page("", &callback, None).into_response()
}

/// POST /login
pub async fn login(State(state): State<Arc<AppState>>, Form(form): Form<LoginForm>) -> Response {
    let callback = safe_callback(form.callback_url.as_deref());
    let ttl = state.session_ttl();
    match auth::login(&state.pool, &form.email, &form.password, ttl).await {
        Ok(session) => {
            tracing::info!(user_id = session.user.user_id, "signed in via login form");
            signed_in_redirect(&session.token, ttl.num_seconds(), &callback)
        }
        Err(e) => form_error(e.into(), |msg| login_page(&form.email, &callback, Some(msg))),
    }
}

/// GET /register
pub async fn register_form(user: MaybeUser, Query(params): Query<CallbackParams>) -> Response {
    let callback = safe_callback(params.callback_url.as_deref());
    if user.user().is_some() {
        return Redirect::to(&callback).into_response();
    }
    register_page("", "", &callback, None).into_response()
}

/// POST /register - create the account and sign it in
pub async fn register(State(state): State<Arc<AppState>>, Form(form): Form<RegisterForm>) -> Response {
    let callback = safe_callback(form.callback_url.as_deref());
    let rerender = |msg: &str| register_page(&form.username, &form.email, &callback, Some(msg));

    if form.password != form.confirm_password {
        return (StatusCode::BAD_REQUEST, rerender("Passwords do not match")).into_response();
    }
    if let Err(e) = auth::register(&state.pool, &form.username, &form.email, &form.password).await {
        return form_error(e.into(), rerender);
    }

    let ttl = state.session_ttl();
    match auth::login(&state.pool, &form.email, &form.password, ttl).await {
        Ok(session) => signed_in_redirect(&session.token, ttl.num_seconds(), &callback),
        Err(e) => {
            tracing::warn!(error = %e, "account created but automatic sign-in failed");
            Redirect::to("/login").into_response()
        }
    }
}

/// POST /logout
pub async fn logout(State(state): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    if let Some(token) = session_token(&headers) {
        if let Err(e) = auth::logout(&state.pool, &token).await {
            tracing::warn!(error = %e, "failed to delete session on logout");
        }
    }
    (
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie())]),
        Redirect::to("/"),
    )
        .into_response()
}

/// GET /library - bookmarks with progress and recent reads
pub async fn library(State(state): State<Arc<AppState>>, user: MaybeUser) -> Result<Response, PageError> {
    let Some(user) = user.user() else {
        return Ok(login_redirect("/library"));
    };

    let bookmarks = BookmarkRepo::new(&state.pool).list_for_user(user.user_id).await?;
    let history = HistoryRepo::new(&state.pool).recent(user.user_id).await?;

    let mut body = format!("<h1>My Library</h1>\n<section>\n<h2>Bookmarks ({})</h2>\n", bookmarks.len());
    if bookmarks.is_empty() {
        body.push_str(r#"<p class="empty">No bookmarks yet. <a href="/novels">Browse novels</a></p>"#);
    } else {
        body.push_str("<ul class=\"bookmarks\">\n");
        for bookmark in &bookmarks {
            let slug = escape_html(&bookmark.novel.slug);
            let position = match &bookmark.chapter {
                Some(ch) => format!(
                    r#"<a href="/novels/{slug}/chapters/{}">Continue: Chapter {}</a>"#,
                    ch.chapter_id, ch.chapter_number
                ),
                None => "Not started".to_string(),
            };
            let _ = writeln!(
                body,
                r#"<li><a href="/novels/{slug}">{}</a> {position} <progress max="100" value="{}">{pct}%</progress> {pct}% of {} chapters</li>"#,
                escape_html(&bookmark.novel.title),
                bookmark.reading.progress,
                bookmark.reading.total_chapters,
                pct = bookmark.reading.display_percent(),
            );
        }
        body.push_str("</ul>\n");
    }
    body.push_str("</section>\n<section>\n<h2>Recently Read</h2>\n");
    if history.is_empty() {
        body.push_str(r#"<p class="empty">Nothing read yet.</p>"#);
    } else {
        body.push_str("<ul class=\"history\">\n");
        for item in &history {
            let _ = writeln!(
                body,
                r#"<li><a href="/novels/{slug}/chapters/{}">{} · Chapter {}: {}</a> <time>{}</time></li>"#,
                item.chapter.chapter_id,
                escape_html(&item.novel.title),
                item.chapter.chapter_number,
                escape_html(&item.chapter.title),
                item.read_at.format("%Y-%m-%d"),
                slug = escape_html(&item.novel.slug),
            );
        }
        body.push_str("</ul>\n");
    }
    body.push_str("</section>");

    Ok(layout::render("My Library", Some(user), &body).into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct ProfileParams {
    pub page: Option<u32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

async fn profile_page(
    state: &AppState,
    user: &SessionUser,
    page: u32,
    error: Option<&str>,
) -> Result<Html<String>, PageError> {
    let profile = UserRepo::new(&state.pool).profile(user.user_id).await?;
    let comments = CommentRepo::new(&state.pool)
        .by_user(user.user_id, Pagination::new(page, PROFILE_COMMENTS_PER_PAGE))
        .await?;
    let u = &profile.user;

    let mut body = format!(
        r#"<h1>{name}</h1>
<p class="meta">@{username} · joined {joined} · {bookmarks} bookmarks · {reads} chapters read</p>
{error}
<form method="post" action="/profile">
<label>Display name <input type="text" name="displayName" value="{display}" maxlength="50" required></label>
<label>Bio <textarea name="bio" maxlength="1000">{bio}</textarea></label>
<label>Avatar URL <input type="url" name="avatarUrl" value="{avatar}" maxlength="500"></label>
<button type="submit">Save profile</button>
</form>
<section>
<h2>My Comments ({total})</h2>
"#,
        name = escape_html(u.shown_name()),
        username = escape_html(&u.username),
        joined = u.created_at.format("%Y-%m-%d"),
        bookmarks = profile.bookmark_count,
        reads = profile.history_count,
        error = error_banner(error),
        display = escape_html(u.display_name.as_deref().unwrap_or("")),
        bio = escape_html(u.bio.as_deref().unwrap_or("")),
        avatar = escape_html(u.avatar_url.as_deref().unwrap_or("")),
        total = comments.total,
    );

    if comments.items.is_empty() {
        body.push_str(r#"<p class="empty">No comments yet.</p>"#);
    }
    for item in &comments.items {
        let _ = writeln!(
            body,
            r#"<p class="comment"><a href="/novels/{}">{}</a> <time>{}</time><br>{}</p>"#,
            escape_html(&item.novel_slug),
            escape_html(&item.novel_title),
            item.comment.created_at.format("%Y-%m-%d %H:%M"),
            escape_html(&item.comment.content),
        );
    }
    body.push_str(&layout::pagination(comments.page, comments.total_pages(), |p| {
        format!("/profile?page={p}")
    }));
    body.push_str("</section>");

    Ok(layout::render("Profile", Some(user), &body))
}

/// GET /profile
pub async fn profile(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
    Query(params): Query<ProfileParams>,
) -> Result<Response, PageError> {
    let Some(user) = user.user() else {
        return Ok(login_redirect("/profile"));
    };
    let page = profile_page(&state, user, params.page.unwrap_or(1), None).await?;
    Ok(page.into_response())
}

/// POST /profile
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    user: MaybeUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, PageError> {
    let Some(user) = user.user() else {
        return Ok(login_redirect("/profile"));
    };

    let update = match ProfileUpdate::new(
        form.display_name.as_deref(),
        form.bio.as_deref(),
        form.avatar_url.as_deref(),
    ) {
        Ok(update) => update,
        Err(e) => {
            let page = profile_page(&state, user, 1, Some(&e.to_string())).await?;
            return Ok((StatusCode::BAD_REQUEST, page).into_response());
        }
    };

    UserRepo::new(&state.pool)
        .update_profile(user.user_id, &update)
        .await?;
    tracing::info!(user_id = user.user_id, "profile updated");
    Ok(Redirect::to("/profile").into_response())
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

impl ContactForm {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() || self.message.trim().is_empty() {
            return Err("Please fill in every field".to_string());
        }
        Email::new(&self.email).map(|_| ()).map_err(|e| e.to_string())
    }
}

fn contact_page(user: Option<&SessionUser>, error: Option<&str>) -> Html<String> {
    let body = format!(
        r#"<h1>Contact Us</h1>
{}
<form method="post" action="/contact">
<label>Name <input type="text" name="name" required></label>
<label>Email <input type="email" name="email" required></label>
<label>Message <textarea name="message" rows="5" required></textarea></label>
<button type="submit">Send Message</button>
</form>"#,
        error_banner(error)
    );
    layout::render("Contact", user, &body)
}

/// GET /contact
pub async fn contact_form(user: MaybeUser) -> Html<String> {
    contact_page(user.user(), None)
}

/// POST /contact - acknowledged and logged, nothing is sent
pub async fn contact(user: MaybeUser, Form(form): Form<ContactForm>) -> Response {
    if let Err(msg) = form.validate() {
        return (StatusCode::BAD_REQUEST, contact_page(user.user(), Some(&msg))).into_response();
    }
    tracing::info!(
        email = %form.email.trim(),
        length = form.message.len(),
        "contact message received"
    );
    let body = r#"<h1>Contact Us</h1>
<p class="notice">Thank you for contacting us! We will get back to you soon.</p>"#;
    layout::render("Contact", user.user(), body).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn login_page_keeps_email_and_escapes() {
        let Html(html) = login_page("a\"@b.c", "/library", Some("Invalid credentials"));
        assert!(html.contains(r#"value="a&quot;@b.c""#));
        assert!(html.contains(r#"name="callbackUrl" value="/library""#));
        assert!(html.contains("Invalid credentials"));
    }

    #[test]
    fn contact_form_validation() {
        let ok = ContactForm {
            name: "Ana".into(),
            email: "ana@example.com".into(),
            message: "Hello".into(),
        };
        assert!(ok.validate().is_ok());

        let blank = ContactForm {
            message: "  ".into(),
            ..ok
        };
        assert!(blank.validate().is_err());
    }

    #[test]
    fn form_errors_keep_status() {
        let response = form_error(ApiError::InvalidCredentials, |msg| login_page("", "/", Some(msg)));
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
