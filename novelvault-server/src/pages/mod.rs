//! Server-rendered HTML pages
//!
//! Pages share the repositories with the JSON API. Errors render an error
//! page carrying the same status code; protected pages redirect anonymous
//! visitors to the login form.

pub mod account;
pub mod catalog;
pub mod layout;
pub mod rankings;

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use novelvault_core::CoreError;

use crate::db::repos::DbError;
use crate::http::error::ApiError;
use crate::models::ValidationError;
use crate::state::AppState;

pub use layout::escape_html;

/// Error rendered as an HTML page
#[derive(Debug)]
pub struct PageError(pub ApiError);

impl From<ApiError> for PageError {
    fn from(e: ApiError) -> Self {
        Self(e)
    }
}

impl From<DbError> for PageError {
    fn from(e: DbError) -> Self {
        Self(e.into())
    }
}

impl From<CoreError> for PageError {
    fn from(e: CoreError) -> Self {
        Self(e.into())
    }
}

impl From<ValidationError> for PageError {
    fn from(e: ValidationError) -> Self {
        Self(e.into())
    }
}

impl From<QueryRejection> for PageError {
    fn from(e: QueryRejection) -> Self {
        Self(e.into())
    }
}

impl PageError {
    pub fn not_found(resource: &'static str, id: impl ToString) -> Self {
        Self(DbError::not_found(resource, id).into())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        self.0.log();
        let status = self.0.status();
        let heading = match status.canonical_reason() {
            Some(reason) => format!("{} {}", status.as_u16(), reason),
            None => status.as_u16().to_string(),
        };
        let body = format!(
            r#"<section class="error">
<h1>{}</h1>
<p>{}</p>
<p><a href="/">Back to home</a></p>
</section>"#,
            escape_html(&heading),
            escape_html(&self.0.public_message()),
        );
        (status, layout::render(&heading, None, &body)).into_response()
    }
}

pub type PageResult = Result<Html<String>, PageError>;

/// Redirect to the login form, returning to `path` afterwards
pub fn login_redirect(path: &str) -> Response {
    Redirect::to(&format!("/login?callbackUrl={}", urlencoding::encode(path))).into_response()
}

/// Post-login target: only same-site absolute paths, else home
pub fn safe_callback(raw: Option<&str>) -> String {
    match raw.map(str::trim) {
        Some(path) if path.starts_with('/') && !path.starts_with("//") && !path.starts_with("/\\") => {
            path.to_string()
        }
        _ => "/".to_string(),
    }
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(catalog::home))
        .route("/novels", get(catalog::browse))
        .route("/novels/{slug}", get(catalog::novel))
        .route("/novels/{slug}/comments", post(catalog::post_comment))
        .route("/novels/{slug}/chapters/{chapter_id}", get(catalog::chapter))
        .route(
            "/novels/{slug}/chapters/{chapter_id}/comments",
            post(catalog::post_chapter_comment),
        )
        .route("/rankings", get(rankings::overall))
        .route("/rankings/{category}", get(rankings::category))
        .route("/search", get(rankings::search))
        .route("/library", get(account::library))
        .route("/profile", get(account::profile).post(account::update_profile))
        .route("/login", get(account::login_form).post(account::login))
        .route("/register", get(account::register_form).post(account::register))
        .route("/logout", post(account::logout))
        .route("/contact", get(account::contact_form).post(account::contact))
}
