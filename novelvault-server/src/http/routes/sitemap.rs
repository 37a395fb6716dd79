//! XML sitemap

use std::sync::Arc;

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::{routing::get, Router};
use novelvault_core::SitemapBuilder;

use crate::db::repos::{GenreRepo, NovelRepo};
use crate::state::AppState;

/// Build the sitemap; database failures leave only the static pages
pub async fn build_sitemap(state: &AppState) -> String {
    let mut builder = SitemapBuilder::new(state.base_url()).static_pages();

    match NovelRepo::new(&state.pool).all_slugs().await {
        Ok(slugs) => slugs.iter().for_each(|slug| builder.novel(slug)),
        Err(e) => tracing::error!(error = %e, "sitemap: novel slugs unavailable"),
    }
    match GenreRepo::new(&state.pool).list().await {
        Ok(genres) => genres.iter().for_each(|g| builder.genre(&g.name)),
        Err(e) => tracing::error!(error = %e, "sitemap: genres unavailable"),
    }

    tracing::debug!(urls = builder.len(), "sitemap built");
    builder.build()
}

/// GET /sitemap.xml
async fn sitemap(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "application/xml")],
        build_sitemap(&state).await,
    )
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/sitemap.xml", get(sitemap))
}
