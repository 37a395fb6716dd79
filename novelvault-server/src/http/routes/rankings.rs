//! Ranking endpoints

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::{routing::get, Json, Router};
use novelvault_core::RankingCategory;
use serde::Serialize;

use crate::db::repos::{NovelCard, NovelRepo};
use crate::http::error::ApiError;
use crate::state::AppState;

#[derive(Serialize)]
pub struct RankingResponse {
    pub category: RankingCategory,
    pub title: &'static str,
    pub description: &'static str,
    pub novels: Vec<NovelCard>,
}

/// GET /api/rankings/{category}
async fn ranking(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Result<Json<RankingResponse>, ApiError> {
    let category: RankingCategory = category.parse()?;
    let novels = NovelRepo::new(&state.pool).rankings(category).await?;
    Ok(Json(RankingResponse {
        category,
        title: category.title(),
        description: category.description(),
        novels,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/rankings/{category}", get(ranking))
}
