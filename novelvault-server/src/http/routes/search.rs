//! Search endpoints

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::repos::{NovelCard, NovelRepo, Suggestion};
use crate::http::error::ApiError;
use crate::state::AppState;

/// Queries longer than this are cut before matching
const MAX_QUERY_LEN: usize = 100;

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

impl SearchParams {
    /// Trimmed, length-capped query; `None` when blank
    pub fn term(&self) -> Option<String> {
        let q = self.q.as_deref()?.trim();
        if q.is_empty() {
            return None;
        }
        Some(q.chars().take(MAX_QUERY_LEN).collect())
    }
}

#[derive(Serialize)]
pub struct SearchResponse {
    pub query: String,
    pub novels: Vec<NovelCard>,
}

#[derive(Serialize)]
pub struct SuggestionResponse {
    pub novels: Vec<Suggestion>,
}

/// GET /api/search?q=
async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Some(term) = params.term() else {
        return Ok(Json(SearchResponse {
            query: String::new(),
            novels: Vec::new(),
        }));
    };
    let novels = NovelRepo::new(&state.pool).search(&term).await?;
    Ok(Json(SearchResponse { query: term, novels }))
}

/// GET /api/search-suggestions?q=
async fn suggestions(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SuggestionResponse>, ApiError> {
    let novels = match params.term() {
        Some(term) => NovelRepo::new(&state.pool).suggestions(&term).await?,
        None => Vec::new(),
    };
    Ok(Json(SuggestionResponse { novels }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/search", get(search))
        .route("/api/search-suggestions", get(suggestions))
}
