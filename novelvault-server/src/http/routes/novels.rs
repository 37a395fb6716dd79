//! Novel catalog endpoints

use std::sync::Arc;

use axum::extract::rejection::QueryRejection;
use axum::extract::{Path, Query, State};
use axum::{routing::get, Json, Router};
use novelvault_core::browse::{self, BrowsePage, BrowseQuery};
use serde::{Deserialize, Serialize};

use crate::db::repos::{CommentRepo, CommentTarget, CommentThread, Genre, GenreRepo, HomeSections, NovelCard, NovelDetail, NovelRepo};
use crate::http::error::ApiError;
use crate::state::AppState;

/// Raw browse query string
#[derive(Debug, Default, Deserialize)]
pub struct BrowseParams {
    #[serde(alias = "genres")]
    pub genre: Option<String>,
    pub status: Option<String>,
    pub sort: Option<String>,
    pub featured: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl BrowseParams {
    pub fn to_query(&self) -> BrowseQuery {
        BrowseQuery::from_params(
            self.genre.as_deref(),
            self.status.as_deref(),
            self.sort.as_deref(),
            self.featured.as_deref(),
            self.page,
            self.limit,
        )
    }
}

#[derive(Serialize)]
pub struct BrowseResponse {
    #[serde(flatten)]
    pub page: BrowsePage<NovelCard>,
    pub total_pages: u32,
}

/// Run a browse query: SQL candidates, then the in-memory pass
pub async fn browse_novels(state: &AppState, query: &BrowseQuery) -> Result<BrowsePage<NovelCard>, ApiError> {
    let candidates = NovelRepo::new(&state.pool).browse_candidates(query).await?;
    Ok(browse::apply(query, candidates))
}

/// GET /api/novels - home page sections
async fn home(State(state): State<Arc<AppState>>) -> Json<HomeSections> {
    Json(NovelRepo::new(&state.pool).home_sections().await)
}

/// GET /api/novels/browse
async fn browse(
    State(state): State<Arc<AppState>>,
    params: Result<Query<BrowseParams>, QueryRejection>,
) -> Result<Json<BrowseResponse>, ApiError> {
    let Query(params) = params?;
    let page = browse_novels(&state, &params.to_query()).await?;
    Ok(Json(BrowseResponse {
        total_pages: page.total_pages(),
        page,
    }))
}

/// GET /api/novels/{slug}
async fn detail(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<NovelDetail>, ApiError> {
    Ok(Json(NovelRepo::new(&state.pool).get_by_slug(&slug).await?))
}

/// GET /api/novels/{slug}/comments
async fn comments(
    State(state): State<Arc<AppState>>,
    Path(slug): Path<String>,
) -> Result<Json<Vec<CommentThread>>, ApiError> {
    let novel = NovelRepo::new(&state.pool).get_by_slug(&slug).await?;
    let threads = CommentRepo::new(&state.pool)
        .threads(CommentTarget::Novel(novel.novel_id))
        .await?;
    Ok(Json(threads))
}

/// GET /api/genres
async fn genres(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Genre>>, ApiError> {
    Ok(Json(GenreRepo::new(&state.pool).list().await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/novels", get(home))
        .route("/api/novels/browse", get(browse))
        .route("/api/novels/{slug}", get(detail))
        .route("/api/novels/{slug}/comments", get(comments))
        .route("/api/genres", get(genres))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn params_map_to_query() {
        let params = BrowseParams {
            genre: Some("Fantasy,Romance".into()),
            status: Some("ALL".into()),
            sort: Some("popular".into()),
            featured: None,
            page: Some(3),
            limit: None,
        };
        let q = params.to_query();
        assert_eq!(q.genres, vec!["Fantasy", "Romance"]);
        assert_eq!(q.status, None);
        assert_eq!(q.page, 3);
        assert_eq!(q.limit, browse::DEFAULT_LIMIT);
    }
}
