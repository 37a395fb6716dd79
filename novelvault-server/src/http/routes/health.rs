//! Health check endpoints

use std::sync::Arc;

use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::db::repos::NovelRepo;
use crate::http::error::ApiError;
use crate::state::AppState;

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct DbHealthResponse {
    pub status: &'static str,
    pub novel_count: i64,
}

/// GET /api/health
async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/health/db - round trip to the database
async fn health_db(State(state): State<Arc<AppState>>) -> Result<Json<DbHealthResponse>, ApiError> {
    let novel_count = NovelRepo::new(&state.pool).count().await?;
    Ok(Json(DbHealthResponse {
        status: "success",
        novel_count,
    }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/health/db", get(health_db))
}
