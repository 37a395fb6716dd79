//! Reading history endpoints

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::db::repos::{HistoryEntry, HistoryItem, HistoryRepo};
use crate::http::error::ApiError;
use crate::models::ValidationError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordRead {
    pub chapter_id: Option<i64>,
    pub progress_percentage: Option<f64>,
}

impl RecordRead {
    fn validate(&self) -> Result<(i64, f64), ValidationError> {
        let chapter_id = self
            .chapter_id
            .filter(|id| *id > 0)
            .ok_or(ValidationError::Missing { field: "chapterId" })?;
        let progress = self
            .progress_percentage
            .ok_or(ValidationError::Missing { field: "progressPercentage" })?;
        if !progress.is_finite() || !(0.0..=100.0).contains(&progress) {
            return Err(ValidationError::OutOfRange {
                field: "progressPercentage",
                min: 0,
                max: 100,
            });
        }
        Ok((chapter_id, progress))
    }
}

/// GET /api/reading-history
async fn recent(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Vec<HistoryItem>>, ApiError> {
    Ok(Json(HistoryRepo::new(&state.pool).recent(user.user_id).await?))
}

/// POST /api/reading-history
async fn record(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<RecordRead>, JsonRejection>,
) -> Result<Json<HistoryEntry>, ApiError> {
    let Json(req) = payload?;
    let (chapter_id, progress) = req.validate()?;
    let entry = HistoryRepo::new(&state.pool)
        .record(user.user_id, chapter_id, progress)
        .await?;
    Ok(Json(entry))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/reading-history", get(recent).post(record))
}
