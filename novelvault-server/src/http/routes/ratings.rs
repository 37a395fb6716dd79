//! Rating endpoint

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{routing::post, Json, Router};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::db::repos::{RatingOutcome, RatingRepo};
use crate::http::error::ApiError;
use crate::models::{Score, ValidationError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateNovel {
    pub novel_id: Option<i64>,
    pub score: Option<i64>,
}

/// POST /api/ratings
async fn rate(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<RateNovel>, JsonRejection>,
) -> Result<Json<RatingOutcome>, ApiError> {
    let Json(req) = payload?;
    let novel_id = req
        .novel_id
        .filter(|id| *id > 0)
        .ok_or(ValidationError::Missing { field: "novelId" })?;
    let score = Score::new(req.score.ok_or(ValidationError::Missing { field: "score" })?)?;

    let outcome = RatingRepo::new(&state.pool)
        .rate(user.user_id, novel_id, score)
        .await?;
    Ok(Json(outcome))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/ratings", post(rate))
}
