//! Profile endpoints

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::db::repos::{Profile, User, UserRepo};
use crate::http::error::ApiError;
use crate::models::ProfileUpdate;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfile {
    pub display_name: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
}

/// GET /api/users/profile
async fn get_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
) -> Result<Json<Profile>, ApiError> {
    Ok(Json(UserRepo::new(&state.pool).profile(user.user_id).await?))
}

/// PUT /api/users/profile
async fn update_profile(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<UpdateProfile>, JsonRejection>,
) -> Result<Json<User>, ApiError> {
    let Json(req) = payload?;
    let update = ProfileUpdate::new(
        req.display_name.as_deref(),
        req.bio.as_deref(),
        req.avatar_url.as_deref(),
    )?;
    let updated = UserRepo::new(&state.pool)
        .update_profile(user.user_id, &update)
        .await?;
    tracing::info!(user_id = user.user_id, "profile updated");
    Ok(Json(updated))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/api/users/profile", get(get_profile).put(update_profile))
}
