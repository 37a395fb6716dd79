//! Session extractors

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use super::token::{hash_token, session_token};
use crate::db::repos::{SessionRepo, SessionUser};
use crate::http::error::ApiError;
use crate::state::AppState;

/// A signed-in user; rejects with 401 otherwise
#[derive(Debug, Clone)]
pub struct AuthUser(pub SessionUser);

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers).ok_or(ApiError::Unauthorized)?;
        SessionRepo::new(&state.pool)
            .find_user(&hash_token(&token))
            .await?
            .map(AuthUser)
            .ok_or(ApiError::Unauthorized)
    }
}

/// The signed-in user, if any.
///
/// Lookup failures are logged and treated as anonymous.
#[derive(Debug, Clone)]
pub struct MaybeUser(pub Option<SessionUser>);

impl FromRequestParts<Arc<AppState>> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let Some(token) = session_token(&parts.headers) else {
            return Ok(Self(None));
        };
        match SessionRepo::new(&state.pool).find_user(&hash_token(&token)).await {
            Ok(user) => Ok(Self(user)),
            Err(e) => {
                tracing::warn!(error = %e, "session lookup failed, continuing anonymous");
                Ok(Self(None))
            }
        }
    }
}

impl MaybeUser {
    pub fn user(&self) -> Option<&SessionUser> {
        self.0.as_ref()
    }
}
