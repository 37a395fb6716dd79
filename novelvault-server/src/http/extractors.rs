//! Custom Axum extractors

use std::sync::Arc;

use axum::extract::{FromRequestParts, Path};
use axum::http::request::Parts;
use novelvault_core::rate_limit::Decision;

use super::error::ApiError;
use crate::auth::AuthUser;
use crate::db::repos::SessionUser;
use crate::models::ValidationError;
use crate::state::AppState;

/// Extract a positive integer id from the path
pub struct ValidId(pub i64);

impl<S> FromRequestParts<S> for ValidId
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::Validation(ValidationError::Missing { field: "id" }))?;

        parse_id(&raw).map(Self).ok_or(ApiError::Validation(ValidationError::InvalidFormat {
            field: "id",
            reason: "must be a positive integer",
        }))
    }
}

/// Positive i64 from text
pub fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}

/// A signed-in user whose request passed the rate limiter.
///
/// Store failures are logged and the request is let through.
pub struct RateLimitedUser(pub SessionUser);

impl FromRequestParts<Arc<AppState>> for RateLimitedUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &Arc<AppState>) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        let subject = format!("user:{}", user.user_id);

        match state.rate_limiter.check(&subject, &state.rate_limit_policy()).await {
            Ok(Decision::Allowed { .. }) => Ok(Self(user)),
            Ok(Decision::Denied { retry_after }) => {
                tracing::warn!(user_id = user.user_id, ?retry_after, "rate limited");
                Err(ApiError::RateLimited {
                    retry_after_secs: (retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0)).max(1),
                })
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    backend = %state.rate_limiter.backend(),
                    "rate limit store failed, admitting request"
                );
                Ok(Self(user))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids() {
        assert_eq!(parse_id("42"), Some(42));
        assert_eq!(parse_id(" 7 "), Some(7));
        assert_eq!(parse_id("0"), None);
        assert_eq!(parse_id("-1"), None);
        assert_eq!(parse_id("abc"), None);
    }
}
