//! Bookmark endpoints, rate limited per user

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::{routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::db::repos::{BookmarkRepo, BookmarkView, ChapterRepo, DbError, NovelRepo};
use crate::http::error::ApiError;
use crate::http::extractors::{RateLimitedUser, ValidId};
use crate::models::ValidationError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct SaveBookmark {
    pub novel_id: Option<i64>,
    pub chapter_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct RemoveBookmark {
    pub novel_id: Option<i64>,
}

#[derive(Serialize)]
pub struct Removed {
    pub success: bool,
}

fn valid_novel_id(id: Option<i64>) -> Result<i64, ApiError> {
    id.filter(|id| *id > 0).ok_or(ApiError::Validation(ValidationError::InvalidFormat {
        field: "novel_id",
        reason: "a valid novel ID is required",
    }))
}

/// GET /api/bookmarks
async fn list(
    State(state): State<Arc<AppState>>,
    RateLimitedUser(user): RateLimitedUser,
) -> Result<Json<Vec<BookmarkView>>, ApiError> {
    Ok(Json(BookmarkRepo::new(&state.pool).list_for_user(user.user_id).await?))
}

/// POST /api/bookmarks
async fn save(
    State(state): State<Arc<AppState>>,
    RateLimitedUser(user): RateLimitedUser,
    payload: Result<Json<SaveBookmark>, JsonRejection>,
) -> Result<Json<BookmarkView>, ApiError> {
    let Json(req) = payload?;
    let novel_id = valid_novel_id(req.novel_id)?;

    if !NovelRepo::new(&state.pool).exists(novel_id).await? {
        return Err(DbError::not_found("novel", novel_id).into());
    }

    let chapter_id = req.chapter_id.filter(|id| *id > 0);
    if let Some(chapter_id) = chapter_id {
        if !ChapterRepo::new(&state.pool).belongs_to(chapter_id, novel_id).await? {
            return Err(ApiError::BadRequest {
                message: "Invalid chapter for this novel".to_string(),
            });
        }
    }

    let bookmark = BookmarkRepo::new(&state.pool)
        .upsert(user.user_id, novel_id, chapter_id)
        .await?;
    Ok(Json(bookmark))
}

/// DELETE /api/bookmarks
async fn remove(
    State(state): State<Arc<AppState>>,
    RateLimitedUser(user): RateLimitedUser,
    payload: Result<Json<RemoveBookmark>, JsonRejection>,
) -> Result<Json<Removed>, ApiError> {
    let Json(req) = payload?;
    let novel_id = valid_novel_id(req.novel_id)?;

    if !BookmarkRepo::new(&state.pool).delete(user.user_id, novel_id).await? {
        return Err(DbError::not_found("bookmark", novel_id).into());
    }
    Ok(Json(Removed { success: true }))
}

/// GET /api/bookmarks/{novel_id} - `null` when the novel is not bookmarked
async fn get_one(
    State(state): State<Arc<AppState>>,
    RateLimitedUser(user): RateLimitedUser,
    ValidId(novel_id): ValidId,
) -> Result<Json<Option<BookmarkView>>, ApiError> {
    if !NovelRepo::new(&state.pool).exists(novel_id).await? {
        return Err(DbError::not_found("novel", novel_id).into());
    }
    Ok(Json(BookmarkRepo::new(&state.pool).get(user.user_id, novel_id).await?))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/bookmarks", get(list).post(save).delete(remove))
        .route("/api/bookmarks/{novel_id}", get(get_one))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use novelvault_core::NovelvaultConfig;
    use tower::ServiceExt;

    use crate::db::testing;
    use crate::rate_limit::MemoryStore;

    async fn post_bookmark(pool: &sqlx::PgPool, token: &str, body: serde_json::Value) -> (StatusCode, serde_json::Value) {
        let state = AppState::new(pool.clone(), NovelvaultConfig::default())
            .with_rate_limiter(Box::new(MemoryStore::new()));
        let request = Request::post("/api/bookmarks")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = crate::http::build_router(Arc::new(state))
            .oneshot(request)
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn novel_id_must_be_positive() {
        assert_eq!(valid_novel_id(Some(5)).unwrap(), 5);
        assert!(valid_novel_id(Some(0)).is_err());
        assert!(valid_novel_id(None).is_err());
    }

    #[test]
    fn string_novel_id_is_rejected_by_serde() {
        assert!(serde_json::from_str::<SaveBookmark>(r#"{"novel_id": "5"}"#).is_err());
        let ok: SaveBookmark = serde_json::from_str(r#"{"novel_id": 5}"#).unwrap();
        assert_eq!(ok.chapter_id, None);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn chapter_of_another_novel_is_rejected() {
        let pool = testing::pool().await;
        let user = testing::user(&pool).await;
        let token = testing::session(&pool, user).await;
        let novel = testing::novel(&pool, 2).await;
        let other = testing::novel(&pool, 1).await;

        let (status, body) = post_bookmark(
            &pool,
            &token,
            serde_json::json!({"novel_id": novel.novel_id, "chapter_id": other.chapters[0]}),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid chapter for this novel");

        let (status, body) = post_bookmark(
            &pool,
            &token,
            serde_json::json!({"novel_id": novel.novel_id, "chapter_id": novel.chapters[1]}),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["chapter_id"], novel.chapters[1]);
        assert_eq!(body["progress"], 100);
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn unknown_novel_is_not_found() {
        let pool = testing::pool().await;
        let user = testing::user(&pool).await;
        let token = testing::session(&pool, user).await;

        let (status, _) = post_bookmark(&pool, &token, serde_json::json!({"novel_id": i64::MAX})).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
