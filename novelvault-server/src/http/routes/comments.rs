//! Comment endpoints for novels and chapters

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::{routing::{get, post}, Json, Router};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::db::repos::{CommentRepo, CommentTarget, CommentThread, UserComment};
use crate::http::error::ApiError;
use crate::http::extractors::ValidId;
use crate::models::{CommentBody, Paginated, Pagination, PaginationParams, ValidationError};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewNovelComment {
    pub novel_id: Option<i64>,
    #[serde(default)]
    pub content: String,
    pub parent_comment_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewChapterComment {
    pub chapter_id: Option<i64>,
    #[serde(default)]
    pub content: String,
    pub parent_comment_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChapterCommentParams {
    pub chapter_id: Option<String>,
}

fn required_id(value: Option<i64>, field: &'static str) -> Result<i64, ApiError> {
    match value {
        Some(id) if id > 0 => Ok(id),
        Some(_) => Err(ValidationError::InvalidFormat {
            field,
            reason: "must be a positive integer",
        }
        .into()),
        None => Err(ValidationError::Missing { field }.into()),
    }
}

/// POST /api/comments
async fn create_novel_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<NewNovelComment>, JsonRejection>,
) -> Result<Json<CommentThread>, ApiError> {
    let Json(req) = payload?;
    let novel_id = required_id(req.novel_id, "novelId")?;
    let body = CommentBody::new(&req.content)?;

    let thread = CommentRepo::new(&state.pool)
        .create(CommentTarget::Novel(novel_id), user.user_id, &body, req.parent_comment_id)
        .await?;
    Ok(Json(thread))
}

/// GET /api/chapter-comments?chapterId=
async fn list_chapter_comments(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ChapterCommentParams>,
) -> Result<Json<Vec<CommentThread>>, ApiError> {
    let raw = params
        .chapter_id
        .filter(|s| !s.trim().is_empty())
        .ok_or(ValidationError::Missing { field: "chapterId" })?;
    let chapter_id = crate::http::extractors::parse_id(&raw).ok_or(ValidationError::InvalidFormat {
        field: "chapterId",
        reason: "must be a positive integer",
    })?;

    let threads = CommentRepo::new(&state.pool)
        .threads(CommentTarget::Chapter(chapter_id))
        .await?;
    Ok(Json(threads))
}

/// POST /api/chapter-comments
async fn create_chapter_comment(
    State(state): State<Arc<AppState>>,
    AuthUser(user): AuthUser,
    payload: Result<Json<NewChapterComment>, JsonRejection>,
) -> Result<Json<CommentThread>, ApiError> {
    let Json(req) = payload?;
    let chapter_id = required_id(req.chapter_id, "chapterId")?;
    let body = CommentBody::new(&req.content)?;

    let thread = CommentRepo::new(&state.pool)
        .create(CommentTarget::Chapter(chapter_id), user.user_id, &body, req.parent_comment_id)
        .await?;
    Ok(Json(thread))
}

/// GET /api/comments/user/{userId}
async fn user_comments(
    State(state): State<Arc<AppState>>,
    AuthUser(_viewer): AuthUser,
    ValidId(user_id): ValidId,
    Query(params): Query<PaginationParams>,
) -> Result<Json<Paginated<UserComment>>, ApiError> {
    let page = CommentRepo::new(&state.pool)
        .by_user(user_id, Pagination::from(params))
        .await?;
    Ok(Json(page))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/comments", post(create_novel_comment))
        .route("/api/comments/user/{user_id}", get(user_comments))
        .route(
            "/api/chapter-comments",
            get(list_chapter_comments).post(create_chapter_comment),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_required_and_positive() {
        assert_eq!(required_id(Some(3), "novelId").unwrap(), 3);
        assert!(matches!(
            required_id(None, "novelId"),
            Err(ApiError::Validation(ValidationError::Missing { field: "novelId" }))
        ));
        assert!(required_id(Some(0), "novelId").is_err());
    }

    #[test]
    fn camel_case_body() {
        let req: NewChapterComment =
            serde_json::from_str(r#"{"chapterId": 9, "content": "hi", "parentCommentId": 2}"#).unwrap();
        assert_eq!(req.chapter_id, Some(9));
        assert_eq!(req.parent_comment_id, Some(2));
    }
}
