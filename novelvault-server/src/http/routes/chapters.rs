//! Chapter endpoints: read, save position, count a view

use std::sync::Arc;

use axum::extract::State;
use axum::{routing::{get, post}, Json, Router};
use serde::Serialize;

use crate::auth::{AuthUser, MaybeUser};
use crate::db::repos::{BookmarkRepo, Chapter, ChapterNovel, ChapterRepo, ChapterSummary, CommentRepo, CommentTarget, CommentThread, SessionUser};
use crate::http::error::ApiError;
use crate::http::extractors::ValidId;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ChapterBody {
    #[serde(flatten)]
    pub chapter: Chapter,
    pub comments: Vec<CommentThread>,
}

#[derive(Serialize)]
pub struct NovelBody {
    #[serde(flatten)]
    pub novel: ChapterNovel,
    pub chapters: Vec<ChapterSummary>,
}

#[derive(Serialize)]
pub struct ChapterResponse {
    pub chapter: ChapterBody,
    pub novel: NovelBody,
}

#[derive(Serialize)]
pub struct Success {
    pub success: bool,
}

/// Non-free chapters need a session
pub fn ensure_readable(chapter: &Chapter, user: Option<&SessionUser>) -> Result<(), ApiError> {
    if !chapter.is_free && user.is_none() {
        return Err(ApiError::Unauthorized);
    }
    Ok(())
}

/// GET /api/chapters/{id}
async fn get_chapter(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    user: MaybeUser,
) -> Result<Json<ChapterResponse>, ApiError> {
    let repo = ChapterRepo::new(&state.pool);
    let chapter = repo.get(id).await?;
    ensure_readable(&chapter, user.user())?;

    let novel = repo.novel_of(&chapter).await?;
    let chapters = repo.list_for_novel(novel.novel_id).await?;
    let comments = CommentRepo::new(&state.pool)
        .threads(CommentTarget::Chapter(chapter.chapter_id))
        .await?;

    Ok(Json(ChapterResponse {
        chapter: ChapterBody { chapter, comments },
        novel: NovelBody { novel, chapters },
    }))
}

/// POST /api/chapters/{id} - remember this chapter as the last read
async fn save_last_read(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    AuthUser(user): AuthUser,
) -> Result<Json<Success>, ApiError> {
    let chapter = ChapterRepo::new(&state.pool).get(id).await?;
    BookmarkRepo::new(&state.pool)
        .upsert(user.user_id, chapter.novel_id, Some(chapter.chapter_id))
        .await?;
    Ok(Json(Success { success: true }))
}

/// POST /api/chapters/{id}/view
async fn record_view(
    State(state): State<Arc<AppState>>,
    ValidId(id): ValidId,
    user: MaybeUser,
) -> Result<Json<Success>, ApiError> {
    let repo = ChapterRepo::new(&state.pool);
    let chapter = repo.get(id).await?;
    ensure_readable(&chapter, user.user())?;
    repo.record_view(&chapter).await?;
    Ok(Json(Success { success: true }))
}

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/chapters/{id}", get(get_chapter).post(save_last_read))
        .route("/api/chapters/{id}/view", post(record_view))
}
