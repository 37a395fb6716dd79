//! Bookmark repository
//!
//! A bookmark is one row per (user, novel) holding the last chapter read.
//! Reads return it with the chapter count and derived progress.

use chrono::{DateTime, Utc};
use novelvault_core::progress::ReadingProgress;
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;

const BOOKMARK_SELECT: &str = r#"
    SELECT
        b.bookmark_id, b.user_id, b.novel_id, b.chapter_id, b.created_at, b.updated_at,
        n.title AS novel_title, n.slug AS novel_slug, n.cover_image_url, n.status,
        c.chapter_number, c.title AS chapter_title,
        (SELECT COUNT(*) FROM chapters tc WHERE tc.novel_id = b.novel_id) AS total_chapters
    FROM bookmarks b
    JOIN novels n ON n.novel_id = b.novel_id
    LEFT JOIN chapters c ON c.chapter_id = b.chapter_id
"#;

#[derive(Debug, Clone, Serialize)]
pub struct BookmarkNovel {
    pub novel_id: i64,
    pub title: String,
    pub slug: String,
    pub cover_image_url: Option<String>,
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct BookmarkChapter {
    pub chapter_id: i64,
    pub chapter_number: i32,
    pub title: String,
}

/// Bookmark with its novel, saved chapter and reading progress
#[derive(Debug, Clone, Serialize)]
pub struct BookmarkView {
    pub bookmark_id: i64,
    pub user_id: i64,
    pub novel_id: i64,
    pub chapter_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub novel: BookmarkNovel,
    pub chapter: Option<BookmarkChapter>,
    /// `current_chapter`, `total_chapters` and rounded `progress`
    #[serde(flatten)]
    pub reading: ReadingProgress,
}

#[derive(Debug, FromRow)]
struct BookmarkRow {
    bookmark_id: i64,
    user_id: i64,
    novel_id: i64,
    chapter_id: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    novel_title: String,
    novel_slug: String,
    cover_image_url: Option<String>,
    status: String,
    chapter_number: Option<i32>,
    chapter_title: Option<String>,
    total_chapters: i64,
}

impl From<BookmarkRow> for BookmarkView {
    fn from(row: BookmarkRow) -> Self {
        let chapter = match (row.chapter_id, row.chapter_number, row.chapter_title) {
            (Some(id), Some(number), Some(title)) => Some(BookmarkChapter {
                chapter_id: id,
                chapter_number: number,
                title,
            }),
            _ => None,
        };

        Self {
            bookmark_id: row.bookmark_id,
            user_id: row.user_id,
            novel_id: row.novel_id,
            chapter_id: row.chapter_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
            novel: BookmarkNovel {
                novel_id: row.novel_id,
                title: row.novel_title,
                slug: row.novel_slug,
                cover_image_url: row.cover_image_url,
                status: row.status,
            },
            reading: ReadingProgress::new(row.chapter_number, row.total_chapters),
            chapter,
        }
    }
}

/// Bookmark repository
pub struct BookmarkRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> BookmarkRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// A user's bookmarks, most recently updated first
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<BookmarkView>, DbError> {
        let sql = format!("{BOOKMARK_SELECT} WHERE b.user_id = $1 ORDER BY b.updated_at DESC, b.bookmark_id DESC");
        let rows = sqlx::query_as::<_, BookmarkRow>(&sql)
            .bind(user_id)
            .fetch_all(self.pool)
            .await?;
        Ok(rows.into_iter().map(BookmarkView::from).collect())
    }

    pub async fn get(&self, user_id: i64, novel_id: i64) -> Result<Option<BookmarkView>, DbError> {
        let sql = format!("{BOOKMARK_SELECT} WHERE b.user_id = $1 AND b.novel_id = $2");
        let row = sqlx::query_as::<_, BookmarkRow>(&sql)
            .bind(user_id)
            .bind(novel_id)
            .fetch_optional(self.pool)
            .await?;
        Ok(row.map(BookmarkView::from))
    }

    /// Create or refresh a bookmark.
    ///
    /// With no chapter the previously saved chapter is kept. The caller
    /// checks that the chapter belongs to the novel.
    pub async fn upsert(
        &self,
        user_id: i64,
        novel_id: i64,
        chapter_id: Option<i64>,
    ) -> Result<BookmarkView, DbError> {
        sqlx::query(
            r#"
            INSERT INTO bookmarks (user_id, novel_id, chapter_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, novel_id) DO UPDATE
            SET chapter_id = COALESCE(EXCLUDED.chapter_id, bookmarks.chapter_id),
                updated_at = NOW()
            "#,
        )
        .bind(user_id)
        .bind(novel_id)
        .bind(chapter_id)
        .execute(self.pool)
        .await?;

        tracing::debug!(user_id, novel_id, ?chapter_id, "bookmark saved");

        self.get(user_id, novel_id)
            .await?
            .ok_or_else(|| DbError::not_found("bookmark", novel_id))
    }

    /// Returns whether a bookmark was removed
    pub async fn delete(&self, user_id: i64, novel_id: i64) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE user_id = $1 AND novel_id = $2")
            .bind(user_id)
            .bind(novel_id)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
