//! Reading history repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;

/// Entries returned by the history list
pub const HISTORY_LIMIT: i64 = 15;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct HistoryEntry {
    pub history_id: i64,
    pub user_id: i64,
    pub chapter_id: i64,
    pub progress_percentage: f64,
    pub read_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryChapter {
    pub chapter_id: i64,
    pub chapter_number: i32,
    pub title: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryNovel {
    pub novel_id: i64,
    pub title: String,
    pub slug: String,
    pub cover_image_url: Option<String>,
}

/// A history entry with the chapter and novel it points at
#[derive(Debug, Clone, Serialize)]
pub struct HistoryItem {
    pub history_id: i64,
    pub progress_percentage: f64,
    pub read_at: DateTime<Utc>,
    pub chapter: HistoryChapter,
    pub novel: HistoryNovel,
}

#[derive(Debug, FromRow)]
struct HistoryRow {
    history_id: i64,
    progress_percentage: f64,
    read_at: DateTime<Utc>,
    chapter_id: i64,
    chapter_number: i32,
    chapter_title: String,
    novel_id: i64,
    novel_title: String,
    slug: String,
    cover_image_url: Option<String>,
}

impl From<HistoryRow> for HistoryItem {
    fn from(r: HistoryRow) -> Self {
        Self {
            history_id: r.history_id,
            progress_percentage: r.progress_percentage,
            read_at: r.read_at,
            chapter: HistoryChapter {
                chapter_id: r.chapter_id,
                chapter_number: r.chapter_number,
                title: r.chapter_title,
            },
            novel: HistoryNovel {
                novel_id: r.novel_id,
                title: r.novel_title,
                slug: r.slug,
                cover_image_url: r.cover_image_url,
            },
        }
    }
}

pub struct HistoryRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> HistoryRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Record a read, refreshing `read_at` on repeat visits
    pub async fn record(
        &self,
        user_id: i64,
        chapter_id: i64,
        progress_percentage: f64,
    ) -> Result<HistoryEntry, DbError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM chapters WHERE chapter_id = $1)")
                .bind(chapter_id)
                .fetch_one(self.pool)
                .await?;
        if !exists {
            return Err(DbError::not_found("chapter", chapter_id));
        }

        let entry = sqlx::query_as::<_, HistoryEntry>(
            r#"
            INSERT INTO reading_history (user_id, chapter_id, progress_percentage)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id, chapter_id) DO UPDATE
            SET progress_percentage = EXCLUDED.progress_percentage, read_at = NOW()
            RETURNING history_id, user_id, chapter_id, progress_percentage, read_at
            "#,
        )
        .bind(user_id)
        .bind(chapter_id)
        .bind(progress_percentage)
        .fetch_one(self.pool)
        .await?;
        Ok(entry)
    }

    /// Most recent reads first
    pub async fn recent(&self, user_id: i64) -> Result<Vec<HistoryItem>, DbError> {
        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT h.history_id, h.progress_percentage, h.read_at,
                   c.chapter_id, c.chapter_number, c.title AS chapter_title,
                   n.novel_id, n.title AS novel_title, n.slug, n.cover_image_url
            FROM reading_history h
            JOIN chapters c ON c.chapter_id = h.chapter_id
            JOIN novels n ON n.novel_id = c.novel_id
            WHERE h.user_id = $1
            ORDER BY h.read_at DESC, h.history_id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(HISTORY_LIMIT)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(HistoryItem::from).collect())
    }
}
