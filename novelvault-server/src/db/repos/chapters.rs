//! Chapter repository

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;

/// Chapter entry in a table of contents
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ChapterSummary {
    pub chapter_id: i64,
    pub chapter_number: i32,
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Chapter with its text
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Chapter {
    pub chapter_id: i64,
    pub novel_id: i64,
    pub chapter_number: i32,
    pub title: String,
    pub content: String,
    pub is_free: bool,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Owning novel, as shown above a chapter
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct ChapterNovel {
    pub novel_id: i64,
    pub title: String,
    pub slug: String,
    pub cover_image_url: Option<String>,
    pub description: Option<String>,
}

/// Chapter repository
pub struct ChapterRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> ChapterRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, chapter_id: i64) -> Result<Chapter, DbError> {
        sqlx::query_as::<_, Chapter>(
            r#"
            SELECT chapter_id, novel_id, chapter_number, title, content, is_free,
                   view_count, created_at, updated_at
            FROM chapters
            WHERE chapter_id = $1
            "#,
        )
        .bind(chapter_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("chapter", chapter_id))
    }

    pub async fn novel_of(&self, chapter: &Chapter) -> Result<ChapterNovel, DbError> {
        sqlx::query_as::<_, ChapterNovel>(
            "SELECT novel_id, title, slug, cover_image_url, description FROM novels WHERE novel_id = $1",
        )
        .bind(chapter.novel_id)
        .fetch_optional(self.pool)
        .await?
        .ok_or_else(|| DbError::not_found("novel", chapter.novel_id))
    }

    /// Chapters of a novel in reading order
    pub async fn list_for_novel(&self, novel_id: i64) -> Result<Vec<ChapterSummary>, DbError> {
        let rows = sqlx::query_as::<_, ChapterSummary>(
            r#"
            SELECT chapter_id, chapter_number, title, created_at, updated_at
            FROM chapters
            WHERE novel_id = $1
            ORDER BY chapter_number ASC
            "#,
        )
        .bind(novel_id)
        .fetch_all(self.pool)
        .await?;
        Ok(rows)
    }

    pub async fn belongs_to(&self, chapter_id: i64, novel_id: i64) -> Result<bool, DbError> {
        let found: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM chapters WHERE chapter_id = $1 AND novel_id = $2)",
        )
        .bind(chapter_id)
        .bind(novel_id)
        .fetch_one(self.pool)
        .await?;
        Ok(found)
    }

    /// Count a read: chapter and novel view counters move together
    pub async fn record_view(&self, chapter: &Chapter) -> Result<(), DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("UPDATE chapters SET view_count = view_count + 1 WHERE chapter_id = $1")
            .bind(chapter.chapter_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("UPDATE novels SET view_count = view_count + 1 WHERE novel_id = $1")
            .bind(chapter.novel_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

/// Previous and next chapters around `current` in an ordered list
pub fn neighbours(
    chapters: &[ChapterSummary],
    current: i64,
) -> (Option<&ChapterSummary>, Option<&ChapterSummary>) {
    let Some(pos) = chapters.iter().position(|c| c.chapter_id == current) else {
        return (None, None);
    };
    let prev = pos.checked_sub(1).and_then(|i| chapters.get(i));
    (prev, chapters.get(pos + 1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(id: i64, number: i32) -> ChapterSummary {
        ChapterSummary {
            chapter_id: id,
            chapter_number: number,
            title: format!("Chapter {number}"),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn neighbours_in_middle_and_edges() {
        let list = vec![summary(10, 1), summary(11, 2), summary(12, 3)];

        let (prev, next) = neighbours(&list, 11);
        assert_eq!(prev.map(|c| c.chapter_id), Some(10));
        assert_eq!(next.map(|c| c.chapter_id), Some(12));

        let (prev, next) = neighbours(&list, 10);
        assert!(prev.is_none());
        assert_eq!(next.map(|c| c.chapter_id), Some(11));

        let (prev, next) = neighbours(&list, 12);
        assert_eq!(prev.map(|c| c.chapter_id), Some(11));
        assert!(next.is_none());

        assert!(matches!(neighbours(&list, 99), (None, None)));
    }
}
