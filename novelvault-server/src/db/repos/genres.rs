//! Genre repository

use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::DbError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Genre {
    pub genre_id: i64,
    pub name: String,
}

pub struct GenreRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> GenreRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// All genres by name
    pub async fn list(&self) -> Result<Vec<Genre>, DbError> {
        let rows = sqlx::query_as::<_, Genre>("SELECT genre_id, name FROM genres ORDER BY name")
            .fetch_all(self.pool)
            .await?;
        Ok(rows)
    }
}
