//! Login sessions keyed by the sha256 of a bearer token

use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use super::DbError;

/// The signed-in user behind a session
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SessionUser {
    pub user_id: i64,
    pub username: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub role: String,
}

impl SessionUser {
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

pub struct SessionRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> SessionRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, user_id: i64, token_hash: &str, ttl: Duration) -> Result<(), DbError> {
        let expires_at = Utc::now()
            .checked_add_signed(ttl)
            .ok_or_else(|| DbError::invalid("session lifetime out of range"))?;
        sqlx::query(
            r#"
            INSERT INTO user_sessions (id, user_id, token_hash, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(token_hash)
        .bind(expires_at)
        .execute(self.pool)
        .await?;
        Ok(())
    }

    /// Active user for an unexpired session, if any
    pub async fn find_user(&self, token_hash: &str) -> Result<Option<SessionUser>, DbError> {
        let user = sqlx::query_as::<_, SessionUser>(
            r#"
            SELECT u.user_id, u.username, u.display_name, u.avatar_url, u.role
            FROM user_sessions s
            JOIN users u ON u.user_id = s.user_id
            WHERE s.token_hash = $1 AND s.expires_at > NOW() AND u.is_active
            "#,
        )
        .bind(token_hash)
        .fetch_optional(self.pool)
        .await?;
        Ok(user)
    }

    pub async fn delete(&self, token_hash: &str) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Remove expired sessions, returning how many were dropped
    pub async fn purge_expired(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM user_sessions WHERE expires_at <= NOW()")
            .execute(self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
