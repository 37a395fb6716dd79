//! User repository: registration, credentials and profile

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};

use super::{is_unique_violation, DbError};
use crate::models::{Email, ProfileUpdate, Username};

const USER_COLUMNS: &str = "user_id, username, email, display_name, avatar_url, bio, role, \
                            is_active, created_at, updated_at, last_login";

/// Account record without the password hash
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub user_id: i64,
    pub username: String,
    pub email: String,
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub bio: Option<String>,
    pub role: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_login: Option<DateTime<Utc>>,
}

impl User {
    /// Display name, falling back to the username
    pub fn shown_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.username)
    }
}

/// What login needs to check a password
#[derive(Debug, Clone, FromRow)]
pub struct UserCredentials {
    pub user_id: i64,
    pub password_hash: String,
    pub is_active: bool,
}

/// Validated registration input with an already hashed password
#[derive(Debug)]
pub struct NewUser {
    pub username: Username,
    pub email: Email,
    pub password_hash: String,
}

/// User with activity counts
#[derive(Debug, Clone, Serialize)]
pub struct Profile {
    #[serde(flatten)]
    pub user: User,
    pub bookmark_count: i64,
    pub history_count: i64,
}

/// User repository
pub struct UserRepo<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepo<'a> {
    pub fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new account in a transaction.
    ///
    /// Email is compared exactly (stored lowercased), username
    /// case-insensitively. A concurrent insert that slips past the lookup is
    /// caught by the unique indexes and reported the same way.
    pub async fn create(&self, new_user: &NewUser) -> Result<User, DbError> {
        let mut tx = self.pool.begin().await?;

        let existing: Option<String> = sqlx::query_scalar(
            r#"
            SELECT email FROM users
            WHERE email = $1 OR LOWER(username) = LOWER($2)
            ORDER BY (email = $1) DESC
            LIMIT 1
            "#,
        )
        .bind(new_user.email.as_str())
        .bind(new_user.username.as_str())
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(email) = existing {
            return Err(duplicate_account(&email, new_user.email.as_str()));
        }

        let sql = format!(
            r#"
            INSERT INTO users (username, email, password_hash, display_name)
            VALUES ($1, $2, $3, $1)
            RETURNING {USER_COLUMNS}
            "#
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(new_user.username.as_str())
            .bind(new_user.email.as_str())
            .bind(&new_user.password_hash)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    DbError::Conflict {
                        message: "This username or email is already registered".into(),
                    }
                } else {
                    DbError::from(e)
                }
            })?;

        tx.commit().await?;
        tracing::info!(user_id = user.user_id, "user registered");
        Ok(user)
    }

    pub async fn credentials_by_email(&self, email: &str) -> Result<Option<UserCredentials>, DbError> {
        let creds = sqlx::query_as::<_, UserCredentials>(
            "SELECT user_id, password_hash, is_active FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool)
        .await?;
        Ok(creds)
    }

    pub async fn touch_last_login(&self, user_id: i64) -> Result<(), DbError> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE user_id = $1")
            .bind(user_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }

    pub async fn get(&self, user_id: i64) -> Result<User, DbError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE user_id = $1");
        sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("user", user_id))
    }

    pub async fn profile(&self, user_id: i64) -> Result<Profile, DbError> {
        let user = self.get(user_id).await?;
        let (bookmark_count, history_count): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM bookmarks WHERE user_id = $1),
                (SELECT COUNT(*) FROM reading_history WHERE user_id = $1)
            "#,
        )
        .bind(user_id)
        .fetch_one(self.pool)
        .await?;

        Ok(Profile {
            user,
            bookmark_count,
            history_count,
        })
    }

    pub async fn update_profile(&self, user_id: i64, update: &ProfileUpdate) -> Result<User, DbError> {
        let sql = format!(
            r#"
            UPDATE users
            SET display_name = $2, bio = $3, avatar_url = $4, updated_at = NOW()
            WHERE user_id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .bind(&update.display_name)
            .bind(update.bio.as_deref())
            .bind(update.avatar_url.as_deref())
            .fetch_optional(self.pool)
            .await?
            .ok_or_else(|| DbError::not_found("user", user_id))
    }
}

/// Conflict message for an existing account matching either field
fn duplicate_account(existing_email: &str, requested_email: &str) -> DbError {
    let message = if existing_email.eq_ignore_ascii_case(requested_email) {
        "Email already registered"
    } else {
        "Username already taken"
    };
    DbError::Conflict {
        message: message.to_string(),
    }
}
