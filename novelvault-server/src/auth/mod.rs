//! Accounts and sessions: registration, login, logout and the request
//! extractors that resolve a session to a user.

pub mod extract;
pub mod password;
pub mod token;

use chrono::Duration;
use sqlx::PgPool;

use crate::db::repos::{DbError, NewUser, SessionRepo, User, UserRepo};
use crate::models::{Email, Password, Username, ValidationError};

pub use extract::{AuthUser, MaybeUser};
pub use token::{clear_session_cookie, hash_token, session_cookie, session_token, SESSION_COOKIE};

/// Authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Account is disabled")]
    Inactive,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Db(#[from] DbError),
}

/// A signed-in user and the raw token handed to the client
#[derive(Debug)]
pub struct LoginSession {
    pub user: User,
    pub token: String,
}

/// Validate and create an account
pub async fn register(pool: &PgPool, username: &str, email: &str, password: &str) -> Result<User, AuthError> {
    if username.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ValidationError::Missing { field: "username, email and password" }.into());
    }
    let email = Email::new(email)?;
    let username = Username::new(username)?;
    let password = Password::new(password)?;

    let password_hash = password::hash_password_blocking(password.expose().to_owned()).await?;
    let user = UserRepo::new(pool)
        .create(&NewUser {
            username,
            email,
            password_hash,
        })
        .await?;
    Ok(user)
}

/// Check credentials and open a session
pub async fn login(pool: &PgPool, email: &str, password: &str, ttl: Duration) -> Result<LoginSession, AuthError> {
    let email = email.trim().to_lowercase();
    if email.is_empty() || password.is_empty() {
        return Err(AuthError::InvalidCredentials);
    }

    let users = UserRepo::new(pool);
    let Some(creds) = users.credentials_by_email(&email).await? else {
        tracing::debug!("login for unknown email");
        return Err(AuthError::InvalidCredentials);
    };

    let matches =
        password::verify_password_blocking(creds.password_hash.clone(), password.to_owned()).await?;
    if !matches {
        tracing::debug!(user_id = creds.user_id, "login with wrong password");
        return Err(AuthError::InvalidCredentials);
    }
    if !creds.is_active {
        return Err(AuthError::Inactive);
    }

    let token = token::generate_token();
    SessionRepo::new(pool)
        .create(creds.user_id, &hash_token(&token), ttl)
        .await?;
    users.touch_last_login(creds.user_id).await?;
    let user = users.get(creds.user_id).await?;

    tracing::info!(user_id = user.user_id, "user logged in");
    Ok(LoginSession { user, token })
}

/// Drop the session behind `token`; unknown tokens are ignored
pub async fn logout(pool: &PgPool, token: &str) -> Result<(), AuthError> {
    let removed = SessionRepo::new(pool).delete(&hash_token(token)).await?;
    tracing::debug!(removed, "logout");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .acquire_timeout(std::time::Duration::from_millis(100))
            .connect_lazy("postgres://localhost:1/unused")
            .unwrap()
    }

    #[tokio::test]
    async fn register_validates_before_touching_database() {
        let pool = lazy_pool();

        let err = register(&pool, "ab", "ann@example.com", "abcdefg1").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(ValidationError::InvalidFormat { field: "username", .. })));

        let err = register(&pool, "annie", "not-an-email", "abcdefg1").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(ValidationError::InvalidFormat { field: "email", .. })));

        let err = register(&pool, "annie", "ann@example.com", "short").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(ValidationError::InvalidFormat { field: "password", .. })));

        let err = register(&pool, "", "", "").await.unwrap_err();
        assert!(matches!(err, AuthError::Validation(ValidationError::Missing { .. })));
    }

    #[tokio::test]
    async fn blank_login_is_invalid_credentials() {
        let err = login(&lazy_pool(), "  ", "x", Duration::days(1)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn register_login_logout() {
        let url = std::env::var("DATABASE_URL").expect("DATABASE_URL required");
        let pool = crate::db::create_pool(&url).await.expect("pool");
        crate::db::migrations::run(&pool).await.expect("migrate");

        let name = format!("r{}", &uuid::Uuid::new_v4().simple().to_string()[..10]);
        let email = format!("{name}@example.com");
        register(&pool, &name, &email, "abcdefg1").await.expect("register");

        let err = login(&pool, &email, "wrongpass1", Duration::days(1)).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));

        let session = login(&pool, &email.to_uppercase(), "abcdefg1", Duration::days(1))
            .await
            .expect("login");
        let found = SessionRepo::new(&pool)
            .find_user(&hash_token(&session.token))
            .await
            .expect("lookup");
        assert_eq!(found.map(|u| u.user_id), Some(session.user.user_id));

        logout(&pool, &session.token).await.expect("logout");
        let gone = SessionRepo::new(&pool)
            .find_user(&hash_token(&session.token))
            .await
            .expect("lookup");
        assert!(gone.is_none());
    }
}
