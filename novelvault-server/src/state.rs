//! Application state shared across handlers

use novelvault_core::config::{NovelvaultConfig, MAX_SESSION_TTL_DAYS};
use novelvault_core::rate_limit::RateLimitPolicy;
use sqlx::PgPool;

use crate::rate_limit::{store_for, RateLimitStore};

/// Shared application state, held in an `Arc` by the router
pub struct AppState {
    pub pool: PgPool,
    pub config: NovelvaultConfig,
    pub rate_limiter: Box<dyn RateLimitStore>,
}

impl AppState {
    /// State with the rate limit store selected in config
    pub fn new(pool: PgPool, config: NovelvaultConfig) -> Self {
        let rate_limiter = store_for(config.rate_limit.backend, &pool);
        Self {
            pool,
            config,
            rate_limiter,
        }
    }

    pub fn with_rate_limiter(mut self, store: Box<dyn RateLimitStore>) -> Self {
        self.rate_limiter = store;
        self
    }

    pub fn rate_limit_policy(&self) -> RateLimitPolicy {
        self.config.rate_limit.policy()
    }

    /// Session lifetime, held to the range config validation accepts
    pub fn session_ttl(&self) -> chrono::Duration {
        chrono::Duration::days(self.config.auth.session_ttl_days.clamp(1, MAX_SESSION_TTL_DAYS))
    }

    pub fn base_url(&self) -> &str {
        &self.config.server.base_url
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::postgres::PgPoolOptions;

    fn state_with_ttl(days: i64) -> AppState {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://novelvault@localhost:1/novelvault_test")
            .unwrap();
        let mut config = NovelvaultConfig::default();
        config.auth.session_ttl_days = days;
        AppState::new(pool, config)
    }

    #[tokio::test]
    async fn session_ttl_follows_config() {
        assert_eq!(state_with_ttl(30).session_ttl(), chrono::Duration::days(30));
    }

    #[tokio::test]
    async fn session_ttl_is_clamped() {
        assert_eq!(
            state_with_ttl(i64::MAX).session_ttl(),
            chrono::Duration::days(MAX_SESSION_TTL_DAYS)
        );
        assert_eq!(state_with_ttl(-5).session_ttl(), chrono::Duration::days(1));
    }
}
