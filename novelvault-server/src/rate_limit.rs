//! Rate limit stores.
//!
//! The window arithmetic lives in `novelvault_core::rate_limit`; a store
//! only keeps hits. `PgStore` shares hits across server instances through
//! the `rate_limit_hits` table, `MemoryStore` keeps them in-process.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use novelvault_core::config::RateLimitBackend;
use novelvault_core::rate_limit::{Decision, RateLimitPolicy, SlidingWindow};
use sqlx::PgPool;

use crate::db::repos::DbError;

/// Idle windows are swept once the map grows past this many subjects
const SWEEP_THRESHOLD: usize = 10_000;

/// Where hits are recorded and counted
#[async_trait]
pub trait RateLimitStore: Send + Sync {
    /// Check `subject` against `policy`, recording the hit if admitted
    async fn check(&self, subject: &str, policy: &RateLimitPolicy) -> Result<Decision, DbError>;

    /// Drop hits older than the window for every subject
    async fn purge(&self, policy: &RateLimitPolicy) -> Result<u64, DbError>;

    fn backend(&self) -> RateLimitBackend;
}

/// Build the store selected in config
pub fn store_for(backend: RateLimitBackend, pool: &PgPool) -> Box<dyn RateLimitStore> {
    match backend {
        RateLimitBackend::Postgres => Box::new(PgStore::new(pool.clone())),
        RateLimitBackend::Memory => Box::new(MemoryStore::new()),
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct MemoryStore {
    windows: Mutex<HashMap<String, SlidingWindow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check at an explicit instant
    pub fn check_at(&self, subject: &str, policy: &RateLimitPolicy, now: DateTime<Utc>) -> Decision {
        let mut windows = self.windows.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, w| !w.is_idle(policy, now));
        }

        windows
            .entry(subject.to_owned())
            .or_default()
            .try_acquire(policy, now)
    }

    fn purge_at(&self, policy: &RateLimitPolicy, now: DateTime<Utc>) -> u64 {
        let mut windows = self.windows.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        let before = windows.len();
        windows.retain(|_, w| !w.is_idle(policy, now));
        (before - windows.len()) as u64
    }

    pub fn subjects(&self) -> usize {
        self.windows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

#[async_trait]
impl RateLimitStore for MemoryStore {
    async fn check(&self, subject: &str, policy: &RateLimitPolicy) -> Result<Decision, DbError> {
        Ok(self.check_at(subject, policy, Utc::now()))
    }

    async fn purge(&self, policy: &RateLimitPolicy) -> Result<u64, DbError> {
        Ok(self.purge_at(policy, Utc::now()))
    }

    fn backend(&self) -> RateLimitBackend {
        RateLimitBackend::Memory
    }
}

/// Database-backed store shared by every instance using the same database.
///
/// Each check runs in one transaction holding a per-subject advisory lock,
/// so count-then-insert is atomic across instances. The database clock is
/// the time source.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RateLimitStore for PgStore {
    async fn check(&self, subject: &str, policy: &RateLimitPolicy) -> Result<Decision, DbError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1))")
            .bind(subject)
            .execute(&mut *tx)
            .await?;

        let now: DateTime<Utc> = sqlx::query_scalar("SELECT NOW()")
            .fetch_one(&mut *tx)
            .await?;
        let window_start = policy.window_start(now);

        sqlx::query("DELETE FROM rate_limit_hits WHERE subject = $1 AND hit_at <= $2")
            .bind(subject)
            .bind(window_start)
            .execute(&mut *tx)
            .await?;

        let (hits, oldest): (i64, Option<DateTime<Utc>>) = sqlx::query_as(
            "SELECT COUNT(*), MIN(hit_at) FROM rate_limit_hits WHERE subject = $1 AND hit_at > $2",
        )
        .bind(subject)
        .bind(window_start)
        .fetch_one(&mut *tx)
        .await?;

        let hits = u32::try_from(hits).unwrap_or(u32::MAX);
        let decision = policy.decide(hits, oldest, now);
        if decision.is_allowed() {
            sqlx::query("INSERT INTO rate_limit_hits (subject, hit_at) VALUES ($1, $2)")
                .bind(subject)
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(decision)
    }

    async fn purge(&self, policy: &RateLimitPolicy) -> Result<u64, DbError> {
        let window = chrono::Duration::from_std(policy.window).unwrap_or(chrono::Duration::zero());
        let result = sqlx::query("DELETE FROM rate_limit_hits WHERE hit_at <= NOW() - $1::interval")
            .bind(format!("{} seconds", window.num_seconds()))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    fn backend(&self) -> RateLimitBackend {
        RateLimitBackend::Postgres
    }
}
