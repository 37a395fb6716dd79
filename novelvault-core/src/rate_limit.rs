//! Sliding-window rate limiting arithmetic.
//!
//! A subject may make at most `max_requests` admitted requests inside any
//! trailing window of `window` length. Denied requests are not recorded.
//! Storage lives in the server crate; this module only decides.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};

/// Default requests admitted per window
pub const DEFAULT_MAX_REQUESTS: u32 = 30;

/// Default window length in seconds
pub const DEFAULT_WINDOW_SECS: u64 = 60;

/// Window size and quota
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitPolicy {
    pub max_requests: u32,
    pub window: Duration,
}

impl Default for RateLimitPolicy {
    fn default() -> Self {
        Self {
            max_requests: DEFAULT_MAX_REQUESTS,
            window: Duration::from_secs(DEFAULT_WINDOW_SECS),
        }
    }
}

/// Outcome of a rate limit check
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Denied { retry_after: Duration },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed { .. })
    }
}

impl RateLimitPolicy {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
        }
    }

    fn window_delta(&self) -> chrono::Duration {
        chrono::Duration::from_std(self.window).unwrap_or_else(|_| chrono::Duration::days(36_500))
    }

    /// Start of the window ending at `now` (exclusive bound)
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.checked_sub_signed(self.window_delta())
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    /// Decide given the hits already inside the window.
    ///
    /// `oldest` is the earliest hit still inside the window; the caller is
    /// free again once it ages out.
    pub fn decide(&self, hits_in_window: u32, oldest: Option<DateTime<Utc>>, now: DateTime<Utc>) -> Decision {
        if hits_in_window < self.max_requests {
            return Decision::Allowed {
                remaining: self.max_requests - hits_in_window - 1,
            };
        }

        let retry_after = oldest
            .map(|t| {
                let frees_at = t + self.window_delta();
                (frees_at - now).to_std().unwrap_or(Duration::ZERO)
            })
            .unwrap_or(self.window);

        Decision::Denied { retry_after }
    }
}

/// In-memory hit log for a single subject
#[derive(Debug, Clone, Default)]
pub struct SlidingWindow {
    hits: VecDeque<DateTime<Utc>>,
}

impl SlidingWindow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop hits at or before the window start
    pub fn prune(&mut self, policy: &RateLimitPolicy, now: DateTime<Utc>) {
        let start = policy.window_start(now);
        while self.hits.front().is_some_and(|t| *t <= start) {
            self.hits.pop_front();
        }
    }

    /// Check and, if admitted, record a hit at `now`.
    pub fn try_acquire(&mut self, policy: &RateLimitPolicy, now: DateTime<Utc>) -> Decision {
        self.prune(policy, now);
        let decision = policy.decide(self.hits.len() as u32, self.hits.front().copied(), now);
        if decision.is_allowed() {
            self.hits.push_back(now);
        }
        decision
    }

    /// Whether every recorded hit has aged out
    pub fn is_idle(&self, policy: &RateLimitPolicy, now: DateTime<Utc>) -> bool {
        let start = policy.window_start(now);
        self.hits.back().map_or(true, |t| *t <= start)
    }

    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    #[test]
    fn default_policy_is_30_per_minute() {
        let policy = RateLimitPolicy::default();
        assert_eq!(policy.max_requests, 30);
        assert_eq!(policy.window, Duration::from_secs(60));
    }

    #[test]
    fn admits_up_to_max_then_denies() {
        let policy = RateLimitPolicy::new(3, Duration::from_secs(60));
        let mut window = SlidingWindow::new();

        assert_eq!(window.try_acquire(&policy, at(0)), Decision::Allowed { remaining: 2 });
        assert_eq!(window.try_acquire(&policy, at(1)), Decision::Allowed { remaining: 1 });
        assert_eq!(window.try_acquire(&policy, at(2)), Decision::Allowed { remaining: 0 });

        let denied = window.try_acquire(&policy, at(10));
        assert_eq!(
            denied,
            Decision::Denied {
                retry_after: Duration::from_secs(50)
            }
        );
        // denied requests are not recorded
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn frees_up_as_hits_age_out() {
        let policy = RateLimitPolicy::new(2, Duration::from_secs(60));
        let mut window = SlidingWindow::new();
        assert!(window.try_acquire(&policy, at(0)).is_allowed());
        assert!(window.try_acquire(&policy, at(30)).is_allowed());
        assert!(!window.try_acquire(&policy, at(59)).is_allowed());

        // hit at t=0 is outside (t-60, t] once t=60
        assert!(window.try_acquire(&policy, at(60)).is_allowed());
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn idle_after_window_passes() {
        let policy = RateLimitPolicy::new(5, Duration::from_secs(60));
        let mut window = SlidingWindow::new();
        window.try_acquire(&policy, at(0));
        assert!(!window.is_idle(&policy, at(59)));
        assert!(window.is_idle(&policy, at(60)));
    }

    #[test]
    fn zero_quota_denies_everything() {
        let policy = RateLimitPolicy::new(0, Duration::from_secs(60));
        let mut window = SlidingWindow::new();
        assert_eq!(
            window.try_acquire(&policy, at(0)),
            Decision::Denied {
                retry_after: Duration::from_secs(60)
            }
        );
    }
}
