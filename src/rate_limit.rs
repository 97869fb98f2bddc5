//! Fixed-window request limiting keyed by client identifier.
//!
//! Each client gets a counter tied to the window its first request of the
//! period fell into. Windows are aligned to multiples of `window_secs` since
//! the Unix epoch, so a client can burst up to twice the limit across a
//! window boundary. Stale counters are purged periodically.

use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tokio::task::JoinHandle;

/// Limiter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Window length in seconds.
    pub window_secs: u64,
    /// Requests allowed per client per window.
    pub max_requests: u32,
    /// How often the background task drops stale counters.
    pub purge_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            max_requests: 30,
            purge_interval_secs: 60,
        }
    }
}

impl RateLimitConfig {
    pub fn with_max_requests(mut self, max_requests: u32) -> Self {
        self.max_requests = max_requests;
        self
    }

    pub fn with_window_secs(mut self, window_secs: u64) -> Self {
        self.window_secs = window_secs;
        self
    }
}

#[derive(Debug, Clone, Copy)]
struct WindowCounter {
    window_start: u64,
    count: u32,
}

/// Per-client fixed-window limiter.
#[derive(Debug)]
pub struct RateLimiter {
    window_secs: u64,
    max_requests: u32,
    counters: DashMap<String, WindowCounter>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            window_secs: config.window_secs.max(1),
            max_requests: config.max_requests,
            counters: DashMap::new(),
        }
    }

    pub fn max_requests(&self) -> u32 {
        self.max_requests
    }

    pub fn window_secs(&self) -> u64 {
        self.window_secs
    }

    /// Records one request from `client` and reports whether it is allowed.
    pub fn is_allowed(&self, client: &str) -> bool {
        self.is_allowed_at(client, epoch_secs())
    }

    /// Same as [`is_allowed`](Self::is_allowed) with an explicit clock.
    pub fn is_allowed_at(&self, client: &str, now_secs: u64) -> bool {
        let window = now_secs - now_secs % self.window_secs;

        let mut entry = self
            .counters
            .entry(client.to_string())
            .or_insert(WindowCounter {
                window_start: window,
                count: 0,
            });
        let counter = entry.value_mut();

        if counter.window_start != window {
            counter.window_start = window;
            counter.count = 0;
        }

        counter.count = counter.count.saturating_add(1);
        counter.count <= self.max_requests
    }

    /// Number of clients currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.counters.len()
    }

    pub fn purge_stale(&self) -> usize {
        self.purge_stale_at(epoch_secs())
    }

    /// Drops counters whose window started more than two windows before
    /// `now_secs`. Returns how many were removed.
    pub fn purge_stale_at(&self, now_secs: u64) -> usize {
        let cutoff = now_secs.saturating_sub(2 * self.window_secs);
        let before = self.counters.len();
        self.counters.retain(|_, counter| counter.window_start >= cutoff);
        let removed = before.saturating_sub(self.counters.len());
        if removed > 0 {
            tracing::debug!(removed, remaining = self.counters.len(), "purged stale rate-limit counters");
        }
        removed
    }

    /// Spawns a task that purges stale counters every `period`.
    ///
    /// Must be called from inside a Tokio runtime.
    pub fn spawn_reclaimer(self: Arc<Self>, period: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period.max(Duration::from_millis(10)));
            // the first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                self.purge_stale();
            }
        })
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn limiter(max_requests: u32) -> RateLimiter {
        RateLimiter::new(RateLimitConfig::default().with_max_requests(max_requests))
    }

    #[test]
    fn thirty_first_request_in_window_is_denied() {
        let limiter = limiter(30);
        let now = 1_200;
        for i in 0..30 {
            assert!(limiter.is_allowed_at("client1", now + i % 60), "request {i}");
        }
        assert!(!limiter.is_allowed_at("client1", now + 59));
        assert!(limiter.is_allowed_at("client2", now + 59));
    }

    #[test]
    fn new_window_resets_count() {
        let limiter = limiter(2);
        assert!(limiter.is_allowed_at("c", 60));
        assert!(limiter.is_allowed_at("c", 61));
        assert!(!limiter.is_allowed_at("c", 119));
        assert!(limiter.is_allowed_at("c", 120));
    }

    #[test]
    fn boundary_burst_allows_twice_the_limit() {
        let limiter = limiter(30);
        let allowed_before = (0..30).filter(|_| limiter.is_allowed_at("c", 119)).count();
        let allowed_after = (0..30).filter(|_| limiter.is_allowed_at("c", 120)).count();
        assert_eq!(allowed_before + allowed_after, 60);
    }

    #[test]
    fn denied_requests_keep_counting() {
        let limiter = limiter(1);
        assert!(limiter.is_allowed_at("c", 0));
        for _ in 0..100 {
            assert!(!limiter.is_allowed_at("c", 10));
        }
    }

    #[test]
    fn purge_removes_only_stale_counters() {
        let limiter = limiter(5);
        limiter.is_allowed_at("old", 0);
        limiter.is_allowed_at("recent", 120);
        assert_eq!(limiter.tracked_clients(), 2);

        // cutoff = 200 - 120 = 80: "old" (window 0) goes, "recent" (window 120) stays
        assert_eq!(limiter.purge_stale_at(200), 1);
        assert_eq!(limiter.tracked_clients(), 1);
        assert!(limiter.is_allowed_at("recent", 125));
    }

    #[test]
    fn concurrent_clients_are_counted_exactly() {
        let limiter = Arc::new(limiter(50));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                thread::spawn(move || (0..25).filter(|_| limiter.is_allowed_at("shared", 600)).count())
            })
            .collect();
        let allowed: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(allowed, 50);
    }

    #[tokio::test]
    async fn reclaimer_runs_in_background() {
        let limiter = Arc::new(limiter(5));
        limiter.is_allowed_at("ancient", 0);
        let handle = Arc::clone(&limiter).spawn_reclaimer(Duration::from_millis(20));

        for _ in 0..50 {
            if limiter.tracked_clients() == 0 {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        handle.abort();
        assert_eq!(limiter.tracked_clients(), 0);
    }
}
