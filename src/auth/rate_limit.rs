//! Sliding-window rate limiting for the public click-tracking endpoint.
//!
//! In-memory, keyed by caller address. Suitable for single-instance
//! deployments; a distributed deployment would move this to a shared store.

use dashmap::DashMap;
use std::time::{Duration, Instant};

struct WindowEntry {
    request_count: u32,
    window_start: Instant,
}

pub struct RateLimiter {
    entries: DashMap<String, WindowEntry>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            max_requests,
            window,
        }
    }

    /// Returns false when the caller exhausted its window.
    pub fn allow(&self, client_id: &str) -> bool {
        let now = Instant::now();
        let mut entry = self
            .entries
            .entry(client_id.to_string())
            .or_insert_with(|| WindowEntry {
                request_count: 0,
                window_start: now,
            });

        if now.duration_since(entry.window_start) >= self.window {
            entry.request_count = 0;
            entry.window_start = now;
        }

        if entry.request_count >= self.max_requests {
            return false;
        }

        entry.request_count += 1;
        true
    }

    /// Drop windows that elapsed; called periodically from a background task.
    pub fn evict_expired(&self) {
        let now = Instant::now();
        let window = self.window;
        self.entries
            .retain(|_, entry| now.duration_since(entry.window_start) < window);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allows_up_to_limit_then_blocks() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));
        assert!(limiter.allow("1.2.3.4"));
        assert!(limiter.allow("1.2.3.4"));
        assert!(limiter.allow("1.2.3.4"));
        assert!(!limiter.allow("1.2.3.4"));
        // Other clients are unaffected
        assert!(limiter.allow("5.6.7.8"));
    }

    #[test]
    fn window_reset_allows_again() {
        let limiter = RateLimiter::new(1, Duration::from_millis(10));
        assert!(limiter.allow("a"));
        assert!(!limiter.allow("a"));
        std::thread::sleep(Duration::from_millis(15));
        assert!(limiter.allow("a"));
    }
}
