//! Login attempt throttling
//!
//! Per-identifier attempt counter over a fixed lockout window, keyed by the
//! login identifier exactly as supplied. Process-local and in-memory: state
//! is lost on restart, which is acceptable for a soft anti-abuse control.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::config::RateLimitConfig;

/// One identifier's attempt window
#[derive(Debug, Clone)]
struct AttemptWindow {
    /// Attempts counted since the window started
    count: u32,
    /// Window start time (fixed at the first attempt, not sliding)
    window_start: Instant,
}

impl AttemptWindow {
    fn is_elapsed(&self, window: Duration) -> bool {
        self.window_start.elapsed() >= window
    }
}

/// Login rate limiter
///
/// Allows up to `max_attempts` per identifier within one window; further
/// attempts are rejected until the window elapses. A successful login must
/// clear the identifier's entry via [`LoginRateLimiter::reset`].
pub struct LoginRateLimiter {
    entries: RwLock<HashMap<String, AttemptWindow>>,
    max_attempts: u32,
    window: Duration,
    max_tracked_identifiers: usize,
}

impl LoginRateLimiter {
    /// Create a new rate limiter
    ///
    /// # Arguments
    /// * `max_attempts` - Attempts allowed per window
    /// * `window` - Lockout window length
    /// * `max_tracked_identifiers` - In-memory key cap
    pub fn new(max_attempts: u32, window: Duration, max_tracked_identifiers: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_attempts: max_attempts.max(1),
            window,
            max_tracked_identifiers: max_tracked_identifiers.max(1),
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_secs(config.window_seconds),
            config.max_tracked_identifiers,
        )
    }

    fn prune_elapsed_locked(entries: &mut HashMap<String, AttemptWindow>, window: Duration) {
        entries.retain(|_, value| !value.is_elapsed(window));
    }

    fn evict_oldest_locked(entries: &mut HashMap<String, AttemptWindow>) {
        let Some(oldest_key) = entries
            .iter()
            .min_by_key(|(_, value)| value.window_start)
            .map(|(key, _)| key.clone())
        else {
            return;
        };
        entries.remove(&oldest_key);
    }

    /// Record a login attempt and decide whether it may proceed
    ///
    /// # Returns
    /// `true` if the attempt is allowed, `false` if the identifier has
    /// exceeded its window's budget.
    pub async fn check_and_increment(&self, identifier: &str) -> bool {
        let mut entries = self.entries.write().await;

        if !entries.contains_key(identifier) && entries.len() >= self.max_tracked_identifiers {
            Self::prune_elapsed_locked(&mut entries, self.window);
            if entries.len() >= self.max_tracked_identifiers {
                Self::evict_oldest_locked(&mut entries);
            }
        }

        let entry = entries
            .entry(identifier.to_string())
            .or_insert_with(|| AttemptWindow {
                count: 0,
                window_start: Instant::now(),
            });

        if entry.is_elapsed(self.window) {
            entry.count = 0;
            entry.window_start = Instant::now();
        }

        entry.count += 1;
        entry.count <= self.max_attempts
    }

    /// Clear an identifier's entry (on successful login)
    pub async fn reset(&self, identifier: &str) {
        let mut entries = self.entries.write().await;
        entries.remove(identifier);
    }

    /// Current attempt count for an identifier within its live window
    pub async fn attempt_count(&self, identifier: &str) -> u32 {
        let entries = self.entries.read().await;
        entries
            .get(identifier)
            .filter(|e| !e.is_elapsed(self.window))
            .map(|e| e.count)
            .unwrap_or(0)
    }
}
