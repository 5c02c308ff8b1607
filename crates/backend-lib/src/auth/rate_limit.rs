// ============================
// crates/backend-lib/src/auth/rate_limit.rs
// ============================
//! Rate limiting for login attempts.

use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::config::AuthSettings;

/// Default number of failed attempts before rate limiting
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default lockout duration (5 minutes)
const DEFAULT_LOCKOUT_DURATION: Duration = Duration::from_secs(5 * 60);

/// How long an unlocked entry is remembered after its last failure
const FAILURE_MEMORY: Duration = Duration::from_secs(24 * 60 * 60);

/// Entry in the rate limit map
#[derive(Debug, Clone)]
struct RateLimitEntry {
    /// Number of consecutive failed attempts
    failed_attempts: u32,
    /// Time of the last failed attempt
    last_failure: Instant,
    /// When the lockout expires, if locked
    lockout_expiry: Option<Instant>,
}

/// Rate limiter for login attempts, keyed by username.
///
/// Unknown usernames are tracked exactly like real ones so a lockout does not
/// reveal which accounts exist.
#[derive(Debug, Clone)]
pub struct AuthRateLimiter {
    attempts: Arc<DashMap<String, RateLimitEntry>>,
    max_attempts: u32,
    lockout_duration: Duration,
}

impl Default for AuthRateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_LOCKOUT_DURATION)
    }
}

impl AuthRateLimiter {
    /// Create a new auth rate limiter
    pub fn new(max_attempts: u32, lockout_duration: Duration) -> Self {
        Self {
            attempts: Arc::new(DashMap::new()),
            max_attempts,
            lockout_duration,
        }
    }

    pub fn from_settings(settings: &AuthSettings) -> Self {
        Self::new(
            settings.login_max_attempts,
            Duration::from_secs(settings.login_lockout_secs),
        )
    }

    /// Reserve a login attempt for `username`, returning `false` while it is
    /// locked out.
    ///
    /// The attempt is counted as a failure before the password is checked, so
    /// concurrent guesses cannot slip past `max_attempts` while their hashes
    /// are still being verified. A successful login clears the count through
    /// `record_success`.
    pub fn begin_attempt(&self, username: &str) -> bool {
        let now = Instant::now();

        let mut entry = self
            .attempts
            .entry(username.to_string())
            .or_insert_with(|| RateLimitEntry {
                failed_attempts: 0,
                last_failure: now,
                lockout_expiry: None,
            });

        if let Some(expiry) = entry.lockout_expiry {
            if now < expiry {
                return false;
            }
            // A finished lockout starts a fresh count
            entry.failed_attempts = 0;
            entry.lockout_expiry = None;
        }

        entry.failed_attempts += 1;
        entry.last_failure = now;

        if entry.failed_attempts >= self.max_attempts {
            entry.lockout_expiry = Some(now + self.lockout_duration);
            tracing::warn!(
                attempts = entry.failed_attempts,
                lockout_secs = self.lockout_duration.as_secs(),
                "login attempt limit reached"
            );
        }
        true
    }

    /// Record a successful login
    pub fn record_success(&self, username: &str) {
        self.attempts.remove(username);
    }

    /// Clean up expired lockouts and stale failure counts
    pub fn cleanup(&self) {
        let now = Instant::now();

        self.attempts.retain(|_, entry| match entry.lockout_expiry {
            Some(expiry) => now < expiry,
            None => now.duration_since(entry.last_failure) < FAILURE_MEMORY,
        });
    }

    /// Number of tracked usernames
    pub fn tracked(&self) -> usize {
        self.attempts.len()
    }
}
