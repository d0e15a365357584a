//! Retry strategies for remote calls.
//!
//! [`FlatRetry`] reproduces the store's expected client behaviour: up to
//! `max_attempts` tries, retrying immediately after any failure except a
//! rate-limit signal, which suspends the calling thread for the advised
//! duration first. No distinction is made between retryable and permanent
//! errors.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::error::RemoteError;

// ---------------------------------------------------------------------------
// Sleeper
// ---------------------------------------------------------------------------

/// Suspends the calling worker. Abstracted so tests can use a simulated clock.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// Blocks the current thread with [`std::thread::sleep`].
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

// ---------------------------------------------------------------------------
// RetryPolicy
// ---------------------------------------------------------------------------

/// Runs one logical remote operation, possibly calling it several times.
///
/// Returns `None` once the policy gives up; the last error is logged, never
/// returned.
pub trait RetryPolicy: Send + Sync {
    fn execute<T>(
        &self,
        operation: &str,
        call: &mut dyn FnMut() -> Result<T, RemoteError>,
    ) -> Option<T>;
}

/// Fixed attempt budget, immediate retry, rate-limit aware waits.
#[derive(Clone)]
pub struct FlatRetry {
    max_attempts: u32,
    default_wait: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl FlatRetry {
    /// Wait used when a rate-limit signal carries no usable advisory value.
    pub const DEFAULT_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

    /// `max_attempts` below one is treated as one.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            default_wait: Self::DEFAULT_RATE_LIMIT_WAIT,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    pub fn with_default_wait(mut self, wait: Duration) -> Self {
        self.default_wait = wait;
        self
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

impl std::fmt::Debug for FlatRetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlatRetry")
            .field("max_attempts", &self.max_attempts)
            .field("default_wait", &self.default_wait)
            .finish_non_exhaustive()
    }
}

impl RetryPolicy for FlatRetry {
    fn execute<T>(
        &self,
        operation: &str,
        call: &mut dyn FnMut() -> Result<T, RemoteError>,
    ) -> Option<T> {
        for attempt in 1..=self.max_attempts {
            match call() {
                Ok(value) => return Some(value),
                Err(RemoteError::RateLimited { retry_after }) => {
                    if attempt == self.max_attempts {
                        tracing::warn!("{operation}: rate limit reached on final attempt");
                        break;
                    }
                    let wait = parse_retry_after(retry_after.as_deref(), Utc::now())
                        .unwrap_or(self.default_wait);
                    tracing::info!(
                        "{operation}: API rate limit reached; waiting {}s to continue (attempt {attempt}/{})",
                        wait.as_secs(),
                        self.max_attempts
                    );
                    self.sleeper.sleep(wait);
                }
                Err(RemoteError::Status { status, text, body }) => {
                    tracing::warn!(
                        "{operation}: remote returned {status} {text} (attempt {attempt}/{})",
                        self.max_attempts
                    );
                    if let Some(body) = body {
                        tracing::trace!("{operation}: response body: {body}");
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        "{operation}: {e} (attempt {attempt}/{})",
                        self.max_attempts
                    );
                }
            }
        }
        tracing::info!("{operation}: maximum request attempts reached, giving up");
        None
    }
}

/// Interpret a `Retry-After` advisory value relative to `now`.
///
/// Accepts whole or fractional seconds, or an RFC 2822 / HTTP date (a date in
/// the past yields zero). Returns `None` for anything else.
pub fn parse_retry_after(raw: Option<&str>, now: DateTime<Utc>) -> Option<Duration> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(secs) = raw.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }
    if let Ok(secs) = raw.parse::<f64>() {
        return (secs.is_finite() && secs >= 0.0).then(|| Duration::from_secs_f64(secs));
    }
    let at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
