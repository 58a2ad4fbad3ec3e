//! Wait-duration resolution for delay behaviors.
//!
//! # Responsibilities
//! - Hold the process-wide default wait
//! - Parse an optional per-request override in whole seconds
//! - Fall back to the default for anything that is not a positive integer

use std::time::Duration;

/// Resolves the effective wait for a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitResolver {
    default: Duration,
}

impl WaitResolver {
    pub fn new(default: Duration) -> Self {
        Self { default }
    }

    pub fn from_secs(secs: u64) -> Self {
        Self::new(Duration::from_secs(secs))
    }

    /// The duration used when no usable override is supplied.
    pub fn default_wait(&self) -> Duration {
        self.default
    }

    /// Resolve the wait for a request carrying the raw `wait` value, if any.
    ///
    /// Only strictly positive integers are honored. Zero, negative numbers,
    /// fractions and non-numeric input all yield the default.
    pub fn resolve(&self, raw: Option<&str>) -> Duration {
        let Some(raw) = raw else {
            tracing::debug!(
                default_secs = self.default.as_secs(),
                "No wait parameter, using default"
            );
            return self.default;
        };

        match raw.parse::<i64>() {
            Ok(secs) if secs > 0 => Duration::from_secs(secs as u64),
            _ => {
                tracing::warn!(
                    wait = raw,
                    default_secs = self.default.as_secs(),
                    "Unusable wait parameter, using default"
                );
                self.default
            }
        }
    }

    /// Resolve and split in half, as the two-phase raw behaviors do.
    pub fn resolve_halves(&self, raw: Option<&str>) -> (Duration, Duration) {
        let wait = self.resolve(raw);
        (wait / 2, wait / 2)
    }
}

impl Default for WaitResolver {
    fn default() -> Self {
        Self::from_secs(3)
    }
}
