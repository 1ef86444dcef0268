//! Retry policies and backoff for HTTP requests.

use std::time::Duration;

use async_trait::async_trait;

use crate::config::ClientConfig;
use crate::http::request::Method;

/// Retry policy for one request.
///
/// Only transport failures are ever retried: send errors, and responses with
/// status ≥ 500 whose body is not an envelope. Business failures never are.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum RetryPolicy {
    /// No retries. Default for POST/PUT unless the config enables write retries.
    None,
    /// `retry_count` retries with `retry_delay × 2^attempt` backoff, from the
    /// client config. Default for GET/DELETE.
    #[default]
    Standard,
    /// Caller-provided retry settings.
    Custom(RetryConfig),
}

impl RetryPolicy {
    /// The policy a request gets when it does not set one.
    pub fn default_for(method: Method, config: &ClientConfig) -> Self {
        if method.is_idempotent() || config.retry_writes() {
            RetryPolicy::Standard
        } else {
            RetryPolicy::None
        }
    }

    /// Resolve to concrete settings against the client config.
    pub fn resolve(&self, config: &ClientConfig) -> RetryConfig {
        match self {
            RetryPolicy::None => RetryConfig::disabled(),
            RetryPolicy::Standard => RetryConfig::from_client(config),
            RetryPolicy::Custom(c) => c.clone(),
        }
    }
}

/// Configuration for retry behavior.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Maximum number of retry attempts (not counting the initial request).
    pub max_retries: u32,
    /// Initial delay before the first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Multiplier applied to the delay after each retry.
    pub backoff_factor: f64,
    /// Whether to add ±25% jitter to the delay.
    pub jitter: bool,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_factor: 2.0,
            jitter: false,
        }
    }
}

impl RetryConfig {
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Standard settings taken from the client config.
    pub fn from_client(config: &ClientConfig) -> Self {
        Self {
            max_retries: config.retry_count(),
            initial_delay: config.retry_delay(),
            max_delay: config.max_retry_delay(),
            backoff_factor: 2.0,
            jitter: false,
        }
    }

    /// Calculate delay for a given attempt (0-indexed).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(attempt).unwrap_or(i32::MAX);
        let base = self.initial_delay.as_millis() as f64 * self.backoff_factor.powi(exponent);
        let capped = base.min(self.max_delay.as_millis() as f64);

        let final_ms = if self.jitter {
            let jitter_range = capped * 0.25;
            let jitter = (rand::random::<f64>() - 0.5) * 2.0 * jitter_range;
            (capped + jitter).max(0.0)
        } else {
            capped
        };

        Duration::from_millis(final_ms as u64)
    }
}

/// Suspends the calling task between attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `futures-timer`; blocks only the awaiting task.
#[cfg(feature = "http")]
#[derive(Debug, Clone, Copy, Default)]
pub struct TimerSleeper;

#[cfg(feature = "http")]
#[async_trait]
impl Sleeper for TimerSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            futures_timer::Delay::new(duration).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(retry_writes: bool) -> ClientConfig {
        ClientConfig::builder()
            .token("tok")
            .retry(4, Duration::from_millis(50))
            .retry_writes(retry_writes)
            .build()
            .unwrap()
    }

    #[test]
    fn test_default_policy_by_method() {
        let c = config(false);
        assert_eq!(RetryPolicy::default_for(Method::Get, &c), RetryPolicy::Standard);
        assert_eq!(RetryPolicy::default_for(Method::Delete, &c), RetryPolicy::Standard);
        assert_eq!(RetryPolicy::default_for(Method::Post, &c), RetryPolicy::None);
        assert_eq!(RetryPolicy::default_for(Method::Put, &c), RetryPolicy::None);

        let c = config(true);
        assert_eq!(RetryPolicy::default_for(Method::Post, &c), RetryPolicy::Standard);
    }

    #[test]
    fn test_standard_resolves_from_client_config() {
        let resolved = RetryPolicy::Standard.resolve(&config(false));
        assert_eq!(resolved.max_retries, 4);
        assert_eq!(resolved.initial_delay, Duration::from_millis(50));
        assert!(!resolved.jitter);
        assert_eq!(RetryPolicy::None.resolve(&config(false)).max_retries, 0);
    }

    #[test]
    fn test_retry_config_delay_doubles() {
        let config = RetryConfig {
            initial_delay: Duration::from_millis(100),
            ..RetryConfig::default()
        };
        assert_eq!(config.delay_for_attempt(0).as_millis(), 100);
        assert_eq!(config.delay_for_attempt(1).as_millis(), 200);
        assert_eq!(config.delay_for_attempt(2).as_millis(), 400);
    }

    #[test]
    fn test_retry_config_delay_caps_at_max() {
        let config = RetryConfig {
            max_retries: 5,
            initial_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(2000),
            backoff_factor: 10.0,
            jitter: false,
        };
        assert_eq!(config.delay_for_attempt(3).as_millis(), 2000);
        assert_eq!(config.delay_for_attempt(u32::MAX).as_millis(), 2000);
    }

    #[test]
    fn test_retry_config_jitter_stays_in_range() {
        let config = RetryConfig {
            initial_delay: Duration::from_millis(1000),
            jitter: true,
            ..RetryConfig::default()
        };
        for _ in 0..50 {
            let ms = config.delay_for_attempt(0).as_millis();
            assert!((750..=1250).contains(&ms), "delay {ms} out of range");
        }
    }
}
