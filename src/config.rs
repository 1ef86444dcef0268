//! Client configuration — `ClientConfig` and its builder.
//!
//! A config is validated once in [`ClientConfigBuilder::build`] and never
//! mutated afterwards. The transport holds it behind an `Arc` and every call
//! reads from the same instance.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use uuid::Uuid;

use crate::error::ConfigError;
use crate::network::{DEFAULT_API_URL, DEFAULT_APP_VERSION, DEFAULT_SIGNING_KEY};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_RETRY_COUNT: u32 = 3;
const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(1);
const DEFAULT_MAX_RETRY_DELAY: Duration = Duration::from_secs(60);

/// Connection parameters shared by every call a client makes.
///
/// The worst-case duration of one call is roughly
/// `timeout × (retry_count + 1)` plus the sum of all backoff sleeps,
/// `retry_delay × (2^retry_count − 1)` before capping. With the defaults that
/// is about 40s + 7s; large retry counts grow it quickly.
#[derive(Clone)]
pub struct ClientConfig {
    base_url: String,
    token: String,
    timeout: Duration,
    retry_count: u32,
    retry_delay: Duration,
    max_retry_delay: Duration,
    device_id: String,
    app_version: String,
    signing_key: String,
    signing_enabled: bool,
    retry_writes: bool,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn token(&self) -> &str {
        &self.token
    }

    /// Applied separately to the connect and read phases of each attempt.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Retries after the first attempt. A call makes at most `retry_count + 1` attempts.
    pub fn retry_count(&self) -> u32 {
        self.retry_count
    }

    /// Delay before the first retry; doubled for each one after.
    pub fn retry_delay(&self) -> Duration {
        self.retry_delay
    }

    pub fn max_retry_delay(&self) -> Duration {
        self.max_retry_delay
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn app_version(&self) -> &str {
        &self.app_version
    }

    pub(crate) fn signing_key(&self) -> &str {
        &self.signing_key
    }

    pub fn signing_enabled(&self) -> bool {
        self.signing_enabled
    }

    /// Whether POST/PUT requests use the standard retry policy by default.
    pub fn retry_writes(&self) -> bool {
        self.retry_writes
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .field("token", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("retry_count", &self.retry_count)
            .field("retry_delay", &self.retry_delay)
            .field("max_retry_delay", &self.max_retry_delay)
            .field("device_id", &self.device_id)
            .field("app_version", &self.app_version)
            .field("signing_key", &"<redacted>")
            .field("signing_enabled", &self.signing_enabled)
            .field("retry_writes", &self.retry_writes)
            .finish()
    }
}

// ═════════════════════════════════════════════════════════════════════════════
// Builder
// ═════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ClientConfigBuilder {
    base_url: String,
    token: Option<String>,
    timeout: Duration,
    retry_count: u32,
    retry_delay: Duration,
    max_retry_delay: Duration,
    device_id: Option<String>,
    app_version: String,
    signing_key: Option<String>,
    signing_enabled: bool,
    retry_writes: bool,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            token: None,
            timeout: DEFAULT_TIMEOUT,
            retry_count: DEFAULT_RETRY_COUNT,
            retry_delay: DEFAULT_RETRY_DELAY,
            max_retry_delay: DEFAULT_MAX_RETRY_DELAY,
            device_id: None,
            app_version: DEFAULT_APP_VERSION.to_string(),
            signing_key: None,
            signing_enabled: true,
            retry_writes: false,
        }
    }
}

impl ClientConfigBuilder {
    /// Seed a builder from `ZSXQ_*` environment variables.
    ///
    /// Unset variables keep their defaults. The token is still required at
    /// [`build`](Self::build) time.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub(crate) fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let mut builder = Self::default();

        if let Some(token) = lookup("ZSXQ_TOKEN") {
            builder = builder.token(token);
        }
        if let Some(url) = lookup("ZSXQ_BASE_URL") {
            builder = builder.base_url(url);
        }
        if let Some(ms) = parse_env::<u64>(&lookup, "ZSXQ_API_TIMEOUT")? {
            builder = builder.timeout(Duration::from_millis(ms));
        }
        if let Some(count) = parse_env::<u32>(&lookup, "ZSXQ_API_RETRY_COUNT")? {
            builder = builder.retry_count(count);
        }
        if let Some(ms) = parse_env::<u64>(&lookup, "ZSXQ_API_RETRY_DELAY")? {
            builder = builder.retry_delay(Duration::from_millis(ms));
        }
        if let Some(id) = lookup("ZSXQ_DEVICE_ID") {
            builder = builder.device_id(id);
        }
        if let Some(version) = lookup("ZSXQ_APP_VERSION") {
            builder = builder.app_version(version);
        }
        if let Some(key) = lookup("ZSXQ_SIGNING_KEY") {
            builder = builder.signing_key(key);
        }
        if let Some(enabled) = parse_env::<bool>(&lookup, "ZSXQ_SIGNING_ENABLED")? {
            builder = builder.signing_enabled(enabled);
        }
        if let Some(enabled) = parse_env::<bool>(&lookup, "ZSXQ_RETRY_WRITES")? {
            builder = builder.retry_writes(enabled);
        }

        Ok(builder)
    }

    pub fn token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry_count(mut self, count: u32) -> Self {
        self.retry_count = count;
        self
    }

    pub fn retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Set retry count and base delay together.
    pub fn retry(self, count: u32, delay: Duration) -> Self {
        self.retry_count(count).retry_delay(delay)
    }

    /// Upper bound on a single backoff sleep.
    pub fn max_retry_delay(mut self, delay: Duration) -> Self {
        self.max_retry_delay = delay;
        self
    }

    pub fn device_id(mut self, id: impl Into<String>) -> Self {
        self.device_id = Some(id.into());
        self
    }

    pub fn app_version(mut self, version: impl Into<String>) -> Self {
        self.app_version = version.into();
        self
    }

    /// Override [`DEFAULT_SIGNING_KEY`].
    pub fn signing_key(mut self, key: impl Into<String>) -> Self {
        self.signing_key = Some(key.into());
        self
    }

    /// Disable to omit `x-signature` entirely. Some deployments reject it.
    pub fn signing_enabled(mut self, enabled: bool) -> Self {
        self.signing_enabled = enabled;
        self
    }

    /// Opt POST/PUT into the standard retry policy.
    ///
    /// Off by default: a write that timed out may already have been applied,
    /// and resending it can duplicate the side effect.
    pub fn retry_writes(mut self, enabled: bool) -> Self {
        self.retry_writes = enabled;
        self
    }

    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let token = self
            .token
            .filter(|t| !t.trim().is_empty())
            .ok_or(ConfigError::MissingToken)?;

        let base_url = self.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ConfigError::InvalidBaseUrl(self.base_url));
        }

        let device_id = self
            .device_id
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        check_header_value("token", &token)?;
        check_header_value("device_id", &device_id)?;
        check_header_value("app_version", &self.app_version)?;

        Ok(ClientConfig {
            base_url,
            token,
            timeout: self.timeout,
            retry_count: self.retry_count,
            retry_delay: self.retry_delay,
            max_retry_delay: self.max_retry_delay,
            device_id,
            app_version: self.app_version,
            signing_key: self
                .signing_key
                .unwrap_or_else(|| DEFAULT_SIGNING_KEY.to_string()),
            signing_enabled: self.signing_enabled,
            retry_writes: self.retry_writes,
        })
    }
}

fn parse_env<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnv {
                var: var.to_string(),
                value: raw,
            }),
    }
}

// Visible ASCII and tab, as accepted by HTTP header values.
fn check_header_value(field: &'static str, value: &str) -> Result<(), ConfigError> {
    let valid = value
        .bytes()
        .all(|b| b == b'\t' || (0x20..0x7f).contains(&b));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::InvalidHeaderValue { field })
    }
}
