//! Configuration for a backoff campaign.

use serde::{Deserialize, Serialize};
use std::env::VarError;
use std::fmt::Display;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Initial delay used when none is configured.
pub const DEFAULT_INITIAL_TIMEOUT: Duration = Duration::from_millis(100);

/// Prefix used by [`BackoffConfig::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "BACKOFF";

/// Errors raised while loading a [`BackoffConfig`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// A variable was present but could not be parsed.
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        /// Name of the offending variable.
        key: String,
        /// Raw value as read.
        value: String,
        /// Parser message.
        reason: String,
    },
}

/// Ceiling on the number of retries in one campaign.
///
/// `Bounded(k)` counts retries *after* the first attempt: the operation is
/// invoked at most `k + 1` times, and `Bounded(0)` still runs it once. The
/// check happens before each attempt, against the number of retries already
/// consumed (`depth - 1`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RetryLimit {
    /// Retry until the operation succeeds.
    #[default]
    Unlimited,
    /// Give up once more than this many retries would be needed.
    Bounded(u32),
}

impl RetryLimit {
    /// Whether the attempt numbered `depth` (1-based) may run.
    pub fn permits(&self, depth: u32) -> bool {
        match self {
            Self::Unlimited => true,
            Self::Bounded(max) => u64::from(depth) <= u64::from(*max) + 1,
        }
    }

    /// Upper bound on operation invocations, `None` when unlimited.
    pub fn max_attempts(&self) -> Option<u64> {
        match self {
            Self::Unlimited => None,
            Self::Bounded(max) => Some(u64::from(*max) + 1),
        }
    }

    /// The ceiling as an optional count, the shape used in [`BackoffConfig`].
    pub fn as_option(&self) -> Option<u32> {
        match self {
            Self::Unlimited => None,
            Self::Bounded(max) => Some(*max),
        }
    }
}

impl From<Option<u32>> for RetryLimit {
    fn from(max_retries: Option<u32>) -> Self {
        max_retries.map_or(Self::Unlimited, Self::Bounded)
    }
}

/// Plain-data configuration for an exponential backoff campaign.
///
/// All fields are optional when deserialized, so the struct can be embedded
/// in a larger TOML or JSON document:
///
/// ```
/// use backstep_core::retry::BackoffConfig;
///
/// let config: BackoffConfig =
///     serde_json::from_str(r#"{"initial_timeout_nanos": 1000, "max_retries": 2}"#).unwrap();
///
/// assert_eq!(config.initial_timeout_nanos, 1000);
/// assert_eq!(config.max_retries, Some(2));
/// assert_eq!(config.max_timeout_nanos, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackoffConfig {
    /// Delay before the first retry, in nanoseconds.
    pub initial_timeout_nanos: u64,
    /// Retry ceiling; absent means unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
    /// Upper bound on the grown delay, in nanoseconds; absent means unbounded.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_timeout_nanos: Option<u64>,
}

impl Default for BackoffConfig {
    /// 100ms initial delay, unlimited retries, no delay ceiling.
    fn default() -> Self {
        Self::new(DEFAULT_INITIAL_TIMEOUT)
    }
}

impl BackoffConfig {
    /// Configuration with the given initial delay and no limits.
    pub fn new(initial_timeout: Duration) -> Self {
        Self {
            initial_timeout_nanos: duration_to_nanos(initial_timeout),
            max_retries: None,
            max_timeout_nanos: None,
        }
    }

    /// Set the retry ceiling.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the delay ceiling.
    pub fn with_max_timeout(mut self, max_timeout: Duration) -> Self {
        self.max_timeout_nanos = Some(duration_to_nanos(max_timeout));
        self
    }

    /// The initial delay as a [`Duration`].
    pub fn initial_timeout(&self) -> Duration {
        Duration::from_nanos(self.initial_timeout_nanos)
    }

    /// The delay ceiling as a [`Duration`].
    pub fn max_timeout(&self) -> Option<Duration> {
        self.max_timeout_nanos.map(Duration::from_nanos)
    }

    /// The retry ceiling as a [`RetryLimit`].
    pub fn retry_limit(&self) -> RetryLimit {
        RetryLimit::from(self.max_retries)
    }

    /// Load configuration from `BACKOFF_*` environment variables.
    ///
    /// See [`from_env_with_prefix`](Self::from_env_with_prefix).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Load configuration from environment variables.
    ///
    /// This will look for:
    /// - `{prefix}_INITIAL_TIMEOUT_NANOS`
    /// - `{prefix}_MAX_RETRIES` (`unlimited` is accepted)
    /// - `{prefix}_MAX_TIMEOUT_NANOS`
    ///
    /// Unset variables keep their [`Default`] value.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(nanos) = read_var::<u64>(&format!("{prefix}_INITIAL_TIMEOUT_NANOS"))? {
            config.initial_timeout_nanos = nanos;
        }

        let retries_key = format!("{prefix}_MAX_RETRIES");
        match read_raw(&retries_key)? {
            Some(raw) if raw.trim().eq_ignore_ascii_case("unlimited") => {
                config.max_retries = None;
            }
            Some(raw) => config.max_retries = Some(parse_value(&retries_key, &raw)?),
            None => {}
        }

        if let Some(nanos) = read_var::<u64>(&format!("{prefix}_MAX_TIMEOUT_NANOS"))? {
            config.max_timeout_nanos = Some(nanos);
        }

        Ok(config)
    }
}

pub(crate) fn duration_to_nanos(duration: Duration) -> u64 {
    u64::try_from(duration.as_nanos()).unwrap_or(u64::MAX)
}

fn read_raw(key: &str) -> Result<Option<String>, ConfigError> {
    match std::env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(raw)) => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string_lossy().into_owned(),
            reason: "not valid unicode".to_string(),
        }),
    }
}

fn read_var<V>(key: &str) -> Result<Option<V>, ConfigError>
where
    V: FromStr,
    V::Err: Display,
{
    read_raw(key)?
        .map(|raw| parse_value(key, &raw))
        .transpose()
}

fn parse_value<V>(key: &str, raw: &str) -> Result<V, ConfigError>
where
    V: FromStr,
    V::Err: Display,
{
    raw.trim()
        .parse::<V>()
        .map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            value: raw.to_string(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_limit_counts_retries_after_first_attempt() {
        let limit = RetryLimit::Bounded(2);

        assert!(limit.permits(1));
        assert!(limit.permits(3));
        assert!(!limit.permits(4));
        assert_eq!(limit.max_attempts(), Some(3));
    }

    #[test]
    fn test_zero_ceiling_still_permits_first_attempt() {
        let limit = RetryLimit::Bounded(0);

        assert!(limit.permits(1));
        assert!(!limit.permits(2));
    }

    #[test]
    fn test_unlimited_never_refuses() {
        assert!(RetryLimit::Unlimited.permits(u32::MAX));
        assert_eq!(RetryLimit::Unlimited.max_attempts(), None);
        assert!(RetryLimit::Bounded(u32::MAX).permits(u32::MAX));
    }

    #[test]
    fn test_limit_from_option() {
        assert_eq!(RetryLimit::from(None), RetryLimit::Unlimited);
        assert_eq!(RetryLimit::from(Some(4)), RetryLimit::Bounded(4));
        assert_eq!(RetryLimit::Bounded(4).as_option(), Some(4));
    }

    #[test]
    fn test_config_defaults() {
        let config = BackoffConfig::default();

        assert_eq!(config.initial_timeout(), Duration::from_millis(100));
        assert_eq!(config.retry_limit(), RetryLimit::Unlimited);
        assert_eq!(config.max_timeout(), None);
    }

    #[test]
    fn test_config_builder_methods() {
        let config = BackoffConfig::new(Duration::from_micros(1))
            .with_max_retries(2)
            .with_max_timeout(Duration::from_secs(1));

        assert_eq!(config.initial_timeout_nanos, 1_000);
        assert_eq!(config.max_retries, Some(2));
        assert_eq!(config.max_timeout_nanos, Some(1_000_000_000));
    }

    #[test]
    fn test_config_from_toml_section() {
        #[derive(Deserialize)]
        struct AppConfig {
            backoff: BackoffConfig,
        }

        let app: AppConfig = toml::from_str(
            r#"
            [backoff]
            initial_timeout_nanos = 250000
            max_retries = 5
            "#,
        )
        .unwrap();

        assert_eq!(app.backoff.initial_timeout(), Duration::from_micros(250));
        assert_eq!(app.backoff.retry_limit(), RetryLimit::Bounded(5));
        assert_eq!(app.backoff.max_timeout_nanos, None);
    }

    #[test]
    fn test_config_missing_fields_use_defaults() {
        let config: BackoffConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, BackoffConfig::default());
    }

    #[test]
    fn test_config_serialization_omits_unset_limits() {
        let json = serde_json::to_string(&BackoffConfig::new(Duration::from_nanos(10))).unwrap();
        assert_eq!(json, r#"{"initial_timeout_nanos":10}"#);
    }

    #[test]
    fn test_duration_to_nanos_saturates() {
        assert_eq!(duration_to_nanos(Duration::MAX), u64::MAX);
        assert_eq!(duration_to_nanos(Duration::from_nanos(7)), 7);
    }
}
