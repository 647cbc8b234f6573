//! Session configuration for the Meridian controller SDK.
//!
//! This module provides the retry policy, TLS trust setting, and the
//! serializable session configuration used to construct a
//! [`crate::session::Session`].

use crate::Error;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Default controller endpoint.
pub const DEFAULT_CONTROLLER: &str = "https://api.sequoia.meridiannet.io";

/// Default per-attempt request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Default maximum number of REST call attempts when retry is enabled.
pub const DEFAULT_MAX_RETRY: u32 = 30;

/// Default sleep between REST call attempts in seconds.
pub const DEFAULT_RETRY_SLEEP_SECS: u64 = 10;

/// Connect timeout applied to the underlying HTTP client.
pub const CONNECT_TIMEOUT_SECS: u64 = 10;

/// URL consulted by the release update check.
pub const UPDATE_INFO_URL: &str = "https://crates.io/api/v1/crates/meridian-core";

/// Timeout for the release update check in seconds.
pub const UPDATE_CHECK_TIMEOUT_SECS: u64 = 3;

/// Retry policy for REST calls.
///
/// Failed calls are reattempted with a fixed sleep between attempts. Retry
/// should stay disabled for calls that create objects on the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Whether failed calls are retried at all
    pub enabled: bool,

    /// Maximum number of attempts before giving up
    pub max_attempts: u32,

    /// Fixed sleep between attempts
    pub sleep: Duration,
}

impl RetryPolicy {
    /// Create the default retry policy (retries disabled).
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enabled: false,
            max_attempts: DEFAULT_MAX_RETRY,
            sleep: Duration::from_secs(DEFAULT_RETRY_SLEEP_SECS),
        }
    }

    /// Enable or disable retries.
    #[must_use]
    pub const fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set the maximum number of attempts.
    #[must_use]
    pub const fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts;
        self
    }

    /// Set the sleep between attempts.
    #[must_use]
    pub const fn with_sleep(mut self, sleep: Duration) -> Self {
        self.sleep = sleep;
        self
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

/// TLS trust setting for the controller connection.
///
/// Serialized form accepts a boolean (`true` = pinned bundle, `false` =
/// verification disabled) or a path string to a PEM CA bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TrustSettingRepr", into = "TrustSettingRepr")]
pub enum TrustSetting {
    /// Verify against the CA bundle shipped with the SDK.
    Pinned,
    /// Disable TLS verification entirely.
    Disabled,
    /// Verify against a caller-supplied PEM CA bundle.
    CaBundle(PathBuf),
}

impl Default for TrustSetting {
    fn default() -> Self {
        Self::Pinned
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum TrustSettingRepr {
    Verify(bool),
    Bundle(PathBuf),
}

impl From<TrustSettingRepr> for TrustSetting {
    fn from(repr: TrustSettingRepr) -> Self {
        match repr {
            TrustSettingRepr::Verify(true) => Self::Pinned,
            TrustSettingRepr::Verify(false) => Self::Disabled,
            TrustSettingRepr::Bundle(path) => Self::CaBundle(path),
        }
    }
}

impl From<TrustSetting> for TrustSettingRepr {
    fn from(setting: TrustSetting) -> Self {
        match setting {
            TrustSetting::Pinned => Self::Verify(true),
            TrustSetting::Disabled => Self::Verify(false),
            TrustSetting::CaBundle(path) => Self::Bundle(path),
        }
    }
}

/// Configuration for a Meridian session.
///
/// This is the serializable form of the session knobs; pass it to
/// [`crate::session::SessionBuilder::from_config`] to build a session.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SessionConfig {
    /// Controller base URL
    #[validate(url)]
    pub controller_url: String,

    /// TLS trust setting
    #[serde(default)]
    pub trust: TrustSetting,

    /// Ignore regions returned by the controller and use the explicit
    /// controller URL only
    #[serde(default)]
    pub ignore_region: bool,

    /// Check for a newer SDK release at session construction
    #[serde(default = "default_update_check")]
    pub update_check: bool,

    /// Per-attempt request timeout in seconds
    #[validate(range(min = 1, max = 600))]
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Whether failed REST calls are retried
    #[serde(default)]
    pub retry: bool,

    /// Maximum number of attempts when retry is enabled
    #[validate(range(min = 1, max = 100))]
    #[serde(default = "default_max_retry")]
    pub max_retry: u32,

    /// Sleep between attempts in seconds
    #[validate(range(max = 300))]
    #[serde(default = "default_retry_sleep_secs")]
    pub retry_sleep_secs: u64,
}

const fn default_update_check() -> bool {
    true
}

const fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

const fn default_max_retry() -> u32 {
    DEFAULT_MAX_RETRY
}

const fn default_retry_sleep_secs() -> u64 {
    DEFAULT_RETRY_SLEEP_SECS
}

impl SessionConfig {
    /// Create a new session configuration for the given controller URL.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or validation fails.
    pub fn new(controller_url: impl Into<String>) -> Result<Self, Error> {
        let config = Self {
            controller_url: controller_url.into(),
            trust: TrustSetting::default(),
            ignore_region: false,
            update_check: default_update_check(),
            timeout_secs: default_timeout_secs(),
            retry: false,
            max_retry: default_max_retry(),
            retry_sleep_secs: default_retry_sleep_secs(),
        };

        config
            .validate()
            .map_err(|e| Error::ConfigError(format!("Invalid configuration: {e}")))?;

        Ok(config)
    }

    /// Set the TLS trust setting.
    #[must_use]
    pub fn with_trust(mut self, trust: TrustSetting) -> Self {
        self.trust = trust;
        self
    }

    /// Ignore controller-provided regions.
    #[must_use]
    pub const fn with_ignore_region(mut self, ignore: bool) -> Self {
        self.ignore_region = ignore;
        self
    }

    /// Enable or disable the release update check.
    #[must_use]
    pub const fn with_update_check(mut self, check: bool) -> Self {
        self.update_check = check;
        self
    }

    /// Set the per-attempt request timeout in seconds.
    #[must_use]
    pub const fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_secs = seconds;
        self
    }

    /// Enable or disable REST call retries.
    #[must_use]
    pub const fn with_retry(mut self, retry: bool) -> Self {
        self.retry = retry;
        self
    }

    /// Set the maximum number of attempts.
    #[must_use]
    pub const fn with_max_retry(mut self, attempts: u32) -> Self {
        self.max_retry = attempts;
        self
    }

    /// Set the sleep between attempts in seconds.
    #[must_use]
    pub const fn with_retry_sleep(mut self, seconds: u64) -> Self {
        self.retry_sleep_secs = seconds;
        self
    }

    /// Get the per-attempt timeout as a Duration.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Get the retry policy described by this configuration.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            enabled: self.retry,
            max_attempts: self.max_retry,
            sleep: Duration::from_secs(self.retry_sleep_secs),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            controller_url: DEFAULT_CONTROLLER.to_string(),
            trust: TrustSetting::default(),
            ignore_region: false,
            update_check: default_update_check(),
            timeout_secs: default_timeout_secs(),
            retry: false,
            max_retry: default_max_retry(),
            retry_sleep_secs: default_retry_sleep_secs(),
        }
    }
}
