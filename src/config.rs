//! # Task Log Configuration
//!
//! Declarative, validated configuration for [`crate::TaskLogCache`] and the
//! Redis connection backing it.
//!
//! ## Sources
//!
//! [`TaskLogConfig::load`] layers sources in this order, later sources winning:
//!
//! 1. An optional configuration file (TOML, YAML or JSON, by extension)
//! 2. `TASKLOG_*` environment variables (`TASKLOG_PREFIX`, `TASKLOG_INDEX`,
//!    `TASKLOG_TTL`, `TASKLOG_TTL_RENEW_ON_WRITE`, `TASKLOG_TTL_RENEW_ON_READ`)
//!
//! ```toml
//! prefix = "task:"
//! index = "tasks"
//! ttl = 30
//! ttl_renew_on_write = true
//! ttl_renew_on_read = false
//! ```
//!
//! ## Validation
//!
//! Uses `validator`:
//! - `#[validate(length(min = 1))]` for the key namespace and index name
//! - `#[validate(range(min = 0))]` for the TTL
//!
//! Validation runs before any store access, so a bad configuration never
//! produces a partially constructed cache.

use crate::error::ConfigurationError;
use config::builder::DefaultState;
use config::{ConfigBuilder, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;
use validator::Validate;

/// Environment variable prefix for [`TaskLogConfig::load`]
pub const ENV_PREFIX: &str = "TASKLOG";

/// Options controlling key layout and expiry of task logs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct TaskLogConfig {
    /// Prepended to every task identifier to form its log key
    #[validate(length(min = 1))]
    pub prefix: String,

    /// Key of the index set
    #[validate(length(min = 1))]
    pub index: String,

    /// Seconds of inactivity before a log expires; 0 disables expiry
    #[serde(default)]
    #[validate(range(min = 0))]
    pub ttl: i64,

    /// Reset the expiry countdown on every push, not only on creation
    #[serde(default)]
    pub ttl_renew_on_write: bool,

    /// Reset the expiry countdown on every read
    #[serde(default)]
    pub ttl_renew_on_read: bool,
}

impl TaskLogConfig {
    /// Configuration with no expiry
    pub fn new(prefix: impl Into<String>, index: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            index: index.into(),
            ttl: 0,
            ttl_renew_on_write: false,
            ttl_renew_on_read: false,
        }
    }

    pub fn with_ttl(mut self, ttl_seconds: i64) -> Self {
        self.ttl = ttl_seconds;
        self
    }

    pub fn with_renew_on_write(mut self, renew: bool) -> Self {
        self.ttl_renew_on_write = renew;
        self
    }

    pub fn with_renew_on_read(mut self, renew: bool) -> Self {
        self.ttl_renew_on_read = renew;
        self
    }

    /// Expiry in seconds, or `None` when logs never expire
    pub fn ttl_seconds(&self) -> Option<i64> {
        (self.ttl > 0).then_some(self.ttl)
    }

    /// Load from an optional file overlaid with `TASKLOG_*` environment variables
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigurationError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            debug!(path = %path.display(), "Loading task log configuration file");
            builder = builder.add_source(File::from(path));
        }
        builder = builder.add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true));

        Self::load_from_sources(builder)
    }

    /// Build, deserialize and validate an arbitrary set of sources
    pub fn load_from_sources(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<Self, ConfigurationError> {
        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }
}

/// Connection settings for the Redis store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RedisConfig {
    pub url: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://localhost:6379".to_string(),
        }
    }
}

impl RedisConfig {
    /// Reads `REDIS_URL`, falling back to the local default
    pub fn from_env() -> Self {
        std::env::var("REDIS_URL")
            .map(|url| Self { url })
            .unwrap_or_default()
    }
}
