#![forbid(unsafe_code)]

//! Runtime configuration.
//!
//! Defaults are usable as-is. Overrides come from environment variables
//! (`CELLKIT_*`) and, with the `config-file` feature, from a TOML file:
//!
//! ```toml
//! max_flush_passes = 8
//! log_filter = "cellkit_runtime=debug"
//! ```

use std::env;
#[cfg(feature = "config-file")]
use std::path::Path;

use crate::error::ConfigError;

/// Environment variable overriding [`RuntimeConfig::max_flush_passes`].
pub const ENV_MAX_FLUSH_PASSES: &str = "CELLKIT_MAX_FLUSH_PASSES";
/// Environment variable overriding [`RuntimeConfig::log_filter`].
pub const ENV_LOG_FILTER: &str = "CELLKIT_LOG";

const DEFAULT_MAX_FLUSH_PASSES: usize = 16;
const DEFAULT_LOG_FILTER: &str = "info";

/// Tunables for [`Runtime`](crate::runtime::Runtime).
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config-file", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-file", serde(default, deny_unknown_fields))]
pub struct RuntimeConfig {
    /// Upper bound on re-render passes per flush. A render that writes state
    /// schedules another pass; this stops feedback loops.
    pub max_flush_passes: usize,
    /// `tracing-subscriber` filter directive used by binaries embedding the
    /// runtime. The library itself only emits events.
    pub log_filter: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            max_flush_passes: DEFAULT_MAX_FLUSH_PASSES,
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Defaults overlaid with `CELLKIT_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().apply_env()
    }

    /// Overlay `CELLKIT_*` environment variables onto `self`.
    pub fn apply_env(self) -> Result<Self, ConfigError> {
        let passes = env::var(ENV_MAX_FLUSH_PASSES).ok();
        let filter = env::var(ENV_LOG_FILTER).ok();
        self.with_overrides(passes.as_deref(), filter.as_deref())
    }

    /// Apply raw override strings (as read from the environment).
    ///
    /// Blank values are ignored.
    pub fn with_overrides(
        mut self,
        max_flush_passes: Option<&str>,
        log_filter: Option<&str>,
    ) -> Result<Self, ConfigError> {
        if let Some(raw) = max_flush_passes.map(str::trim).filter(|s| !s.is_empty()) {
            self.max_flush_passes = raw.parse().map_err(|_| ConfigError::InvalidValue {
                key: ENV_MAX_FLUSH_PASSES,
                value: raw.to_string(),
            })?;
        }
        if let Some(raw) = log_filter.map(str::trim).filter(|s| !s.is_empty()) {
            self.log_filter = raw.to_string();
        }
        self.validate()?;
        Ok(self)
    }

    /// Parse a TOML document. Missing keys keep their defaults.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source).map_err(|err| ConfigError::Parse {
            message: err.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    #[cfg(feature = "config-file")]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// Reject settings the runtime cannot operate with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_flush_passes == 0 {
            return Err(ConfigError::InvalidValue {
                key: "max_flush_passes",
                value: "0".to_string(),
            });
        }
        Ok(())
    }
}
