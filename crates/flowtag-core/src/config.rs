//! Configuration loading and typed config structures for flowtag.
//!
//! Configuration is an optional YAML file (conventionally `flowtag.yaml`).
//! Every field has a default, so an empty file and no file at all mean the
//! same thing.
//!
//! ```yaml
//! identity:
//!   salt: "0x5eed"        # fixed salt for reproducible traces; omit for random
//! logging:
//!   level: info
//!   json: false
//! analyzer:
//!   min_hops_for_leak: 1
//! ```

use std::path::Path;

use serde::{Deserialize, Deserializer};

/// Environment variable overriding `identity.salt`.
pub const SALT_ENV_VAR: &str = "FLOWTAG_SALT";

/// Environment variable overriding `logging.level`.
pub const LOG_ENV_VAR: &str = "FLOWTAG_LOG";

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A salt value is neither a decimal nor a `0x`-prefixed hex `u64`.
    #[error("invalid salt {value:?}: expected a decimal or 0x-prefixed hex u64")]
    InvalidSalt {
        /// The rejected text.
        value: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level flowtag configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FlowConfig {
    /// Process identity settings.
    #[serde(default)]
    pub identity: IdentityConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Flow analyzer settings.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
}

impl FlowConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `FLOWTAG_SALT` overrides `identity.salt`
    /// - `FLOWTAG_LOG` overrides `logging.level`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read,
    /// [`ConfigError::Yaml`] if the content is not valid YAML, or
    /// [`ConfigError::InvalidSalt`] if `FLOWTAG_SALT` does not parse.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse_yaml(&contents)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Parse configuration from a YAML string, then apply environment
    /// overrides.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let mut config = Self::parse_yaml(yaml)?;
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Load the file at `path`, or the defaults when there is none, without
    /// applying environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::parse_yaml(&std::fs::read_to_string(path)?),
            None => Ok(Self::default()),
        }
    }

    /// Default configuration with environment overrides applied.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();
        config.apply_env_overrides()?;
        Ok(config)
    }

    /// Apply `FLOWTAG_SALT` and `FLOWTAG_LOG` from the process environment.
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        self.apply_overrides_from(|key| std::env::var(key).ok())
    }

    /// Apply overrides looked up through `lookup` instead of the process
    /// environment.
    pub fn apply_overrides_from<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(SALT_ENV_VAR) {
            self.identity.salt = Some(parse_salt(&val)?);
        }
        self.apply_logging_overrides_from(lookup);
        Ok(())
    }

    /// Apply only the `FLOWTAG_LOG` override. Tools that never derive flow
    /// ids use this so a malformed `FLOWTAG_SALT` does not stop them.
    pub fn apply_logging_overrides_from<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(val) = lookup(LOG_ENV_VAR) {
            self.logging.level = val;
        }
    }

    fn parse_yaml(yaml: &str) -> Result<Self, ConfigError> {
        // An empty document deserializes as unit, not as an empty mapping.
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yml::from_str(yaml)?)
    }
}

/// Process identity configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct IdentityConfig {
    /// Fixed process salt. `None` draws a random salt at startup.
    ///
    /// Accepts an integer or a string holding a decimal or `0x` hex value.
    #[serde(default, deserialize_with = "deserialize_salt")]
    pub salt: Option<u64>,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log filter directive (`trace`, `debug`, `info`, ... or a full
    /// `EnvFilter` directive). `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit logs as JSON objects instead of human-readable lines.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Flow analyzer configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AnalyzerConfig {
    /// An unterminated chain is reported as leaked once it has at least
    /// this many hops.
    #[serde(default = "default_min_hops_for_leak")]
    pub min_hops_for_leak: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            min_hops_for_leak: default_min_hops_for_leak(),
        }
    }
}

/// Parse a salt written as decimal (`42`) or hex (`0x2a`, `0X2A`).
pub fn parse_salt(text: &str) -> Result<u64, ConfigError> {
    let trimmed = text.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some(hex) => u64::from_str_radix(&hex.replace('_', ""), 16),
        None => trimmed.replace('_', "").parse(),
    };
    parsed.map_err(|_err| ConfigError::InvalidSalt {
        value: text.to_owned(),
    })
}

/// Accepts `salt: 42`, `salt: "42"`, `salt: "0x2a"`, or `salt: null`.
fn deserialize_salt<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum SaltRepr {
        Number(u64),
        Text(String),
    }

    match Option::<SaltRepr>::deserialize(deserializer)? {
        None => Ok(None),
        Some(SaltRepr::Number(n)) => Ok(Some(n)),
        Some(SaltRepr::Text(text)) => parse_salt(&text)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_min_hops_for_leak() -> usize {
    1
}
