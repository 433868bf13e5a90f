//! Resolver configuration loaded from `flownext.toml`.
//!
//! Missing keys fall back to defaults (timeout 30 s, interval 500 ms, ignore
//! assignee off). Environment variables take precedence over the file:
//! `FLOWNEXT_TIMEOUT_SECS`, `FLOWNEXT_POLL_INTERVAL_MS`,
//! `FLOWNEXT_IGNORE_ASSIGNEE`.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const CONFIG_FILE: &str = "flownext.toml";

const MIN_POLL_INTERVAL_MS: u64 = 1;

const ENV_TIMEOUT_SECS: &str = "FLOWNEXT_TIMEOUT_SECS";
const ENV_POLL_INTERVAL_MS: &str = "FLOWNEXT_POLL_INTERVAL_MS";
const ENV_IGNORE_ASSIGNEE: &str = "FLOWNEXT_IGNORE_ASSIGNEE";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Defaults for resolution requests; each may be overridden per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Wait budget when a request does not give one.
    #[serde(default = "default_timeout_secs")]
    pub default_timeout_secs: u64,

    /// Pause between poll iterations.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Match any actionable task instead of the user's own.
    #[serde(default)]
    pub ignore_assignee: bool,
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_poll_interval_ms() -> u64 {
    500
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_timeout_secs: default_timeout_secs(),
            poll_interval_ms: default_poll_interval_ms(),
            ignore_assignee: false,
        }
    }
}

impl ResolverConfig {
    /// Loads `flownext.toml` from the working directory, then applies
    /// environment overrides. Uses defaults when the file is absent.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(CONFIG_FILE))
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let config = if path.exists() {
            let contents = std::fs::read_to_string(path)?;
            Self::from_toml_str(&contents)?
        } else {
            Self::default()
        };
        config.with_overrides(|key| std::env::var(key).ok())
    }

    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Applies overrides from `lookup` (normally the process environment).
    /// Empty values are ignored.
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_TIMEOUT_SECS) {
            self.default_timeout_secs = parse_env(ENV_TIMEOUT_SECS, &v)?;
        }
        if let Some(v) = get(ENV_POLL_INTERVAL_MS) {
            self.poll_interval_ms = parse_env(ENV_POLL_INTERVAL_MS, &v)?;
        }
        if let Some(v) = get(ENV_IGNORE_ASSIGNEE) {
            self.ignore_assignee = parse_env(ENV_IGNORE_ASSIGNEE, &v)?;
        }

        self.validate()?;
        Ok(self)
    }

    /// Checks invariants that deserialization cannot express.
    ///
    /// `from_toml_str` and `with_overrides` call this; configs built in code
    /// may call it themselves.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "poll_interval_ms must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_secs(self.default_timeout_secs)
    }

    /// Never shorter than 1 ms, even for an unvalidated config.
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::Invalid(format!("{key}={value:?} is not valid")))
}
