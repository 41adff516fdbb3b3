//! Configuration layer: typed settings with layered precedence (file → env).
//!
//! Raw values are deserialized from an optional `gramline.toml` plus
//! `GRAMLINE_`-prefixed environment variables, then validated into the typed
//! [`Settings`] the rest of the crate consumes.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use config::{Config, Environment, File};
use serde::Deserialize;
use thiserror::Error;
use tracing::level_filters::LevelFilter;
use url::Url;

const LOCAL_CONFIG_BASENAME: &str = "gramline";
const ENV_PREFIX: &str = "GRAMLINE";
const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/instagram/";
const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SESSION_PATH: &str = "gramline-session.json";
const DEFAULT_QUERY_LIMIT: usize = 512;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read configuration: {0}")]
    Read(#[from] config::ConfigError),
    #[error("invalid configuration value for {field}: {message}")]
    Invalid {
        field: &'static str,
        message: String,
    },
}

/// Fully validated client settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    pub session: SessionSettings,
    pub cache: CacheSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone)]
pub struct ApiSettings {
    /// Base URL of the API, always ending in a slash so endpoint paths join
    /// under it instead of replacing it.
    pub base_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    /// Where the durable token/username document lives.
    pub storage_path: PathBuf,
}

/// Query-cache knobs. One uniform freshness policy applies to every
/// resource: entries live until tag invalidation, logout, or LRU pressure.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub enabled: bool,
    pub query_limit: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            query_limit: DEFAULT_QUERY_LIMIT,
        }
    }
}

impl CacheSettings {
    /// Entry limit as `NonZeroUsize`, clamping to 1 if configured as zero.
    pub fn query_limit_non_zero(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.query_limit).unwrap_or(NonZeroUsize::MIN)
    }
}

#[derive(Debug, Clone)]
pub struct LoggingSettings {
    pub level: LevelFilter,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Compact,
}

// ============================================================================
// Raw (pre-validation) settings
// ============================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    api: RawApiSettings,
    session: RawSessionSettings,
    cache: CacheSettings,
    logging: RawLoggingSettings,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawApiSettings {
    base_url: String,
    timeout_secs: u64,
    user_agent: Option<String>,
}

impl Default for RawApiSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            user_agent: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawSessionSettings {
    storage_path: String,
}

impl Default for RawSessionSettings {
    fn default() -> Self {
        Self {
            storage_path: DEFAULT_SESSION_PATH.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawLoggingSettings {
    level: String,
    format: String,
}

impl Default for RawLoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "compact".to_string(),
        }
    }
}

impl TryFrom<RawSettings> for Settings {
    type Error = LoadError;

    fn try_from(raw: RawSettings) -> Result<Self, Self::Error> {
        let mut base_url = Url::parse(&raw.api.base_url).map_err(|err| LoadError::Invalid {
            field: "api.base_url",
            message: err.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(LoadError::Invalid {
                field: "api.base_url",
                message: "URL cannot serve as a base".to_string(),
            });
        }
        // Endpoint paths are joined relative to the base; without the
        // trailing slash `Url::join` would drop the last path segment.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        if raw.api.timeout_secs == 0 {
            return Err(LoadError::Invalid {
                field: "api.timeout_secs",
                message: "timeout must be at least one second".to_string(),
            });
        }

        let level =
            LevelFilter::from_str(&raw.logging.level).map_err(|err| LoadError::Invalid {
                field: "logging.level",
                message: err.to_string(),
            })?;
        let format = match raw.logging.format.to_ascii_lowercase().as_str() {
            "json" => LogFormat::Json,
            "compact" => LogFormat::Compact,
            other => {
                return Err(LoadError::Invalid {
                    field: "logging.format",
                    message: format!("expected `json` or `compact`, got `{other}`"),
                });
            }
        };

        Ok(Self {
            api: ApiSettings {
                base_url,
                timeout: Duration::from_secs(raw.api.timeout_secs),
                user_agent: raw
                    .api
                    .user_agent
                    .unwrap_or_else(|| default_user_agent().to_string()),
            },
            session: SessionSettings {
                storage_path: PathBuf::from(raw.session.storage_path),
            },
            cache: raw.cache,
            logging: LoggingSettings { level, format },
        })
    }
}

pub fn default_user_agent() -> &'static str {
    concat!("gramline/", env!("CARGO_PKG_VERSION"))
}

/// Load settings from the optional local `gramline.toml`, an explicit file
/// when given, and `GRAMLINE_`-prefixed environment variables (later sources
/// win).
pub fn load(config_file: Option<&Path>) -> Result<Settings, LoadError> {
    let mut builder =
        Config::builder().add_source(File::with_name(LOCAL_CONFIG_BASENAME).required(false));
    if let Some(path) = config_file {
        builder = builder.add_source(File::from(path).required(true));
    }
    let raw: RawSettings = builder
        .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?
        .try_deserialize()?;
    Settings::try_from(raw)
}
