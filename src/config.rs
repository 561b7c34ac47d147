use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo-instruct";
pub const DEFAULT_MAX_TOKENS: u32 = 256;
pub const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {name}: {value:?}")]
    InvalidValue { name: &'static str, value: String },
}

/// Process-wide settings, read once at startup and shared read-only afterwards.
#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub api_key: Option<String>,
    pub api_base: String,
    pub model: String,
    pub max_tokens: u32,
    pub request_timeout: Option<Duration>,
    pub static_dir: PathBuf,
}

// Hand-written so the credential never ends up in a log line.
impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("port", &self.port)
            .field("api_key_present", &self.api_key_present())
            .field("api_base", &self.api_base)
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .field("request_timeout", &self.request_timeout)
            .field("static_dir", &self.static_dir)
            .finish()
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            port: DEFAULT_PORT,
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            request_timeout: None,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let defaults = Config::default();

        let port = match var("PORT") {
            Some(value) => parse_number("PORT", &value)?,
            None => defaults.port,
        };
        let max_tokens = match var("OPENAI_MAX_TOKENS") {
            Some(value) => parse_number("OPENAI_MAX_TOKENS", &value)?,
            None => defaults.max_tokens,
        };
        let request_timeout = match var("OPENAI_TIMEOUT_SECS") {
            Some(value) => Some(Duration::from_secs(parse_number(
                "OPENAI_TIMEOUT_SECS",
                &value,
            )?)),
            None => None,
        };

        Ok(Config {
            port,
            api_key: var("OPENAI_API_KEY"),
            api_base: var("OPENAI_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base),
            model: var("OPENAI_MODEL").unwrap_or(defaults.model),
            max_tokens,
            request_timeout,
            static_dir: var("STATIC_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
        })
    }

    pub fn api_key_present(&self) -> bool {
        self.api_key.is_some()
    }
}

fn parse_number<T: std::str::FromStr>(name: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        name,
        value: value.to_string(),
    })
}
