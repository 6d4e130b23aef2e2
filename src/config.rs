//! Top-level application configuration.
//!
//! Configuration is stored in `config.yaml` inside the ticketdesk config
//! directory and includes:
//! - Base URLs for the identity and service hosts
//! - The API key sent with every request
//! - The timezone used to interpret and display local date/times

use std::env;
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use jiff::tz::TimeZone;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{DeskError, Result};
use crate::types::{APP_DIR, UserType};

/// Overrides the directory holding `config.yaml` and `session.json`.
pub const CONFIG_DIR_ENV: &str = "TICKETDESK_CONFIG_DIR";
pub const API_KEY_ENV: &str = "TICKETDESK_API_KEY";
pub const IDENTITY_URL_ENV: &str = "TICKETDESK_IDENTITY_URL";
pub const SERVICE_URL_ENV: &str = "TICKETDESK_SERVICE_URL";

/// Keys accepted by `config get` / `config set`.
pub const CONFIG_KEYS: &[&str] = &[
    "identity_url",
    "service_url",
    "api_key",
    "timezone",
    "user_type",
    "request_timeout",
];

/// Main configuration structure
#[derive(Clone, Serialize, Deserialize)]
pub struct Config {
    /// Host serving login and user administration
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_url: Option<String>,

    /// Host serving tickets, projects, categories, comments and uploads
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,

    /// Value of the `x-encrypted-key` header
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// IANA timezone for local date/time input and display (default: UTC)
    #[serde(default = "default_timezone")]
    pub timezone: String,

    /// Which login endpoint to use (default: employee)
    #[serde(default)]
    pub user_type: UserType,

    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

impl Default for Config {
    fn default() -> Self {
        Self {
            identity_url: None,
            service_url: None,
            api_key: None,
            timezone: default_timezone(),
            user_type: UserType::default(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("identity_url", &self.identity_url)
            .field("service_url", &self.service_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "[REDACTED]"))
            .field("timezone", &self.timezone)
            .field("user_type", &self.user_type)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Config {
    /// Directory holding the config and session files
    pub fn config_dir() -> Result<PathBuf> {
        if let Ok(dir) = env::var(CONFIG_DIR_ENV)
            && !dir.is_empty()
        {
            return Ok(PathBuf::from(dir));
        }

        directories::ProjectDirs::from("", "", APP_DIR)
            .map(|dirs| dirs.config_dir().to_path_buf())
            .ok_or_else(|| {
                DeskError::Config(format!(
                    "could not determine a config directory; set {CONFIG_DIR_ENV}"
                ))
            })
    }

    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.yaml"))
    }

    /// Get the path to the persisted session
    pub fn session_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("session.json"))
    }

    /// Load configuration from file, or return default if not found
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(&path)?;
        let config: Config = serde_yaml_ng::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let path = Self::config_path()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = serde_yaml_ng::to_string(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    /// Get API key from environment variable or config
    pub fn api_key(&self) -> Option<String> {
        env_override(API_KEY_ENV).or_else(|| self.api_key.clone())
    }

    /// Parsed identity host URL
    pub fn identity_url(&self) -> Result<Url> {
        let raw = env_override(IDENTITY_URL_ENV)
            .or_else(|| self.identity_url.clone())
            .ok_or_else(|| {
                DeskError::Config(
                    "identity_url not configured. Run: ticketdesk config set identity_url <url>"
                        .to_string(),
                )
            })?;
        Ok(Url::parse(&raw)?)
    }

    /// Parsed service host URL
    pub fn service_url(&self) -> Result<Url> {
        let raw = env_override(SERVICE_URL_ENV)
            .or_else(|| self.service_url.clone())
            .ok_or_else(|| {
                DeskError::Config(
                    "service_url not configured. Run: ticketdesk config set service_url <url>"
                        .to_string(),
                )
            })?;
        Ok(Url::parse(&raw)?)
    }

    /// Resolve the configured timezone
    pub fn time_zone(&self) -> Result<TimeZone> {
        TimeZone::get(&self.timezone).map_err(|_| DeskError::InvalidTimezone(self.timezone.clone()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout)
    }

    /// Set a single key, validating the value
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "identity_url" => {
                Url::parse(value)?;
                self.identity_url = Some(value.to_string());
            }
            "service_url" => {
                Url::parse(value)?;
                self.service_url = Some(value.to_string());
            }
            "api_key" => self.api_key = Some(value.to_string()),
            "timezone" => {
                TimeZone::get(value).map_err(|_| DeskError::InvalidTimezone(value.to_string()))?;
                self.timezone = value.to_string();
            }
            "user_type" => self.user_type = value.parse()?,
            "request_timeout" => {
                self.request_timeout = value.parse().map_err(|_| {
                    DeskError::Config(format!("request_timeout must be seconds, got '{value}'"))
                })?;
            }
            _ => return Err(unknown_key(key)),
        }
        Ok(())
    }

    /// Read a single key. Secrets are returned as-is; callers mask them.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "identity_url" => self.identity_url.clone(),
            "service_url" => self.service_url.clone(),
            "api_key" => self.api_key(),
            "timezone" => Some(self.timezone.clone()),
            "user_type" => Some(self.user_type.to_string()),
            "request_timeout" => Some(self.request_timeout.to_string()),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }
}

fn env_override(var: &str) -> Option<String> {
    env::var(var).ok().filter(|v| !v.is_empty())
}

fn unknown_key(key: &str) -> DeskError {
    DeskError::Config(format!(
        "unknown config key '{key}'. Valid keys: {}",
        CONFIG_KEYS.join(", ")
    ))
}
