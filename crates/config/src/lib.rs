//! Configuration loading, validation, and management for sheetdraft.
//!
//! Loads configuration from `~/.sheetdraft/config.toml` (or an explicit path)
//! with environment variable overrides. Validates all settings at startup.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The root configuration structure.
///
/// Maps directly to `~/.sheetdraft/config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Telegram bot settings
    #[serde(default)]
    pub telegram: TelegramSettings,

    /// Spreadsheet backend settings
    #[serde(default)]
    pub sheets: SheetsSettings,

    /// Table preview settings
    #[serde(default)]
    pub display: DisplaySettings,

    /// Per-chat session retention
    #[serde(default)]
    pub sessions: SessionSettings,
}

/// Redact a secret string for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct TelegramSettings {
    /// Bot token from @BotFather
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_token: Option<String>,

    /// Long-polling timeout for `getUpdates`
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout_secs: u64,

    /// Allowlist of chat ids. Empty = deny all. ["*"] = allow all.
    #[serde(default = "default_allowed_chats")]
    pub allowed_chats: Vec<String>,
}

fn default_poll_timeout() -> u64 {
    30
}
fn default_allowed_chats() -> Vec<String> {
    vec!["*".into()]
}

impl Default for TelegramSettings {
    fn default() -> Self {
        Self {
            bot_token: None,
            poll_timeout_secs: default_poll_timeout(),
            allowed_chats: default_allowed_chats(),
        }
    }
}

impl std::fmt::Debug for TelegramSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSettings")
            .field("bot_token", &redact(&self.bot_token))
            .field("poll_timeout_secs", &self.poll_timeout_secs)
            .field("allowed_chats", &self.allowed_chats)
            .finish()
    }
}

/// How a sheet name is turned into the range segment of a values request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeQuoting {
    /// Form-encode the name with UTF-16 escapes for non-ASCII runs.
    #[default]
    Utf16Form,
    /// A1 notation: the name in single quotes, quotes doubled.
    A1,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SheetsSettings {
    /// Spreadsheet identifier (the long id in the sheet URL)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spreadsheet_id: Option<String>,

    /// Service-account key file
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,

    #[serde(default)]
    pub range_quoting: RangeQuoting,
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("credentials.json")
}

impl Default for SheetsSettings {
    fn default() -> Self {
        Self {
            spreadsheet_id: None,
            credentials_path: default_credentials_path(),
            range_quoting: RangeQuoting::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplaySettings {
    /// How many trailing data rows a sheet preview shows
    #[serde(default = "default_row_count")]
    pub row_count: usize,
}

fn default_row_count() -> usize {
    5
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            row_count: default_row_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionSettings {
    /// Sessions idle longer than this are evicted
    #[serde(default = "default_ttl_minutes")]
    pub ttl_minutes: u64,

    /// How often the eviction sweep runs
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

fn default_ttl_minutes() -> u64 {
    24 * 60
}
fn default_sweep_interval() -> u64 {
    300
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl_minutes: default_ttl_minutes(),
            sweep_interval_secs: default_sweep_interval(),
        }
    }
}

/// The settings the bot cannot run without, resolved and non-empty.
#[derive(Clone)]
pub struct RuntimeSettings {
    pub bot_token: String,
    pub spreadsheet_id: String,
    pub credentials_path: PathBuf,
}

impl std::fmt::Debug for RuntimeSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuntimeSettings")
            .field("bot_token", &"[REDACTED]")
            .field("spreadsheet_id", &self.spreadsheet_id)
            .field("credentials_path", &self.credentials_path)
            .finish()
    }
}

impl AppConfig {
    /// Load configuration from the default path (~/.sheetdraft/config.toml).
    ///
    /// Environment variables take precedence over the file:
    /// - `SHEETDRAFT_BOT_TOKEN`
    /// - `SHEETDRAFT_SPREADSHEET_ID`
    /// - `SHEETDRAFT_CREDENTIALS_PATH`
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_with_env(&Self::config_path())
    }

    /// Load from `path`, then apply environment overrides.
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load_from(path)?;
        config.apply_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from a variable lookup (the process environment in
    /// production, a map in tests).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(token) = lookup("SHEETDRAFT_BOT_TOKEN") {
            self.telegram.bot_token = Some(token);
        }
        if let Some(id) = lookup("SHEETDRAFT_SPREADSHEET_ID") {
            self.sheets.spreadsheet_id = Some(id);
        }
        if let Some(path) = lookup("SHEETDRAFT_CREDENTIALS_PATH") {
            self.sheets.credentials_path = PathBuf::from(path);
        }
    }

    /// Get the configuration directory path.
    pub fn config_dir() -> PathBuf {
        dirs_home().join(".sheetdraft")
    }

    /// Get the default configuration file path.
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.display.row_count == 0 {
            return Err(ConfigError::ValidationError(
                "display.row_count must be at least 1".into(),
            ));
        }

        if self.sessions.ttl_minutes == 0 || self.sessions.sweep_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "sessions.ttl_minutes and sessions.sweep_interval_secs must be > 0".into(),
            ));
        }

        Ok(())
    }

    /// Resolve the settings required to serve, failing on the first gap.
    pub fn require_runtime(&self) -> Result<RuntimeSettings, ConfigError> {
        let bot_token = non_empty(&self.telegram.bot_token)
            .ok_or(ConfigError::Missing("telegram.bot_token"))?;
        let spreadsheet_id = non_empty(&self.sheets.spreadsheet_id)
            .ok_or(ConfigError::Missing("sheets.spreadsheet_id"))?;

        Ok(RuntimeSettings {
            bot_token,
            spreadsheet_id,
            credentials_path: self.sheets.credentials_path.clone(),
        })
    }

    /// Generate a default config TOML string (for the `init` command).
    pub fn default_toml() -> String {
        let config = Self::default();
        toml::to_string_pretty(&config).unwrap_or_default()
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Get the user's home directory.
fn dirs_home() -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        std::env::var("USERPROFILE")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("C:\\Users\\Default"))
    }
    #[cfg(not(target_os = "windows"))]
    {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("/tmp"))
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),

    #[error("Required setting `{0}` is missing")]
    Missing(&'static str),
}
