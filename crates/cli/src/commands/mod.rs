pub mod doctor;
pub mod init;
pub mod run;

use std::path::{Path, PathBuf};

use sheetdraft_config::{AppConfig, ConfigError};

/// The explicit path, else the default location.
pub fn resolve_config_path(path: Option<&Path>) -> PathBuf {
    path.map(Path::to_path_buf)
        .unwrap_or_else(AppConfig::config_path)
}

/// Load the config file with environment overrides applied.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    AppConfig::load_with_env(&resolve_config_path(path))
}
