//! Platform configuration and log paths
//!
//! Uses the directories crate for platform-appropriate locations:
//! - Linux: `~/.config/reload-dap/`
//! - macOS: `~/Library/Application Support/reload-dap/`
//! - Windows: `%APPDATA%\reload-dap\`

use std::path::PathBuf;

const APP_NAME: &str = "reload-dap";

/// Get the configuration directory path
pub fn config_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the configuration file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|dir| dir.join("config.toml"))
}

/// Get the path to the log directory
pub fn log_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().join("logs"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_dir_is_valid() {
        let dir = config_dir();
        assert!(dir.is_some());
    }
}
