//! Configuration file handling

use serde::Deserialize;
use std::path::PathBuf;

use super::paths::config_path;
use super::Result;

/// Default name of the launcher tool searched on PATH
pub const DEFAULT_LAUNCHER: &str = "apprun";

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Launcher tool settings
    #[serde(default)]
    pub launcher: LauncherConfig,

    /// Timeout settings
    #[serde(default)]
    pub timeouts: Timeouts,
}

/// Launcher tool configuration
#[derive(Debug, Deserialize, Default)]
pub struct LauncherConfig {
    /// Path to the launcher executable (searched on PATH when unset)
    pub command: Option<PathBuf>,

    /// Additional arguments passed to the launcher
    #[serde(default)]
    pub args: Vec<String>,
}

/// Timeout settings in seconds
#[derive(Debug, Deserialize)]
pub struct Timeouts {
    /// Timeout for launcher requests (reload, extension calls)
    #[serde(default = "default_request")]
    pub request_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            request_secs: default_request(),
        }
    }
}

fn default_request() -> u64 {
    60
}

impl Config {
    /// Load configuration from the default config file
    ///
    /// Returns default configuration if file doesn't exist
    pub fn load() -> Result<Self> {
        if let Some(path) = config_path() {
            if path.exists() {
                let content = std::fs::read_to_string(&path)
                    .map_err(|e| super::Error::Config(format!("{}: {}", path.display(), e)))?;
                return toml::from_str(&content)
                    .map_err(|e| super::Error::ConfigParse(e.to_string()));
            }
        }
        Ok(Self::default())
    }

    /// Resolve the launcher executable path
    ///
    /// Order: explicit override, config file, PATH search.
    pub fn resolve_launcher(&self, override_path: Option<&PathBuf>) -> Result<PathBuf> {
        if let Some(path) = override_path.or(self.launcher.command.as_ref()) {
            return Ok(path.clone());
        }

        which::which(DEFAULT_LAUNCHER).map_err(|_| {
            super::Error::LauncherNotFound(format!("'{}' on PATH", DEFAULT_LAUNCHER))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_override_wins() {
        let config = Config::default();
        let path = PathBuf::from("/opt/tools/apprun");
        let resolved = config.resolve_launcher(Some(&path)).unwrap();
        assert_eq!(resolved, path);
    }

    #[test]
    fn test_config_command_used_without_override() {
        let config = Config {
            launcher: LauncherConfig {
                command: Some(PathBuf::from("/usr/local/bin/apprun")),
                args: vec![],
            },
            ..Default::default()
        };
        let resolved = config.resolve_launcher(None).unwrap();
        assert_eq!(resolved, PathBuf::from("/usr/local/bin/apprun"));
    }
}
