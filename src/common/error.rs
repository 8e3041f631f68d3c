//! Error types for the bridge adapter
//!
//! Failures against the running application are reported asynchronously
//! through protocol events, so most variants here carry a user-visible
//! message rather than structured detail.

use std::io;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the bridge adapter
#[derive(Error, Debug)]
pub enum Error {
    // === Launcher Errors ===
    #[error("Launcher tool not found. Searched: {0}")]
    LauncherNotFound(String),

    #[error("Failed to start launcher: {0}")]
    LauncherStartFailed(String),

    #[error("Launcher exited unexpectedly")]
    LauncherCrashed,

    #[error("Launcher protocol error: {0}")]
    LauncherProtocol(String),

    #[error("Launcher request '{method}' failed: {message}")]
    LauncherRequestFailed { method: String, message: String },

    // === Reload / Extension Errors ===
    #[error("Reload failed: {0}")]
    ReloadFailed(String),

    #[error("Service extension '{extension}' failed: {message}")]
    ExtensionFailed { extension: String, message: String },

    // === Protocol Errors ===
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Front-end disconnected")]
    Disconnected,

    #[error("Unsupported command '{0}'")]
    UnsupportedCommand(String),

    #[error("Invalid launch configuration: {0}")]
    InvalidLaunchConfig(String),

    #[error("No launch configuration received yet")]
    NotLaunched,

    // === Timeout Errors ===
    #[error("Launcher request timed out after {0} seconds")]
    Timeout(u64),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file: {0}")]
    ConfigParse(String),

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Internal Errors ===
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a launcher request failed error
    pub fn launcher_request_failed(method: &str, message: &str) -> Self {
        Self::LauncherRequestFailed {
            method: method.to_string(),
            message: message.to_string(),
        }
    }

    /// Create a service extension failure
    pub fn extension_failed(extension: &str, message: &str) -> Self {
        Self::ExtensionFailed {
            extension: extension.to_string(),
            message: message.to_string(),
        }
    }
}
