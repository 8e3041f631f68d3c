//! DAP message types
//!
//! Base protocol messages plus this adapter's launch configuration and
//! custom event bodies.
//! See: https://microsoft.github.io/debug-adapter-protocol/specification

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

// === Base Protocol Messages ===

/// DAP request message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMessage {
    pub seq: i64,
    #[serde(rename = "type")]
    pub message_type: String,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arguments: Option<Value>,
}

/// DAP response message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMessage {
    pub seq: i64,
    #[serde(rename = "type")]
    pub message_type: String,
    pub request_seq: i64,
    pub success: bool,
    pub command: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

/// DAP event message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventMessage {
    pub seq: i64,
    #[serde(rename = "type")]
    pub message_type: String,
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<Value>,
}

// === Capabilities ===

/// Capabilities advertised in the initialize response
///
/// The bridge handles restart requests itself (mapped to a hot reload),
/// so `supportsRestartRequest` must be advertised.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capabilities {
    pub supports_restart_request: bool,
    pub supports_configuration_done_request: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            supports_restart_request: true,
            supports_configuration_done_request: true,
        }
    }
}

// === Launch Configuration ===

/// Launch request arguments recognized by the bridge
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchConfig {
    /// Entry file of the target application
    pub program: PathBuf,

    /// Device/target selector passed to the launcher
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_id: Option<String>,

    /// Extra arguments forwarded to the target application
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub args: Vec<String>,

    /// Run without debugging (no VM connection, no pause-on-reload)
    #[serde(default)]
    pub no_debug: bool,

    /// Local project root; falls back to cwd when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_root: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,
}

impl LaunchConfig {
    /// Resolve the effective local project root
    pub fn effective_project_root(&self) -> Option<PathBuf> {
        self.project_root
            .clone()
            .or_else(|| self.cwd.clone())
            .or_else(|| self.program.parent().map(PathBuf::from))
    }
}

// === Custom Event Bodies ===

/// Body of the `appProgress` event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEventBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    pub finished: bool,
}

/// Body of the `reloadHint` event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HintEventBody {
    pub hint_id: String,
    pub hint_message: String,
}

/// Body of the standard `output` event
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputEventBody {
    pub category: String,
    pub output: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_config_camel_case() {
        let json = serde_json::json!({
            "program": "/proj/lib/main.x",
            "deviceId": "emulator-1",
            "noDebug": true,
            "projectRoot": "/proj"
        });
        let config: LaunchConfig = serde_json::from_value(json).unwrap();
        assert_eq!(config.device_id.as_deref(), Some("emulator-1"));
        assert!(config.no_debug);
        assert_eq!(config.effective_project_root(), Some(PathBuf::from("/proj")));
    }

    #[test]
    fn test_project_root_falls_back_to_program_dir() {
        let json = serde_json::json!({ "program": "/proj/lib/main.x" });
        let config: LaunchConfig = serde_json::from_value(json).unwrap();
        assert_eq!(
            config.effective_project_root(),
            Some(PathBuf::from("/proj/lib"))
        );
    }
}
