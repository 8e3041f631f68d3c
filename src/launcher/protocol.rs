//! Launcher wire protocol
//!
//! The launcher tool speaks newline-delimited JSON over its stdio:
//! requests `{"id": n, "method": "app.x", "params": {...}}`, responses
//! `{"id": n, "result": ...}` or `{"id": n, "error": "..."}`, and
//! unsolicited events `{"event": "app.x", "params": {...}}`.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::common::{Error, Result};

/// Request sent to the launcher
#[derive(Debug, Clone, Serialize)]
pub struct DaemonRequest {
    pub id: u64,
    pub method: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
}

/// A single message received from the launcher
#[derive(Debug)]
pub enum DaemonMessage {
    /// Reply to a request we sent
    Response { id: u64, result: Result<Value> },
    /// Unsolicited event
    Event(LauncherEvent),
}

/// Events emitted by the launcher, as a tagged union
#[derive(Debug, Clone)]
pub enum LauncherEvent {
    /// The target application instance started
    AppStarted { app_id: String },
    /// The instance's inspection endpoint is available
    DebugPort {
        app_id: String,
        ws_uri: String,
        base_uri: Option<String>,
    },
    /// The instance stopped
    AppStopped { app_id: String },
    /// Human-readable launch/operation progress
    Progress {
        message: Option<String>,
        finished: bool,
    },
    /// Anything the bridge does not interpret; passed through raw
    Unhandled { raw: Value },
}

/// Raw event envelope for serde
#[derive(Debug, Deserialize)]
struct EventEnvelope {
    event: String,
    #[serde(default)]
    params: Value,
}

/// Raw response envelope for serde
#[derive(Debug, Deserialize)]
struct ResponseEnvelope {
    id: u64,
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<Value>,
}

/// Parse one line of launcher output
pub fn parse_line(line: &str) -> Result<DaemonMessage> {
    let value: Value = serde_json::from_str(line)
        .map_err(|e| Error::LauncherProtocol(format!("invalid JSON: {}", e)))?;

    if value.get("event").is_some() {
        let envelope: EventEnvelope = serde_json::from_value(value)?;
        return Ok(DaemonMessage::Event(LauncherEvent::parse(
            &envelope.event,
            envelope.params,
        )));
    }

    if value.get("id").is_some() {
        let envelope: ResponseEnvelope = serde_json::from_value(value)?;
        let result = match envelope.error {
            Some(err) => Err(Error::LauncherProtocol(
                err.as_str().map(String::from).unwrap_or_else(|| err.to_string()),
            )),
            None => Ok(envelope.result.unwrap_or(Value::Null)),
        };
        return Ok(DaemonMessage::Response {
            id: envelope.id,
            result,
        });
    }

    Err(Error::LauncherProtocol(format!(
        "message is neither event nor response: {}",
        line
    )))
}

/// Extract a string field from a JSON object
fn str_field(params: &Value, key: &str) -> Option<String> {
    params.get(key).and_then(Value::as_str).map(String::from)
}

impl LauncherEvent {
    /// Decode a named event; unknown names land in `Unhandled`
    pub fn parse(name: &str, params: Value) -> Self {
        match name {
            "app.started" => match str_field(&params, "appId") {
                Some(app_id) => Self::AppStarted { app_id },
                None => Self::unhandled(name, params),
            },
            "app.debugPort" => {
                match (str_field(&params, "appId"), str_field(&params, "wsUri")) {
                    (Some(app_id), Some(ws_uri)) => Self::DebugPort {
                        app_id,
                        ws_uri,
                        base_uri: str_field(&params, "baseUri"),
                    },
                    _ => Self::unhandled(name, params),
                }
            }
            "app.stopped" => match str_field(&params, "appId") {
                Some(app_id) => Self::AppStopped { app_id },
                None => Self::unhandled(name, params),
            },
            "app.progress" => Self::Progress {
                message: str_field(&params, "message"),
                finished: params
                    .get("finished")
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
            },
            _ => Self::unhandled(name, params),
        }
    }

    fn unhandled(name: &str, params: Value) -> Self {
        Self::Unhandled {
            raw: serde_json::json!({ "event": name, "params": params }),
        }
    }
}

/// Successful reload result, with an optional advisory hint
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReloadSuccess {
    pub hint_id: Option<String>,
    pub hint_message: Option<String>,
}

impl ReloadSuccess {
    /// Interpret an `app.restart` result
    ///
    /// A non-zero `code` is a failure carrying `message`; a missing `code`
    /// is treated as success.
    pub fn from_result(result: &Value) -> Result<Self> {
        let code = result.get("code").and_then(Value::as_i64).unwrap_or(0);
        if code != 0 {
            let message = result
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("reload failed")
                .to_string();
            return Err(Error::ReloadFailed(message));
        }

        Ok(Self {
            hint_id: result
                .get("hintId")
                .and_then(Value::as_str)
                .map(String::from),
            hint_message: result
                .get("hintMessage")
                .and_then(Value::as_str)
                .map(String::from),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_app_started_event() {
        let msg = parse_line(r#"{"event":"app.started","params":{"appId":"app1"}}"#).unwrap();
        match msg {
            DaemonMessage::Event(LauncherEvent::AppStarted { app_id }) => {
                assert_eq!(app_id, "app1")
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_debug_port_event() {
        let msg = parse_line(
            r#"{"event":"app.debugPort","params":{"appId":"app1","wsUri":"ws://host:1/ws","baseUri":"file:///data/app/"}}"#,
        )
        .unwrap();
        match msg {
            DaemonMessage::Event(LauncherEvent::DebugPort {
                ws_uri, base_uri, ..
            }) => {
                assert_eq!(ws_uri, "ws://host:1/ws");
                assert_eq!(base_uri.as_deref(), Some("file:///data/app/"));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_parse_error_response() {
        let msg = parse_line(r#"{"id":3,"error":"no such app"}"#).unwrap();
        match msg {
            DaemonMessage::Response { id, result } => {
                assert_eq!(id, 3);
                assert!(result.is_err());
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_event_is_unhandled() {
        let msg = parse_line(r#"{"event":"device.added","params":{"id":"x"}}"#).unwrap();
        assert!(matches!(
            msg,
            DaemonMessage::Event(LauncherEvent::Unhandled { .. })
        ));
    }

    #[test]
    fn test_reload_result_with_hint() {
        let result = serde_json::json!({
            "code": 0,
            "hintId": "restartRecommended",
            "hintMessage": "Some changes need a full restart to take effect"
        });
        let success = ReloadSuccess::from_result(&result).unwrap();
        assert_eq!(success.hint_id.as_deref(), Some("restartRecommended"));
    }

    #[test]
    fn test_reload_result_nonzero_code_is_failure() {
        let result = serde_json::json!({ "code": 1, "message": "connection lost" });
        let err = ReloadSuccess::from_result(&result).unwrap_err();
        assert_eq!(err.to_string(), "Reload failed: connection lost");
    }

    #[test]
    fn test_reload_result_missing_code_is_success() {
        let success = ReloadSuccess::from_result(&serde_json::json!({})).unwrap();
        assert_eq!(success, ReloadSuccess::default());
    }
}
