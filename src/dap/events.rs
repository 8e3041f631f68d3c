//! Outbound protocol events
//!
//! Every asynchronous operation in the bridge reports its outcome through
//! the [`EventSink`]. Funneling all reporting through one channel keeps the
//! discipline of exactly-one report per outcome in a single place instead
//! of at each call site.
//!
//! Late results (a reload completing after the instance stopped) are still
//! emitted; the front-end may receive a stale event. Suppressing them would
//! need teardown-aware state here; current behavior keeps the sink
//! stateless.

use serde_json::Value;
use tokio::sync::mpsc;

use super::types::{HintEventBody, OutputEventBody, ProgressEventBody};

/// Events emitted to the debugging front-end, beyond plain responses
#[derive(Debug, Clone, PartialEq)]
pub enum OutboundEvent {
    /// Launcher progress, re-emitted as `appProgress`
    Progress {
        message: Option<String>,
        finished: bool,
    },
    /// Advisory hint from a successful hot reload, emitted as `reloadHint`
    Hint { hint_id: String, hint_message: String },
    /// A restart request was observed (audit event, no payload)
    RestartObserved,
    /// Standard `output` event
    Output { category: OutputCategory, output: String },
}

/// Output event categories used by the bridge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputCategory {
    Console,
    Stderr,
}

impl OutputCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Console => "console",
            Self::Stderr => "stderr",
        }
    }
}

/// Cloneable sender half of the outbound event channel
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<OutboundEvent>,
}

impl EventSink {
    /// Create a sink together with the receiver the serve loop drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<OutboundEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    /// Emit an event; dropped silently if the serve loop is gone
    pub fn emit(&self, event: OutboundEvent) {
        if self.tx.send(event).is_err() {
            tracing::debug!("event sink closed, dropping event");
        }
    }

    pub fn progress(&self, message: Option<String>, finished: bool) {
        self.emit(OutboundEvent::Progress { message, finished });
    }

    pub fn hint(&self, hint_id: String, hint_message: String) {
        self.emit(OutboundEvent::Hint { hint_id, hint_message });
    }

    pub fn restart_observed(&self) {
        self.emit(OutboundEvent::RestartObserved);
    }

    /// Report a failure message on the error stream
    pub fn diagnostic(&self, message: impl Into<String>) {
        let mut output = message.into();
        if !output.ends_with('\n') {
            output.push('\n');
        }
        self.emit(OutboundEvent::Output {
            category: OutputCategory::Stderr,
            output,
        });
    }

    /// Raw diagnostic passthrough on the console stream
    pub fn console(&self, output: impl Into<String>) {
        let mut output = output.into();
        if !output.ends_with('\n') {
            output.push('\n');
        }
        self.emit(OutboundEvent::Output {
            category: OutputCategory::Console,
            output,
        });
    }
}

impl OutboundEvent {
    /// Wire event name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Progress { .. } => "appProgress",
            Self::Hint { .. } => "reloadHint",
            Self::RestartObserved => "restartObserved",
            Self::Output { .. } => "output",
        }
    }

    /// Wire event body, if any
    pub fn body(&self) -> Option<Value> {
        let body = match self {
            Self::Progress { message, finished } => serde_json::to_value(ProgressEventBody {
                message: message.clone(),
                finished: *finished,
            }),
            Self::Hint { hint_id, hint_message } => serde_json::to_value(HintEventBody {
                hint_id: hint_id.clone(),
                hint_message: hint_message.clone(),
            }),
            Self::RestartObserved => return None,
            Self::Output { category, output } => serde_json::to_value(OutputEventBody {
                category: category.as_str().to_string(),
                output: output.clone(),
            }),
        };
        body.ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_is_stderr_with_newline() {
        let (sink, mut rx) = EventSink::channel();
        sink.diagnostic("connection lost");

        let event = rx.try_recv().unwrap();
        assert_eq!(
            event,
            OutboundEvent::Output {
                category: OutputCategory::Stderr,
                output: "connection lost\n".to_string(),
            }
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_wire_names_and_bodies() {
        let hint = OutboundEvent::Hint {
            hint_id: "restartRecommended".to_string(),
            hint_message: "Some changes need a full restart".to_string(),
        };
        assert_eq!(hint.name(), "reloadHint");
        assert_eq!(
            hint.body().unwrap()["hintId"],
            serde_json::json!("restartRecommended")
        );

        assert_eq!(OutboundEvent::RestartObserved.name(), "restartObserved");
        assert!(OutboundEvent::RestartObserved.body().is_none());
    }

    #[test]
    fn test_output_body_has_wire_fields() {
        let event = OutboundEvent::Output {
            category: OutputCategory::Stderr,
            output: "connection lost\n".to_string(),
        };
        assert_eq!(
            event.body().unwrap(),
            serde_json::json!({ "category": "stderr", "output": "connection lost\n" })
        );

        let progress = OutboundEvent::Progress {
            message: None,
            finished: true,
        };
        // The optional message is omitted, not serialized as null
        assert_eq!(
            progress.body().unwrap(),
            serde_json::json!({ "finished": true })
        );
    }
}
