//! Live reload coordination
//!
//! Reload and full-restart are fire-and-forget: the protocol dispatcher
//! never blocks on them and never sees their errors. Each invocation reads
//! the instance id at call time, runs as an independent task, and reports
//! its outcome exactly once through the event sink. Concurrent requests
//! are not queued or de-duplicated; the launcher serializes against the
//! running instance.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::common::Result;
use crate::dap::events::EventSink;
use crate::launcher::{Launcher, ReloadSuccess};

use super::state::SharedState;

/// Which flavor of reload to request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReloadKind {
    /// Incremental code update
    Hot,
    /// Full restart of target state
    Full,
}

impl ReloadKind {
    fn is_full(self) -> bool {
        matches!(self, Self::Full)
    }

    fn describe(self) -> &'static str {
        match self {
            Self::Hot => "hot reload",
            Self::Full => "full restart",
        }
    }
}

/// Issues reload commands and reports their outcomes as events
#[derive(Clone)]
pub struct ReloadCoordinator {
    launcher: Arc<dyn Launcher>,
    state: SharedState,
    events: EventSink,
    /// Full debugging active (false for run-without-debugging)
    debug_mode: bool,
}

impl ReloadCoordinator {
    pub fn new(
        launcher: Arc<dyn Launcher>,
        state: SharedState,
        events: EventSink,
        debug_mode: bool,
    ) -> Self {
        Self {
            launcher,
            state,
            events,
            debug_mode,
        }
    }

    /// Request an incremental reload of the running instance
    ///
    /// Returns the task handle when a reload was dispatched, `None` when
    /// no instance is running (a normal condition, not an error).
    pub fn hot_reload(&self) -> Option<JoinHandle<()>> {
        self.dispatch(ReloadKind::Hot)
    }

    /// Request a full restart of the running instance's state
    pub fn full_restart(&self) -> Option<JoinHandle<()>> {
        self.dispatch(ReloadKind::Full)
    }

    fn dispatch(&self, kind: ReloadKind) -> Option<JoinHandle<()>> {
        let Some(app_id) = self.state.app_id() else {
            tracing::debug!("no running instance, skipping {}", kind.describe());
            return None;
        };

        let launcher = Arc::clone(&self.launcher);
        let events = self.events.clone();
        let debug = self.debug_mode;

        Some(tokio::spawn(async move {
            // Pause after reload only under full debugging
            let result = launcher
                .restart(&app_id, debug, kind.is_full(), debug)
                .await;
            report_outcome(kind, result, &events);
        }))
    }
}

/// The single funnel every reload outcome passes through
///
/// Success with a hint (hot reload only) becomes a hint event; failure
/// becomes one diagnostic event on the error stream. Nothing is reported
/// twice and nothing is dropped.
fn report_outcome(kind: ReloadKind, result: Result<ReloadSuccess>, events: &EventSink) {
    match result {
        Ok(success) => {
            tracing::info!("{} succeeded", kind.describe());
            if kind == ReloadKind::Hot {
                if let Some(hint_id) = success.hint_id {
                    events.hint(hint_id, success.hint_message.unwrap_or_default());
                }
            }
        }
        Err(e) => {
            tracing::warn!("{} failed: {}", kind.describe(), e);
            events.diagnostic(e.to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::Error;
    use crate::dap::events::{OutboundEvent, OutputCategory};

    #[test]
    fn test_hot_reload_success_hint_event() {
        let (sink, mut rx) = EventSink::channel();
        report_outcome(
            ReloadKind::Hot,
            Ok(ReloadSuccess {
                hint_id: Some("restartRecommended".to_string()),
                hint_message: Some("A full restart is needed".to_string()),
            }),
            &sink,
        );

        match rx.try_recv().unwrap() {
            OutboundEvent::Hint {
                hint_id,
                hint_message,
            } => {
                assert_eq!(hint_id, "restartRecommended");
                assert_eq!(hint_message, "A full restart is needed");
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_full_restart_success_emits_no_hint() {
        let (sink, mut rx) = EventSink::channel();
        report_outcome(
            ReloadKind::Full,
            Ok(ReloadSuccess {
                hint_id: Some("restartRecommended".to_string()),
                hint_message: Some("ignored".to_string()),
            }),
            &sink,
        );

        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_failure_is_one_stderr_event() {
        let (sink, mut rx) = EventSink::channel();
        report_outcome(
            ReloadKind::Hot,
            Err(Error::ReloadFailed("connection lost".to_string())),
            &sink,
        );

        match rx.try_recv().unwrap() {
            OutboundEvent::Output { category, output } => {
                assert_eq!(category, OutputCategory::Stderr);
                assert!(output.contains("connection lost"));
            }
            other => panic!("unexpected event: {:?}", other),
        }
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_success_without_hint_is_silent() {
        let (sink, mut rx) = EventSink::channel();
        report_outcome(ReloadKind::Hot, Ok(ReloadSuccess::default()), &sink);
        assert!(rx.try_recv().is_err());
    }
}
