//! Custom command routing
//!
//! Dispatches protocol-level custom commands to the running instance.
//! Every branch that needs a running instance is a silent no-op when none
//! is running: commands can legitimately arrive before launch completes or
//! after the instance stops. Unrecognized commands pass through to the
//! core session's default handling.

use std::sync::Arc;

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::dap::events::EventSink;
use crate::launcher::Launcher;

use super::reload::ReloadCoordinator;
use super::state::SharedState;

/// Service extension controlling the platform override on the instance
pub const PLATFORM_OVERRIDE_EXTENSION: &str = "ext.ui.platformOverride";

/// Result of routing a custom command
pub enum Routed {
    /// Recognized; any work runs as a detached task
    Dispatched(Option<JoinHandle<()>>),
    /// Not recognized here; delegate to the core session
    PassThrough(Value),
}

/// Routes custom protocol commands to launcher operations
#[derive(Clone)]
pub struct ExtensionRouter {
    launcher: Arc<dyn Launcher>,
    state: SharedState,
    events: EventSink,
    reload: ReloadCoordinator,
}

impl ExtensionRouter {
    pub fn new(
        launcher: Arc<dyn Launcher>,
        state: SharedState,
        events: EventSink,
        reload: ReloadCoordinator,
    ) -> Self {
        Self {
            launcher,
            state,
            events,
            reload,
        }
    }

    /// Route one custom command
    ///
    /// Returns synchronously; recognized commands do their work in
    /// detached tasks and report failures through the event sink.
    pub fn handle(&self, command: &str, args: Value) -> Routed {
        match command {
            "serviceExtension" => Routed::Dispatched(self.service_extension(args)),
            "togglePlatform" => Routed::Dispatched(self.toggle_platform()),
            "hotReload" => Routed::Dispatched(self.reload.hot_reload()),
            "fullRestart" => Routed::Dispatched(self.reload.full_restart()),
            _ => Routed::PassThrough(args),
        }
    }

    /// Invoke a named service extension; success is discarded, failure is
    /// reported as a diagnostic
    fn service_extension(&self, args: Value) -> Option<JoinHandle<()>> {
        let app_id = self.state.app_id()?;

        let Some(extension) = args
            .get("type")
            .and_then(Value::as_str)
            .map(String::from)
        else {
            self.events
                .diagnostic("serviceExtension requires a 'type' argument");
            return None;
        };
        let params = args.get("params").cloned().unwrap_or(Value::Null);

        let launcher = Arc::clone(&self.launcher);
        let events = self.events.clone();
        Some(tokio::spawn(async move {
            if let Err(e) = launcher.call_extension(&app_id, &extension, params).await {
                events.diagnostic(e.to_string());
            }
        }))
    }

    /// Flip the platform override between android and iOS
    ///
    /// Any current value other than "android" (including unrecognized
    /// ones) toggles to "android".
    fn toggle_platform(&self) -> Option<JoinHandle<()>> {
        let app_id = self.state.app_id()?;

        let launcher = Arc::clone(&self.launcher);
        let events = self.events.clone();
        Some(tokio::spawn(async move {
            let current = launcher
                .call_extension(&app_id, PLATFORM_OVERRIDE_EXTENSION, Value::Null)
                .await;

            let current = match current {
                Ok(value) => value
                    .get("value")
                    .and_then(Value::as_str)
                    .map(String::from),
                Err(e) => {
                    events.diagnostic(e.to_string());
                    return;
                }
            };

            let next = if current.as_deref() == Some("android") {
                "iOS"
            } else {
                "android"
            };

            let params = serde_json::json!({ "value": next });
            if let Err(e) = launcher
                .call_extension(&app_id, PLATFORM_OVERRIDE_EXTENSION, params)
                .await
            {
                events.diagnostic(e.to_string());
            }
        }))
    }
}
