//! Bridge session
//!
//! Ties the four pieces together: shared session state, the source
//! mapper, the reload coordinator, and the extension router, composed
//! over the core debugging session. The serve loop feeds it front-end
//! requests and launcher events; everything it emits goes through the
//! event sink.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;

use crate::common::{Error, Result};
use crate::dap::events::EventSink;
use crate::dap::types::LaunchConfig;
use crate::launcher::{Launcher, LauncherEvent};

use super::core::CoreSession;
use super::paths::SourceMapper;
use super::reload::ReloadCoordinator;
use super::router::{ExtensionRouter, Routed};
use super::state::SharedState;

/// The session bridge between the DAP front-end and the launcher
pub struct BridgeSession {
    core: Box<dyn CoreSession>,
    launcher: Arc<dyn Launcher>,
    state: SharedState,
    events: EventSink,
    mapper: SourceMapper,
    reload: ReloadCoordinator,
    router: ExtensionRouter,
    config: LaunchConfig,
    /// Full debugging active (false for run-without-debugging)
    debug_mode: bool,
}

impl BridgeSession {
    pub fn new(
        core: Box<dyn CoreSession>,
        launcher: Arc<dyn Launcher>,
        events: EventSink,
        config: LaunchConfig,
    ) -> Result<Self> {
        let project_root = config.effective_project_root().ok_or_else(|| {
            Error::InvalidLaunchConfig("no project root, cwd, or program directory".to_string())
        })?;

        let debug_mode = !config.no_debug;
        let state = SharedState::new();
        let mapper = SourceMapper::new(state.clone(), project_root);
        let reload = ReloadCoordinator::new(
            Arc::clone(&launcher),
            state.clone(),
            events.clone(),
            debug_mode,
        );
        let router = ExtensionRouter::new(
            Arc::clone(&launcher),
            state.clone(),
            events.clone(),
            reload.clone(),
        );

        Ok(Self {
            core,
            launcher,
            state,
            events,
            mapper,
            reload,
            router,
            config,
            debug_mode,
        })
    }

    /// Ask the launcher to start the target application
    pub async fn start(&self) -> Result<()> {
        tracing::info!(
            program = %self.config.program.display(),
            device = ?self.config.device_id,
            debug = self.debug_mode,
            "starting target application"
        );
        self.launcher
            .start(
                &self.config.program,
                self.config.device_id.as_deref(),
                &self.config.args,
                self.debug_mode,
            )
            .await
    }

    /// Lifecycle tracking: apply one launcher event
    pub async fn handle_launcher_event(&mut self, event: LauncherEvent) -> Result<()> {
        match event {
            LauncherEvent::AppStarted { app_id } => {
                tracing::info!(app_id = %app_id, "instance started");
                self.state.set_app_started(app_id);
            }
            LauncherEvent::DebugPort {
                app_id,
                ws_uri,
                base_uri,
            } => {
                tracing::info!(app_id = %app_id, ws_uri = %ws_uri, base_uri = ?base_uri, "inspection endpoint available");
                self.state.set_debug_port(ws_uri.clone(), base_uri);
                if self.debug_mode {
                    self.core.connect(&ws_uri).await?;
                }
            }
            LauncherEvent::AppStopped { app_id } => {
                tracing::info!(app_id = %app_id, "instance stopped");
                self.state.clear_app();
                self.launcher.dispose().await;
            }
            LauncherEvent::Progress { message, finished } => {
                self.events.progress(message, finished);
            }
            LauncherEvent::Unhandled { raw } => {
                tracing::debug!(%raw, "unhandled launcher message");
                self.events.console(raw.to_string());
            }
        }
        Ok(())
    }

    /// Outbound path translation: local path to identifier candidates
    pub fn expand_source(&self, local: &Path) -> Vec<String> {
        self.mapper.expand(self.core.as_ref(), local)
    }

    /// Inbound path translation: instance identifier to local path
    pub fn resolve_source(&self, uri: &str) -> Option<PathBuf> {
        self.mapper.resolve(self.core.as_ref(), uri)
    }

    /// Handle a custom protocol command
    ///
    /// Recognized commands are dispatched fire-and-forget and answered
    /// immediately; anything else falls through to the core session.
    pub async fn custom_request(&mut self, command: &str, args: Value) -> Result<Value> {
        match self.router.handle(command, args) {
            Routed::Dispatched(_) => Ok(Value::Null),
            Routed::PassThrough(args) => self.core.handle_custom_command(command, args).await,
        }
    }

    /// Protocol restart request: hot reload, audit event, then the core
    /// session's own restart handling
    pub async fn restart_request(&mut self) -> Result<()> {
        self.reload.hot_reload();
        self.events.restart_observed();
        self.core.restart().await
    }

    /// Protocol disconnect: stop the running instance first, then the
    /// core session's disconnect handling
    pub async fn disconnect(&mut self) -> Result<()> {
        if let Some(app_id) = self.state.app_id() {
            if let Err(e) = self.launcher.stop(&app_id).await {
                tracing::warn!(app_id = %app_id, "stop on disconnect failed: {}", e);
            }
        }
        self.core.disconnect().await
    }

    /// Shared session state handle
    pub fn state(&self) -> &SharedState {
        &self.state
    }

    /// Reload coordinator handle
    pub fn reload(&self) -> &ReloadCoordinator {
        &self.reload
    }
}
