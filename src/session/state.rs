//! Shared session state
//!
//! One instance per debugging session. Written only by the lifecycle
//! event handler; every other component takes read-only snapshots. Locks
//! are never held across an await.

use std::sync::{Arc, Mutex};

/// Identity and addressing of the running target instance
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    /// Launcher-assigned identifier of the running instance
    pub app_id: Option<String>,
    /// Address of the instance's live inspection endpoint
    pub vm_service_uri: Option<String>,
    /// Root prefix the instance uses for its own resource identifiers
    pub device_root: Option<String>,
}

/// Session state behind a shared handle
#[derive(Debug, Clone, Default)]
pub struct SharedState {
    inner: Arc<Mutex<SessionState>>,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the started instance
    pub fn set_app_started(&self, app_id: String) {
        self.lock().app_id = Some(app_id);
    }

    /// Record the inspection endpoint and device root
    pub fn set_debug_port(&self, vm_service_uri: String, device_root: Option<String>) {
        let mut state = self.lock();
        state.vm_service_uri = Some(vm_service_uri);
        state.device_root = device_root;
    }

    /// Clear the instance identity on stop
    ///
    /// Endpoint fields are left in place; a late callback may still want
    /// them, and the whole state is discarded at session teardown anyway.
    pub fn clear_app(&self) {
        self.lock().app_id = None;
    }

    /// Current instance id, if one is running
    pub fn app_id(&self) -> Option<String> {
        self.lock().app_id.clone()
    }

    /// Current device root, if known
    pub fn device_root(&self) -> Option<String> {
        self.lock().device_root.clone()
    }

    /// Read-only copy of the whole state
    pub fn snapshot(&self) -> SessionState {
        self.lock().clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        // A poisoned lock means a panic elsewhere already ended the
        // session; propagating the state is still the least-bad option
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lifecycle_transitions() {
        let state = SharedState::new();
        assert!(state.app_id().is_none());

        state.set_app_started("app1".to_string());
        assert_eq!(state.app_id().as_deref(), Some("app1"));

        state.set_debug_port(
            "ws://host:1/ws".to_string(),
            Some("file:///data/app/".to_string()),
        );
        let snapshot = state.snapshot();
        assert_eq!(snapshot.vm_service_uri.as_deref(), Some("ws://host:1/ws"));
        assert_eq!(snapshot.device_root.as_deref(), Some("file:///data/app/"));

        state.clear_app();
        assert!(state.app_id().is_none());
        // Endpoint survives the stop; only identity is cleared
        assert!(state.snapshot().vm_service_uri.is_some());
    }
}
