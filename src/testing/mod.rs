//! Test doubles for the launcher collaborator
//!
//! `MockLauncher` records every command and plays back scripted results,
//! so unit and integration tests can drive the bridge without a real
//! launcher process.

use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::mpsc;

use crate::common::Result;
use crate::dap::events::OutboundEvent;
use crate::launcher::{Launcher, ReloadSuccess};

/// One command the mock launcher received
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCall {
    Start {
        entry: PathBuf,
        device: Option<String>,
        extra_args: Vec<String>,
        start_paused: bool,
    },
    Stop {
        app_id: String,
    },
    Restart {
        app_id: String,
        debug: bool,
        full_restart: bool,
        pause: bool,
    },
    CallExtension {
        app_id: String,
        method: String,
        params: Value,
    },
    Dispose,
}

/// Scripted launcher for tests
#[derive(Default)]
pub struct MockLauncher {
    calls: Mutex<Vec<RecordedCall>>,
    restart_results: Mutex<VecDeque<Result<ReloadSuccess>>>,
    extension_results: Mutex<VecDeque<Result<Value>>>,
}

impl MockLauncher {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the result of the next restart call (defaults to plain
    /// success when the queue is empty)
    pub fn push_restart_result(&self, result: Result<ReloadSuccess>) {
        self.restart_results.lock().unwrap().push_back(result);
    }

    /// Queue the result of the next extension call (defaults to null)
    pub fn push_extension_result(&self, result: Result<Value>) {
        self.extension_results.lock().unwrap().push_back(result);
    }

    /// All commands received so far
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, call: RecordedCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Launcher for MockLauncher {
    async fn start(
        &self,
        entry: &Path,
        device: Option<&str>,
        extra_args: &[String],
        start_paused: bool,
    ) -> Result<()> {
        self.record(RecordedCall::Start {
            entry: entry.to_path_buf(),
            device: device.map(String::from),
            extra_args: extra_args.to_vec(),
            start_paused,
        });
        Ok(())
    }

    async fn stop(&self, app_id: &str) -> Result<()> {
        self.record(RecordedCall::Stop {
            app_id: app_id.to_string(),
        });
        Ok(())
    }

    async fn restart(
        &self,
        app_id: &str,
        debug: bool,
        full_restart: bool,
        pause: bool,
    ) -> Result<ReloadSuccess> {
        self.record(RecordedCall::Restart {
            app_id: app_id.to_string(),
            debug,
            full_restart,
            pause,
        });
        self.restart_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ReloadSuccess::default()))
    }

    async fn call_extension(&self, app_id: &str, method: &str, params: Value) -> Result<Value> {
        self.record(RecordedCall::CallExtension {
            app_id: app_id.to_string(),
            method: method.to_string(),
            params,
        });
        self.extension_results
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(Value::Null))
    }

    async fn dispose(&self) {
        self.record(RecordedCall::Dispose);
    }
}

/// Drain everything currently buffered in an event receiver
pub fn drain_events(rx: &mut mpsc::UnboundedReceiver<OutboundEvent>) -> Vec<OutboundEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}
