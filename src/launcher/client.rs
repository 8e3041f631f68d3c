//! Launcher collaborator
//!
//! [`Launcher`] is the command surface the bridge addresses the running
//! application through; [`ProcessLauncher`] implements it against a spawned
//! launcher tool speaking the JSON-lines protocol in [`super::protocol`].

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{mpsc, oneshot};

use crate::common::{Error, Result};

use super::protocol::{self, DaemonMessage, DaemonRequest, LauncherEvent, ReloadSuccess};

/// Commands the bridge issues to the launcher
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Start the target application
    async fn start(
        &self,
        entry: &Path,
        device: Option<&str>,
        extra_args: &[String],
        start_paused: bool,
    ) -> Result<()>;

    /// Stop a running instance
    async fn stop(&self, app_id: &str) -> Result<()>;

    /// Reload or fully restart a running instance
    async fn restart(
        &self,
        app_id: &str,
        debug: bool,
        full_restart: bool,
        pause: bool,
    ) -> Result<ReloadSuccess>;

    /// Invoke a service extension on a running instance
    async fn call_extension(&self, app_id: &str, method: &str, params: Value) -> Result<Value>;

    /// Release launcher-side resources
    async fn dispose(&self);
}

/// Launcher backed by a spawned launcher-tool process
pub struct ProcessLauncher {
    /// Launcher subprocess, kept for shutdown
    child: Mutex<Child>,
    /// Buffered writer for the launcher's stdin
    writer: tokio::sync::Mutex<BufWriter<ChildStdin>>,
    /// Request id allocator
    next_id: AtomicU64,
    /// Requests awaiting a response
    pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value>>>>>,
    /// Per-request timeout
    request_timeout: Duration,
}

impl ProcessLauncher {
    /// Spawn the launcher tool and wire up its event stream
    ///
    /// Returns the launcher handle and the receiver of its unsolicited
    /// events, delivered in the order the tool emits them.
    pub fn spawn(
        path: &Path,
        args: &[String],
        request_timeout: Duration,
    ) -> Result<(Arc<Self>, mpsc::UnboundedReceiver<LauncherEvent>)> {
        let mut cmd = Command::new(path);
        cmd.args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        let mut child = cmd.spawn().map_err(|e| {
            Error::LauncherStartFailed(format!("Failed to start {}: {}", path.display(), e))
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::LauncherStartFailed("Failed to get launcher stdin".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::LauncherStartFailed("Failed to get launcher stdout".to_string()))?;

        let pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Result<Value>>>>> =
            Arc::new(Mutex::new(HashMap::new()));
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        // Reader task: route responses to waiters, events to the session
        let reader_pending = Arc::clone(&pending);
        tokio::spawn(async move {
            let mut lines = BufReader::new(stdout).lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim();
                        if line.is_empty() {
                            continue;
                        }
                        tracing::trace!(target: "launcher", "<<< {}", line);
                        match protocol::parse_line(line) {
                            Ok(DaemonMessage::Response { id, result }) => {
                                let waiter = reader_pending.lock().ok().and_then(|mut p| p.remove(&id));
                                match waiter {
                                    Some(tx) => {
                                        let _ = tx.send(result);
                                    }
                                    None => {
                                        tracing::warn!("response for unknown request id {}", id)
                                    }
                                }
                            }
                            Ok(DaemonMessage::Event(event)) => {
                                if event_tx.send(event).is_err() {
                                    break;
                                }
                            }
                            Err(e) => {
                                tracing::warn!("ignoring malformed launcher message: {}", e);
                            }
                        }
                    }
                    Ok(None) | Err(_) => break,
                }
            }

            // Launcher is gone; fail anything still waiting
            if let Ok(mut pending) = reader_pending.lock() {
                for (_, tx) in pending.drain() {
                    let _ = tx.send(Err(Error::LauncherCrashed));
                }
            }
            tracing::debug!("launcher event stream closed");
        });

        let launcher = Arc::new(Self {
            child: Mutex::new(child),
            writer: tokio::sync::Mutex::new(BufWriter::new(stdin)),
            next_id: AtomicU64::new(1),
            pending,
            request_timeout,
        });

        Ok((launcher, event_rx))
    }

    /// Send a request and await its response
    async fn request(&self, method: &str, params: Option<Value>) -> Result<Value> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let json = serde_json::to_string(&DaemonRequest {
            id,
            method: method.to_string(),
            params,
        })?;

        let (tx, rx) = oneshot::channel();
        self.pending
            .lock()
            .map_err(|_| Error::Internal("pending request map poisoned".to_string()))?
            .insert(id, tx);

        tracing::trace!(target: "launcher", ">>> {}", json);
        if let Err(e) = self.write_line(&json).await {
            // The waiter will never be answered; do not leave it for the
            // reader task to find
            self.forget_pending(id);
            return Err(Error::Io(e));
        }

        let response = tokio::time::timeout(self.request_timeout, rx)
            .await
            .map_err(|_| {
                self.forget_pending(id);
                Error::Timeout(self.request_timeout.as_secs())
            })?
            .map_err(|_| Error::LauncherCrashed)?;

        response.map_err(|e| match e {
            Error::LauncherProtocol(message) => Error::launcher_request_failed(method, &message),
            other => other,
        })
    }

    async fn write_line(&self, json: &str) -> std::io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await
    }

    fn forget_pending(&self, id: u64) {
        if let Ok(mut pending) = self.pending.lock() {
            pending.remove(&id);
        }
    }

    #[cfg(test)]
    fn pending_len(&self) -> usize {
        self.pending.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn start(
        &self,
        entry: &Path,
        device: Option<&str>,
        extra_args: &[String],
        start_paused: bool,
    ) -> Result<()> {
        let params = serde_json::json!({
            "entry": entry.to_string_lossy(),
            "deviceId": device,
            "args": extra_args,
            "startPaused": start_paused,
        });
        self.request("app.start", Some(params)).await?;
        Ok(())
    }

    async fn stop(&self, app_id: &str) -> Result<()> {
        self.request("app.stop", Some(serde_json::json!({ "appId": app_id })))
            .await?;
        Ok(())
    }

    async fn restart(
        &self,
        app_id: &str,
        debug: bool,
        full_restart: bool,
        pause: bool,
    ) -> Result<ReloadSuccess> {
        let params = serde_json::json!({
            "appId": app_id,
            "debug": debug,
            "fullRestart": full_restart,
            "pause": pause,
        });
        let result = self.request("app.restart", Some(params)).await?;
        ReloadSuccess::from_result(&result)
    }

    async fn call_extension(&self, app_id: &str, method: &str, params: Value) -> Result<Value> {
        let params = serde_json::json!({
            "appId": app_id,
            "methodName": method,
            "params": params,
        });
        self.request("app.callServiceExtension", Some(params)).await
    }

    async fn dispose(&self) {
        if let Ok(mut child) = self.child.lock() {
            let _ = child.start_kill();
        }
    }
}

impl Drop for ProcessLauncher {
    fn drop(&mut self) {
        // Best-effort kill; we cannot await in drop
        if let Ok(mut child) = self.child.lock() {
            let _ = child.start_kill();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_failure_reclaims_pending_entry() {
        // `true` exits immediately, closing its end of the stdin pipe, so
        // the next write fails without the reader ever seeing a response
        let (launcher, _events) =
            ProcessLauncher::spawn(Path::new("true"), &[], Duration::from_secs(5))
                .expect("spawn");
        tokio::time::sleep(Duration::from_millis(100)).await;

        launcher.request("app.stop", None).await.unwrap_err();
        assert_eq!(launcher.pending_len(), 0);
    }
}
