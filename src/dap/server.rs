//! DAP serve loop
//!
//! One consumer loop multiplexes the three inputs: front-end requests,
//! launcher events, and outbound events from asynchronous operations.
//! Fire-and-forget work never blocks a command response; its outcome
//! arrives later through the event channel.

use std::path::PathBuf;
use std::time::Duration;

use serde_json::Value;
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::sync::mpsc;

use crate::common::{Error, Result};
use crate::launcher::{LauncherEvent, ProcessLauncher};
use crate::session::{BridgeSession, LocalCore};

use super::codec;
use super::events::{EventSink, OutboundEvent};
use super::types::{Capabilities, EventMessage, LaunchConfig, RequestMessage, ResponseMessage};

/// Launcher settings the serve loop needs to start a session
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to the launcher tool executable
    pub launcher_path: PathBuf,
    /// Extra arguments for the launcher tool
    pub launcher_args: Vec<String>,
    /// Per-request timeout against the launcher
    pub request_timeout: Duration,
}

/// Sequenced writer for responses and events
pub struct DapWriter<W> {
    writer: W,
    seq: i64,
}

impl<W: AsyncWrite + Unpin> DapWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, seq: 1 }
    }

    fn next_seq(&mut self) -> i64 {
        let seq = self.seq;
        self.seq += 1;
        seq
    }

    /// Send a response to a request
    pub async fn send_response(
        &mut self,
        request: &RequestMessage,
        success: bool,
        message: Option<String>,
        body: Option<Value>,
    ) -> Result<()> {
        let response = ResponseMessage {
            seq: self.next_seq(),
            message_type: "response".to_string(),
            request_seq: request.seq,
            success,
            command: request.command.clone(),
            message,
            body,
        };
        let json = serde_json::to_string(&response)?;
        tracing::trace!(target: "dap", ">>> {}", json);
        codec::write_message(&mut self.writer, &json).await
    }

    /// Send an event
    pub async fn send_event(&mut self, event: &str, body: Option<Value>) -> Result<()> {
        let message = EventMessage {
            seq: self.next_seq(),
            message_type: "event".to_string(),
            event: event.to_string(),
            body,
        };
        let json = serde_json::to_string(&message)?;
        tracing::trace!(target: "dap", ">>> {}", json);
        codec::write_message(&mut self.writer, &json).await
    }
}

/// The adapter server: owns the session and the serve loop
pub struct BridgeServer<R, W> {
    reader: R,
    writer: DapWriter<W>,
    config: ServerConfig,
    session: Option<BridgeSession>,
    launcher_events: Option<mpsc::UnboundedReceiver<LauncherEvent>>,
    events: EventSink,
    event_rx: mpsc::UnboundedReceiver<OutboundEvent>,
}

impl<R, W> BridgeServer<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W, config: ServerConfig) -> Self {
        let (events, event_rx) = EventSink::channel();
        Self {
            reader,
            writer: DapWriter::new(writer),
            config,
            session: None,
            launcher_events: None,
            events,
            event_rx,
        }
    }

    /// Run until the front-end disconnects
    pub async fn run(&mut self) -> Result<()> {
        loop {
            tokio::select! {
                msg = codec::read_message(&mut self.reader) => {
                    let msg = match msg {
                        Ok(msg) => msg,
                        Err(Error::Disconnected) => break,
                        Err(e) => return Err(e),
                    };
                    tracing::trace!(target: "dap", "<<< {}", msg);
                    let request: RequestMessage = match serde_json::from_str(&msg) {
                        Ok(request) => request,
                        Err(e) => {
                            tracing::warn!("ignoring malformed request: {}", e);
                            continue;
                        }
                    };
                    if self.handle_request(request).await? {
                        break;
                    }
                }
                event = recv_launcher_event(&mut self.launcher_events) => {
                    match (event, &mut self.session) {
                        (Some(event), Some(session)) => {
                            if let Err(e) = session.handle_launcher_event(event).await {
                                tracing::warn!("launcher event handling failed: {}", e);
                            }
                        }
                        (Some(event), None) => {
                            tracing::debug!(?event, "launcher event without session");
                        }
                        (None, _) => {
                            // Launcher stream closed; stop polling it
                            self.launcher_events = None;
                        }
                    }
                }
                Some(event) = self.event_rx.recv() => {
                    self.writer.send_event(event.name(), event.body()).await?;
                }
            }
        }

        // Teardown: stop a still-running instance
        if let Some(mut session) = self.session.take() {
            let _ = session.disconnect().await;
        }
        Ok(())
    }

    /// Handle one front-end request; returns true when the session should
    /// end (disconnect)
    async fn handle_request(&mut self, request: RequestMessage) -> Result<bool> {
        let args = request.arguments.clone().unwrap_or(Value::Null);

        match request.command.as_str() {
            "initialize" => {
                let body = serde_json::to_value(Capabilities::default())?;
                self.writer
                    .send_response(&request, true, None, Some(body))
                    .await?;
                self.writer.send_event("initialized", None).await?;
            }

            "launch" => match self.handle_launch(args).await {
                Ok(()) => {
                    self.writer.send_response(&request, true, None, None).await?;
                }
                Err(e) => {
                    self.writer
                        .send_response(&request, false, Some(e.to_string()), None)
                        .await?;
                }
            },

            "configurationDone" => {
                self.writer.send_response(&request, true, None, None).await?;
            }

            "restart" => {
                match &mut self.session {
                    Some(session) => {
                        if let Err(e) = session.restart_request().await {
                            tracing::warn!("restart handling failed: {}", e);
                        }
                    }
                    None => tracing::debug!("restart request before launch"),
                }
                self.writer.send_response(&request, true, None, None).await?;
            }

            "disconnect" => {
                if let Some(session) = &mut self.session {
                    if let Err(e) = session.disconnect().await {
                        tracing::warn!("disconnect handling failed: {}", e);
                    }
                }
                self.session = None;
                self.writer.send_response(&request, true, None, None).await?;
                return Ok(true);
            }

            command => match &mut self.session {
                Some(session) => {
                    match session.custom_request(command, args).await {
                        Ok(body) => {
                            let body = if body.is_null() { None } else { Some(body) };
                            self.writer.send_response(&request, true, None, body).await?;
                        }
                        Err(e) => {
                            self.writer
                                .send_response(&request, false, Some(e.to_string()), None)
                                .await?;
                        }
                    }
                }
                // Instance-addressed commands before launch are normal
                // no-ops, not faults
                None if matches!(
                    command,
                    "serviceExtension" | "togglePlatform" | "hotReload" | "fullRestart"
                ) =>
                {
                    self.writer.send_response(&request, true, None, None).await?;
                }
                None => {
                    self.writer
                        .send_response(
                            &request,
                            false,
                            Some(Error::NotLaunched.to_string()),
                            None,
                        )
                        .await?;
                }
            },
        }

        Ok(false)
    }

    /// Spawn the launcher and start the bridge session
    async fn handle_launch(&mut self, args: Value) -> Result<()> {
        if self.session.is_some() {
            return Err(Error::Protocol("session already launched".to_string()));
        }

        let config: LaunchConfig = serde_json::from_value(args)
            .map_err(|e| Error::InvalidLaunchConfig(e.to_string()))?;

        let (launcher, launcher_events) = ProcessLauncher::spawn(
            &self.config.launcher_path,
            &self.config.launcher_args,
            self.config.request_timeout,
        )?;

        let session = BridgeSession::new(
            Box::new(LocalCore::new()),
            launcher,
            self.events.clone(),
            config,
        )?;
        session.start().await?;

        self.launcher_events = Some(launcher_events);
        self.session = Some(session);
        Ok(())
    }
}

/// Await the next launcher event, pending forever while no stream exists
async fn recv_launcher_event(
    events: &mut Option<mpsc::UnboundedReceiver<LauncherEvent>>,
) -> Option<LauncherEvent> {
    match events {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Serve DAP over the process's stdio
pub async fn serve_stdio(config: ServerConfig) -> Result<()> {
    let reader = BufReader::new(tokio::io::stdin());
    let writer = tokio::io::stdout();
    BridgeServer::new(reader, writer, config).run().await
}
