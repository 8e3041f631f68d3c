//! Core debugging session capability
//!
//! The generic debugging session (breakpoints, stack inspection,
//! evaluation, base protocol machinery) is an external collaborator. The
//! bridge composes over it through this trait and calls through except
//! where it intercepts: path translation in both directions and the custom
//! commands it recognizes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use crate::common::{Error, Result};

/// Capability surface of the underlying debugging session
#[async_trait]
pub trait CoreSession: Send {
    /// Base identifier candidates for a local source path, in probe order
    fn expand_source_path(&self, local: &Path) -> Vec<String>;

    /// Default resolution of an identifier reported by the running
    /// instance, assuming it shares the local root and native separators
    fn resolve_remote_uri(&self, uri: &str) -> Option<PathBuf>;

    /// Connect to the instance's inspection endpoint
    async fn connect(&mut self, endpoint_uri: &str) -> Result<()>;

    /// Default handling for custom commands the bridge does not recognize
    async fn handle_custom_command(&mut self, command: &str, args: Value) -> Result<Value>;

    /// Base disconnect handling
    async fn disconnect(&mut self) -> Result<()>;

    /// Base restart handling
    async fn restart(&mut self) -> Result<()>;
}

/// Default local-only core session
///
/// Produces a single file-URI candidate per path and resolves file URIs
/// against the native filesystem convention. Custom commands are rejected.
#[derive(Debug, Default)]
pub struct LocalCore {
    connected_to: Option<String>,
}

impl LocalCore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Endpoint of the last successful connect, if any
    pub fn endpoint(&self) -> Option<&str> {
        self.connected_to.as_deref()
    }
}

#[async_trait]
impl CoreSession for LocalCore {
    fn expand_source_path(&self, local: &Path) -> Vec<String> {
        vec![super::paths::path_to_file_uri(local)]
    }

    fn resolve_remote_uri(&self, uri: &str) -> Option<PathBuf> {
        // Native interpretation only; forward-slash handling is layered on
        // top by the source mapper
        let path = uri.strip_prefix("file://")?;
        Some(PathBuf::from(path))
    }

    async fn connect(&mut self, endpoint_uri: &str) -> Result<()> {
        tracing::info!(endpoint = endpoint_uri, "connecting to inspection endpoint");
        self.connected_to = Some(endpoint_uri.to_string());
        Ok(())
    }

    async fn handle_custom_command(&mut self, command: &str, _args: Value) -> Result<Value> {
        Err(Error::UnsupportedCommand(command.to_string()))
    }

    async fn disconnect(&mut self) -> Result<()> {
        self.connected_to = None;
        Ok(())
    }

    async fn restart(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_core_rejects_custom_commands() {
        let mut core = LocalCore::new();
        let err = core
            .handle_custom_command("frobnicate", Value::Null)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedCommand(_)));
    }

    #[tokio::test]
    async fn test_local_core_tracks_connection_endpoint() {
        let mut core = LocalCore::new();
        assert!(core.endpoint().is_none());

        core.connect("ws://host:1/ws").await.unwrap();
        assert_eq!(core.endpoint(), Some("ws://host:1/ws"));

        core.disconnect().await.unwrap();
        assert!(core.endpoint().is_none());
    }

    #[test]
    fn test_local_core_resolves_file_uri() {
        let core = LocalCore::new();
        let path = core.resolve_remote_uri("file:///proj/lib/main.x").unwrap();
        assert_eq!(path, PathBuf::from("/proj/lib/main.x"));
        assert!(core.resolve_remote_uri("package:thing/main.x").is_none());
    }
}
