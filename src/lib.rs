//! reload-dap - DAP bridge for hot-reload application launchers
//!
//! Sits between a DAP front-end and an external launcher tool that runs
//! the target application: translates source paths across the device
//! root boundary, coordinates hot reload and full restart, and routes
//! custom service-extension commands, reporting asynchronous outcomes as
//! protocol events.

pub mod common;
pub mod dap;
pub mod launcher;
pub mod session;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
pub use session::BridgeSession;
