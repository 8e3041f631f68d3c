//! Session bridge components
//!
//! State tracking, path reconciliation, reload coordination, and custom
//! command routing, composed over the core debugging session.

pub mod bridge;
pub mod core;
pub mod paths;
pub mod reload;
pub mod router;
pub mod state;

pub use bridge::BridgeSession;
pub use core::{CoreSession, LocalCore};
pub use paths::SourceMapper;
pub use reload::ReloadCoordinator;
pub use router::{ExtensionRouter, Routed, PLATFORM_OVERRIDE_EXTENSION};
pub use state::{SessionState, SharedState};
