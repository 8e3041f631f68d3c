//! Debug Adapter Protocol surface
//!
//! Wire codec, message types, outbound event channel, and the serve loop
//! that dispatches front-end requests to the bridge session.

pub mod codec;
pub mod events;
pub mod server;
pub mod types;

pub use events::{EventSink, OutboundEvent, OutputCategory};
pub use server::{serve_stdio, BridgeServer, ServerConfig};
pub use types::*;
