//! Launcher collaborator: command surface and event stream
//!
//! The launcher is an external tool that starts/stops/restarts the target
//! application and multiplexes its structured event stream. The bridge
//! only consumes that stream and issues commands; the tool's internals are
//! out of scope.

pub mod client;
pub mod protocol;

pub use client::{Launcher, ProcessLauncher};
pub use protocol::{LauncherEvent, ReloadSuccess};
