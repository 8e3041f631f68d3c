//! Logging and tracing configuration
//!
//! The adapter speaks DAP over stdout, so stdout must stay clean: logs go
//! to stderr and optionally to a file (either an explicit path or the
//! platform data dir).

use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};

use super::paths;

/// Initialize tracing for the adapter process
///
/// Log level is controlled by `RUST_LOG`; default is INFO for this crate,
/// WARN for dependencies. Returns the file-writer guard (logging stops
/// flushing when it is dropped) together with the log file path, if file
/// logging could be set up.
pub fn init(log_file: Option<&Path>) -> Option<(WorkerGuard, PathBuf)> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("reload_dap=info,warn"));

    let log_path = log_file.map(Path::to_path_buf).or_else(default_log_path);

    if let Some(path) = log_path {
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        match std::fs::OpenOptions::new().create(true).append(true).open(&path) {
            Ok(file) => {
                let (writer, guard) = tracing_appender::non_blocking(file);
                let file_layer = fmt::layer()
                    .with_writer(writer)
                    .with_ansi(false)
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true);

                tracing_subscriber::registry()
                    .with(filter)
                    .with(stderr_layer())
                    .with(file_layer)
                    .init();

                return Some((guard, path));
            }
            Err(e) => {
                eprintln!("Warning: could not open log file {}: {}", path.display(), e);
            }
        }
    }

    // Fallback: stderr only
    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer())
        .init();

    None
}

fn stderr_layer<S>() -> impl tracing_subscriber::Layer<S>
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
}

/// Default log file location under the platform data dir
fn default_log_path() -> Option<PathBuf> {
    paths::log_dir().map(|d| d.join("adapter.log"))
}
