//! reload-dap - DAP bridge for hot-reload application launchers
//!
//! Speaks DAP over stdio to the debugging front-end and drives an
//! external launcher tool that runs the target application.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use reload_dap::common::{config::Config, logging};
use reload_dap::dap::{serve_stdio, ServerConfig};

#[derive(Parser)]
#[command(name = "reload-dap", about = "DAP bridge for hot-reload application launchers")]
#[command(version, long_about = None)]
struct Cli {
    /// Path to the launcher tool (overrides config and PATH search)
    #[arg(long)]
    launcher: Option<PathBuf>,

    /// Extra argument passed to the launcher tool (repeatable)
    #[arg(long = "launcher-arg")]
    launcher_args: Vec<String>,

    /// Log file path (defaults to the platform data dir)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Stdout carries the protocol; logs go to stderr and the log file
    let _guard = logging::init(cli.log_file.as_deref());

    if let Err(e) = run(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> reload_dap::Result<()> {
    let config = Config::load()?;
    let launcher_path = config.resolve_launcher(cli.launcher.as_ref())?;

    let mut launcher_args = config.launcher.args.clone();
    launcher_args.extend(cli.launcher_args);

    tracing::info!(
        launcher = %launcher_path.display(),
        "starting adapter on stdio"
    );

    serve_stdio(ServerConfig {
        launcher_path,
        launcher_args,
        request_timeout: Duration::from_secs(config.timeouts.request_secs),
    })
    .await
}
