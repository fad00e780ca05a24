//! Multitool command-line client

use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info};

use multitool_client::args::Args;
use multitool_client::commands::{self, App, Endpoints};
use multitool_client::logging;
use multitool_client::services::HttpSession;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    let data_dir = commands::data_dir(&args);

    // Keep the guard alive so buffered log lines are flushed on exit
    let _log_guard = match logging::init(&data_dir, args.debug) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Warning: logging disabled: {}", e);
            None
        }
    };

    info!(version = env!("CARGO_PKG_VERSION"), "multitool starting");

    let mut app = match App::open(
        &data_dir,
        commands::config_path(&args),
        Endpoints::default(),
        HttpSession::new(),
    ) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to start");
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let mut stdout = std::io::stdout();
    match app.execute(args.command, &mut stdout).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
