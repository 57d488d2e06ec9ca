mod backend;
mod cli;
mod format;
mod logging;
mod model;
mod orchestrator;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = cli::Cli::parse();
    // Held until exit so buffered log lines are flushed.
    let _log = logging::init(&args.log_level)?;

    match cli::run(args).await {
        Ok(true) => Ok(ExitCode::SUCCESS),
        Ok(false) => Ok(ExitCode::FAILURE),
        Err(e) => {
            let msg = format!("{e:#}");
            tracing::error!(error = %msg, "fatal");
            Err(e)
        }
    }
}
