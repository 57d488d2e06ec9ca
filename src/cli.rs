use crate::backend::{BackendReply, HttpBackend, MediaBackend, TransportError};
use crate::format::format_bytes;
use crate::model::{ControllerEvent, DownloadKind};
use crate::orchestrator::{OperationController, MSG_UNREACHABLE};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Where a console line goes.
enum Console {
    Out(String),
    Err(String),
}

/// Stdout/stderr are written from a blocking task fed by a channel; dropping every
/// sender ends the task after a final flush.
fn spawn_console() -> (mpsc::UnboundedSender<Console>, tokio::task::JoinHandle<()>) {
    let (tx, mut rx) = mpsc::unbounded_channel::<Console>();
    let handle = tokio::task::spawn_blocking(move || {
        let mut out = std::io::LineWriter::new(std::io::stdout().lock());
        let mut err = std::io::LineWriter::new(std::io::stderr().lock());
        while let Some(line) = rx.blocking_recv() {
            let _ = match line {
                Console::Out(msg) => writeln!(out, "{msg}"),
                Console::Err(msg) => writeln!(err, "{msg}"),
            };
        }
        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

#[derive(Debug, Parser, Clone)]
#[command(
    name = "ytdl-remote",
    version,
    about = "Fetch info and trigger downloads on a YouTube download backend"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    /// Print the result as JSON; only valid with a subcommand
    #[arg(long, global = true)]
    pub json: bool,

    /// Log level for the log file; RUST_LOG overrides it
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Show title, uploader, duration and views for a video
    Info { url: String },
    /// Download a video (or every video of a playlist)
    Video {
        url: String,
        /// Treat the URL as a playlist
        #[arg(long)]
        playlist: bool,
    },
    /// Download audio only (or the audio of every playlist entry)
    Audio {
        url: String,
        /// Treat the URL as a playlist
        #[arg(long)]
        playlist: bool,
    },
    /// List files in the backend's download folder
    Downloads,
    /// Save a file from the backend's download folder
    Fetch {
        filename: String,
        /// Destination path; defaults to the file name in the current directory
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check that the backend is up
    Health,
}

/// Run the selected mode. `Ok(false)` means the operation ended with an error message.
pub async fn run(args: Cli) -> Result<bool> {
    let Some(command) = args.command.clone() else {
        if args.json {
            return Err(anyhow::anyhow!(
                "--json needs a subcommand: info, video, audio, downloads, fetch or health"
            ));
        }
        #[cfg(feature = "tui")]
        {
            crate::tui::run().await?;
            return Ok(true);
        }
        #[cfg(not(feature = "tui"))]
        {
            return Err(anyhow::anyhow!(
                "built without TUI support; use one of: info, video, audio, downloads, fetch, health"
            ));
        }
    };

    let backend = HttpBackend::new()?;
    match command {
        Command::Info { url } => run_operation(&args, backend, url, false, None).await,
        Command::Video { url, playlist } => {
            run_operation(&args, backend, url, playlist, Some(DownloadKind::Video)).await
        }
        Command::Audio { url, playlist } => {
            run_operation(&args, backend, url, playlist, Some(DownloadKind::Audio)).await
        }
        Command::Downloads => run_downloads(&args, backend).await,
        Command::Fetch { filename, output } => {
            let dest = output.unwrap_or_else(|| default_dest(&filename));
            run_fetch(&args, backend, &filename, &dest).await
        }
        Command::Health => run_health(&args, backend).await,
    }
}

/// One controller cycle: info when `kind` is `None`, otherwise a download.
async fn run_operation<B: MediaBackend>(
    args: &Cli,
    backend: B,
    url: String,
    playlist: bool,
    kind: Option<DownloadKind>,
) -> Result<bool> {
    let (console, console_done) = spawn_console();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<ControllerEvent>();
    let mut ctrl = OperationController::new(backend).with_events(evt_tx);
    ctrl.set_url(url);
    ctrl.set_playlist(playlist);

    // Echo in-progress text while the exchange is outstanding.
    let progress_console = console.clone();
    let echo_progress = !args.json;
    let progress = tokio::spawn(async move {
        while let Some(ev) = evt_rx.recv().await {
            let ControllerEvent::Snapshot(s) = ev else { continue };
            if echo_progress && !s.mode.is_idle() {
                if let Some(msg) = s.outcome.status_message {
                    let _ = progress_console.send(Console::Err(msg));
                }
            }
        }
    });

    let res = match kind {
        None => ctrl.request_info().await,
        Some(kind) => ctrl.request_download(kind).await,
    };
    if let Err(e) = &res {
        info!(error = %e, url = %ctrl.target().url, "operation ended with error");
    }

    if args.json {
        let out = serde_json::to_string_pretty(&ctrl.snapshot())?;
        let _ = console.send(Console::Out(out));
    } else {
        let summary = crate::text_summary::build_text_summary(ctrl.outcome(), ctrl.metadata());
        for line in summary.lines {
            let _ = console.send(Console::Out(line));
        }
        if let Some(err) = summary.error {
            let _ = console.send(Console::Err(format!("Error: {err}")));
        }
    }

    // Dropping the controller closes the event channel and ends the echo task.
    drop(ctrl);
    let _ = progress.await;
    drop(console);
    let _ = console_done.await;
    Ok(res.is_ok())
}

async fn run_downloads<B: MediaBackend>(args: &Cli, backend: B) -> Result<bool> {
    let (console, console_done) = spawn_console();
    let ok = match backend.list_downloads().await {
        Ok(BackendReply::Ok(files)) => {
            if args.json {
                let out = serde_json::to_string_pretty(&files).context("encode listing")?;
                let _ = console.send(Console::Out(out));
            } else {
                for line in crate::text_summary::build_listing_lines(&files) {
                    let _ = console.send(Console::Out(line));
                }
            }
            true
        }
        Ok(BackendReply::Failed { error }) => {
            let msg = error.unwrap_or_else(|| "Failed to list downloads".into());
            let _ = console.send(Console::Err(format!("Error: {msg}")));
            false
        }
        Err(e) => {
            info!(error = %e, "listing failed");
            let _ = console.send(Console::Err(format!(
                "Error: {}",
                MSG_UNREACHABLE
            )));
            false
        }
    };
    drop(console);
    let _ = console_done.await;
    Ok(ok)
}

async fn run_health<B: MediaBackend>(args: &Cli, backend: B) -> Result<bool> {
    let (console, console_done) = spawn_console();
    let ok = match backend.health().await {
        Ok(BackendReply::Ok(h)) => {
            let line = if args.json {
                serde_json::to_string_pretty(&h)?
            } else {
                format!("{}: {}", h.status, h.message)
            };
            let _ = console.send(Console::Out(line));
            true
        }
        Ok(BackendReply::Failed { error }) => {
            let msg = error.unwrap_or_else(|| "Backend reported unhealthy".into());
            let _ = console.send(Console::Err(format!("Error: {msg}")));
            false
        }
        Err(e) => {
            info!(error = %e, "health check failed");
            let _ = console.send(Console::Err(format!(
                "Error: {}",
                MSG_UNREACHABLE
            )));
            false
        }
    };
    drop(console);
    let _ = console_done.await;
    Ok(ok)
}

/// Last path component of `filename`, in the current directory.
fn default_dest(filename: &str) -> PathBuf {
    Path::new(filename)
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(filename))
}

async fn run_fetch<B: MediaBackend>(
    args: &Cli,
    backend: B,
    filename: &str,
    dest: &Path,
) -> Result<bool> {
    let (console, console_done) = spawn_console();
    let ok = match backend.fetch_file(filename, dest).await {
        Ok(BackendReply::Ok(bytes)) => {
            let line = if args.json {
                serde_json::to_string_pretty(&serde_json::json!({
                    "filename": filename,
                    "path": dest.display().to_string(),
                    "bytes": bytes,
                }))?
            } else {
                format!("Saved {} ({})", dest.display(), format_bytes(bytes))
            };
            let _ = console.send(Console::Out(line));
            true
        }
        Ok(BackendReply::Failed { error }) => {
            let msg = error
                .filter(|e| !e.is_empty())
                .unwrap_or_else(|| format!("Failed to fetch {filename}"));
            let _ = console.send(Console::Err(format!("Error: {msg}")));
            false
        }
        Err(TransportError::Io(e)) => {
            warn!(error = %e, dest = %dest.display(), "could not write fetched file");
            let _ = console.send(Console::Err(format!(
                "Error: cannot write {}: {e}",
                dest.display()
            )));
            false
        }
        Err(e) => {
            info!(error = %e, "fetch failed");
            let _ = console.send(Console::Err(format!("Error: {MSG_UNREACHABLE}")));
            false
        }
    };
    drop(console);
    let _ = console_done.await;
    Ok(ok)
}
