//! Tracing setup.
//!
//! Logs go to a file so they never interleave with the TUI. `RUST_LOG` takes
//! precedence over `--log-level`.

use anyhow::{Context, Result};
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

pub const LOG_FILE: &str = "latest.log";

/// Keeps the non-blocking writer flushing; drop it only at process exit.
pub struct LogGuard {
    _guard: Option<WorkerGuard>,
}

pub fn log_dir() -> Option<PathBuf> {
    Some(dirs::data_local_dir()?.join("ytdl-remote").join("logs"))
}

fn filter_for(level: &str) -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(format!("{level},hyper=warn,reqwest=warn"))
            .unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

/// Create the log directory and truncate the log file inside it.
fn open_log_file(dir: &Path) -> Result<(PathBuf, File)> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    let path = dir.join(LOG_FILE);
    let file = File::create(&path).with_context(|| format!("create {}", path.display()))?;
    Ok((path, file))
}

/// Warnings and above to stderr, for when no log file can be used.
fn init_stderr() -> Result<LogGuard> {
    tracing_subscriber::registry()
        .with(EnvFilter::new("warn"))
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .context("install stderr logger")?;
    Ok(LogGuard { _guard: None })
}

pub fn init(level: &str) -> Result<LogGuard> {
    let opened = match log_dir() {
        Some(dir) => open_log_file(&dir).map_err(Some),
        None => Err(None),
    };
    let (path, file) = match opened {
        Ok(opened) => opened,
        Err(reason) => {
            let guard = init_stderr()?;
            if let Some(e) = reason {
                tracing::warn!(error = %format!("{e:#}"), "file logging unavailable");
            }
            return Ok(guard);
        }
    };
    let (writer, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::registry()
        .with(filter_for(level))
        .with(
            fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .try_init()
        .context("install file logger")?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), path = %path.display(), "logging initialized");
    Ok(LogGuard {
        _guard: Some(guard),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_dir_is_namespaced() {
        if let Some(dir) = log_dir() {
            assert!(dir.ends_with("ytdl-remote/logs"));
        }
    }

    #[test]
    fn bad_level_falls_back_to_a_valid_filter() {
        // Only meaningful when RUST_LOG is not steering the filter.
        if std::env::var_os("RUST_LOG").is_none() {
            let filter = filter_for("not a level!!");
            assert!(!filter.to_string().is_empty());
        }
    }

    #[test]
    fn unwritable_log_dir_is_reported_not_fatal() {
        let blocker = std::env::temp_dir().join("ytdl-remote-log-blocker");
        std::fs::write(&blocker, b"not a directory").unwrap();

        let res = open_log_file(&blocker.join("logs"));

        assert!(res.is_err());
        let _ = std::fs::remove_file(&blocker);
    }
}
