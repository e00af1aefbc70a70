//! Logging and tracing configuration
//!
//! The CLI logs compactly to stderr. A scenario run additionally writes a
//! detailed log file so slow or flaky runs can be inspected afterwards.

use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use super::paths;

/// Initialize tracing for the CLI (stderr logging)
///
/// Logs are controlled by the `RUST_LOG` environment variable.
/// Default level is INFO for this crate, WARN for dependencies.
pub fn init_cli(verbose: bool) {
    tracing_subscriber::registry()
        .with(cli_filter(verbose))
        .with(stderr_layer())
        .init();
}

/// Initialize tracing for a scenario run (file + stderr logging)
///
/// The run logs to both:
/// 1. A log file at `~/.local/share/dashboard-e2e/logs/run.log`
/// 2. stderr, at the CLI level
///
/// Returns the log file path and the guard that flushes the file writer;
/// the guard must live until the run finishes.
pub fn init_run(verbose: bool) -> Option<(PathBuf, WorkerGuard)> {
    let log_dir = match paths::ensure_log_dir() {
        Ok(Some(dir)) => dir,
        Ok(None) => {
            init_cli(verbose);
            return None;
        }
        Err(e) => {
            eprintln!("Warning: Could not create log directory: {}", e);
            init_cli(verbose);
            return None;
        }
    };

    let appender = tracing_appender::rolling::never(&log_dir, paths::RUN_LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    // The file always gets the detailed view regardless of RUST_LOG
    let file_filter = EnvFilter::new("dashboard_e2e=trace,info");

    let file_layer = fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .with_filter(file_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer().with_filter(cli_filter(verbose)))
        .init();

    Some((log_dir.join(paths::RUN_LOG_FILE), guard))
}

fn cli_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("dashboard_e2e=debug,warn")
        } else {
            EnvFilter::new("dashboard_e2e=info,warn")
        }
    })
}

fn stderr_layer<S>() -> impl Layer<S>
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

/// Truncate the run log file
pub fn truncate_run_log() -> std::io::Result<()> {
    if let Some(path) = paths::run_log_path() {
        if path.exists() {
            std::fs::write(&path, "")?;
        }
    }
    Ok(())
}
