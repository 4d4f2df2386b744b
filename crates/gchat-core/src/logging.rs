//! File logging.
//!
//! Logs go to `$GCHAT_HOME/logs/gchat.log` so they never interleave with the
//! revealed answer on the terminal. Verbosity comes from `GCHAT_LOG` using
//! `EnvFilter` directives (default `info`).

use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "GCHAT_LOG";
pub const LOG_FILE: &str = "gchat.log";
const DEFAULT_DIRECTIVE: &str = "info";

/// Builds the filter from `GCHAT_LOG`, falling back to `info`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Installs the global subscriber writing to `logs_dir`.
///
/// Returns the writer guard; dropping it flushes pending lines. Returns
/// `None` if the directory cannot be created or a subscriber is already set.
/// Logging is never fatal.
pub fn init(logs_dir: &Path) -> Option<WorkerGuard> {
    if let Err(err) = fs::create_dir_all(logs_dir) {
        eprintln!(
            "Warning: logging disabled, cannot create {}: {err}",
            logs_dir.display()
        );
        return None;
    }

    let appender = tracing_appender::rolling::never(logs_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(writer)
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .ok()?;

    Some(guard)
}
