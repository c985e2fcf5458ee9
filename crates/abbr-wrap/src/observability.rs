//! Logging and tracing setup for the CLI.
//!
//! Human-readable events go to stderr so stdout stays clean for annotated
//! output and `--json`. When a log location is resolvable, every event is
//! also appended as one JSON object per line to a log file.
//!
//! Log location precedence (highest first):
//! 1. `ABBR_WRAP_LOG_PATH` (exact file, never rotated)
//! 2. `ABBR_WRAP_LOG_DIR` (daily-rotated `abbr-wrap.jsonl.<date>`)
//! 3. `log_dir` from configuration
//! 4. platform data directory (`~/.local/share/abbr-wrap/logs` on Linux)

use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const LOG_PATH_ENV: &str = "ABBR_WRAP_LOG_PATH";
const LOG_DIR_ENV: &str = "ABBR_WRAP_LOG_DIR";
const LOG_FILE_PREFIX: &str = "abbr-wrap.jsonl";

/// Where (and whether) to write the JSONL log file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// Exact log file path; takes precedence over `log_dir`.
    pub log_path: Option<PathBuf>,
    /// Directory for daily-rotated log files.
    pub log_dir: Option<PathBuf>,
}

impl ObservabilityConfig {
    /// Resolve the log location from the environment, falling back to
    /// `config_log_dir` and then the platform default.
    pub fn from_env_with_overrides(config_log_dir: Option<PathBuf>) -> Self {
        let log_path = non_empty_env(LOG_PATH_ENV).map(PathBuf::from);
        let log_dir = non_empty_env(LOG_DIR_ENV)
            .map(PathBuf::from)
            .or(config_log_dir)
            .or_else(|| {
                abbr_wrap_core::config::user_log_dir().map(|dir| dir.into_std_path_buf())
            });
        Self { log_path, log_dir }
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.trim().is_empty())
}

/// Keeps the background log writer alive; flushes on drop.
#[derive(Debug)]
pub struct ObservabilityGuard {
    _file: Option<WorkerGuard>,
}

/// Level implied by the CLI flags, or `default_level` when none are given.
fn level_for(quiet: bool, verbose: u8, default_level: &str) -> &str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => default_level,
        1 => "debug",
        _ => "trace",
    }
}

/// Build the event filter. `RUST_LOG` wins over `-q`/`-v`, which win over
/// the configured level.
pub fn env_filter(quiet: bool, verbose: u8, default_level: &str) -> EnvFilter {
    if let Some(directives) = non_empty_env(EnvFilter::DEFAULT_ENV)
        && let Ok(filter) = EnvFilter::try_new(&directives)
    {
        return filter;
    }
    EnvFilter::new(level_for(quiet, verbose, default_level))
}

/// Install the global subscriber.
///
/// A log file that cannot be opened is reported on stderr and skipped;
/// logging to stderr still works.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<ObservabilityGuard> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .boxed();

    let (file_layer, file_guard, file_error) = match open_log_writer(config) {
        Ok(Some((writer, guard))) => {
            let layer = fmt::layer()
                .json()
                .with_writer(writer)
                .with_current_span(true)
                .boxed();
            (Some(layer), Some(guard), None)
        }
        Ok(None) => (None, None, None),
        Err(err) => (None, None, Some(err)),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;

    if let Some(err) = file_error {
        tracing::warn!(error = %format!("{err:#}"), "file logging disabled");
    }

    Ok(ObservabilityGuard { _file: file_guard })
}

fn open_log_writer(
    config: &ObservabilityConfig,
) -> anyhow::Result<Option<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)>> {
    let appender = if let Some(ref path) = config.log_path {
        let dir = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), PathBuf::from);
        let file_name = path
            .file_name()
            .with_context(|| format!("log path has no file name: {}", path.display()))?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        tracing_appender::rolling::never(dir, file_name)
    } else if let Some(ref dir) = config.log_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create log directory {}", dir.display()))?;
        tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX)
    } else {
        return Ok(None);
    };

    Ok(Some(tracing_appender::non_blocking(appender)))
}
