//! Logging bootstrap and safety policy.
//!
//! # Responsibility
//! - Initialize process-wide logging exactly once.
//! - Emit stable, metadata-only key=value event lines from core modules.
//!
//! # Invariants
//! - Initialization is idempotent for the same sink and level.
//! - Re-initialization with a conflicting sink or level is rejected.
//! - Initialization never panics.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "taskbox";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
const MAX_LOG_FILES: usize = 5;

static LOGGING_STATE: OnceCell<LoggingState> = OnceCell::new();
static PANIC_HOOK_INSTALLED: OnceCell<()> = OnceCell::new();

/// Where log lines are written.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LogSink {
    /// Plain stderr output, the development default.
    Stderr,
    /// Rolling files under the given directory.
    Directory(PathBuf),
}

struct LoggingState {
    level: &'static str,
    sink: LogSink,
    _logger: LoggerHandle,
}

/// Initializes logging at `level`, writing to rolling files under `log_dir`
/// when given and to stderr otherwise.
///
/// # Errors
/// - Unsupported `level` values.
/// - A `log_dir` that cannot be created.
/// - Re-initialization with a different level or sink.
pub fn init_logging(level: &str, log_dir: Option<&Path>) -> Result<(), String> {
    let level = normalize_level(level)?;
    let sink = match log_dir {
        Some(dir) => LogSink::Directory(dir.to_path_buf()),
        None => LogSink::Stderr,
    };

    let state = LOGGING_STATE.get_or_try_init(|| start_logger(level, sink.clone()))?;

    if state.level != level {
        return Err(format!(
            "logging already initialized with level `{}`; refusing to switch to `{level}`",
            state.level
        ));
    }
    if state.sink != sink {
        return Err(format!(
            "logging already initialized with sink {:?}; refusing to switch to {sink:?}",
            state.sink
        ));
    }

    Ok(())
}

/// Returns `(level, log_dir)` when logging is active; `log_dir` is `None`
/// for the stderr sink.
pub fn logging_status() -> Option<(&'static str, Option<PathBuf>)> {
    LOGGING_STATE.get().map(|state| {
        let dir = match &state.sink {
            LogSink::Stderr => None,
            LogSink::Directory(dir) => Some(dir.clone()),
        };
        (state.level, dir)
    })
}

/// Returns the default log level for the current build mode.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_logger(level: &'static str, sink: LogSink) -> Result<LoggingState, String> {
    let builder =
        Logger::try_with_str(level).map_err(|err| format!("invalid log level `{level}`: {err}"))?;

    let logger = match &sink {
        LogSink::Stderr => builder
            .log_to_stderr()
            .start()
            .map_err(|err| format!("failed to start logger: {err}"))?,
        LogSink::Directory(dir) => {
            std::fs::create_dir_all(dir)
                .map_err(|err| format!("failed to create log directory `{}`: {err}", dir.display()))?;
            builder
                .log_to_file(FileSpec::default().directory(dir).basename(LOG_FILE_BASENAME))
                .rotate(
                    Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
                    Naming::Numbers,
                    Cleanup::KeepLogFiles(MAX_LOG_FILES),
                )
                .write_mode(WriteMode::BufferAndFlush)
                .append()
                .format_for_files(flexi_logger::detailed_format)
                .start()
                .map_err(|err| format!("failed to start logger: {err}"))?
        }
    };

    install_panic_hook_once();

    info!(
        "event=logging_init module=core status=ok level={level} sink={}",
        match &sink {
            LogSink::Stderr => "stderr".to_string(),
            LogSink::Directory(dir) => dir.display().to_string(),
        }
    );

    Ok(LoggingState {
        level,
        sink,
        _logger: logger,
    })
}

fn normalize_level(level: &str) -> Result<&'static str, String> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok("trace"),
        "debug" => Ok("debug"),
        "info" => Ok("info"),
        "warn" | "warning" => Ok("warn"),
        "error" => Ok("error"),
        other => Err(format!(
            "unsupported log level `{other}`; expected trace|debug|info|warn|error"
        )),
    }
}

fn install_panic_hook_once() {
    if PANIC_HOOK_INSTALLED.get().is_some() {
        return;
    }

    let previous_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        error!("event=panic_captured module=core status=error location={location}");
        previous_hook(panic_info);
    }));

    let _ = PANIC_HOOK_INSTALLED.set(());
}
