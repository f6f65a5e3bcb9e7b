use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use time::macros::format_description;
use time::UtcOffset;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{self, fmt, prelude::*, EnvFilter};

use crate::config::EngineConfig;

const LOG_RETENTION_DAYS: u64 = 7;

/// Default log directory in the user-specific OS cache directory
/// - Linux: ~/.cache/structpatch/
/// - macOS: ~/Library/Caches/structpatch/
/// - Windows: %LOCALAPPDATA%\structpatch\
pub fn default_log_dir() -> io::Result<PathBuf> {
    let cache_dir = dirs::cache_dir()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "Unable to determine user cache directory"))?;
    Ok(cache_dir.join("structpatch"))
}

/// Removes session logs older than LOG_RETENTION_DAYS
fn cleanup_old_logs(log_dir: &Path) -> io::Result<()> {
    let now = std::time::SystemTime::now();
    let retention = std::time::Duration::from_secs(LOG_RETENTION_DAYS * 24 * 60 * 60);

    for entry in fs::read_dir(log_dir)?.flatten() {
        let Ok(metadata) = entry.metadata() else { continue };
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if !metadata.is_file() || !name.starts_with("session-") || !name.ends_with(".log") {
            continue;
        }
        let expired = metadata
            .modified()
            .ok()
            .and_then(|modified| now.duration_since(modified).ok())
            .is_some_and(|age| age > retention);
        if expired {
            if let Err(e) = fs::remove_file(entry.path()) {
                eprintln!("Failed to remove old log file {:?}: {}", entry.path(), e);
            }
        }
    }

    Ok(())
}

/// Filter for stderr output: an explicit level wins over RUST_LOG, which
/// wins over "info".
fn stderr_filter(log_level: Option<&str>) -> EnvFilter {
    match log_level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    }
}

fn is_already_set(e: &impl std::fmt::Display) -> bool {
    let msg = e.to_string();
    msg.contains("already been set") || msg.contains("SetLoggerError")
}

/// Initialize logger with stderr and optional file output
///
/// Returns a WorkerGuard that must be kept alive while logging to a file.
///
/// # Arguments
/// * `no_color` - Disable ANSI colors in stderr output
/// * `log_level` - Override log level (otherwise uses RUST_LOG or defaults to "info")
/// * `log_dir` - Directory for a DEBUG-level session log; `None` logs to stderr only
///
/// Calling this more than once is harmless: later calls keep the subscriber
/// installed first.
pub fn init_logger(no_color: bool, log_level: Option<&str>, log_dir: Option<&Path>) -> io::Result<WorkerGuard> {
    let timer = fmt::time::OffsetTime::new(
        UtcOffset::UTC,
        format_description!("[[[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z]"),
    );

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_timer(timer.clone())
        .with_ansi(!no_color)
        .with_filter(stderr_filter(log_level));

    let Some(log_dir) = log_dir else {
        let (_, guard) = tracing_appender::non_blocking(std::io::sink());
        return match tracing_subscriber::registry().with(stderr_layer).try_init() {
            Ok(()) => Ok(guard),
            Err(e) if is_already_set(&e) => Ok(guard),
            Err(e) => Err(io::Error::other(e)),
        };
    };

    fs::create_dir_all(log_dir)?;
    cleanup_old_logs(log_dir)?;

    let timestamp = time::OffsetDateTime::now_utc()
        .format(format_description!("[year][month][day]-[hour][minute][second]"))
        .map_err(io::Error::other)?;
    let log_path = log_dir.join(format!("session-{}-{}.log", timestamp, std::process::id()));

    let file = fs::OpenOptions::new().create(true).append(true).open(&log_path)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_timer(timer)
        .with_ansi(false)
        .with_filter(EnvFilter::new("debug"));

    match tracing_subscriber::registry().with(stderr_layer).with(file_layer).try_init() {
        Ok(()) => {
            eprintln!("Logging to file: {:?}", log_path);
            Ok(guard)
        }
        Err(e) if is_already_set(&e) => Ok(guard),
        Err(e) => Err(io::Error::other(e)),
    }
}

/// Initialize the logger with the level set in the engine configuration
pub fn init_from_config(config: &EngineConfig, no_color: bool, log_dir: Option<&Path>) -> io::Result<WorkerGuard> {
    init_logger(no_color, config.log_level.as_deref(), log_dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configured_level_overrides_default() {
        let config = EngineConfig::from_json(r#"{ "logLevel": "structpatch=trace" }"#).unwrap();
        assert_eq!(stderr_filter(config.log_level.as_deref()).to_string(), "structpatch=trace");
        let _guard = init_from_config(&config, true, None).unwrap();
    }

    #[test]
    fn test_init_logger_twice_is_tolerated() {
        let _first = init_logger(true, Some("warn"), None).unwrap();
        let _second = init_logger(true, Some("debug"), None).unwrap();
    }

    #[test]
    fn test_cleanup_keeps_recent_logs() {
        let dir = std::env::temp_dir().join(format!("structpatch-log-test-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let recent = dir.join("session-recent.log");
        fs::write(&recent, "x").unwrap();
        cleanup_old_logs(&dir).unwrap();
        assert!(recent.exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
