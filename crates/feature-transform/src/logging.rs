//! Logging setup.
//!
//! Two sinks are supported: a timestamped log file per process run
//! (`logs/<YYYY-MM-DD_HH-MM-SS>.log`, lines formatted as
//! `[timestamp] LEVEL - message`) and a console sink for the CLI. Either is
//! installed once at process start; library code only emits `tracing` events.

use crate::error::{Result, ResultExt};
use chrono::Local;
use std::fmt;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{Event, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Format used for log file names.
pub const LOG_FILE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d_%H-%M-%S";

/// Formats events as `[2024-05-01 12:00:00,123] INFO - message`.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainFormat;

impl<S, N> FormatEvent<S, N> for PlainFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        write!(
            writer,
            "[{}] {} - ",
            Local::now().format("%Y-%m-%d %H:%M:%S,%3f"),
            event.metadata().level()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Path of a new log file inside `logs_dir`, named after the current time.
pub fn log_file_path(logs_dir: impl AsRef<Path>) -> PathBuf {
    let name = format!("{}.log", Local::now().format(LOG_FILE_TIMESTAMP_FORMAT));
    logs_dir.as_ref().join(name)
}

/// Create the log file, creating `logs_dir` if needed.
pub fn create_log_file(logs_dir: impl AsRef<Path>) -> Result<(File, PathBuf)> {
    let logs_dir = logs_dir.as_ref();
    fs::create_dir_all(logs_dir).context(format!(
        "Creating log directory {}",
        logs_dir.display()
    ))?;

    let path = log_file_path(logs_dir);
    let file = File::create(&path).context(format!("Creating log file {}", path.display()))?;
    Ok((file, path))
}

/// Install a global subscriber writing to a fresh timestamped file in
/// `logs_dir`. Returns the log file path.
///
/// `RUST_LOG` takes precedence over `level` when set.
pub fn init_file_logging(logs_dir: impl AsRef<Path>, level: &str) -> Result<PathBuf> {
    let (file, path) = create_log_file(logs_dir)?;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .event_format(PlainFormat)
        .with_writer(Mutex::new(file))
        .init();

    tracing::info!("Logging has started");
    Ok(path)
}

/// Install a console subscriber for interactive use.
pub fn init_console_logging(level: &str, quiet: bool) {
    let effective_level = if quiet { "warn" } else { level };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(effective_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_log_file_path_is_timestamped() {
        let path = log_file_path("logs");
        let name = path.file_name().unwrap().to_str().unwrap();

        assert!(path.starts_with("logs"));
        assert!(name.ends_with(".log"));
        // YYYY-MM-DD_HH-MM-SS.log
        assert_eq!(name.len(), "2024-01-01_00-00-00.log".len());
        assert_eq!(&name[10..11], "_");
    }

    #[test]
    fn test_create_log_file_creates_directory() {
        let dir = TempDir::new().unwrap();
        let logs_dir = dir.path().join("logs");

        let (_file, path) = create_log_file(&logs_dir).unwrap();

        assert!(logs_dir.is_dir());
        assert!(path.is_file());
        assert_eq!(path.parent().unwrap(), logs_dir.as_path());
    }
}
