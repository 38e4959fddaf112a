//! # Local Logger
//!
//! Installs the global `log` backend for the command-line tools: a `fern`
//! dispatcher writing `YYYY-MM-DD HH:MM:SS - LEVEL - message` lines to the
//! console, with colored levels, and optionally to a timestamped file per run.
//!
//! ## Key Features
//! - **Console output**: levels colored with `colored` when stdout is a terminal.
//! - **File output**: `<app>-<YYYYmmdd_HHMMSS>.log` in the chosen directory.
//! - **Rotation**: older files of the same app are removed, keeping the newest
//!   `keep` files (the current run included).

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use colored::*;
use glob::{glob, Pattern};
use log::{Level, LevelFilter};

use crate::error::{Result, VolunteerError};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// # Logger Options
///
/// Where and how much to log.
#[derive(Debug, Clone)]
pub struct LoggerOptions {
    pub level: LevelFilter,
    /// Color the level names on the console.
    pub use_color: bool,
    /// Directory for log files; `None` logs to the console only.
    pub log_dir: Option<PathBuf>,
    /// Log files to keep per app, the current one included.
    pub keep: usize,
}

impl Default for LoggerOptions {
    fn default() -> Self {
        Self {
            level: LevelFilter::Info,
            use_color: true,
            log_dir: None,
            keep: 1,
        }
    }
}

/// Maps a level name to a filter; unknown names mean `info`.
pub fn parse_level(name: &str) -> LevelFilter {
    match name.trim().to_lowercase().as_str() {
        "trace" => LevelFilter::Trace,
        "debug" => LevelFilter::Debug,
        "warn" | "warning" => LevelFilter::Warn,
        "error" => LevelFilter::Error,
        "off" => LevelFilter::Off,
        _ => LevelFilter::Info,
    }
}

fn colored_level(level: Level) -> ColoredString {
    let name = level.to_string();
    match level {
        Level::Error => name.bright_red(),
        Level::Warn => name.bright_yellow(),
        Level::Info => name.bright_green(),
        Level::Debug => name.bright_white(),
        Level::Trace => name.bright_cyan(),
    }
}

/// Installs the global logger for `app_name` and returns the log file path, if
/// any.
///
/// # Errors
/// `Logger` when a logger is already installed or the rotation pattern is
/// invalid, `Io` when the log file cannot be created.
pub fn setup_logging(app_name: &str, options: &LoggerOptions) -> Result<Option<PathBuf>> {
    let use_color = options.use_color;
    let console = fern::Dispatch::new()
        .format(move |out, message, record| {
            let ts = Local::now().format(TIMESTAMP_FORMAT);
            if use_color {
                out.finish(format_args!("{ts} - {} - {message}", colored_level(record.level())))
            } else {
                out.finish(format_args!("{ts} - {} - {message}", record.level()))
            }
        })
        .chain(std::io::stdout());

    let mut root = fern::Dispatch::new()
        .level(options.level)
        .level_for("hyper", LevelFilter::Warn)
        .level_for("hyper_util", LevelFilter::Warn)
        .level_for("reqwest", LevelFilter::Warn)
        .chain(console);

    let mut log_path = None;
    if let Some(dir) = &options.log_dir {
        fs::create_dir_all(dir)?;
        rotate_logs(app_name, dir, options.keep.saturating_sub(1))?;

        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("{app_name}-{timestamp}.log"));
        let file = fern::Dispatch::new()
            .format(|out, message, record| {
                out.finish(format_args!(
                    "{} - {} - {message}",
                    Local::now().format(TIMESTAMP_FORMAT),
                    record.level()
                ))
            })
            .chain(fern::log_file(&path)?);
        root = root.chain(file);
        log_path = Some(path);
    }

    root.apply().map_err(|e| VolunteerError::Logger(e.to_string()))?;
    Ok(log_path)
}

/// Deletes all but the newest `keep` log files of `app_name` in `log_dir`.
///
/// File names embed a sortable timestamp, so name order is age order. Returns
/// the removed paths.
pub fn rotate_logs(app_name: &str, log_dir: &Path, keep: usize) -> Result<Vec<PathBuf>> {
    let dir = Pattern::escape(&log_dir.to_string_lossy());
    let pattern = format!("{dir}/{}-*.log", Pattern::escape(app_name));
    let paths = glob(&pattern)
        .map_err(|e| VolunteerError::Logger(format!("Invalid log rotation pattern {pattern}: {e}")))?;

    let mut log_files: Vec<PathBuf> = paths.filter_map(|entry| entry.ok()).collect();
    log_files.sort_by(|a, b| b.file_name().cmp(&a.file_name()));

    let mut removed = Vec::new();
    for old_file in log_files.into_iter().skip(keep) {
        match fs::remove_file(&old_file) {
            Ok(()) => removed.push(old_file),
            Err(e) => eprintln!("Error deleting old log file {}: {}", old_file.display(), e),
        }
    }
    Ok(removed)
}
