//! Structured run log persisted next to the reports.
//!
//! Independent of the `tracing` output: it records the key decisions of each
//! stage so a run can be audited after the fact. The guard writes it on drop,
//! so early returns and aborted stages still leave `run_log.txt` and
//! `run_log.json` behind.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warn,
    Error,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warn => "WARN",
            Self::Error => "ERROR",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LogEntry {
    #[serde(serialize_with = "serialize_timestamp")]
    pub timestamp: NaiveDateTime,
    pub level: LogLevel,
    pub stage: String,
    pub message: String,
}

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn serialize_timestamp<S: serde::Serializer>(
    value: &NaiveDateTime,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.collect_str(&value.format(TIMESTAMP_FORMAT))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunLog {
    entries: Vec<LogEntry>,
}

impl RunLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, level: LogLevel, stage: &str, message: impl Into<String>) {
        self.entries.push(LogEntry {
            timestamp: Local::now().naive_local(),
            level,
            stage: stage.to_string(),
            message: message.into(),
        });
    }

    pub fn info(&mut self, stage: &str, message: impl Into<String>) {
        self.record(LogLevel::Info, stage, message);
    }

    pub fn warn(&mut self, stage: &str, message: impl Into<String>) {
        self.record(LogLevel::Warn, stage, message);
    }

    pub fn error(&mut self, stage: &str, message: impl Into<String>) {
        self.record(LogLevel::Error, stage, message);
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn count(&self, level: LogLevel) -> usize {
        self.entries.iter().filter(|entry| entry.level == level).count()
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            let _ = writeln!(
                out,
                "{} [{}] {}: {}",
                entry.timestamp.format(TIMESTAMP_FORMAT),
                entry.level.as_str(),
                entry.stage,
                entry.message
            );
        }
        out
    }

    /// Writes `run_log.txt` and `run_log.json` into `dir`.
    pub fn write_to(&self, dir: &Path) -> std::io::Result<(PathBuf, PathBuf)> {
        std::fs::create_dir_all(dir)?;
        let text_path = dir.join("run_log.txt");
        std::fs::write(&text_path, self.render_text())?;
        let json_path = dir.join("run_log.json");
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(&json_path, format!("{json}\n"))?;
        Ok((text_path, json_path))
    }
}

/// Owns the run log and flushes it to `dir` when dropped.
#[derive(Debug)]
pub struct RunLogGuard {
    log: RunLog,
    dir: PathBuf,
}

impl RunLogGuard {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            log: RunLog::new(),
            dir: dir.into(),
        }
    }

    pub fn log(&self) -> &RunLog {
        &self.log
    }

    pub fn log_mut(&mut self) -> &mut RunLog {
        &mut self.log
    }
}

impl Drop for RunLogGuard {
    fn drop(&mut self) {
        match self.log.write_to(&self.dir) {
            Ok((text, _)) => debug!(path = %text.display(), "run log written"),
            Err(error) => warn!(dir = %self.dir.display(), %error, "failed to write run log"),
        }
    }
}
