//! Plain-text activity log (`[timestamp] [LEVEL] message`) mirrored into `tracing`.

use crate::clock::{Clock, SystemClock};
use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::str::FromStr;
use std::sync::{Arc, Mutex};

/// Severity of an activity log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Warning,
    Err,
    Critical,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARNING"),
            LogLevel::Err => write!(f, "ERR"),
            LogLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, <LogLevel as FromStr>::Err> {
        match s.to_uppercase().as_str() {
            "INFO" => Ok(LogLevel::Info),
            "WARNING" | "WARN" => Ok(LogLevel::Warning),
            "ERR" | "ERROR" => Ok(LogLevel::Err),
            "CRITICAL" => Ok(LogLevel::Critical),
            _ => Err(format!("Unknown log level: {}. Use: info, warning, err or critical", s)),
        }
    }
}

/// Last `limit` lines of a log file, newest first.
///
/// With `level`, only lines carrying that `[LEVEL]` tag count. A missing file
/// reads as empty.
pub fn read_recent(path: impl AsRef<Path>, limit: usize, level: Option<LogLevel>) -> std::io::Result<Vec<String>> {
    let content = match std::fs::read_to_string(path.as_ref()) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e),
    };
    let tag = level.map(|level| format!("] [{}] ", level));

    Ok(content
        .lines()
        .rev()
        .filter(|line| !line.is_empty())
        .filter(|line| tag.as_ref().map_or(true, |tag| line.contains(tag.as_str())))
        .take(limit)
        .map(str::to_string)
        .collect())
}

/// Append-only activity log shared by every component.
///
/// Cloning is cheap; all clones append to the same file.
#[derive(Clone)]
pub struct ActivityLog {
    file: Option<Arc<Mutex<File>>>,
    clock: Arc<dyn Clock>,
}

impl ActivityLog {
    /// Opens (or creates) the log file in append mode.
    pub fn open(path: impl AsRef<Path>, clock: Arc<dyn Clock>) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path.as_ref())?;
        Ok(Self { file: Some(Arc::new(Mutex::new(file))), clock })
    }

    /// A log that only forwards to `tracing`.
    pub fn silent() -> Self {
        Self { file: None, clock: Arc::new(SystemClock) }
    }

    /// Formats one log line without the trailing newline.
    pub fn format_line(&self, level: LogLevel, message: &str) -> String {
        format!("[{}] [{}] {}", self.clock.now_string(), level, message)
    }

    /// Records an entry. Write failures are dropped.
    pub fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Warning => tracing::warn!("{}", message),
            LogLevel::Err | LogLevel::Critical => tracing::error!("{}", message),
        }

        if let Some(file) = &self.file {
            let line = self.format_line(level, message);
            if let Ok(mut file) = file.lock() {
                let _ = writeln!(file, "{}", line);
                let _ = file.flush();
            }
        }
    }

    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    pub fn warning(&self, message: &str) {
        self.log(LogLevel::Warning, message);
    }

    pub fn error(&self, message: &str) {
        self.log(LogLevel::Err, message);
    }

    pub fn critical(&self, message: &str) {
        self.log(LogLevel::Critical, message);
    }
}

impl Default for ActivityLog {
    fn default() -> Self {
        Self::silent()
    }
}

impl fmt::Debug for ActivityLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActivityLog").field("file", &self.file.is_some()).finish()
    }
}
