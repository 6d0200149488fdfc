//! Activity log viewer. Administrators only.

use crate::activity_log::{read_recent, LogLevel};
use crate::commands::{require_admin, Login};
use crate::format::Formatter;
use crate::shop::Shop;
use anyhow::{anyhow, Context, Result};
use std::path::Path;

/// Lines shown when no count is given.
pub const DEFAULT_LOG_LINES: usize = 20;

pub struct LogsCommand<'a> {
    shop: &'a Shop,
    formatter: Formatter,
}

impl<'a> LogsCommand<'a> {
    pub fn new(shop: &'a Shop, formatter: Formatter) -> Self {
        Self { shop, formatter }
    }

    /// The newest `lines` entries of the log at `path`, optionally of one level.
    pub fn show(&self, login: &Login, path: &Path, lines: usize, level: Option<&str>) -> Result<String> {
        require_admin(self.shop, login)?;
        let level: Option<LogLevel> = level
            .map(|l| l.parse::<LogLevel>().map_err(|e: String| anyhow!(e)))
            .transpose()?;

        let entries = read_recent(path, lines, level)
            .with_context(|| format!("Failed to read activity log {}", path.display()))?;
        Ok(self.formatter.format_log_lines(&entries))
    }
}
