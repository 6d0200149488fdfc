//! Configuration management with TOML, environment variables, and CLI overrides.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Application configuration with layered loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding every data file
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Output format
    #[serde(default)]
    pub format: OutputFormat,

    /// Activity log file; defaults to `system.log` in the data directory
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Stock level below which administrators are warned
    #[serde(default = "default_low_stock_threshold")]
    pub low_stock_threshold: u32,

    /// Maximum number of recommended games
    #[serde(default = "default_recommendation_limit")]
    pub recommendation_limit: usize,

    /// Number of best sellers listed in sales reports
    #[serde(default = "default_top_products_limit")]
    pub top_products_limit: usize,

    /// Where saved reports go; defaults to the data directory
    #[serde(default)]
    pub report_dir: Option<PathBuf>,
}

fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("gamehub"))
        .unwrap_or_else(|| PathBuf::from("data"))
}

fn default_low_stock_threshold() -> u32 {
    5
}

fn default_recommendation_limit() -> usize {
    5
}

fn default_top_products_limit() -> usize {
    5
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            format: OutputFormat::Table,
            log_file: None,
            low_stock_threshold: default_low_stock_threshold(),
            recommendation_limit: default_recommendation_limit(),
            top_products_limit: default_top_products_limit(),
            report_dir: None,
        }
    }
}

impl Config {
    /// Creates a new default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a default configuration rooted at `data_dir`.
    pub fn in_dir(data_dir: impl Into<PathBuf>) -> Self {
        Self { data_dir: data_dir.into(), ..Self::default() }
    }

    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading config from: {}", path.display());

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Loads configuration with fallback to default locations.
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        // 1. Explicit path takes precedence
        if let Some(path) = explicit_path {
            return Self::from_file(path);
        }

        // 2. Try current directory
        let local_config = Path::new("gamehub.toml");
        if local_config.exists() {
            debug!("Found gamehub.toml in current directory");
            return Self::from_file(local_config);
        }

        // 3. Try XDG config directory
        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("gamehub").join("config.toml");
            if xdg_config.exists() {
                debug!("Found config in XDG config directory");
                return Self::from_file(xdg_config);
            }
        }

        // 4. Return default config
        debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Applies environment variable overrides.
    pub fn with_env(mut self) -> Self {
        if let Ok(dir) = std::env::var("GAMEHUB_DATA_DIR") {
            self.data_dir = PathBuf::from(dir);
        }

        if let Ok(format) = std::env::var("GAMEHUB_FORMAT") {
            if let Ok(f) = format.parse() {
                self.format = f;
            }
        }

        if let Ok(log_file) = std::env::var("GAMEHUB_LOG_FILE") {
            self.log_file = Some(PathBuf::from(log_file));
        }

        if let Ok(threshold) = std::env::var("GAMEHUB_LOW_STOCK") {
            if let Ok(t) = threshold.parse() {
                self.low_stock_threshold = t;
            }
        }

        self
    }

    /// Returns the location of every data file.
    pub fn paths(&self) -> DataPaths {
        let mut paths = DataPaths::in_dir(&self.data_dir);
        if let Some(log_file) = &self.log_file {
            paths.log = log_file.clone();
        }
        paths
    }

    /// Directory that saved reports are written to.
    pub fn report_dir(&self) -> PathBuf {
        self.report_dir.clone().unwrap_or_else(|| self.data_dir.clone())
    }

    /// Creates the data and report directories if missing.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir).with_context(|| {
            format!("Failed to create data directory: {}", self.data_dir.display())
        })?;

        let report_dir = self.report_dir();
        std::fs::create_dir_all(&report_dir).with_context(|| {
            format!("Failed to create report directory: {}", report_dir.display())
        })
    }
}

/// Locations of the per-entity data files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub users: PathBuf,
    pub products: PathBuf,
    pub sales: PathBuf,
    pub discounts: PathBuf,
    pub wishlists: PathBuf,
    pub genres: PathBuf,
    pub tags: PathBuf,
    pub notifications: PathBuf,
    pub sequences: PathBuf,
    pub log: PathBuf,
}

impl DataPaths {
    /// Standard file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            users: dir.join("users.dat"),
            products: dir.join("products.dat"),
            sales: dir.join("sales.dat"),
            discounts: dir.join("discounts.dat"),
            wishlists: dir.join("wishlists.dat"),
            genres: dir.join("genres.dat"),
            tags: dir.join("tags.dat"),
            notifications: dir.join("notifications.dat"),
            sequences: dir.join("sequences.dat"),
            log: dir.join("system.log"),
        }
    }
}

/// Output format for results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Markdown,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "markdown" | "md" => Ok(OutputFormat::Markdown),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, markdown, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Markdown => write!(f, "markdown"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}
