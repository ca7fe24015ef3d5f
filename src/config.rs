//! Client settings.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `FARMWATCH_*` environment variables. Command-line flags are applied on top
//! by the binary.
//!
//! ```toml
//! base_url = "http://farm.local:8080"
//! max_points = 30
//! page_size = 50
//! sort = "asc"
//! request_timeout_secs = 10
//! log_file = "farmwatch.log"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::data::MAX_POINTS;
use crate::query::{SortOrder, DEFAULT_PAGE_SIZE};

pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_LOG_FILE: &str = "farmwatch.log";
const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Settings {
    pub base_url: String,
    pub max_points: usize,
    pub page_size: u32,
    pub sort: SortOrder,
    pub request_timeout_secs: u64,
    pub log_file: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_points: MAX_POINTS,
            page_size: DEFAULT_PAGE_SIZE,
            sort: SortOrder::Asc,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl Settings {
    /// Load settings from defaults, an optional file and the environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = Config::builder()
            .set_default("base_url", DEFAULT_BASE_URL)?
            .set_default("max_points", MAX_POINTS as u64)?
            .set_default("page_size", DEFAULT_PAGE_SIZE as u64)?
            .set_default("sort", SortOrder::Asc.as_str())?
            .set_default("request_timeout_secs", DEFAULT_TIMEOUT_SECS)?
            .set_default("log_file", DEFAULT_LOG_FILE)?;

        if let Some(path) = path {
            builder = builder.add_source(File::from(path));
        }

        let settings: Settings = builder
            .add_source(Environment::with_prefix("FARMWATCH").try_parsing(true))
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")?;

        Ok(settings.normalized())
    }

    /// Trim the base URL and keep sizes at least 1.
    pub fn normalized(mut self) -> Self {
        self.base_url = self.base_url.trim().trim_end_matches('/').to_string();
        self.max_points = self.max_points.max(1);
        self.page_size = self.page_size.max(1);
        self
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}
