use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use combiner_engine::{ApiSettings, Endpoints};
use serde::{Deserialize, Serialize};

use crate::cli::Cli;

pub const DEFAULT_CONFIG_FILE: &str = "combiner.ron";

/// Settings read from `combiner.ron`; every field is optional in the file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub base_url: String,
    pub api_prefix: String,
    pub poll_interval_ms: u64,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub download_timeout_secs: u64,
    pub download_dir: PathBuf,
    pub state_file: PathBuf,
    pub log_to_file: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        let api = ApiSettings::default();
        Self {
            base_url: api.base_url,
            api_prefix: api.api_prefix,
            poll_interval_ms: combiner_core::POLL_INTERVAL.as_millis() as u64,
            connect_timeout_secs: api.connect_timeout.as_secs(),
            request_timeout_secs: api.request_timeout.as_secs(),
            download_timeout_secs: api.download_timeout.as_secs(),
            download_dir: PathBuf::from("."),
            state_file: PathBuf::from(".combiner_state.ron"),
            log_to_file: false,
        }
    }
}

impl AppConfig {
    /// Reads `explicit` if given, else `combiner.ron` in the working directory
    /// if it exists, else the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        match explicit {
            Some(path) => Self::read(path),
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    Self::read(default_path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        ron::from_str(&text).with_context(|| format!("failed to parse config {}", path.display()))
    }

    pub fn apply_overrides(&mut self, cli: &Cli) {
        if let Some(base_url) = &cli.base_url {
            self.base_url = base_url.clone();
        }
        if let Some(state_file) = &cli.state_file {
            self.state_file = state_file.clone();
        }
        if let Some(poll_interval_ms) = cli.poll_interval_ms {
            self.poll_interval_ms = poll_interval_ms;
        }
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.poll_interval_ms > 0, "poll_interval_ms must be positive");
        ensure!(
            self.request_timeout_secs > 0
                && self.connect_timeout_secs > 0
                && self.download_timeout_secs > 0,
            "timeouts must be positive"
        );
        Endpoints::new(&self.base_url, &self.api_prefix)
            .with_context(|| format!("invalid base_url {:?}", self.base_url))?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn api_settings(&self) -> ApiSettings {
        ApiSettings {
            base_url: self.base_url.clone(),
            api_prefix: self.api_prefix.clone(),
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            request_timeout: Duration::from_secs(self.request_timeout_secs),
            download_timeout: Duration::from_secs(self.download_timeout_secs),
        }
    }
}
