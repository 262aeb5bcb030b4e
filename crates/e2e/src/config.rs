//! Harness configuration
//!
//! Everything has a default so the harness runs against a locally started stack
//! without a config file. A TOML file can override any section; command-line flags
//! override the file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{E2eError, E2eResult};
use crate::playwright::PlaywrightConfig;
use crate::runner::RunnerConfig;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub api: ApiConfig,
    pub ui: PlaywrightConfig,
    pub run: RunConfig,
    /// Processes to start before the run and stop afterwards
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub launch: Vec<LaunchCommand>,
}

/// Where the API lives and how patient to be with it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL including the `/api` prefix
    pub base_url: String,
    pub request_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            request_timeout_secs: 10,
        }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Endpoint polled to decide the API is up
    pub fn readiness_url(&self) -> String {
        format!("{}/products", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub spec_timeout_secs: u64,
    /// How long to wait for the API and UI to answer before giving up
    pub ready_timeout_secs: u64,
    pub output_dir: PathBuf,
    pub filter: Option<String>,
    /// Extra YAML scenarios
    pub scenarios_dir: Option<PathBuf>,
    pub tag: Option<String>,
    pub summary_table: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            spec_timeout_secs: 30,
            ready_timeout_secs: 60,
            output_dir: PathBuf::from("test-results"),
            filter: None,
            scenarios_dir: None,
            tag: None,
            summary_table: true,
        }
    }
}

/// A process the harness starts itself, e.g. the API server or `ng serve`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LaunchCommand {
    pub name: String,
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    #[serde(default)]
    pub env: HashMap<String, String>,
    /// Polled until it returns a success status
    pub ready_url: String,
}

impl HarnessConfig {
    /// Load configuration from file, falling back to defaults when it does not exist
    pub fn load(path: &Path) -> E2eResult<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Self = toml::from_str(&content)?;
            config.check()?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn to_toml(&self) -> E2eResult<String> {
        toml::to_string_pretty(self).map_err(|e| E2eError::Config(e.to_string()))
    }

    /// Reject values that would make every spec fail for the wrong reason
    pub fn check(&self) -> E2eResult<()> {
        for (what, url) in [("api.base_url", &self.api.base_url), ("ui.base_url", &self.ui.base_url)] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(E2eError::Config(format!("{} must be an http(s) URL: {}", what, url)));
            }
        }
        if self.run.spec_timeout_secs == 0 {
            return Err(E2eError::Config("run.spec_timeout_secs must be positive".into()));
        }
        Ok(())
    }

    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig {
            spec_timeout: Duration::from_secs(self.run.spec_timeout_secs),
            filter: self.run.filter.clone(),
        }
    }

    pub fn ready_timeout(&self) -> Duration {
        Duration::from_secs(self.run.ready_timeout_secs)
    }
}
