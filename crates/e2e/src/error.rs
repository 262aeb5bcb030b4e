//! Error types for E2E testing

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Server failed to start: {0}")]
    ServerStartup(String),

    #[error("Readiness check for {url} failed after {attempts} attempts")]
    ServerHealthCheck { url: String, attempts: usize },

    #[error("Playwright not found. Install with: npm i -D @playwright/test && npx playwright install")]
    PlaywrightNotFound,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Scenario parse error: {0}")]
    ScenarioParse(String),

    #[error("Step failed: {step} - {reason}")]
    StepFailed { step: String, reason: String },

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("Spec panicked: {0}")]
    Panicked(String),

    #[error("Contract violation")]
    Model(#[from] fruitstall_common::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

pub type E2eResult<T> = Result<T, E2eError>;

/// How a failed spec is classified in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Observed value did not match the contract
    Assertion,
    /// Request or browser interaction could not complete
    Transport,
    /// Spec exceeded its time budget
    Timeout,
    /// Spec body panicked
    Panic,
    /// Harness could not be set up
    Setup,
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureKind::Assertion => write!(f, "assertion"),
            FailureKind::Transport => write!(f, "transport"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::Panic => write!(f, "panic"),
            FailureKind::Setup => write!(f, "setup"),
        }
    }
}

impl E2eError {
    pub fn assertion(message: impl Into<String>) -> Self {
        E2eError::AssertionFailed(message.into())
    }

    pub fn kind(&self) -> FailureKind {
        match self {
            E2eError::AssertionFailed(_) | E2eError::Model(_) => FailureKind::Assertion,
            // Playwright reports failed `expect(...)` calls the same way as a
            // click that never found its target.
            E2eError::StepFailed { reason, .. } if reason.contains("expect(") => {
                FailureKind::Assertion
            }
            E2eError::Timeout(_) => FailureKind::Timeout,
            E2eError::Panicked(_) => FailureKind::Panic,
            E2eError::Config(_)
            | E2eError::ServerStartup(_)
            | E2eError::ServerHealthCheck { .. }
            | E2eError::PlaywrightNotFound
            | E2eError::ScenarioParse(_)
            | E2eError::Yaml(_)
            | E2eError::Toml(_) => FailureKind::Setup,
            E2eError::StepFailed { .. }
            | E2eError::Playwright(_)
            | E2eError::Io(_)
            | E2eError::Json(_)
            | E2eError::Http(_) => FailureKind::Transport,
        }
    }

    /// Render the error together with its chain of causes
    pub fn detail(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            let text = cause.to_string();
            // `#[from]` variants already embed their source in the message
            if !out.contains(&text) {
                out.push_str("\n  caused by: ");
                out.push_str(&text);
            }
            source = cause.source();
        }
        out
    }
}
