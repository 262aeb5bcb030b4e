//! Sequential spec runner
//!
//! Suites and specs are registered against an explicit [`TestRunner`]. Registering a
//! spec runs it to completion before the call returns, so specs execute strictly
//! one at a time in the order they appear in the source. A failing spec is recorded
//! and the run moves on to its siblings.

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult, FailureKind};
use crate::report::{ConsoleReporter, Reporter};

/// Outcome of a single spec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecStatus {
    Passed,
    Failed,
}

impl std::fmt::Display for SpecStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpecStatus::Passed => write!(f, "PASSED"),
            SpecStatus::Failed => write!(f, "FAILED"),
        }
    }
}

/// Result of running a single spec
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub suite: String,
    pub name: String,
    pub status: SpecStatus,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub failure_kind: Option<FailureKind>,
}

impl TestResult {
    pub fn passed(&self) -> bool {
        self.status == SpecStatus::Passed
    }
}

/// Result of a whole run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl RunSummary {
    pub fn success(&self) -> bool {
        self.failed == 0
    }

    /// Process exit status for CI gating
    pub fn exit_code(&self) -> i32 {
        if self.success() {
            0
        } else {
            1
        }
    }

    /// Write the results as JSON into `output_dir`
    pub fn write_json(&self, output_dir: &Path) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(output_dir)?;

        let path = output_dir.join("test-results.json");
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

/// Configuration for the runner itself
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Upper bound on a single spec, after which it is recorded as failed
    pub spec_timeout: Duration,

    /// Only run specs whose "suite > spec" label contains this text
    pub filter: Option<String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            spec_timeout: Duration::from_secs(30),
            filter: None,
        }
    }
}

/// Run context threaded through suite and spec registration
pub struct TestRunner {
    config: RunnerConfig,
    reporter: Box<dyn Reporter>,
    suite_path: Vec<String>,
    results: Vec<TestResult>,
    started: Instant,
}

impl TestRunner {
    /// Create a runner that reports to the console
    pub fn new(config: RunnerConfig) -> Self {
        Self::with_reporter(config, Box::new(ConsoleReporter::default()))
    }

    pub fn with_reporter(config: RunnerConfig, reporter: Box<dyn Reporter>) -> Self {
        Self {
            config,
            reporter,
            suite_path: Vec::new(),
            results: Vec::new(),
            started: Instant::now(),
        }
    }

    /// Enter a named suite and let `body` register its specs and nested suites.
    ///
    /// ```ignore
    /// runner
    ///     .register_suite("/products endpoint", |r| {
    ///         Box::pin(async move {
    ///             r.register_spec("should GET all products", || list_products(&api)).await;
    ///         })
    ///     })
    ///     .await;
    /// ```
    pub async fn register_suite<F>(&mut self, name: &str, body: F)
    where
        F: for<'a> FnOnce(&'a mut TestRunner) -> BoxFuture<'a, ()>,
    {
        self.suite_path.push(name.to_string());
        self.reporter.suite_started(&self.suite_path);
        body(self).await;
        self.suite_path.pop();
    }

    /// Run `body` to completion and record its outcome.
    ///
    /// Returns `None` when the spec is excluded by the configured filter.
    pub async fn register_spec<F, Fut>(&mut self, name: &str, body: F) -> Option<SpecStatus>
    where
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = E2eResult<()>> + Send,
    {
        let suite = self.suite_label();
        if !self.selected(&suite, name) {
            debug!("Skipping filtered spec: {} > {}", suite, name);
            return None;
        }

        self.reporter.spec_started(&suite, name);
        let start = Instant::now();
        let outcome = run_guarded(body, self.config.spec_timeout).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        let result = match outcome {
            Ok(()) => TestResult {
                suite,
                name: name.to_string(),
                status: SpecStatus::Passed,
                duration_ms,
                error: None,
                failure_kind: None,
            },
            Err(e) => TestResult {
                suite,
                name: name.to_string(),
                status: SpecStatus::Failed,
                duration_ms,
                error: Some(e.detail()),
                failure_kind: Some(e.kind()),
            },
        };

        self.reporter.spec_finished(&result);
        let status = result.status;
        self.results.push(result);
        Some(status)
    }

    /// Results recorded so far
    pub fn results(&self) -> &[TestResult] {
        &self.results
    }

    /// Whether any spec has failed so far
    pub fn has_failures(&self) -> bool {
        self.results.iter().any(|r| !r.passed())
    }

    /// Close the run and hand back the aggregated summary
    pub fn finish(mut self) -> RunSummary {
        let passed = self.results.iter().filter(|r| r.passed()).count();
        let total = self.results.len();
        let summary = RunSummary {
            total,
            passed,
            failed: total - passed,
            duration_ms: self.started.elapsed().as_millis() as u64,
            results: std::mem::take(&mut self.results),
        };
        self.reporter.run_finished(&summary);
        summary
    }

    fn suite_label(&self) -> String {
        self.suite_path.join(" > ")
    }

    fn selected(&self, suite: &str, name: &str) -> bool {
        match &self.config.filter {
            Some(filter) => format!("{} > {}", suite, name).contains(filter.as_str()),
            None => true,
        }
    }
}

/// Await a spec body under the per-spec timeout, turning panics into failures
async fn run_guarded<F, Fut>(body: F, limit: Duration) -> E2eResult<()>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = E2eResult<()>>,
{
    let guarded = AssertUnwindSafe(async move { body().await }).catch_unwind();
    match tokio::time::timeout(limit, guarded).await {
        Err(_) => Err(E2eError::Timeout(format!("spec to finish within {:?}", limit))),
        Ok(Err(panic)) => Err(E2eError::Panicked(panic_message(panic.as_ref()))),
        Ok(Ok(result)) => result,
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
