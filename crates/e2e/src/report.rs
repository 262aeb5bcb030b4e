//! Run reporting
//!
//! The runner talks to a [`Reporter`] at suite entry, around every spec, and once at
//! the end of the run. [`ConsoleReporter`] prints the familiar one-line-per-spec
//! output; [`MemoryReporter`] records events for embedding and tests.

use std::sync::Arc;

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use parking_lot::Mutex;

use crate::runner::{RunSummary, SpecStatus, TestResult};

/// Receives progress notifications from a [`TestRunner`](crate::runner::TestRunner)
pub trait Reporter: Send {
    /// A suite was entered; `path` holds the enclosing suite names, innermost last
    fn suite_started(&mut self, _path: &[String]) {}

    fn spec_started(&mut self, _suite: &str, _name: &str) {}

    fn spec_finished(&mut self, result: &TestResult);

    fn run_finished(&mut self, _summary: &RunSummary) {}
}

/// Prints progress to stdout and failures to stderr
#[derive(Debug, Default)]
pub struct ConsoleReporter {
    /// Print the summary table when the run finishes
    pub summary_table: bool,
}

impl ConsoleReporter {
    pub fn with_summary_table() -> Self {
        Self { summary_table: true }
    }
}

impl Reporter for ConsoleReporter {
    fn suite_started(&mut self, path: &[String]) {
        let indent = "  ".repeat(path.len().saturating_sub(1));
        if let Some(name) = path.last() {
            println!("\n{}Running test suite: {}", indent, name.bold());
        }
    }

    fn spec_started(&mut self, _suite: &str, name: &str) {
        println!("  - Running test: {}", name);
    }

    fn spec_finished(&mut self, result: &TestResult) {
        match result.status {
            SpecStatus::Passed => {
                println!("    {}: {} ({} ms)", result.name, "PASSED".green(), result.duration_ms);
            }
            SpecStatus::Failed => {
                eprintln!("    {}: {}", result.name, "FAILED".red());
                if let Some(error) = &result.error {
                    for line in error.lines() {
                        eprintln!("      {}", line);
                    }
                }
            }
        }
    }

    fn run_finished(&mut self, summary: &RunSummary) {
        if self.summary_table && !summary.results.is_empty() {
            println!();
            println!("{}", summary_table(summary));
        }

        let line = format!(
            "{} passed, {} failed ({} ms)",
            summary.passed, summary.failed, summary.duration_ms
        );
        println!();
        if summary.success() {
            println!("{}", line.green());
        } else {
            println!("{}", line.red());
        }
    }
}

/// Render every result as a table row
pub fn summary_table(summary: &RunSummary) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec!["Suite", "Spec", "Status", "Duration", "Failure"]);
    for result in &summary.results {
        table.add_row(vec![
            result.suite.clone(),
            result.name.clone(),
            result.status.to_string(),
            format!("{} ms", result.duration_ms),
            result
                .failure_kind
                .map(|k| k.to_string())
                .unwrap_or_default(),
        ]);
    }
    table
}

/// Event captured by [`MemoryReporter`]
#[derive(Debug, Clone, PartialEq)]
pub enum ReportEvent {
    SuiteStarted(String),
    SpecStarted { suite: String, name: String },
    SpecFinished { suite: String, name: String, status: SpecStatus },
    RunFinished { passed: usize, failed: usize },
}

/// Records events in memory; clones share the same log
#[derive(Debug, Clone, Default)]
pub struct MemoryReporter {
    events: Arc<Mutex<Vec<ReportEvent>>>,
}

impl MemoryReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ReportEvent> {
        self.events.lock().clone()
    }

    /// Names of the specs that finished with the given status, in run order
    pub fn specs_with_status(&self, status: SpecStatus) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                ReportEvent::SpecFinished { name, status: s, .. } if *s == status => {
                    Some(name.clone())
                }
                _ => None,
            })
            .collect()
    }
}

impl Reporter for MemoryReporter {
    fn suite_started(&mut self, path: &[String]) {
        self.events.lock().push(ReportEvent::SuiteStarted(path.join(" > ")));
    }

    fn spec_started(&mut self, suite: &str, name: &str) {
        self.events.lock().push(ReportEvent::SpecStarted {
            suite: suite.to_string(),
            name: name.to_string(),
        });
    }

    fn spec_finished(&mut self, result: &TestResult) {
        self.events.lock().push(ReportEvent::SpecFinished {
            suite: result.suite.clone(),
            name: result.name.clone(),
            status: result.status,
        });
    }

    fn run_finished(&mut self, summary: &RunSummary) {
        self.events.lock().push(ReportEvent::RunFinished {
            passed: summary.passed,
            failed: summary.failed,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[test]
    fn test_summary_table_lists_every_result() {
        let summary = RunSummary {
            total: 2,
            passed: 1,
            failed: 1,
            duration_ms: 12,
            results: vec![
                TestResult {
                    suite: "/products endpoint".into(),
                    name: "should GET all products".into(),
                    status: SpecStatus::Passed,
                    duration_ms: 4,
                    error: None,
                    failure_kind: None,
                },
                TestResult {
                    suite: "/orders endpoint".into(),
                    name: "should DELETE an order".into(),
                    status: SpecStatus::Failed,
                    duration_ms: 8,
                    error: Some("Assertion failed: expected 204, got 200".into()),
                    failure_kind: Some(FailureKind::Assertion),
                },
            ],
        };

        let rendered = summary_table(&summary).to_string();
        assert!(rendered.contains("should GET all products"));
        assert!(rendered.contains("FAILED"));
        assert!(rendered.contains("assertion"));
    }
}
