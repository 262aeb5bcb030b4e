//! UI suite wiring with fake browser drivers

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use fruitstall_e2e::error::{E2eError, E2eResult, FailureKind};
use fruitstall_e2e::playwright::{BrowserDriver, ScenarioReport};
use fruitstall_e2e::ui::{builtin_scenarios, SUITE_NAME};
use fruitstall_e2e::{
    MemoryReporter, RunnerConfig, SpecStatus, TestRunner, UiScenario, UiScenarioSuite, UiStep,
};

/// Records which scenarios it was asked to run; fails the ones named in `failing`
#[derive(Default)]
struct RecordingDriver {
    seen: Mutex<Vec<String>>,
    failing: Vec<String>,
}

#[async_trait]
impl BrowserDriver for RecordingDriver {
    async fn run_scenario(&self, scenario: &UiScenario) -> E2eResult<ScenarioReport> {
        self.seen.lock().push(scenario.name.clone());
        if self.failing.contains(&scenario.name) {
            return Err(E2eError::StepFailed {
                step: "assert_text_visible 'Product Name is required'".into(),
                reason: "expect(locator).toBeVisible() failed".into(),
            });
        }
        Ok(ScenarioReport::default())
    }
}

/// Never finishes a scenario
struct HangingDriver;

#[async_trait]
impl BrowserDriver for HangingDriver {
    async fn run_scenario(&self, _scenario: &UiScenario) -> E2eResult<ScenarioReport> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(ScenarioReport::default())
    }
}

#[tokio::test]
async fn every_builtin_scenario_runs_once_in_order() {
    let driver = Arc::new(RecordingDriver::default());
    let reporter = MemoryReporter::new();
    let mut runner = TestRunner::with_reporter(RunnerConfig::default(), Box::new(reporter.clone()));

    UiScenarioSuite::new(driver.clone()).register(&mut runner).await;
    let summary = runner.finish();

    let expected: Vec<String> = builtin_scenarios().into_iter().map(|s| s.name).collect();
    assert_eq!(*driver.seen.lock(), expected);
    assert_eq!(reporter.specs_with_status(SpecStatus::Passed), expected);
    assert!(summary.results.iter().all(|r| r.suite == SUITE_NAME));
    assert_eq!(summary.exit_code(), 0);
}

#[tokio::test]
async fn failing_scenario_does_not_stop_the_rest() {
    let failing = "should display an error when creating a product with an empty name";
    let driver = Arc::new(RecordingDriver {
        failing: vec![failing.to_string()],
        ..Default::default()
    });
    let reporter = MemoryReporter::new();
    let mut runner = TestRunner::with_reporter(RunnerConfig::default(), Box::new(reporter.clone()));

    UiScenarioSuite::new(driver.clone()).register(&mut runner).await;
    let summary = runner.finish();

    assert_eq!(driver.seen.lock().len(), 10);
    assert_eq!(reporter.specs_with_status(SpecStatus::Failed), vec![failing]);
    assert_eq!(summary.passed, 9);
    assert_eq!(summary.exit_code(), 1);

    let result = summary.results.iter().find(|r| r.name == failing).unwrap();
    assert_eq!(result.failure_kind, Some(FailureKind::Assertion));
}

#[tokio::test]
async fn hanging_scenario_times_out() {
    let scenario = UiScenario::new("hangs")
        .step(UiStep::Navigate { url: "/".into() })
        .step(UiStep::AssertTextVisible { text: "never".into() });
    let config = RunnerConfig {
        spec_timeout: Duration::from_millis(50),
        ..Default::default()
    };
    let mut runner = TestRunner::new(config);

    UiScenarioSuite::with_scenarios(Arc::new(HangingDriver), vec![scenario])
        .register_as(&mut runner, "Scenario Files")
        .await;
    let summary = runner.finish();

    assert_eq!(summary.failed, 1);
    assert_eq!(summary.results[0].suite, "Scenario Files");
    assert_eq!(summary.results[0].failure_kind, Some(FailureKind::Timeout));
}

#[tokio::test]
async fn yaml_scenarios_join_the_run_after_builtins() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("orders_header.yaml"),
        r#"
name: orders page shows the Total column
tags: [orders]
steps:
  - action: navigate
    url: /orders
  - action: assert_visible
    selector: table
    has_text: Total
"#,
    )
    .unwrap();

    let driver = Arc::new(RecordingDriver::default());
    let mut runner = TestRunner::new(RunnerConfig::default());

    UiScenarioSuite::new(driver.clone())
        .retain_tagged("orders")
        .register(&mut runner)
        .await;
    UiScenarioSuite::with_scenarios(driver.clone(), UiScenario::load_all(dir.path()).unwrap())
        .register_as(&mut runner, "Scenario Files")
        .await;
    let summary = runner.finish();

    let seen = driver.seen.lock().clone();
    assert_eq!(seen.len(), 4);
    assert_eq!(seen.last().map(String::as_str), Some("orders page shows the Total column"));
    assert!(summary.success());
}
