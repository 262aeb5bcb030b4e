//! Contract suite against an in-process API

mod support;

use std::time::Duration;

use fruitstall_common::{EntityId, EntityKind, EntityState};
use fruitstall_e2e::error::FailureKind;
use fruitstall_e2e::report::ReportEvent;
use fruitstall_e2e::{
    ApiClient, ContractSuite, MemoryReporter, RunSummary, RunnerConfig, SpecStatus, TestRunner,
};
use support::{StubApi, StubBehaviour};

const ORDER_SPEC: &str = "should POST a new order and GET it";

async fn run_contract(stub: &StubApi) -> (RunSummary, MemoryReporter, ContractSuite) {
    let api = ApiClient::new(stub.base_url(), Duration::from_secs(5)).unwrap();
    let suite = ContractSuite::new(api);
    let reporter = MemoryReporter::new();

    let mut runner = TestRunner::with_reporter(RunnerConfig::default(), Box::new(reporter.clone()));
    suite.register(&mut runner).await;

    (runner.finish(), reporter, suite)
}

#[tokio::test]
async fn contract_passes_against_conforming_api() {
    let stub = StubApi::start(StubBehaviour::default()).await;
    let (summary, reporter, _) = run_contract(&stub).await;

    for result in &summary.results {
        assert!(result.passed(), "{} failed: {:?}", result.name, result.error);
    }
    assert_eq!(summary.total, 7);
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.exit_code(), 0);

    assert_eq!(
        reporter.specs_with_status(SpecStatus::Passed),
        vec![
            "should GET all products",
            "should POST a new product and GET it",
            "should POST a product without a description",
            "should DELETE a product",
            "should POST a new order and GET it",
            "should GET all orders",
            "should DELETE an order",
        ]
    );
}

#[tokio::test]
async fn contract_reports_nested_suites_in_order() {
    let stub = StubApi::start(StubBehaviour::default()).await;
    let (_, reporter, _) = run_contract(&stub).await;

    let suites: Vec<String> = reporter
        .events()
        .into_iter()
        .filter_map(|e| match e {
            ReportEvent::SuiteStarted(label) => Some(label),
            _ => None,
        })
        .collect();
    assert_eq!(
        suites,
        vec![
            "Fruit Stall API Integration Tests",
            "Fruit Stall API Integration Tests > /products endpoint",
            "Fruit Stall API Integration Tests > /orders endpoint",
        ]
    );
    assert_eq!(
        reporter.events().last(),
        Some(&ReportEvent::RunFinished { passed: 7, failed: 0 })
    );
}

#[tokio::test]
async fn wrong_order_total_fails_only_the_order_spec() {
    let stub = StubApi::start(StubBehaviour {
        wrong_total: true,
        ..Default::default()
    })
    .await;
    let (summary, reporter, _) = run_contract(&stub).await;

    assert_eq!(reporter.specs_with_status(SpecStatus::Failed), vec![ORDER_SPEC]);
    assert_eq!(summary.passed, 6);
    assert_eq!(summary.exit_code(), 1);

    let failed = summary.results.iter().find(|r| r.name == ORDER_SPEC).unwrap();
    assert_eq!(failed.failure_kind, Some(FailureKind::Assertion));
    assert!(failed.error.as_deref().unwrap().contains("expected total 20"));
}

#[tokio::test]
async fn reused_ids_are_flagged() {
    let stub = StubApi::start(StubBehaviour {
        reuse_ids: true,
        ..Default::default()
    })
    .await;
    let (summary, reporter, suite) = run_contract(&stub).await;

    // The product deleted by "should DELETE a product" has the highest id, so the
    // next product created gets it again.
    assert_eq!(reporter.specs_with_status(SpecStatus::Failed), vec![ORDER_SPEC]);
    let failed = summary.results.iter().find(|r| r.name == ORDER_SPEC).unwrap();
    assert!(failed.error.as_deref().unwrap().contains("already issued"), "{:?}", failed.error);

    let ledger = suite.ledger();
    let ledger = ledger.lock();
    assert_eq!(ledger.state(EntityKind::Product, &EntityId::from(3)), EntityState::Absent);
    assert!(ledger.was_issued(EntityKind::Product, &EntityId::from(3)));
}

#[tokio::test]
async fn unreachable_api_fails_every_spec_as_transport() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();
    let api = ApiClient::new(&format!("http://127.0.0.1:{}/api", port), Duration::from_secs(1)).unwrap();

    let mut runner = TestRunner::new(RunnerConfig::default());
    ContractSuite::new(api).register(&mut runner).await;
    let summary = runner.finish();

    assert_eq!(summary.failed, 7);
    assert!(summary
        .results
        .iter()
        .all(|r| r.failure_kind == Some(FailureKind::Transport)));
    assert_eq!(summary.exit_code(), 1);
}

#[tokio::test]
async fn filter_selects_specs_by_label() {
    let stub = StubApi::start(StubBehaviour::default()).await;
    let api = ApiClient::new(stub.base_url(), Duration::from_secs(5)).unwrap();

    let config = RunnerConfig {
        filter: Some("/orders endpoint".into()),
        ..Default::default()
    };
    let mut runner = TestRunner::new(config);
    ContractSuite::new(api).register(&mut runner).await;
    let summary = runner.finish();

    assert_eq!(summary.total, 3);
    assert!(summary.success());
}

/// Run the contract against a misbehaving stub and return the failed specs, checking
/// each failure is classified as an assertion
async fn failed_specs(behaviour: StubBehaviour) -> Vec<String> {
    let stub = StubApi::start(behaviour).await;
    let (summary, reporter, _) = run_contract(&stub).await;

    for result in summary.results.iter().filter(|r| !r.passed()) {
        assert_eq!(
            result.failure_kind,
            Some(FailureKind::Assertion),
            "{}: {:?}",
            result.name,
            result.error
        );
    }
    assert_eq!(summary.exit_code(), 1);
    reporter.specs_with_status(SpecStatus::Failed)
}

#[tokio::test]
async fn deleted_record_still_readable_fails_delete_specs() {
    let failed = failed_specs(StubBehaviour {
        soft_delete: true,
        ..Default::default()
    })
    .await;
    assert_eq!(failed, vec!["should DELETE a product", "should DELETE an order"]);
}

#[tokio::test]
async fn repeat_delete_answering_204_fails_delete_specs() {
    let failed = failed_specs(StubBehaviour {
        idempotent_delete: true,
        ..Default::default()
    })
    .await;
    assert_eq!(failed, vec!["should DELETE a product", "should DELETE an order"]);
}

#[tokio::test]
async fn dropped_description_fails_specs_that_submit_one() {
    let failed = failed_specs(StubBehaviour {
        drop_description: true,
        ..Default::default()
    })
    .await;
    assert_eq!(
        failed,
        vec!["should POST a new product and GET it", ORDER_SPEC]
    );
}

#[tokio::test]
async fn price_coerced_to_string_fails_every_product_create() {
    let failed = failed_specs(StubBehaviour {
        price_as_string: true,
        ..Default::default()
    })
    .await;
    assert_eq!(
        failed,
        vec![
            "should POST a new product and GET it",
            "should POST a product without a description",
            "should DELETE a product",
            ORDER_SPEC,
            "should DELETE an order",
        ]
    );
}

#[tokio::test]
async fn null_listing_fails_list_specs() {
    let failed = failed_specs(StubBehaviour {
        null_list: true,
        ..Default::default()
    })
    .await;
    assert_eq!(failed, vec!["should GET all products", "should GET all orders"]);
}
