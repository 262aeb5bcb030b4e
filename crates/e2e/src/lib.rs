//! Fruit Stall E2E Test Harness
//!
//! This crate checks a running Fruit Stall stack from the outside:
//! - API contract specs against `/api/products` and `/api/orders`
//! - Browser scenarios driven through Playwright
//! - A sequential runner that reports every spec and turns the outcome into an
//!   exit code
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                 fruitstall-e2e (binary)                     │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── register_suite(name, |r| async { ... })              │
//! │    ├── register_spec(name, || async { ... })                │
//! │    └── finish() -> RunSummary -> exit code                  │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ContractSuite                  UiScenarioSuite             │
//! │    └── ApiClient (reqwest)        └── BrowserDriver         │
//! │          + expect helpers               └── Playwright      │
//! │          + IdLedger                         (node script)   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  UiScenario (built-in or YAML)                              │
//! │    └── steps: navigate, click, fill, assert_*, record_*     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod contract;
pub mod error;
pub mod expect;
pub mod playwright;
pub mod report;
pub mod runner;
pub mod scenario;
pub mod server;
pub mod ui;

pub use api::{ApiClient, ApiResponse};
pub use config::HarnessConfig;
pub use contract::ContractSuite;
pub use error::{E2eError, E2eResult, FailureKind};
pub use playwright::{BrowserDriver, PlaywrightDriver};
pub use report::{ConsoleReporter, MemoryReporter, Reporter};
pub use runner::{RunSummary, RunnerConfig, SpecStatus, TestResult, TestRunner};
pub use scenario::{UiScenario, UiStep};
pub use ui::UiScenarioSuite;
