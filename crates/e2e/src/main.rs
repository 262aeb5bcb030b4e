//! Fruit Stall E2E - Main Entry Point
//!
//! Runs the API contract specs and the browser scenarios against a running stack and
//! exits with 0 when everything passed, 1 when any spec failed and 2 when the run
//! could not start.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use fruitstall_e2e::config::HarnessConfig;
use fruitstall_e2e::playwright::{Browser, BrowserDriver, PlaywrightDriver};
use fruitstall_e2e::server::{launch_all, wait_for_ready};
use fruitstall_e2e::{
    ApiClient, ConsoleReporter, ContractSuite, TestRunner, UiScenario, UiScenarioSuite,
};

const SETUP_FAILURE: i32 = 2;
const SCENARIO_FILES_SUITE: &str = "Scenario Files";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SuiteSelection {
    Api,
    Ui,
    All,
}

impl SuiteSelection {
    fn api(self) -> bool {
        matches!(self, SuiteSelection::Api | SuiteSelection::All)
    }

    fn ui(self) -> bool {
        matches!(self, SuiteSelection::Ui | SuiteSelection::All)
    }
}

/// Fruit Stall E2E - API contract and browser tests
#[derive(Parser)]
#[command(name = "fruitstall-e2e")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML); defaults apply when it does not exist
    #[arg(short, long, default_value = "fruitstall-e2e.toml")]
    config: PathBuf,

    /// API base URL including the /api prefix
    #[arg(long, env = "FRUITSTALL_API_URL")]
    api_url: Option<String>,

    /// UI base URL
    #[arg(long, env = "FRUITSTALL_UI_URL")]
    ui_url: Option<String>,

    /// Which suites to run
    #[arg(long, value_enum, default_value_t = SuiteSelection::All)]
    suite: SuiteSelection,

    /// Only run specs whose "suite > name" label contains this text
    #[arg(long)]
    filter: Option<String>,

    /// Directory of extra YAML scenarios
    #[arg(long)]
    scenarios: Option<PathBuf>,

    /// Only run UI scenarios carrying this tag
    #[arg(long)]
    tag: Option<String>,

    /// Per-spec timeout in seconds
    #[arg(long)]
    timeout: Option<u64>,

    /// Directory for test-results.json and generated scripts
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Browser engine for UI scenarios
    #[arg(long, value_enum)]
    browser: Option<Browser>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Do not start the configured launch commands
    #[arg(long)]
    no_launch: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn apply(&self, config: &mut HarnessConfig) {
        if let Some(url) = &self.api_url {
            config.api.base_url = url.clone();
        }
        if let Some(url) = &self.ui_url {
            config.ui.base_url = url.clone();
        }
        if let Some(filter) = &self.filter {
            config.run.filter = Some(filter.clone());
        }
        if let Some(dir) = &self.scenarios {
            config.run.scenarios_dir = Some(dir.clone());
        }
        if let Some(tag) = &self.tag {
            config.run.tag = Some(tag.clone());
        }
        if let Some(secs) = self.timeout {
            config.run.spec_timeout_secs = secs;
        }
        if let Some(dir) = &self.output {
            config.ui.script_dir = dir.join("playwright");
            config.run.output_dir = dir.clone();
        }
        if let Some(browser) = self.browser {
            config.ui.browser = browser;
        }
        if self.headed {
            config.ui.headless = false;
        }
        if self.no_launch {
            config.launch.clear();
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("❌ {:#}", e);
            SETUP_FAILURE
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let mut config = HarnessConfig::load(&cli.config)?;
    cli.apply(&mut config);
    config.check()?;

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(0);
    }

    // Dropped at the end of the run, which stops them
    let _servers = launch_all(&config.launch, config.ready_timeout()).await?;

    if cli.suite.api() {
        wait_for_ready(&config.api.readiness_url(), config.ready_timeout()).await?;
    }

    let mut ui_suites = Vec::new();
    if cli.suite.ui() {
        wait_for_ready(&config.ui.base_url, config.ready_timeout()).await?;
        let driver: Arc<dyn BrowserDriver> = Arc::new(PlaywrightDriver::new(config.ui.clone())?);

        ui_suites.push((
            fruitstall_e2e::ui::SUITE_NAME,
            UiScenarioSuite::new(driver.clone()),
        ));
        if let Some(dir) = &config.run.scenarios_dir {
            let scenarios = UiScenario::load_all(dir)?;
            info!("Loaded {} scenario(s) from {}", scenarios.len(), dir.display());
            ui_suites.push((
                SCENARIO_FILES_SUITE,
                UiScenarioSuite::with_scenarios(driver, scenarios),
            ));
        }
    }

    let reporter = ConsoleReporter {
        summary_table: config.run.summary_table,
    };
    let mut runner = TestRunner::with_reporter(config.runner_config(), Box::new(reporter));

    if cli.suite.api() {
        let api = ApiClient::new(&config.api.base_url, config.api.request_timeout())?;
        ContractSuite::new(api).register(&mut runner).await;
    }

    for (name, suite) in ui_suites {
        let suite = match &config.run.tag {
            Some(tag) => suite.retain_tagged(tag),
            None => suite,
        };
        suite.register_as(&mut runner, name).await;
    }

    let summary = runner.finish();
    if let Err(e) = summary.write_json(&config.run.output_dir) {
        warn!("Could not write results: {}", e);
    }

    Ok(summary.exit_code())
}
