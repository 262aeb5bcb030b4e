//! Playwright browser automation
//!
//! A scenario is compiled into one Node script driving `@playwright/test`, so every
//! step of a scenario shares a single browser page. The script reports one JSON line
//! per completed step on stdout, which is how a failure is pinned to its step.

use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::process::Command as TokioCommand;
use tracing::{debug, info};

use crate::error::{E2eError, E2eResult};
use crate::scenario::{UiScenario, UiStep};

/// Executes browser scenarios against the UI under test
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    async fn run_scenario(&self, scenario: &UiScenario) -> E2eResult<ScenarioReport>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

/// Result of executing a scenario step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub success: bool,
    pub step_name: String,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Outcome of a scenario that ran to the end
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub steps: Vec<StepResult>,
    pub duration_ms: u64,
}

/// Configuration for Playwright
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaywrightConfig {
    /// Base URL of the UI under test
    pub base_url: String,
    pub browser: Browser,
    pub headless: bool,
    /// Timeout for each action and auto-retrying assertion
    pub step_timeout_ms: u64,
    /// Where generated scripts are written; `@playwright/test` must be resolvable
    /// from here or through `node_path`
    pub script_dir: PathBuf,
    /// Extra module search path passed as `NODE_PATH`
    pub node_path: Option<PathBuf>,
    pub node_binary: String,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:4200".to_string(),
            browser: Browser::Chromium,
            headless: true,
            step_timeout_ms: 5000,
            script_dir: PathBuf::from("test-results/playwright"),
            node_path: None,
            node_binary: "node".to_string(),
        }
    }
}

/// [`BrowserDriver`] backed by Playwright scripts run through `node`
pub struct PlaywrightDriver {
    config: PlaywrightConfig,
}

impl PlaywrightDriver {
    /// Create a driver, checking that Playwright is installed
    pub fn new(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed()?;
        std::fs::create_dir_all(&config.script_dir)?;
        Ok(Self { config })
    }

    /// Check if Playwright is installed
    fn check_playwright_installed() -> E2eResult<()> {
        let output = Command::new("npx")
            .args(["playwright", "--version"])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();

        match output {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    /// Execute a script with node, returning (exit success, stdout, stderr)
    async fn run_script(&self, name: &str, script: &str) -> E2eResult<(bool, String, String)> {
        let script_path = self.config.script_dir.join(format!("{}.js", slug(name)));
        std::fs::write(&script_path, script)?;

        debug!("Running Playwright script: {}", script_path.display());

        let mut cmd = TokioCommand::new(&self.config.node_binary);
        cmd.arg(&script_path).kill_on_drop(true);
        if let Some(node_path) = &self.config.node_path {
            cmd.env("NODE_PATH", node_path);
        }

        let output = cmd.output().await.map_err(|e| {
            E2eError::Playwright(format!("Failed to run {}: {}", self.config.node_binary, e))
        })?;

        Ok((
            output.status.success(),
            String::from_utf8_lossy(&output.stdout).into_owned(),
            String::from_utf8_lossy(&output.stderr).into_owned(),
        ))
    }
}

#[async_trait]
impl BrowserDriver for PlaywrightDriver {
    async fn run_scenario(&self, scenario: &UiScenario) -> E2eResult<ScenarioReport> {
        scenario.validate()?;
        let start = Instant::now();
        let script = build_script(&self.config, scenario);
        let (success, stdout, stderr) = self.run_script(&scenario.name, &script).await?;

        let mut report = interpret_output(scenario, success, &stdout, &stderr)?;
        report.duration_ms = start.elapsed().as_millis() as u64;
        info!(
            "Scenario '{}' passed {} step(s) in {} ms",
            scenario.name,
            report.steps.len(),
            report.duration_ms
        );
        Ok(report)
    }
}

/// Line emitted by the generated script
#[derive(Debug, Deserialize)]
struct ScriptEvent {
    step: usize,
    ok: bool,
    #[serde(default)]
    ms: u64,
    #[serde(default)]
    error: Option<String>,
}

/// Turn the script's stdout into a report, or the error of the failing step
pub fn interpret_output(
    scenario: &UiScenario,
    success: bool,
    stdout: &str,
    stderr: &str,
) -> E2eResult<ScenarioReport> {
    let mut steps = Vec::new();

    for line in stdout.lines() {
        let Ok(event) = serde_json::from_str::<ScriptEvent>(line.trim()) else {
            continue;
        };
        let step_name = scenario
            .steps
            .get(event.step)
            .map(UiStep::label)
            .unwrap_or_else(|| format!("step {}", event.step + 1));

        if !event.ok {
            return Err(E2eError::StepFailed {
                step: step_name,
                reason: event.error.unwrap_or_else(|| "unknown error".to_string()),
            });
        }
        steps.push(StepResult {
            success: true,
            step_name,
            duration_ms: event.ms,
            error: None,
        });
    }

    if !success || steps.len() != scenario.steps.len() {
        return Err(E2eError::Playwright(format!(
            "Script stopped after {} of {} steps:\nstdout: {}\nstderr: {}",
            steps.len(),
            scenario.steps.len(),
            stdout,
            stderr
        )));
    }

    Ok(ScenarioReport { steps, duration_ms: 0 })
}

/// Build the Playwright script for a scenario
pub fn build_script(config: &PlaywrightConfig, scenario: &UiScenario) -> String {
    let mut script = String::new();

    // Header
    script.push_str(&format!(
        r#"const {{ chromium, firefox, webkit, expect }} = require('@playwright/test');

(async () => {{
  const browser = await {browser}.launch({{ headless: {headless} }});
  const context = await browser.newContext({{
    viewport: {{ width: {width}, height: {height} }}
  }});
  const page = await context.newPage();
  page.setDefaultTimeout({timeout});
  const check = expect.configure({{ timeout: {timeout} }});
  const baseUrl = {base_url};
  const slots = {{}};
  const find = (selector, hasText) => {{
    const locator = page.locator(selector);
    return hasText === null ? locator : locator.filter({{ hasText }});
  }};
  const norm = (text) => (text || '').replace(/\s+/g, ' ').trim();
  const readValue = async (locator) => {{
    const tag = await locator.evaluate((node) => node.tagName.toLowerCase());
    return ['input', 'textarea', 'select'].includes(tag)
      ? await locator.inputValue()
      : await locator.innerText();
  }};
  let current = 0;
  let started = Date.now();
  const done = () => console.log(JSON.stringify({{ step: current, ok: true, ms: Date.now() - started }}));

  try {{
"#,
        browser = config.browser.as_str(),
        headless = config.headless,
        width = scenario.viewport.width,
        height = scenario.viewport.height,
        timeout = config.step_timeout_ms,
        base_url = js(config.base_url.trim_end_matches('/')),
    ));

    // Generate step code
    for (i, step) in scenario.steps.iter().enumerate() {
        script.push_str(&format!("\n    // Step {}: {}\n", i + 1, step.label()));
        script.push_str(&format!("    current = {}; started = Date.now();\n", i));
        script.push_str(&step_to_js(step));
        script.push_str("\n    done();\n");
    }

    // Footer
    script.push_str(
        r#"
  } catch (error) {
    const message = error && error.message ? error.message : String(error);
    console.log(JSON.stringify({ step: current, ok: false, error: message }));
    process.exitCode = 1;
  } finally {
    await browser.close();
  }
})();
"#,
    );

    script
}

/// Convert a step to JavaScript code
fn step_to_js(step: &UiStep) -> String {
    match step {
        UiStep::Navigate { url } => {
            format!("    await page.goto(baseUrl + {});", js(url))
        }
        UiStep::AssertUrlContains { fragment } => {
            format!(
                "    await page.waitForURL((url) => url.href.includes({}));",
                js(fragment)
            )
        }
        UiStep::Click { selector, has_text } => {
            format!(
                "    await find({}, {}).first().click();",
                js(selector),
                js_opt(has_text)
            )
        }
        UiStep::Fill { selector, value } => {
            format!(
                "    await find({}, null).first().fill({});",
                js(selector),
                js(value)
            )
        }
        UiStep::AcceptDialogs => {
            "    page.on('dialog', (dialog) => dialog.accept());".to_string()
        }
        UiStep::AssertVisible { selector, has_text } => {
            format!(
                "    await check(find({}, {}).first()).toBeVisible();",
                js(selector),
                js_opt(has_text)
            )
        }
        UiStep::AssertTextVisible { text } => {
            format!(
                "    await check(page.getByText({}).first()).toBeVisible();",
                js(text)
            )
        }
        UiStep::AssertNotEmpty { selector } => {
            format!(
                "    await check.poll(async () => (await readValue(find({}, null).first())).trim()).not.toBe('');",
                js(selector)
            )
        }
        UiStep::AssertEachMatches { selector, pattern } => {
            format!(
                r#"    {{
      const matches = find({selector}, null);
      await check(matches.first()).toBeVisible();
      const pattern = new RegExp({pattern});
      const offenders = (await matches.allInnerTexts()).filter((text) => !pattern.test(text));
      if (offenders.length > 0) {{
        throw new Error(`expect(each ${{{selector}}}).toMatch(${{pattern}}) failed for: ${{offenders.join(' | ')}}`);
      }}
    }}"#,
                selector = js(selector),
                pattern = js(pattern),
            )
        }
        UiStep::RecordCount { selector, slot } => {
            format!(
                "    slots[{}] = await find({}, null).count();",
                js(slot),
                js(selector)
            )
        }
        UiStep::AssertCount { selector, slot, delta } => {
            format!(
                "    await check(find({}, null)).toHaveCount(slots[{}] + ({}));",
                js(selector),
                js(slot),
                delta
            )
        }
        UiStep::AssertTextIs { selector, text } => {
            format!(
                "    await check(find({}, null).first()).toHaveText({});",
                js(selector),
                js(text)
            )
        }
        UiStep::WaitForNetworkIdle => "    await page.waitForLoadState('networkidle');".to_string(),
        // textContent, the same text `toHaveText` compares against
        UiStep::RecordText { selector, slot } => {
            format!(
                "    slots[{}] = norm(await find({}, null).first().textContent());",
                js(slot),
                js(selector)
            )
        }
        UiStep::AssertTextEquals { selector, slot } => {
            format!(
                "    await check(find({}, null).first()).toHaveText(slots[{}]);",
                js(selector),
                js(slot)
            )
        }
        UiStep::AssertNoneEqual { selector, slot } => {
            format!(
                "    await check.poll(async () => (await find({}, null).allTextContents()).map(norm).filter((text) => text === slots[{}]).length).toBe(0);",
                js(selector),
                js(slot)
            )
        }
        UiStep::CountRequests { method, url_contains, slot } => {
            format!(
                r#"    slots[{slot}] = 0;
    page.on('request', (request) => {{
      if (request.method() === {method} && request.url().includes({url})) slots[{slot}] += 1;
    }});"#,
                slot = js(slot),
                method = js(&method.to_uppercase()),
                url = js(url_contains),
            )
        }
        UiStep::AssertRequestCount { slot, count } => {
            format!(
                "    await page.waitForLoadState('networkidle');\n    check(slots[{}]).toBe({});",
                js(slot),
                count
            )
        }
        UiStep::Log { message } => {
            format!("    console.error('[scenario] ' + {});", js(message))
        }
    }
}

/// Quote a string as a JavaScript literal
fn js(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

fn js_opt(s: &Option<String>) -> String {
    s.as_deref().map(js).unwrap_or_else(|| "null".to_string())
}

fn slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}
