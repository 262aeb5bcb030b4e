//! Browser scenarios as data
//!
//! A [`UiScenario`] is an ordered list of [`UiStep`]s executed in a single browser
//! session. Built-in scenarios are constructed in code (see `ui.rs`); extra ones
//! can be loaded from YAML files using the same step vocabulary.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{E2eError, E2eResult};

/// A complete browser scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UiScenario {
    /// Unique name for this scenario, used as the spec name
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering scenarios
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport size for the browser
    #[serde(default)]
    pub viewport: Viewport,

    /// Steps to execute in order
    pub steps: Vec<UiStep>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Viewport { width: 1280, height: 720 }
    }
}

/// A single step in a scenario.
///
/// Selectors use Playwright syntax, so `.product-card >> nth=0 >> button` narrows to
/// buttons inside the first card. `has_text` further filters matches by substring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum UiStep {
    /// Navigate to a URL (relative to the UI base)
    Navigate { url: String },

    /// The current URL must contain `fragment`
    AssertUrlContains { fragment: String },

    /// Click the first element matching the selector
    Click {
        selector: String,
        #[serde(default)]
        has_text: Option<String>,
    },

    /// Replace the value of an input field
    Fill { selector: String, value: String },

    /// Accept every confirmation dialog raised from here on
    AcceptDialogs,

    /// The first matching element must be visible
    AssertVisible {
        selector: String,
        #[serde(default)]
        has_text: Option<String>,
    },

    /// Some visible element must contain this text. Matching is a case-insensitive
    /// substring match on whitespace-normalised text, so surrounding punctuation or
    /// markup around a validation message does not matter.
    AssertTextVisible { text: String },

    /// The first match's whitespace-normalised text must be exactly `text`
    AssertTextIs { selector: String, text: String },

    /// Wait until the page has had no network traffic for a moment; passes on an
    /// empty list as well as a full one
    WaitForNetworkIdle,

    /// The first match must have a non-empty value (inputs) or text (anything else)
    AssertNotEmpty { selector: String },

    /// Every element matching the selector must match the regular expression
    AssertEachMatches { selector: String, pattern: String },

    /// Remember how many elements match the selector
    RecordCount { selector: String, slot: String },

    /// Match count must equal a recorded count plus `delta`
    AssertCount {
        selector: String,
        slot: String,
        #[serde(default)]
        delta: i64,
    },

    /// Remember the whitespace-normalised text content of the first matching element
    RecordText { selector: String, slot: String },

    /// The first match must still have the recorded text
    AssertTextEquals { selector: String, slot: String },

    /// No element matching the selector may have exactly the recorded text
    AssertNoneEqual { selector: String, slot: String },

    /// Count browser requests with this method whose URL contains `url_contains`,
    /// from this step on
    CountRequests {
        method: String,
        url_contains: String,
        slot: String,
    },

    /// Once the network is idle, the requests counted into `slot` must equal `count`
    AssertRequestCount { slot: String, count: u64 },

    /// Log a message (for debugging)
    Log { message: String },
}

impl UiStep {
    /// Short label used in logs and failure messages
    pub fn label(&self) -> String {
        match self {
            UiStep::Navigate { url } => format!("navigate:{}", url),
            UiStep::AssertUrlContains { fragment } => format!("assert_url:{}", fragment),
            UiStep::Click { selector, has_text } => with_text("click", selector, has_text),
            UiStep::Fill { selector, .. } => format!("fill:{}", selector),
            UiStep::AcceptDialogs => "accept_dialogs".to_string(),
            UiStep::AssertVisible { selector, has_text } => {
                with_text("assert_visible", selector, has_text)
            }
            UiStep::AssertTextVisible { text } => format!("assert_text:{}", text),
            UiStep::AssertNotEmpty { selector } => format!("assert_not_empty:{}", selector),
            UiStep::AssertEachMatches { selector, .. } => format!("assert_each_matches:{}", selector),
            UiStep::RecordCount { selector, slot } => format!("record_count:{}->{}", selector, slot),
            UiStep::AssertCount { selector, slot, delta } => {
                format!("assert_count:{}=={}{:+}", selector, slot, delta)
            }
            UiStep::RecordText { selector, slot } => format!("record_text:{}->{}", selector, slot),
            UiStep::AssertTextEquals { selector, slot } => {
                format!("assert_text_equals:{}=={}", selector, slot)
            }
            UiStep::AssertTextIs { selector, text } => format!("assert_text_is:{}=={}", selector, text),
            UiStep::WaitForNetworkIdle => "wait_for_network_idle".to_string(),
            UiStep::AssertNoneEqual { selector, slot } => {
                format!("assert_none_equal:{}!={}", selector, slot)
            }
            UiStep::CountRequests { method, url_contains, slot } => {
                format!("count_requests:{} {}->{}", method, url_contains, slot)
            }
            UiStep::AssertRequestCount { slot, count } => {
                format!("assert_request_count:{}=={}", slot, count)
            }
            UiStep::Log { message } => format!("log:{}", message.chars().take(30).collect::<String>()),
        }
    }

    /// Slot this step reads, if any
    fn reads_slot(&self) -> Option<&str> {
        match self {
            UiStep::AssertCount { slot, .. }
            | UiStep::AssertTextEquals { slot, .. }
            | UiStep::AssertNoneEqual { slot, .. }
            | UiStep::AssertRequestCount { slot, .. } => Some(slot.as_str()),
            _ => None,
        }
    }

    /// Slot this step writes, if any
    fn writes_slot(&self) -> Option<&str> {
        match self {
            UiStep::RecordCount { slot, .. }
            | UiStep::RecordText { slot, .. }
            | UiStep::CountRequests { slot, .. } => Some(slot.as_str()),
            _ => None,
        }
    }
}

fn with_text(action: &str, selector: &str, has_text: &Option<String>) -> String {
    match has_text {
        Some(text) => format!("{}:{}[{}]", action, selector, text),
        None => format!("{}:{}", action, selector),
    }
}

impl UiScenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            tags: Vec::new(),
            viewport: Viewport::default(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: UiStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    /// Reject scenarios that read a slot before recording it
    pub fn validate(&self) -> E2eResult<()> {
        if self.steps.is_empty() {
            return Err(E2eError::ScenarioParse(format!("{}: no steps", self.name)));
        }
        let mut recorded: Vec<&str> = Vec::new();
        for (i, step) in self.steps.iter().enumerate() {
            if let Some(slot) = step.reads_slot() {
                if !recorded.contains(&slot) {
                    return Err(E2eError::ScenarioParse(format!(
                        "{}: step {} ({}) reads slot '{}' before it is recorded",
                        self.name,
                        i + 1,
                        step.label(),
                        slot
                    )));
                }
            }
            if let Some(slot) = step.writes_slot() {
                recorded.push(slot);
            }
        }
        Ok(())
    }

    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let scenario: Self = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::ScenarioParse(format!("{}: {}", path.display(), e)))
    }

    /// Load all scenarios from a directory, sorted by file path
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        let mut paths: Vec<_> = walkdir::WalkDir::new(dir)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
            .map(|e| e.into_path())
            .collect();
        paths.sort();

        paths.iter().map(|p| Self::from_file(p)).collect()
    }

    /// Filter scenarios by tag
    pub fn filter_by_tag(scenarios: Vec<Self>, tag: &str) -> Vec<Self> {
        scenarios
            .into_iter()
            .filter(|s| s.tags.iter().any(|t| t == tag))
            .collect()
    }
}
