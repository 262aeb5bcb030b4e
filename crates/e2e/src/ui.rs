//! Browser-level scenarios for the storefront UI
//!
//! These mirror the API contract from the user's side: what the listing shows,
//! what the create/edit/order forms accept or reject, and how the Orders table
//! reacts to a delete. Scenarios run in order and later ones rely on data created
//! by earlier ones (a product to edit, an order to delete).

use std::sync::Arc;

use fruitstall_common::{format_price, parse_price_input};

use crate::error::E2eResult;
use crate::playwright::BrowserDriver;
use crate::runner::TestRunner;
use crate::scenario::{UiScenario, UiStep};

pub const SUITE_NAME: &str = "Product and Order Management E2E Tests";

pub const PRODUCT_NAME_REQUIRED: &str = "Product Name is required";
pub const PRODUCT_PRICE_INVALID: &str = "Product Price is invalid";
pub const QUANTITY_NOT_POSITIVE: &str = "Quantity must be greater than zero";

/// Columns the Orders table must expose
pub const ORDER_COLUMNS: [&str; 7] = [
    "Order ID",
    "Order Date",
    "Product Name",
    "Price",
    "Quantity",
    "Total",
    "Actions",
];

const CARD: &str = ".product-card";
const FIRST_CARD: &str = ".product-card >> nth=0";
const CARD_NAME: &str = ".product-card h3";
const CARD_TEXT: &str = ".product-card p";
const FIRST_CARD_BUTTON: &str = ".product-card >> nth=0 >> button";
const ORDER_ROWS: &str = "table tbody tr";
const FIRST_ROW_BUTTON: &str = "table tbody tr >> nth=0 >> button";
const FIRST_ROW_ID: &str = "table tbody tr >> nth=0 >> td >> nth=0";
const ORDER_ID_CELLS: &str = "table tbody tr td:first-child";

/// Index of "Quantity" in [`ORDER_COLUMNS`]
const QUANTITY_COLUMN: usize = 4;

const NEW_PRODUCT_PRICE: &str = "10.00";
const UPDATED_PRODUCT_PRICE: &str = "15.50";
const ORDER_QUANTITY: &str = "2";

/// Registers UI scenarios, one spec per scenario
#[derive(Clone)]
pub struct UiScenarioSuite {
    driver: Arc<dyn BrowserDriver>,
    scenarios: Vec<UiScenario>,
}

impl UiScenarioSuite {
    /// Suite with the built-in storefront scenarios
    pub fn new(driver: Arc<dyn BrowserDriver>) -> Self {
        Self::with_scenarios(driver, builtin_scenarios())
    }

    pub fn with_scenarios(driver: Arc<dyn BrowserDriver>, scenarios: Vec<UiScenario>) -> Self {
        Self { driver, scenarios }
    }

    /// Keep only scenarios carrying `tag`
    pub fn retain_tagged(mut self, tag: &str) -> Self {
        self.scenarios = UiScenario::filter_by_tag(self.scenarios, tag);
        self
    }

    pub fn scenarios(&self) -> &[UiScenario] {
        &self.scenarios
    }

    pub async fn register(&self, runner: &mut TestRunner) {
        self.register_as(runner, SUITE_NAME).await;
    }

    /// Register under a custom suite name (used for scenarios loaded from files)
    pub async fn register_as(&self, runner: &mut TestRunner, suite_name: &str) {
        let suite = self.clone();
        runner
            .register_suite(suite_name, move |r| {
                Box::pin(async move {
                    for scenario in &suite.scenarios {
                        r.register_spec(&scenario.name, || suite.run(scenario)).await;
                    }
                })
            })
            .await;
    }

    async fn run(&self, scenario: &UiScenario) -> E2eResult<()> {
        self.driver.run_scenario(scenario).await.map(|_| ())
    }
}

fn field(name: &str) -> String {
    format!("[name=\"{}\"]", name)
}

fn navigate(url: &str) -> UiStep {
    UiStep::Navigate { url: url.to_string() }
}

fn click(selector: &str, text: &str) -> UiStep {
    UiStep::Click {
        selector: selector.to_string(),
        has_text: Some(text.to_string()),
    }
}

fn fill(name: &str, value: &str) -> UiStep {
    UiStep::Fill {
        selector: field(name),
        value: value.to_string(),
    }
}

fn visible(selector: &str) -> UiStep {
    UiStep::AssertVisible {
        selector: selector.to_string(),
        has_text: None,
    }
}

fn visible_with(selector: &str, text: &str) -> UiStep {
    UiStep::AssertVisible {
        selector: selector.to_string(),
        has_text: Some(text.to_string()),
    }
}

/// Label the listing shows for a price typed into the form
fn price_label(input: &str) -> String {
    parse_price_input(input)
        .map(format_price)
        .unwrap_or_else(|| input.to_string())
}

/// The cell of the newest order row under `column`
fn last_row_cell(column: usize) -> String {
    format!("{} >> nth=-1 >> td >> nth={}", ORDER_ROWS, column)
}

fn not_empty(selector: &str) -> UiStep {
    UiStep::AssertNotEmpty { selector: selector.to_string() }
}

fn url_contains(fragment: &str) -> UiStep {
    UiStep::AssertUrlContains { fragment: fragment.to_string() }
}

fn message(text: &str) -> UiStep {
    UiStep::AssertTextVisible { text: text.to_string() }
}

fn record_count(selector: &str, slot: &str) -> UiStep {
    UiStep::RecordCount {
        selector: selector.to_string(),
        slot: slot.to_string(),
    }
}

fn count_changed_by(selector: &str, slot: &str, delta: i64) -> UiStep {
    UiStep::AssertCount {
        selector: selector.to_string(),
        slot: slot.to_string(),
        delta,
    }
}

/// Every scenario starts from the listing page
fn scenario(name: &str) -> UiScenario {
    UiScenario::new(name).step(navigate("/"))
}

/// The storefront scenarios, in execution order
pub fn builtin_scenarios() -> Vec<UiScenario> {
    vec![
        // Listing
        scenario("should load the product listing page and display product names")
            .tag("products")
            .step(visible(CARD_NAME))
            .step(not_empty(CARD_NAME)),
        scenario("should display product prices in the correct format")
            .tag("products")
            .step(visible_with(CARD_TEXT, fruitstall_common::CURRENCY_PREFIX))
            .step(UiStep::AssertEachMatches {
                selector: CARD.to_string(),
                pattern: r"MYR\d+\.\d{2}(?!\d)".to_string(),
            }),
        scenario("should display product descriptions")
            .tag("products")
            .step(visible(CARD_TEXT))
            .step(not_empty(CARD_TEXT)),
        // Create
        scenario("should navigate to the create product page and create a new product")
            .tag("products")
            .step(click("a", "Create"))
            .step(url_contains("/create"))
            .step(fill("name", "Test Product"))
            .step(fill("description", "Test Description"))
            .step(fill("price", NEW_PRODUCT_PRICE))
            .step(click("button", "Create"))
            .step(navigate("/"))
            .step(visible_with(CARD_NAME, "Test Product"))
            .step(visible_with(CARD_TEXT, "Test Description"))
            .step(visible_with(CARD_TEXT, &price_label(NEW_PRODUCT_PRICE))),
        scenario("should display an error when creating a product with an empty name")
            .tag("products")
            .tag("validation")
            .step(UiStep::WaitForNetworkIdle)
            .step(record_count(CARD, "cards"))
            .step(click("a", "Create"))
            .step(fill("description", "Description"))
            .step(fill("price", "12"))
            .step(UiStep::CountRequests {
                method: "POST".to_string(),
                url_contains: "/api/products".to_string(),
                slot: "product_posts".to_string(),
            })
            .step(click("button", "Create"))
            .step(message(PRODUCT_NAME_REQUIRED))
            .step(UiStep::AssertRequestCount {
                slot: "product_posts".to_string(),
                count: 0,
            })
            .step(navigate("/"))
            .step(UiStep::WaitForNetworkIdle)
            .step(count_changed_by(CARD, "cards", 0)),
        // Edit
        scenario("should navigate to the edit product page and update a product")
            .tag("products")
            .step(click(FIRST_CARD_BUTTON, "Edit"))
            .step(url_contains("/edit"))
            .step(fill("name", "Updated Product Name"))
            .step(fill("description", "Updated Description"))
            .step(fill("price", UPDATED_PRODUCT_PRICE))
            .step(click("button", "Update"))
            .step(navigate("/"))
            .step(visible_with(CARD_NAME, "Updated Product Name"))
            .step(visible_with(CARD_TEXT, &price_label(UPDATED_PRODUCT_PRICE))),
        scenario("should display an error when updating the product price with non-numeric input")
            .tag("products")
            .tag("validation")
            .step(visible(CARD))
            .step(UiStep::RecordText {
                selector: FIRST_CARD.to_string(),
                slot: "first_card".to_string(),
            })
            .step(click(FIRST_CARD_BUTTON, "Edit"))
            .step(fill("price", "abc"))
            .step(click("button", "Update"))
            .step(message(PRODUCT_PRICE_INVALID))
            .step(navigate("/"))
            .step(UiStep::AssertTextEquals {
                selector: FIRST_CARD.to_string(),
                slot: "first_card".to_string(),
            }),
        // Orders
        scenario("should navigate to the order creation page and create an order")
            .tag("orders")
            .step(click("a", "Orders"))
            .step(url_contains("/orders"))
            .step(UiStep::WaitForNetworkIdle)
            .step(record_count(ORDER_ROWS, "rows"))
            .step(navigate("/"))
            .step(click(FIRST_CARD_BUTTON, "Order"))
            .step(url_contains("/order"))
            .step(not_empty(&field("productName")))
            .step(not_empty(&field("productDescription")))
            .step(not_empty(&field("productPrice")))
            .step(fill("quantity", ORDER_QUANTITY))
            .step(click("button", "Create Order"))
            .step(click("a", "Orders"))
            .step(url_contains("/orders"))
            .step(count_changed_by(ORDER_ROWS, "rows", 1))
            .step(UiStep::AssertTextIs {
                selector: last_row_cell(QUANTITY_COLUMN),
                text: ORDER_QUANTITY.to_string(),
            }),
        scenario("should display an error when creating an order with quantity zero")
            .tag("orders")
            .tag("validation")
            .step(click("a", "Orders"))
            .step(UiStep::WaitForNetworkIdle)
            .step(record_count(ORDER_ROWS, "rows"))
            .step(navigate("/"))
            .step(click(FIRST_CARD_BUTTON, "Order"))
            .step(fill("quantity", "0"))
            .step(click("button", "Create Order"))
            .step(message(QUANTITY_NOT_POSITIVE))
            .step(click("a", "Orders"))
            .step(UiStep::WaitForNetworkIdle)
            .step(count_changed_by(ORDER_ROWS, "rows", 0)),
        orders_listing_and_delete(),
    ]
}

fn orders_listing_and_delete() -> UiScenario {
    let mut scenario = scenario("should display orders and delete an order")
        .tag("orders")
        .step(click("a", "Orders"))
        .step(url_contains("/orders"));

    for column in ORDER_COLUMNS {
        scenario = scenario.step(visible_with("table", column));
    }

    scenario
        .step(visible(ORDER_ROWS))
        .step(record_count(ORDER_ROWS, "rows"))
        .step(UiStep::RecordText {
            selector: FIRST_ROW_ID.to_string(),
            slot: "first_order_id".to_string(),
        })
        .step(UiStep::AcceptDialogs)
        .step(click(FIRST_ROW_BUTTON, "Delete"))
        .step(count_changed_by(ORDER_ROWS, "rows", -1))
        .step(UiStep::AssertNoneEqual {
            selector: ORDER_ID_CELLS.to_string(),
            slot: "first_order_id".to_string(),
        })
}
