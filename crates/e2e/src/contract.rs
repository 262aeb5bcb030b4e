//! API contract suite for `/products` and `/orders`

use std::sync::Arc;

use fruitstall_common::{EntityId, EntityKind, IdLedger, NewOrder, NewProduct, Order, Product};
use parking_lot::Mutex;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::debug;

use crate::api::{ApiClient, ApiResponse};
use crate::error::E2eResult;
use crate::expect::{
    expect_array, expect_echoed_fields, expect_json_eq, expect_non_empty_string, expect_property,
    expect_status, expect_true,
};
use crate::runner::TestRunner;

pub const SUITE_NAME: &str = "Fruit Stall API Integration Tests";

/// Registers the API-level contract against a live backend.
///
/// Every spec creates the records it needs instead of assuming rows left behind by
/// earlier specs or a seeded database. Created records are left in place.
#[derive(Clone)]
pub struct ContractSuite {
    api: ApiClient,
    ledger: Arc<Mutex<IdLedger>>,
}

impl ContractSuite {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            ledger: Arc::new(Mutex::new(IdLedger::new())),
        }
    }

    /// Ids observed during the run, with their lifecycle state
    pub fn ledger(&self) -> Arc<Mutex<IdLedger>> {
        self.ledger.clone()
    }

    pub async fn register(&self, runner: &mut TestRunner) {
        let suite = self.clone();
        runner
            .register_suite(SUITE_NAME, move |r| {
                Box::pin(async move {
                    suite.register_products(r).await;
                    suite.register_orders(r).await;
                })
            })
            .await;
    }

    async fn register_products(&self, runner: &mut TestRunner) {
        let suite = self.clone();
        runner
            .register_suite("/products endpoint", move |r| {
                Box::pin(async move {
                    r.register_spec("should GET all products", || suite.get_all_products())
                        .await;
                    r.register_spec("should POST a new product and GET it", || {
                        suite.post_and_get_product()
                    })
                    .await;
                    r.register_spec("should POST a product without a description", || {
                        suite.post_product_without_description()
                    })
                    .await;
                    r.register_spec("should DELETE a product", || suite.delete_product())
                        .await;
                })
            })
            .await;
    }

    async fn register_orders(&self, runner: &mut TestRunner) {
        let suite = self.clone();
        runner
            .register_suite("/orders endpoint", move |r| {
                Box::pin(async move {
                    r.register_spec("should POST a new order and GET it", || {
                        suite.post_and_get_order()
                    })
                    .await;
                    r.register_spec("should GET all orders", || suite.get_all_orders()).await;
                    r.register_spec("should DELETE an order", || suite.delete_order()).await;
                })
            })
            .await;
    }

    // Products

    async fn get_all_products(&self) -> E2eResult<()> {
        let response = self.api.list_products().await?;
        expect_status(&response, StatusCode::OK, "GET /products")?;
        expect_array(&response.body, "GET /products")?;
        Ok(())
    }

    async fn post_and_get_product(&self) -> E2eResult<()> {
        let new_product = NewProduct::new("Integration Test Fruit", 9.99)
            .with_description("This is a test product added via integration test.");

        let (product, created) = self.create_product(&new_product).await?;
        self.read_back(EntityKind::Product, &product.id, &created).await
    }

    async fn post_product_without_description(&self) -> E2eResult<()> {
        let new_product = NewProduct::new("Integration Test Plain Fruit", 3.5);

        let (product, created) = self.create_product(&new_product).await?;
        self.read_back(EntityKind::Product, &product.id, &created).await
    }

    async fn delete_product(&self) -> E2eResult<()> {
        let (product, _) = self.create_product(&NewProduct::new("ToDelete", 1.0)).await?;
        let id = product.id;

        let deleted = self.api.delete_product(&id).await?;
        expect_status(&deleted, StatusCode::NO_CONTENT, "DELETE /products/{id}")?;
        self.ledger.lock().retire(EntityKind::Product, &id)?;

        self.expect_gone(EntityKind::Product, &id).await
    }

    // Orders

    async fn post_and_get_order(&self) -> E2eResult<()> {
        let (product, _) = self
            .create_product(
                &NewProduct::new("Order Fixture Fruit", 10.0)
                    .with_description("Fixture product for order contract checks."),
            )
            .await?;

        let new_order = NewOrder::new(product.id, 2);
        let (order, created) = self.create_order(&new_order).await?;

        expect_non_empty_string(&created.body, "orderDate")?;
        let expected_total = new_order.expected_total(product.price);
        expect_true(
            order.total == expected_total,
            format!(
                "POST /orders: expected total {} ({} x {}), got {}",
                expected_total, product.price, new_order.quantity, order.total
            ),
        )?;

        self.read_back(EntityKind::Order, &order.id, &created).await
    }

    async fn get_all_orders(&self) -> E2eResult<()> {
        let response = self.api.list_orders().await?;
        expect_status(&response, StatusCode::OK, "GET /orders")?;
        expect_array(&response.body, "GET /orders")?;
        Ok(())
    }

    async fn delete_order(&self) -> E2eResult<()> {
        let (product, _) = self
            .create_product(&NewProduct::new("Order Delete Fixture", 4.25))
            .await?;
        let (order, _) = self.create_order(&NewOrder::new(product.id, 1)).await?;
        let id = order.id;

        let deleted = self.api.delete_order(&id).await?;
        expect_status(&deleted, StatusCode::NO_CONTENT, "DELETE /orders/{id}")?;
        self.ledger.lock().retire(EntityKind::Order, &id)?;

        self.expect_gone(EntityKind::Order, &id).await
    }

    // Shared steps

    /// POST a product, check the echo, and record the new id
    async fn create_product(&self, new_product: &NewProduct) -> E2eResult<(Product, ApiResponse)> {
        new_product.validate()?;
        let created = self.api.create_product(new_product).await?;
        expect_status(&created, StatusCode::CREATED, "POST /products")?;
        self.issue(EntityKind::Product, &created.body)?;
        expect_echoed_fields(&created.body, &serde_json::to_value(new_product)?, "POST /products")?;
        let product: Product = created.json()?;
        product.validate()?;
        Ok((product, created))
    }

    /// POST an order, check the echo, and record the new id
    async fn create_order(&self, new_order: &NewOrder) -> E2eResult<(Order, ApiResponse)> {
        new_order.validate()?;
        let created = self.api.create_order(new_order).await?;
        expect_status(&created, StatusCode::CREATED, "POST /orders")?;
        self.issue(EntityKind::Order, &created.body)?;
        expect_echoed_fields(&created.body, &serde_json::to_value(new_order)?, "POST /orders")?;
        expect_property(&created.body, "orderDate")?;
        expect_property(&created.body, "total")?;
        let order: Order = created.json()?;
        order.validate()?;
        Ok((order, created))
    }

    /// GET a live id and compare it with its creation response
    async fn read_back(&self, kind: EntityKind, id: &EntityId, created: &ApiResponse) -> E2eResult<()> {
        self.ledger.lock().expect_present(kind, id)?;
        let (label, fetched) = match kind {
            EntityKind::Product => ("GET /products/{id}", self.api.get_product(id).await?),
            EntityKind::Order => ("GET /orders/{id}", self.api.get_order(id).await?),
        };
        expect_status(&fetched, StatusCode::OK, label)?;
        expect_json_eq(&fetched.body, &created.body, "read-after-write")?;
        Ok(())
    }

    fn issue(&self, kind: EntityKind, body: &Value) -> E2eResult<EntityId> {
        let id: EntityId = serde_json::from_value(expect_property(body, "id")?.clone())?;
        self.ledger.lock().issue(kind, &id)?;
        debug!("Issued {} id {}", kind, id);
        Ok(id)
    }

    /// A retired id must stay unresolvable: reads and repeat deletes are 404
    async fn expect_gone(&self, kind: EntityKind, id: &EntityId) -> E2eResult<()> {
        let (label, first_read, repeat_delete, second_read) = match kind {
            EntityKind::Product => (
                "/products/{id}",
                self.api.get_product(id).await?,
                self.api.delete_product(id).await?,
                self.api.get_product(id).await?,
            ),
            EntityKind::Order => (
                "/orders/{id}",
                self.api.get_order(id).await?,
                self.api.delete_order(id).await?,
                self.api.get_order(id).await?,
            ),
        };

        expect_status(&first_read, StatusCode::NOT_FOUND, &format!("GET {} after delete", label))?;
        expect_status(
            &repeat_delete,
            StatusCode::NOT_FOUND,
            &format!("DELETE {} twice", label),
        )?;
        expect_status(
            &second_read,
            StatusCode::NOT_FOUND,
            &format!("GET {} after repeat delete", label),
        )?;
        Ok(())
    }
}
