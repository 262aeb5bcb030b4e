//! In-process Fruit Stall API used by the integration tests

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Ways the stub can deviate from the contract
#[derive(Debug, Clone, Copy, Default)]
pub struct StubBehaviour {
    /// Report an order total one unit above price x quantity
    pub wrong_total: bool,
    /// Allocate ids as max(existing) + 1, so deleting the newest record frees its id
    pub reuse_ids: bool,
    /// Answer DELETE with 204 but keep the record readable
    pub soft_delete: bool,
    /// Answer DELETE of an unknown id with 204 instead of 404
    pub idempotent_delete: bool,
    /// Leave `description` out of stored products
    pub drop_description: bool,
    /// Store and return product prices as strings
    pub price_as_string: bool,
    /// Return `null` from the listing endpoints
    pub null_list: bool,
}

#[derive(Default)]
struct Table {
    rows: BTreeMap<u64, Value>,
    next_id: u64,
}

impl Table {
    fn allocate(&mut self, reuse_ids: bool) -> u64 {
        if reuse_ids {
            self.rows.keys().next_back().map_or(1, |max| max + 1)
        } else {
            self.next_id += 1;
            self.next_id
        }
    }
}

struct StubState {
    behaviour: StubBehaviour,
    products: RwLock<Table>,
    orders: RwLock<Table>,
}

pub struct StubApi {
    base_url: String,
    task: JoinHandle<()>,
}

impl StubApi {
    pub async fn start(behaviour: StubBehaviour) -> Self {
        let state = Arc::new(StubState {
            behaviour,
            products: RwLock::new(Table::default()),
            orders: RwLock::new(Table::default()),
        });

        let app = Router::new()
            .route("/api/products", get(list_products).post(create_product))
            .route("/api/products/:id", get(get_product).delete(delete_product))
            .route("/api/orders", get(list_orders).post(create_order))
            .route("/api/orders/:id", get(get_order).delete(delete_order))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let task = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api", addr),
            task,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

impl Drop for StubApi {
    fn drop(&mut self) {
        self.task.abort();
    }
}

fn bad_request(message: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
}

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "error": format!("{} not found", what) }))).into_response()
}

async fn list_rows(state: &StubState, table: &RwLock<Table>) -> Response {
    if state.behaviour.null_list {
        return Json(Value::Null).into_response();
    }
    let table = table.read().await;
    Json(table.rows.values().cloned().collect::<Vec<_>>()).into_response()
}

async fn get_row(table: &RwLock<Table>, id: &str, what: &str) -> Response {
    let table = table.read().await;
    match id.parse::<u64>().ok().and_then(|id| table.rows.get(&id)) {
        Some(row) => Json(row.clone()).into_response(),
        None => not_found(what),
    }
}

async fn delete_row(state: &StubState, table: &RwLock<Table>, id: &str, what: &str) -> Response {
    let behaviour = state.behaviour;
    let mut table = table.write().await;
    let Some(id) = id.parse::<u64>().ok() else {
        return not_found(what);
    };
    let existed = if behaviour.soft_delete {
        table.rows.contains_key(&id)
    } else {
        table.rows.remove(&id).is_some()
    };
    if existed || behaviour.idempotent_delete {
        StatusCode::NO_CONTENT.into_response()
    } else {
        not_found(what)
    }
}

async fn list_products(State(state): State<Arc<StubState>>) -> Response {
    list_rows(&state, &state.products).await
}

async fn get_product(State(state): State<Arc<StubState>>, Path(id): Path<String>) -> Response {
    get_row(&state.products, &id, "Product").await
}

async fn delete_product(State(state): State<Arc<StubState>>, Path(id): Path<String>) -> Response {
    delete_row(&state, &state.products, &id, "Product").await
}

async fn create_product(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    let name = match body.get("name").and_then(Value::as_str) {
        Some(name) if !name.trim().is_empty() => name.to_string(),
        _ => return bad_request("Product Name is required"),
    };
    let price = match body.get("price").and_then(Value::as_f64) {
        Some(price) if price > 0.0 => price,
        _ => return bad_request("Product Price is invalid"),
    };

    let mut products = state.products.write().await;
    let id = products.allocate(state.behaviour.reuse_ids);
    let mut product = json!({ "id": id, "name": name, "price": price });
    if state.behaviour.price_as_string {
        product["price"] = json!(price.to_string());
    }
    if let Some(description) = body.get("description").and_then(Value::as_str) {
        if !state.behaviour.drop_description {
            product["description"] = json!(description);
        }
    }
    products.rows.insert(id, product.clone());

    (StatusCode::CREATED, Json(product)).into_response()
}

async fn list_orders(State(state): State<Arc<StubState>>) -> Response {
    list_rows(&state, &state.orders).await
}

async fn get_order(State(state): State<Arc<StubState>>, Path(id): Path<String>) -> Response {
    get_row(&state.orders, &id, "Order").await
}

async fn delete_order(State(state): State<Arc<StubState>>, Path(id): Path<String>) -> Response {
    delete_row(&state, &state.orders, &id, "Order").await
}

async fn create_order(State(state): State<Arc<StubState>>, Json(body): Json<Value>) -> Response {
    let quantity = match body.get("quantity").and_then(Value::as_u64) {
        Some(quantity) if quantity > 0 => quantity,
        _ => return bad_request("Quantity must be greater than zero"),
    };
    let Some(product_id) = body.get("productId").and_then(Value::as_u64) else {
        return bad_request("productId is required");
    };

    let price = {
        let products = state.products.read().await;
        let price = products.rows.get(&product_id).and_then(|p| match &p["price"] {
            Value::String(text) => text.parse::<f64>().ok(),
            other => other.as_f64(),
        });
        match price {
            Some(price) => price,
            None => return not_found("Product"),
        }
    };

    let mut total = price * quantity as f64;
    if state.behaviour.wrong_total {
        total += 1.0;
    }

    let mut orders = state.orders.write().await;
    let id = orders.allocate(state.behaviour.reuse_ids);
    let order = json!({
        "id": id,
        "productId": product_id,
        "quantity": quantity,
        "orderDate": chrono::Utc::now().to_rfc3339(),
        "total": total,
    });
    orders.rows.insert(id, order.clone());

    (StatusCode::CREATED, Json(order)).into_response()
}
