//! HTTP client for the product/order API

use std::time::Duration;

use fruitstall_common::{EntityId, NewOrder, NewProduct};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::error::{E2eError, E2eResult};

/// A response reduced to what the contract looks at: status and JSON body
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    /// Parsed body, `Value::Null` when the response had none
    pub body: Value,
}

impl ApiResponse {
    /// Decode the body into a typed value. A body that does not fit the model is a
    /// contract violation, not a transport problem.
    pub fn json<T: DeserializeOwned>(&self) -> E2eResult<T> {
        serde_json::from_value(self.body.clone()).map_err(|e| {
            E2eError::assertion(format!("response body does not match the model ({}): {}", e, self.body))
        })
    }
}

/// Thin client over the `/api` surface
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// Create a client rooted at `base_url` (e.g. `http://localhost:3000/api`)
    pub fn new(base_url: &str, request_timeout: Duration) -> E2eResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    // Product operations

    pub async fn list_products(&self) -> E2eResult<ApiResponse> {
        self.send(Method::GET, "/products", None::<&()>).await
    }

    pub async fn create_product(&self, product: &NewProduct) -> E2eResult<ApiResponse> {
        self.send(Method::POST, "/products", Some(product)).await
    }

    pub async fn get_product(&self, id: &EntityId) -> E2eResult<ApiResponse> {
        self.send(Method::GET, &format!("/products/{}", id), None::<&()>).await
    }

    pub async fn delete_product(&self, id: &EntityId) -> E2eResult<ApiResponse> {
        self.send(Method::DELETE, &format!("/products/{}", id), None::<&()>).await
    }

    // Order operations

    pub async fn list_orders(&self) -> E2eResult<ApiResponse> {
        self.send(Method::GET, "/orders", None::<&()>).await
    }

    pub async fn create_order(&self, order: &NewOrder) -> E2eResult<ApiResponse> {
        self.send(Method::POST, "/orders", Some(order)).await
    }

    pub async fn get_order(&self, id: &EntityId) -> E2eResult<ApiResponse> {
        self.send(Method::GET, &format!("/orders/{}", id), None::<&()>).await
    }

    pub async fn delete_order(&self, id: &EntityId) -> E2eResult<ApiResponse> {
        self.send(Method::DELETE, &format!("/orders/{}", id), None::<&()>).await
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> E2eResult<ApiResponse> {
        let url = format!("{}{}", self.base_url, path);
        debug!("{} {}", method, url);

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            // `.json()` sets `Content-Type: application/json`
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| {
                Value::String(String::from_utf8_lossy(&bytes).into_owned())
            })
        };

        debug!("{} {} -> {}", path, status.as_u16(), body);
        Ok(ApiResponse { status, body })
    }
}
