//! Core types for the product/order domain

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Server-generated identifier. The backend may hand out numeric or string ids, so
/// both are accepted and rendered back verbatim into request paths.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityId::Number(n) => write!(f, "{}", n),
            EntityId::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<u64> for EntityId {
    fn from(n: u64) -> Self {
        EntityId::Number(n)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        EntityId::Text(s.to_string())
    }
}

/// A product as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: EntityId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
}

impl Product {
    /// Invariants every stored product must satisfy
    pub fn validate(&self) -> Result<()> {
        check_name(&self.name)?;
        check_price(self.price)
    }
}

/// Payload for `POST /products`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub price: f64,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            name: name.into(),
            description: None,
            price,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check the fields the contract treats as required
    pub fn validate(&self) -> Result<()> {
        check_name(&self.name)?;
        check_price(self.price)
    }
}

/// An order as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: EntityId,
    pub product_id: EntityId,
    pub quantity: u32,
    pub order_date: String,
    pub total: f64,
}

impl Order {
    /// Invariants every stored order must satisfy
    pub fn validate(&self) -> Result<()> {
        check_quantity(self.quantity)?;
        if self.order_date.trim().is_empty() {
            return Err(Error::MissingOrderDate);
        }
        Ok(())
    }
}

/// Payload for `POST /orders`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub product_id: EntityId,
    pub quantity: u32,
}

impl NewOrder {
    pub fn new(product_id: EntityId, quantity: u32) -> Self {
        Self { product_id, quantity }
    }

    pub fn validate(&self) -> Result<()> {
        check_quantity(self.quantity)
    }

    /// Total the server must compute for this order at creation time
    pub fn expected_total(&self, unit_price: f64) -> f64 {
        unit_price * f64::from(self.quantity)
    }
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(Error::EmptyName);
    }
    Ok(())
}

fn check_price(price: f64) -> Result<()> {
    if !(price.is_finite() && price > 0.0) {
        return Err(Error::InvalidPrice(price));
    }
    Ok(())
}

fn check_quantity(quantity: u32) -> Result<()> {
    if quantity == 0 {
        return Err(Error::InvalidQuantity);
    }
    Ok(())
}
