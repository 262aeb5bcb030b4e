//! Fruit Stall Common Library
//!
//! Shared domain types for the Fruit Stall verification harness: the product and
//! order model as it travels over the wire, price formatting as the storefront
//! renders it, and the per-entity lifecycle used to check id invariants.

pub mod error;
pub mod lifecycle;
pub mod money;
pub mod types;

// Re-export commonly used types
pub use error::{Error, Result};
pub use lifecycle::{EntityKind, EntityState, IdLedger};
pub use money::{format_price, parse_price_input, CURRENCY_PREFIX};
pub use types::*;

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
