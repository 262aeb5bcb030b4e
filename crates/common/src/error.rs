//! Error types for the domain model

use thiserror::Error;

use crate::lifecycle::EntityKind;
use crate::types::EntityId;

/// Result type alias using the model Error
pub type Result<T> = std::result::Result<T, Error>;

/// Domain model errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    #[error("Product name must not be empty")]
    EmptyName,

    #[error("Price must be a positive number, got {0}")]
    InvalidPrice(f64),

    #[error("Quantity must be greater than zero")]
    InvalidQuantity,

    #[error("Order date must be present and non-empty")]
    MissingOrderDate,

    #[error("{kind} id {id} was already issued in this run")]
    IdReused { kind: EntityKind, id: EntityId },

    #[error("{kind} id {id} was never issued in this run")]
    UnknownId { kind: EntityKind, id: EntityId },

    #[error("Invalid state transition for {kind} {id}: {from} -> {to}")]
    InvalidStateTransition {
        kind: EntityKind,
        id: EntityId,
        from: String,
        to: String,
    },
}
