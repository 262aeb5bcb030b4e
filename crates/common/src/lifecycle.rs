//! Entity lifecycle tracking
//!
//! Every product or order moves through the same two states. An id is issued once
//! (Absent -> Present), may be updated any number of times while present, and is
//! retired for good on delete (Present -> Absent). There is no way back to Present
//! for a retired id within one run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::types::EntityId;

/// Kind of entity an id belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Product,
    Order,
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Product => write!(f, "product"),
            EntityKind::Order => write!(f, "order"),
        }
    }
}

/// Lifecycle state of a single id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityState {
    #[default]
    Absent,
    Present,
}

impl std::fmt::Display for EntityState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityState::Absent => write!(f, "absent"),
            EntityState::Present => write!(f, "present"),
        }
    }
}

/// Run-scoped record of every id the system under test has issued.
///
/// An id seen once stays in the ledger after it is retired, which is what lets a
/// second create returning the same id be flagged as reuse.
#[derive(Debug, Default)]
pub struct IdLedger {
    entries: HashMap<(EntityKind, EntityId), EntityState>,
}

impl IdLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a freshly created entity
    pub fn issue(&mut self, kind: EntityKind, id: &EntityId) -> Result<()> {
        let key = (kind, id.clone());
        if self.entries.contains_key(&key) {
            return Err(Error::IdReused { kind, id: id.clone() });
        }
        self.entries.insert(key, EntityState::Present);
        Ok(())
    }

    /// An id may only be read or updated while present
    pub fn expect_present(&self, kind: EntityKind, id: &EntityId) -> Result<()> {
        match self.state(kind, id) {
            EntityState::Present => Ok(()),
            EntityState::Absent => Err(self.transition_error(kind, id, "present")),
        }
    }

    /// Retire an id after a successful delete
    pub fn retire(&mut self, kind: EntityKind, id: &EntityId) -> Result<()> {
        if !self.was_issued(kind, id) {
            return Err(Error::UnknownId { kind, id: id.clone() });
        }
        match self.state(kind, id) {
            EntityState::Present => {
                self.entries.insert((kind, id.clone()), EntityState::Absent);
                Ok(())
            }
            EntityState::Absent => Err(self.transition_error(kind, id, "absent")),
        }
    }

    /// Current state of an id; ids never issued are absent
    pub fn state(&self, kind: EntityKind, id: &EntityId) -> EntityState {
        self.entries
            .get(&(kind, id.clone()))
            .copied()
            .unwrap_or_default()
    }

    /// Whether the id has ever been issued during this run
    pub fn was_issued(&self, kind: EntityKind, id: &EntityId) -> bool {
        self.entries.contains_key(&(kind, id.clone()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn transition_error(&self, kind: EntityKind, id: &EntityId, to: &str) -> Error {
        Error::InvalidStateTransition {
            kind,
            id: id.clone(),
            from: self.state(kind, id).to_string(),
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_read_retire() {
        let mut ledger = IdLedger::new();
        let id = EntityId::Number(3);

        assert_eq!(ledger.state(EntityKind::Product, &id), EntityState::Absent);
        ledger.issue(EntityKind::Product, &id).unwrap();
        assert_eq!(ledger.state(EntityKind::Product, &id), EntityState::Present);
        ledger.expect_present(EntityKind::Product, &id).unwrap();
        ledger.retire(EntityKind::Product, &id).unwrap();
        assert_eq!(ledger.state(EntityKind::Product, &id), EntityState::Absent);
        assert!(ledger.was_issued(EntityKind::Product, &id));
    }

    #[test]
    fn test_retired_id_cannot_come_back() {
        let mut ledger = IdLedger::new();
        let id = EntityId::Number(9);
        ledger.issue(EntityKind::Order, &id).unwrap();
        ledger.retire(EntityKind::Order, &id).unwrap();

        assert_eq!(
            ledger.issue(EntityKind::Order, &id),
            Err(Error::IdReused { kind: EntityKind::Order, id: id.clone() })
        );
        assert!(ledger.expect_present(EntityKind::Order, &id).is_err());
        assert!(ledger.retire(EntityKind::Order, &id).is_err());
    }

    #[test]
    fn test_kinds_have_separate_id_spaces() {
        let mut ledger = IdLedger::new();
        let id = EntityId::Number(1);
        ledger.issue(EntityKind::Product, &id).unwrap();
        ledger.issue(EntityKind::Order, &id).unwrap();
        assert_eq!(ledger.len(), 2);
    }

    #[test]
    fn test_retire_unknown_id() {
        let mut ledger = IdLedger::new();
        let id = EntityId::from("missing");
        assert_eq!(
            ledger.retire(EntityKind::Product, &id),
            Err(Error::UnknownId { kind: EntityKind::Product, id })
        );
    }
}
