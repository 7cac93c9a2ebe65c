//! Entity change log
//!
//! The execution layer records, for every committed call, which entities the
//! call created, mutated or deleted. The core builds that list as it goes.

use serde::{Deserialize, Serialize};

use crate::types::Address;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Mutated,
    Deleted,
}

/// Entities the treasury store is made of.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "entity", content = "id", rename_all = "snake_case")]
pub enum Entity {
    Config,
    Proposal(String),
    VaultBucket(String),
    Account(Address),
    Metadata,
    AirdropAllocation(Address),
    VestingGrant(u64),
    RewardPool,
    StakePosition(u64),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Change {
    pub kind: ChangeKind,
    #[serde(flatten)]
    pub entity: Entity,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChangeLog {
    changes: Vec<Change>,
}

impl ChangeLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn created(&mut self, entity: Entity) {
        self.push(ChangeKind::Created, entity);
    }

    pub fn mutated(&mut self, entity: Entity) {
        self.push(ChangeKind::Mutated, entity);
    }

    pub fn deleted(&mut self, entity: Entity) {
        self.push(ChangeKind::Deleted, entity);
    }

    /// Record a change, folding repeats of the same entity.
    ///
    /// A created-then-mutated entity stays `Created`; a created-then-deleted
    /// entity disappears from the log.
    fn push(&mut self, kind: ChangeKind, entity: Entity) {
        if let Some(pos) = self.changes.iter().position(|c| c.entity == entity) {
            let prior = self.changes[pos].kind;
            match (prior, kind) {
                (ChangeKind::Created, ChangeKind::Deleted) => {
                    self.changes.remove(pos);
                }
                (ChangeKind::Created, _) => {}
                (ChangeKind::Deleted, ChangeKind::Created) => {
                    self.changes[pos].kind = ChangeKind::Mutated;
                }
                (_, kind) => self.changes[pos].kind = kind,
            }
            return;
        }
        self.changes.push(Change { kind, entity });
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn into_vec(self) -> Vec<Change> {
        self.changes
    }
}
