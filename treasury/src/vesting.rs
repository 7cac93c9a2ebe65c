//! Vesting grants
//!
//! A grant releases its total linearly from `start` over `duration_ms`.
//! The beneficiary unlocks any part of the vested-but-unreleased amount;
//! a grant is closed once everything has been released.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use warden_core::{checked_add, mul_div_floor, to_u64, Address, Result, Timestamp, WardenError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingGrant {
    pub id: u64,
    pub beneficiary: Address,
    /// Bucket the grant was funded from
    pub stakeholder: String,
    pub total: u64,
    pub released: u64,
    pub start: Timestamp,
    pub duration_ms: u64,
}

impl VestingGrant {
    /// Amount vested at `now`, released or not.
    pub fn vested(&self, now: Timestamp) -> Result<u64> {
        let elapsed = now.saturating_sub(self.start);
        if self.duration_ms == 0 || elapsed >= self.duration_ms {
            return Ok(self.total);
        }
        to_u64(mul_div_floor(
            self.total as u128,
            elapsed as u128,
            self.duration_ms as u128,
        )?)
    }

    pub fn unlockable(&self, now: Timestamp) -> Result<u64> {
        Ok(self.vested(now)?.saturating_sub(self.released))
    }

    pub fn locked(&self) -> u64 {
        self.total - self.released
    }
}

/// Outcome of an unlock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Unlocked {
    pub amount: u64,
    /// The grant was fully released and removed
    pub closed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingBook {
    grants: BTreeMap<u64, VestingGrant>,
    next_id: u64,
}

impl Default for VestingBook {
    fn default() -> Self {
        Self {
            grants: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl VestingBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, id: u64) -> Option<&VestingGrant> {
        self.grants.get(&id)
    }

    pub fn len(&self) -> usize {
        self.grants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.grants.is_empty()
    }

    /// Tokens still held by open grants.
    pub fn locked(&self) -> Result<u64> {
        self.grants
            .values()
            .try_fold(0u64, |acc, g| checked_add(acc, g.locked()))
    }

    pub fn create(
        &mut self,
        beneficiary: &Address,
        stakeholder: &str,
        total: u64,
        start: Timestamp,
        duration_ms: u64,
    ) -> Result<u64> {
        let id = self.next_id;
        self.next_id = id.checked_add(1).ok_or(WardenError::Overflow)?;
        self.grants.insert(
            id,
            VestingGrant {
                id,
                beneficiary: beneficiary.clone(),
                stakeholder: stakeholder.to_string(),
                total,
                released: 0,
                start,
                duration_ms,
            },
        );
        Ok(id)
    }

    pub fn unlock(
        &mut self,
        id: u64,
        caller: &Address,
        amount: u64,
        now: Timestamp,
    ) -> Result<Unlocked> {
        let grant = self
            .grants
            .get_mut(&id)
            .ok_or_else(|| WardenError::NotFound(format!("vesting grant {}", id)))?;
        if &grant.beneficiary != caller {
            return Err(WardenError::Unauthorized(format!(
                "{} is not the beneficiary of grant {}",
                caller, id
            )));
        }
        if amount == 0 {
            return Err(WardenError::InvalidPayload(
                "unlock amount must be positive".to_string(),
            ));
        }
        let available = grant.unlockable(now)?;
        if amount > available {
            return Err(WardenError::InsufficientBalance {
                requested: amount,
                available,
            });
        }

        grant.released += amount;
        let closed = grant.released == grant.total;
        if closed {
            self.grants.remove(&id);
        }
        Ok(Unlocked { amount, closed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book_with_grant(total: u64, duration_ms: u64) -> (VestingBook, u64) {
        let mut book = VestingBook::new();
        let id = book
            .create(&Address::from("dev"), "team", total, 1_000, duration_ms)
            .unwrap();
        (book, id)
    }

    #[test]
    fn test_linear_vesting() {
        let (book, id) = book_with_grant(1_000, 3_000);
        let grant = book.grant(id).unwrap();
        assert_eq!(grant.vested(0).unwrap(), 0);
        assert_eq!(grant.vested(1_000).unwrap(), 0);
        assert_eq!(grant.vested(2_000).unwrap(), 333);
        assert_eq!(grant.vested(4_000).unwrap(), 1_000);
        assert_eq!(grant.vested(99_000).unwrap(), 1_000);
    }

    #[test]
    fn test_zero_duration_vests_immediately() {
        let (book, id) = book_with_grant(500, 0);
        assert_eq!(book.grant(id).unwrap().unlockable(1_000).unwrap(), 500);
    }

    #[test]
    fn test_unlock_limits_and_close() {
        let (mut book, id) = book_with_grant(1_000, 1_000);
        let dev = Address::from("dev");

        assert!(matches!(
            book.unlock(id, &Address::from("mallory"), 1, 1_500),
            Err(WardenError::Unauthorized(_))
        ));
        assert_eq!(
            book.unlock(id, &dev, 501, 1_500),
            Err(WardenError::InsufficientBalance { requested: 501, available: 500 })
        );

        let first = book.unlock(id, &dev, 500, 1_500).unwrap();
        assert!(!first.closed);
        assert_eq!(book.locked().unwrap(), 500);

        let last = book.unlock(id, &dev, 500, 2_000).unwrap();
        assert!(last.closed);
        assert!(book.is_empty());
        assert!(matches!(
            book.unlock(id, &dev, 1, 2_000),
            Err(WardenError::NotFound(_))
        ));
    }
}
