//! Airdrop allocations
//!
//! Allocations are funded when the airdrop request completes and wait in
//! the book until the recipient claims them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use warden_core::{checked_add, Address, Result, WardenError};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirdropBook {
    allocations: BTreeMap<Address, u64>,
}

impl AirdropBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocation(&self, who: &Address) -> Option<u64> {
        self.allocations.get(who).copied()
    }

    pub fn unclaimed(&self) -> Result<u64> {
        self.allocations
            .values()
            .try_fold(0u64, |acc, v| checked_add(acc, *v))
    }

    /// Add to `who`'s allocation. Returns true if this created it.
    pub fn allocate(&mut self, who: &Address, amount: u64) -> Result<bool> {
        match self.allocations.get_mut(who) {
            Some(existing) => {
                *existing = checked_add(*existing, amount)?;
                Ok(false)
            }
            None => {
                self.allocations.insert(who.clone(), amount);
                Ok(true)
            }
        }
    }

    pub fn claim(&mut self, who: &Address) -> Result<u64> {
        self.allocations
            .remove(who)
            .ok_or_else(|| WardenError::NotFound(format!("airdrop allocation for {}", who)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_accumulates_and_claim_empties() {
        let alice = Address::from("alice");
        let mut book = AirdropBook::new();
        assert!(book.allocate(&alice, 10).unwrap());
        assert!(!book.allocate(&alice, 5).unwrap());
        assert_eq!(book.unclaimed().unwrap(), 15);

        assert_eq!(book.claim(&alice).unwrap(), 15);
        assert!(matches!(book.claim(&alice), Err(WardenError::NotFound(_))));
    }
}
