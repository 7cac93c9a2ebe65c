//! Position book
//!
//! Owns the reward pool together with every open position, hands out
//! position ids and enforces ownership and lockups.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::pool::RewardPool;
use crate::position::StakePosition;
use crate::schedule::EmissionSchedule;
use warden_core::{Address, Result, Timestamp, WardenError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingBook {
    pool: RewardPool,
    positions: BTreeMap<u64, StakePosition>,
    next_id: u64,
}

impl StakingBook {
    /// An empty book whose pool is funded with the schedule's total.
    pub fn new(schedule: EmissionSchedule) -> Result<Self> {
        Ok(Self {
            pool: RewardPool::new(schedule)?,
            positions: BTreeMap::new(),
            next_id: 1,
        })
    }

    pub fn pool(&self) -> &RewardPool {
        &self.pool
    }

    pub fn position(&self, id: u64) -> Option<&StakePosition> {
        self.positions.get(&id)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    /// Open a new position of `amount`, withdrawable after `lock_ms`.
    pub fn open(
        &mut self,
        owner: &Address,
        amount: u64,
        lock_ms: u64,
        now: Timestamp,
    ) -> Result<u64> {
        if amount == 0 {
            return Err(WardenError::InvalidPayload(
                "stake amount must be positive".to_string(),
            ));
        }
        let unlock_time = now.checked_add(lock_ms).ok_or(WardenError::Overflow)?;
        let id = self.next_id;
        let next_id = id.checked_add(1).ok_or(WardenError::Overflow)?;

        let mut position = StakePosition::new(id, owner.clone(), unlock_time);
        self.pool.stake(&mut position, amount, now)?;

        self.positions.insert(id, position);
        self.next_id = next_id;
        Ok(id)
    }

    pub fn claim(&mut self, id: u64, caller: &Address, now: Timestamp) -> Result<u64> {
        let mut position = self.owned(id, caller)?.clone();
        let reward = self.pool.claim(&mut position, now)?;
        self.positions.insert(id, position);
        Ok(reward)
    }

    /// Close a position. Returns `(value, reward)`.
    pub fn unstake(&mut self, id: u64, caller: &Address, now: Timestamp) -> Result<(u64, u64)> {
        let position = self.owned(id, caller)?.clone();
        if position.is_locked(now) {
            return Err(WardenError::Locked {
                unlock_time: position.unlock_time,
            });
        }
        let settled = self.pool.unstake(position, now)?;
        self.positions.remove(&id);
        Ok(settled)
    }

    pub fn pending_rewards(&self, id: u64, now: Timestamp) -> Result<u64> {
        let position = self
            .positions
            .get(&id)
            .ok_or_else(|| WardenError::NotFound(format!("stake position {}", id)))?;
        self.pool.pending_rewards(position, now)
    }

    fn owned(&self, id: u64, caller: &Address) -> Result<&StakePosition> {
        let position = self
            .positions
            .get(&id)
            .ok_or_else(|| WardenError::NotFound(format!("stake position {}", id)))?;
        if &position.owner != caller {
            return Err(WardenError::Unauthorized(format!(
                "{} does not own stake position {}",
                caller, id
            )));
        }
        Ok(position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WEEK;

    const START: u64 = 50_000;

    fn book() -> StakingBook {
        StakingBook::new(EmissionSchedule::uniform(1_000, START)).unwrap()
    }

    #[test]
    fn test_open_claim_unstake() {
        let alice = Address::from("alice");
        let mut book = book();
        let id = book.open(&alice, 100, 0, START).unwrap();

        assert_eq!(book.claim(id, &alice, START + WEEK).unwrap(), 1_000);
        assert_eq!(book.unstake(id, &alice, START + 2 * WEEK).unwrap(), (100, 1_000));
        assert!(book.position(id).is_none());
        assert_eq!(book.pool().total_staked(), 0);
    }

    #[test]
    fn test_only_owner_may_touch_position() {
        let alice = Address::from("alice");
        let bob = Address::from("bob");
        let mut book = book();
        let id = book.open(&alice, 100, 0, START).unwrap();

        assert!(matches!(
            book.claim(id, &bob, START + 1),
            Err(WardenError::Unauthorized(_))
        ));
        assert!(matches!(
            book.unstake(99, &alice, START + 1),
            Err(WardenError::NotFound(_))
        ));
    }

    #[test]
    fn test_lockup_blocks_unstake_but_not_claim() {
        let alice = Address::from("alice");
        let mut book = book();
        let id = book.open(&alice, 100, WEEK, START).unwrap();

        let before = book.clone();
        assert_eq!(
            book.unstake(id, &alice, START + WEEK - 1),
            Err(WardenError::Locked { unlock_time: START + WEEK })
        );
        assert_eq!(book, before);

        assert!(book.claim(id, &alice, START + WEEK / 2).is_ok());
        assert!(book.unstake(id, &alice, START + WEEK).is_ok());
    }

    #[test]
    fn test_zero_stake_rejected() {
        let mut book = book();
        assert!(matches!(
            book.open(&Address::from("alice"), 0, 0, START),
            Err(WardenError::InvalidPayload(_))
        ));
        assert_eq!(book.position_count(), 0);
    }
}
