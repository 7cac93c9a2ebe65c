//! Stake positions

use serde::{Deserialize, Serialize};

use warden_core::{Address, Timestamp};

/// A user's stake and the index value it last settled rewards at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePosition {
    pub id: u64,
    pub owner: Address,
    pub value: u64,
    pub reward_index_snapshot: u128,
    pub unlock_time: Timestamp,
}

impl StakePosition {
    /// An empty position; `RewardPool::stake` fills it.
    pub fn new(id: u64, owner: Address, unlock_time: Timestamp) -> Self {
        Self {
            id,
            owner,
            value: 0,
            reward_index_snapshot: 0,
            unlock_time,
        }
    }

    pub fn is_locked(&self, now: Timestamp) -> bool {
        now < self.unlock_time
    }
}
