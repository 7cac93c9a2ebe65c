//! Reward pool and its global reward index
//!
//! The index is the cumulative emission per staked unit, scaled by
//! [`SCALE`]. It only moves when someone interacts with the pool; each
//! interaction first folds in everything emitted since the last one.
//!
//! The pool is funded up front with everything its schedule will ever
//! emit; rewards are paid out of that reserve.
//!
//! Every operation computes its complete outcome before writing anything,
//! so an error leaves pool and position exactly as they were.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::position::StakePosition;
use crate::schedule::EmissionSchedule;
use warden_core::{checked_add, checked_sub, mul_div_floor, to_u64, Result, Timestamp, WardenError, SCALE};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewardPool {
    schedule: EmissionSchedule,
    index: u128,
    total_staked: u64,
    last_updated: Timestamp,
    /// Emission folded into the index so far (while something was staked)
    accrued: u64,
    /// Rewards handed out by claims and unstakes
    distributed: u64,
    /// Funding not yet paid out
    reserve: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoolStats {
    pub index: u128,
    pub total_staked: u64,
    pub last_updated: Timestamp,
    pub accrued: u64,
    pub distributed: u64,
    pub reserve: u64,
    pub schedule_start: Timestamp,
}

/// Pool values after catching up to some `now`, not yet written back.
struct Accrual {
    index: u128,
    accrued: u64,
    now: Timestamp,
}

impl RewardPool {
    /// A pool whose reserve holds the schedule's full emission.
    pub fn new(schedule: EmissionSchedule) -> Result<Self> {
        let last_updated = schedule.start();
        let reserve = schedule.total()?;
        Ok(Self {
            schedule,
            index: 0,
            total_staked: 0,
            last_updated,
            accrued: 0,
            distributed: 0,
            reserve,
        })
    }

    pub fn schedule(&self) -> &EmissionSchedule {
        &self.schedule
    }

    pub fn index(&self) -> u128 {
        self.index
    }

    pub fn total_staked(&self) -> u64 {
        self.total_staked
    }

    pub fn last_updated(&self) -> Timestamp {
        self.last_updated
    }

    pub fn reserve(&self) -> u64 {
        self.reserve
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            index: self.index,
            total_staked: self.total_staked,
            last_updated: self.last_updated,
            accrued: self.accrued,
            distributed: self.distributed,
            reserve: self.reserve,
            schedule_start: self.schedule.start(),
        }
    }

    /// Bring the index up to `now`. Returns the emission folded in.
    pub fn update(&mut self, now: Timestamp) -> Result<u64> {
        let before = self.accrued;
        let accrual = self.accrue(now)?;
        self.commit(accrual);
        Ok(self.accrued - before)
    }

    /// Add `amount` to `position` and snapshot the index.
    ///
    /// The snapshot is reset unconditionally, so staking onto a position
    /// with unclaimed rewards forfeits them; claim first.
    pub fn stake(&mut self, position: &mut StakePosition, amount: u64, now: Timestamp) -> Result<()> {
        let accrual = self.accrue(now)?;
        let total_staked = checked_add(self.total_staked, amount)?;
        let value = checked_add(position.value, amount)?;

        position.value = value;
        position.reward_index_snapshot = accrual.index;
        self.total_staked = total_staked;
        self.commit(accrual);

        debug!("position {} staked {} (pool total {})", position.id, amount, total_staked);
        Ok(())
    }

    /// Settle rewards accrued by `position` since its last snapshot.
    pub fn claim(&mut self, position: &mut StakePosition, now: Timestamp) -> Result<u64> {
        let accrual = self.accrue(now)?;
        let reward = reward_for(position, accrual.index)?;
        let distributed = checked_add(self.distributed, reward)?;
        let reserve = self.draw(reward)?;

        position.reward_index_snapshot = accrual.index;
        self.distributed = distributed;
        self.reserve = reserve;
        self.commit(accrual);

        debug!("position {} claimed {}", position.id, reward);
        Ok(reward)
    }

    /// Claim, then withdraw the whole position. Returns `(value, reward)`.
    pub fn unstake(&mut self, position: StakePosition, now: Timestamp) -> Result<(u64, u64)> {
        let accrual = self.accrue(now)?;
        let reward = reward_for(&position, accrual.index)?;
        let distributed = checked_add(self.distributed, reward)?;
        let total_staked = checked_sub(self.total_staked, position.value)?;
        let reserve = self.draw(reward)?;

        self.distributed = distributed;
        self.total_staked = total_staked;
        self.reserve = reserve;
        self.commit(accrual);

        debug!(
            "position {} unstaked {} with reward {}",
            position.id, position.value, reward
        );
        Ok((position.value, reward))
    }

    /// What `claim` would pay at `now`, without touching the pool.
    pub fn pending_rewards(&self, position: &StakePosition, now: Timestamp) -> Result<u64> {
        let accrual = self.accrue(now)?;
        reward_for(position, accrual.index)
    }

    fn accrue(&self, now: Timestamp) -> Result<Accrual> {
        if now < self.last_updated {
            return Err(WardenError::StaleClock {
                now,
                last_updated: self.last_updated,
            });
        }
        if self.total_staked == 0 {
            // Nobody to credit: the index stays put and the emission is forgone
            return Ok(Accrual {
                index: self.index,
                accrued: self.accrued,
                now,
            });
        }

        let emitted = self.schedule.emitted(self.last_updated, now)?;
        let step = mul_div_floor(emitted as u128, SCALE, self.total_staked as u128)?;
        Ok(Accrual {
            index: self.index.checked_add(step).ok_or(WardenError::Overflow)?,
            accrued: checked_add(self.accrued, emitted)?,
            now,
        })
    }

    /// Reserve left after paying `reward`.
    fn draw(&self, reward: u64) -> Result<u64> {
        self.reserve
            .checked_sub(reward)
            .ok_or(WardenError::InsufficientBalance {
                requested: reward,
                available: self.reserve,
            })
    }

    fn commit(&mut self, accrual: Accrual) {
        self.index = accrual.index;
        self.accrued = accrual.accrued;
        self.last_updated = accrual.now;
    }
}

fn reward_for(position: &StakePosition, index: u128) -> Result<u64> {
    let delta = index
        .checked_sub(position.reward_index_snapshot)
        .ok_or(WardenError::Overflow)?;
    to_u64(mul_div_floor(delta, position.value as u128, SCALE)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::WEEK;
    use warden_core::Address;

    const START: u64 = 1_000_000;

    fn pool() -> RewardPool {
        RewardPool::new(EmissionSchedule::uniform(100, START)).unwrap()
    }

    fn position(id: u64) -> StakePosition {
        StakePosition::new(id, Address::from("alice"), START)
    }

    #[test]
    fn test_scenario_half_week_claim() {
        let mut pool = pool();
        let mut pos = position(1);
        pool.stake(&mut pos, 1_000, START).unwrap();

        let reward = pool.claim(&mut pos, START + WEEK / 2).unwrap();
        assert_eq!(reward, 50);
        assert_eq!(pool.index(), 50 * SCALE / 1_000);
        assert_eq!(pos.reward_index_snapshot, pool.index());
    }

    #[test]
    fn test_claim_right_after_stake_is_zero() {
        let mut pool = pool();
        let mut pos = position(1);
        pool.stake(&mut pos, 500, START + WEEK).unwrap();
        assert_eq!(pool.claim(&mut pos, START + WEEK).unwrap(), 0);
    }

    #[test]
    fn test_empty_pool_keeps_index() {
        let mut pool = pool();
        assert_eq!(pool.update(START + 3 * WEEK).unwrap(), 0);
        assert_eq!(pool.index(), 0);
        assert_eq!(pool.last_updated(), START + 3 * WEEK);
    }

    #[test]
    fn test_stale_clock_changes_nothing() {
        let mut pool = pool();
        let mut pos = position(1);
        pool.stake(&mut pos, 10, START + 100).unwrap();

        let before = (pool.clone(), pos.clone());
        assert!(matches!(
            pool.claim(&mut pos, START + 50),
            Err(WardenError::StaleClock { .. })
        ));
        assert_eq!((pool, pos), before);
    }

    #[test]
    fn test_overflowing_stake_changes_nothing() {
        let mut pool = pool();
        let mut pos = position(1);
        pool.stake(&mut pos, u64::MAX, START).unwrap();

        let before = pool.clone();
        let mut other = position(2);
        assert_eq!(
            pool.stake(&mut other, 1, START + WEEK),
            Err(WardenError::Overflow)
        );
        assert_eq!(pool, before);
        assert_eq!(other.value, 0);
    }

    #[test]
    fn test_two_stakers_split_by_weight() {
        let mut pool = pool();
        let mut a = position(1);
        let mut b = position(2);
        pool.stake(&mut a, 300, START).unwrap();
        pool.stake(&mut b, 100, START).unwrap();

        let (value, reward) = pool.unstake(a, START + WEEK).unwrap();
        assert_eq!(value, 300);
        assert_eq!(reward, 75);
        assert_eq!(pool.claim(&mut b, START + WEEK).unwrap(), 25);
        assert_eq!(pool.total_staked(), 100);
    }

    #[test]
    fn test_rewards_come_out_of_reserve() {
        let mut pool = pool();
        assert_eq!(pool.reserve(), 7_200);

        let mut a = position(1);
        let mut b = position(2);
        pool.stake(&mut a, 300, START).unwrap();
        pool.stake(&mut b, 100, START).unwrap();

        assert_eq!(pool.claim(&mut a, START + WEEK).unwrap(), 75);
        let (_, reward) = pool.unstake(b, START + 2 * WEEK).unwrap();
        assert_eq!(reward, 50);

        let stats = pool.stats();
        assert_eq!(stats.reserve, 7_200 - 125);
        assert_eq!(stats.reserve + stats.distributed, 7_200);
    }

    #[test]
    fn test_pending_matches_claim() {
        let mut pool = pool();
        let mut pos = position(1);
        pool.stake(&mut pos, 7, START).unwrap();

        let preview = pool.pending_rewards(&pos, START + WEEK / 3).unwrap();
        let snapshot = pool.clone();
        assert_eq!(pool.claim(&mut pos, START + WEEK / 3).unwrap(), preview);
        assert_ne!(pool, snapshot);
    }
}
