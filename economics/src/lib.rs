//! Warden Economics Module
//!
//! Time-weighted staking rewards:
//! - a fixed 72-week emission curve anchored at a start time
//! - a lazily updated reward-per-staked-unit index for the pool
//! - stake positions that snapshot the index at every interaction

pub mod book;
pub mod pool;
pub mod position;
pub mod schedule;

pub use book::StakingBook;
pub use pool::{PoolStats, RewardPool};
pub use position::StakePosition;
pub use schedule::EmissionSchedule;

pub use warden_core::SCALE;

/// Emission constants
pub mod constants {
    pub use warden_core::SCHEDULE_WEEKS;

    /// Length of one emission bucket in milliseconds
    pub const WEEK: u64 = warden_core::MS_PER_WEEK;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_emission_constants() {
        assert_eq!(constants::SCHEDULE_WEEKS, 72);
        assert_eq!(constants::WEEK, 604_800_000);
    }
}
