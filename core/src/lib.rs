//! Warden Core Library
//!
//! Shared vocabulary for the treasury workspace: the error taxonomy every
//! operation reports through, principal and time types, checked fixed-point
//! helpers and the change log that accompanies each committed transaction.

pub mod changes;
pub mod error;
pub mod math;
pub mod types;

pub use changes::{Change, ChangeKind, ChangeLog, Entity};
pub use error::{Result, WardenError};
pub use math::{checked_add, checked_sub, mul_div_floor, to_u64, SCALE};
pub use types::{Address, Member, Timestamp, MS_PER_DAY, MS_PER_WEEK, SCHEDULE_WEEKS};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_constants() {
        assert_eq!(SCALE, 1_000_000_000);
        assert_eq!(MS_PER_WEEK, 7 * MS_PER_DAY);
        assert_eq!(MS_PER_DAY, 86_400_000);
    }
}
