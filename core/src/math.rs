//! Checked fixed-point arithmetic
//!
//! Amounts are `u64`, the reward index is a `u128` scaled by [`SCALE`].
//! Products are formed in `u128` and every division floors, so rounding
//! always favours the pool over the claimant.

use crate::error::{Result, WardenError};

/// Fixed-point scale of the reward index (9 decimals).
pub const SCALE: u128 = 1_000_000_000;

/// `floor(a * b / c)` without intermediate wrap-around.
pub fn mul_div_floor(a: u128, b: u128, c: u128) -> Result<u128> {
    if c == 0 {
        return Err(WardenError::Overflow);
    }
    a.checked_mul(b)
        .map(|p| p / c)
        .ok_or(WardenError::Overflow)
}

pub fn checked_add(a: u64, b: u64) -> Result<u64> {
    a.checked_add(b).ok_or(WardenError::Overflow)
}

pub fn checked_sub(a: u64, b: u64) -> Result<u64> {
    a.checked_sub(b).ok_or(WardenError::Overflow)
}

/// Narrow a wide intermediate back to an amount.
pub fn to_u64(value: u128) -> Result<u64> {
    u64::try_from(value).map_err(|_| WardenError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mul_div_floors() {
        assert_eq!(mul_div_floor(10, 1, 3).unwrap(), 3);
        assert_eq!(mul_div_floor(50, SCALE, 1000).unwrap(), 50_000_000);
    }

    #[test]
    fn test_overflow_is_reported() {
        assert_eq!(mul_div_floor(u128::MAX, 2, 1), Err(WardenError::Overflow));
        assert_eq!(mul_div_floor(1, 1, 0), Err(WardenError::Overflow));
        assert_eq!(checked_add(u64::MAX, 1), Err(WardenError::Overflow));
        assert_eq!(checked_sub(0, 1), Err(WardenError::Overflow));
        assert_eq!(to_u64(u64::MAX as u128 + 1), Err(WardenError::Overflow));
    }
}
