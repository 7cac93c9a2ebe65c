//! Principal and time types

use serde::{Deserialize, Serialize};
use std::fmt;

/// Milliseconds since the Unix epoch, always supplied by the caller.
pub type Timestamp = u64;

pub const MS_PER_DAY: u64 = 86_400_000;
pub const MS_PER_WEEK: u64 = 7 * MS_PER_DAY;

/// Number of weekly buckets in an emission schedule
pub const SCHEDULE_WEEKS: usize = 72;

/// Opaque principal identifier.
///
/// Authentication happens outside the core; by the time an `Address` reaches
/// an operation it is trusted to name the caller.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

/// Multisig members are plain principals.
pub type Member = Address;

impl Address {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for Address {
    fn from(id: String) -> Self {
        Self(id)
    }
}
