//! Multisig membership and threshold

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::payload::ModifyConfig;
use warden_core::{Member, Result, WardenError};

/// Authorized members and the number of distinct approvals a proposal needs.
///
/// `version` increments on every successful amendment so that proposals can
/// tell whether the member set they were approved under is still current.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultisigConfig {
    members: BTreeSet<Member>,
    threshold: u64,
    version: u64,
}

impl MultisigConfig {
    pub fn new(members: impl IntoIterator<Item = Member>, threshold: u64) -> Result<Self> {
        let members: BTreeSet<Member> = members.into_iter().collect();
        validate(threshold, &members)?;
        Ok(Self {
            members,
            threshold,
            version: 0,
        })
    }

    pub fn members(&self) -> impl Iterator<Item = &Member> {
        self.members.iter()
    }

    pub fn member_count(&self) -> u64 {
        self.members.len() as u64
    }

    pub fn threshold(&self) -> u64 {
        self.threshold
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn is_member(&self, who: &Member) -> bool {
        self.members.contains(who)
    }

    /// Build the config a `Modify` proposal would produce.
    ///
    /// `self` is never touched: on `InvalidThreshold` the caller simply keeps
    /// the current config.
    pub fn amended(&self, change: &ModifyConfig) -> Result<MultisigConfig> {
        let mut members = self.members.clone();
        if change.add {
            members.extend(change.addresses.iter().cloned());
        } else {
            for addr in &change.addresses {
                members.remove(addr);
            }
        }
        validate(change.new_threshold, &members)?;

        Ok(MultisigConfig {
            members,
            threshold: change.new_threshold,
            version: self.version.checked_add(1).ok_or(WardenError::Overflow)?,
        })
    }
}

fn validate(threshold: u64, members: &BTreeSet<Member>) -> Result<()> {
    let count = members.len() as u64;
    if threshold == 0 || threshold > count {
        return Err(WardenError::InvalidThreshold {
            threshold,
            members: count,
        });
    }
    Ok(())
}
