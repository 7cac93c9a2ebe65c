//! Treasury Vault
//!
//! Undistributed supply sits in named stakeholder buckets ("team",
//! "public_sale", "airdrop", "staking", ...). Tokens leave a bucket only
//! through a guarded effect or a reward payout, and land in principal
//! accounts.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use warden_core::{checked_add, Address, Result, WardenError};

/// Bucket that funds airdrop allocations by default
pub const AIRDROP_BUCKET: &str = "airdrop";

/// Bucket staking rewards are paid out of
pub const STAKING_BUCKET: &str = "staking";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vault {
    buckets: BTreeMap<String, u64>,
    accounts: BTreeMap<Address, u64>,
}

impl Vault {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_allocations<I, S>(allocations: I) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        Self {
            buckets: allocations
                .into_iter()
                .map(|(name, amount)| (name.into(), amount))
                .collect(),
            accounts: BTreeMap::new(),
        }
    }

    pub fn bucket_balance(&self, name: &str) -> Option<u64> {
        self.buckets.get(name).copied()
    }

    pub fn account_balance(&self, who: &Address) -> u64 {
        self.accounts.get(who).copied().unwrap_or(0)
    }

    pub fn buckets(&self) -> impl Iterator<Item = (&String, &u64)> {
        self.buckets.iter()
    }

    pub fn accounts(&self) -> impl Iterator<Item = (&Address, &u64)> {
        self.accounts.iter()
    }

    /// Everything the vault holds, buckets and accounts together.
    pub fn holdings(&self) -> Result<u64> {
        self.buckets
            .values()
            .chain(self.accounts.values())
            .try_fold(0u64, |acc, v| checked_add(acc, *v))
    }

    pub fn debit_bucket(&mut self, name: &str, amount: u64) -> Result<()> {
        let balance = self
            .buckets
            .get_mut(name)
            .ok_or_else(|| WardenError::NotFound(format!("stakeholder bucket {}", name)))?;
        if *balance < amount {
            return Err(WardenError::InsufficientBalance {
                requested: amount,
                available: *balance,
            });
        }
        *balance -= amount;
        Ok(())
    }

    pub fn credit_account(&mut self, who: &Address, amount: u64) -> Result<()> {
        let current = self.account_balance(who);
        let updated = checked_add(current, amount)?;
        self.accounts.insert(who.clone(), updated);
        Ok(())
    }

    pub fn debit_account(&mut self, who: &Address, amount: u64) -> Result<()> {
        let available = self.account_balance(who);
        if available < amount {
            return Err(WardenError::InsufficientBalance {
                requested: amount,
                available,
            });
        }
        if available == amount {
            self.accounts.remove(who);
        } else {
            self.accounts.insert(who.clone(), available - amount);
        }
        Ok(())
    }
}
