//! Treasury state
//!
//! Everything the treasury owns, in one value. The [`Ledger`](crate::Ledger)
//! keeps the authoritative copy; transactions run against a clone.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::airdrop::AirdropBook;
use crate::metadata::CoinMetadata;
use crate::vault::Vault;
use crate::vesting::VestingBook;
use warden_core::{checked_add, Member, Result, Timestamp};
use warden_economics::StakingBook;
use warden_governance::{ApprovalPolicy, MultisigConfig, ProposalRegistry};

/// Initial parameters of a treasury.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genesis {
    pub members: Vec<Member>,
    pub threshold: u64,
    /// Stakeholder bucket name to initial balance
    #[serde(default)]
    pub allocations: BTreeMap<String, u64>,
    #[serde(default)]
    pub metadata: CoinMetadata,
    #[serde(default)]
    pub approval_policy: ApprovalPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TreasuryState {
    pub(crate) config: MultisigConfig,
    pub(crate) proposals: ProposalRegistry,
    pub(crate) vault: Vault,
    pub(crate) metadata: CoinMetadata,
    pub(crate) airdrops: AirdropBook,
    pub(crate) vesting: VestingBook,
    pub(crate) staking: Option<StakingBook>,
    /// Time of the last committed transaction
    pub(crate) clock: Timestamp,
}

impl TreasuryState {
    pub fn from_genesis(genesis: Genesis) -> Result<Self> {
        let config = MultisigConfig::new(genesis.members, genesis.threshold)?;
        Ok(Self {
            config,
            proposals: ProposalRegistry::new(genesis.approval_policy),
            vault: Vault::with_allocations(genesis.allocations),
            metadata: genesis.metadata,
            airdrops: AirdropBook::new(),
            vesting: VestingBook::new(),
            staking: None,
            clock: 0,
        })
    }

    pub fn config(&self) -> &MultisigConfig {
        &self.config
    }

    pub fn proposals(&self) -> &ProposalRegistry {
        &self.proposals
    }

    pub fn vault(&self) -> &Vault {
        &self.vault
    }

    pub fn metadata(&self) -> &CoinMetadata {
        &self.metadata
    }

    pub fn airdrops(&self) -> &AirdropBook {
        &self.airdrops
    }

    pub fn vesting(&self) -> &VestingBook {
        &self.vesting
    }

    pub fn staking(&self) -> Option<&StakingBook> {
        self.staking.as_ref()
    }

    pub fn clock(&self) -> Timestamp {
        self.clock
    }

    /// Tokens accounted for anywhere in the treasury: vault buckets and
    /// accounts, unclaimed airdrops, locked vesting, staked principal and
    /// the unpaid reward reserve.
    pub fn total_supply(&self) -> Result<u64> {
        let staked = match &self.staking {
            Some(book) => checked_add(book.pool().total_staked(), book.pool().reserve())?,
            None => 0,
        };
        let supply = checked_add(self.vault.holdings()?, self.airdrops.unclaimed()?)?;
        let supply = checked_add(supply, self.vesting.locked()?)?;
        checked_add(supply, staked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use warden_core::{Address, WardenError};

    #[test]
    fn test_genesis_validates_threshold() {
        let genesis = Genesis {
            members: vec![Address::from("a"), Address::from("b")],
            threshold: 3,
            allocations: BTreeMap::new(),
            metadata: CoinMetadata::default(),
            approval_policy: ApprovalPolicy::default(),
        };
        assert!(matches!(
            TreasuryState::from_genesis(genesis),
            Err(WardenError::InvalidThreshold { .. })
        ));
    }

    #[test]
    fn test_genesis_supply() {
        let genesis = Genesis {
            members: vec![Address::from("a")],
            threshold: 1,
            allocations: [("team".to_string(), 40), ("staking".to_string(), 60)]
                .into_iter()
                .collect(),
            metadata: CoinMetadata::default(),
            approval_policy: ApprovalPolicy::default(),
        };
        let state = TreasuryState::from_genesis(genesis).unwrap();
        assert_eq!(state.total_supply().unwrap(), 100);
        assert!(state.staking().is_none());
        assert_eq!(state.config().version(), 0);
    }
}
