//! Warden Treasury Module
//!
//! The multisig-controlled treasury:
//! - a vault of stakeholder buckets and principal accounts
//! - guarded effects (config amendment, transfers, metadata, airdrops,
//!   vesting, staking launch) run only through executed proposals
//! - holder operations (airdrop claims, vesting unlocks, staking)
//!
//! All of it is driven through [`Ledger::transact`], one all-or-nothing
//! transaction per external call.

pub mod airdrop;
pub mod effects;
pub mod ledger;
pub mod metadata;
pub mod session;
pub mod state;
pub mod vault;
pub mod vesting;

pub use airdrop::AirdropBook;
pub use effects::{
    AirdropIntent, Applied, LaunchIntent, MetadataIntent, ModifyIntent, TransferIntent,
    VestingIntent, MAX_DROPS_PER_REQUEST,
};
pub use ledger::{Ledger, Receipt};
pub use metadata::CoinMetadata;
pub use session::Session;
pub use state::{Genesis, TreasuryState};
pub use vault::{Vault, AIRDROP_BUCKET, STAKING_BUCKET};
pub use vesting::{Unlocked, VestingBook, VestingGrant};

pub use warden_core::{Result, WardenError};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_module_constants() {
        assert_eq!(MAX_DROPS_PER_REQUEST, 500);
        assert_eq!(STAKING_BUCKET, "staking");
        assert_eq!(AIRDROP_BUCKET, "airdrop");
    }
}
