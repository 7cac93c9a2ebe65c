//! Guarded effects
//!
//! Every privileged action is a start/complete pair on [`Session`]:
//! `start_*` trades an [`ExecutionRequest`] for the typed intent of one
//! effect, failing `InvalidPayload` if the request carries another kind;
//! `complete_*` validates against the current state, applies the effect
//! and consumes the request. A failed completion changes nothing, and the
//! request then stays open, so the transaction cannot commit.
//!
//! Intents are consumed by their completion, so a request cannot be
//! completed twice:
//!
//! ```compile_fail
//! use treasury::Ledger;
//!
//! fn twice(ledger: &Ledger) {
//!     let _ = ledger.transact(1, |session| {
//!         let request = session.execute("rename")?;
//!         let intent = session.start_update_metadata(request)?;
//!         session.complete_update_metadata(intent)?;
//!         session.complete_update_metadata(intent)
//!     });
//! }
//! ```

mod airdrop;
mod launch;
mod metadata;
mod modify;
mod transfer;
mod vesting;

pub use airdrop::{AirdropIntent, MAX_DROPS_PER_REQUEST};
pub use launch::LaunchIntent;
pub use metadata::MetadataIntent;
pub use modify::ModifyIntent;
pub use transfer::TransferIntent;
pub use vesting::VestingIntent;

use serde::Serialize;

use crate::session::Session;
use warden_core::{Address, Result, Timestamp, WardenError};
use warden_governance::{ExecutionRequest, PayloadKind};

/// What an executed proposal did, for callers that run the whole
/// execute/start/complete sequence in one go.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum Applied {
    Modify { version: u64, threshold: u64 },
    Transfer { recipient: Address, amount: u64 },
    UpdateMetadata { name: String, symbol: String },
    Airdrop { recipients: usize, total: u64 },
    Vesting { grants: Vec<u64> },
    LaunchStaking { start: Timestamp },
}

pub(crate) fn wrong_kind(expected: PayloadKind, found: PayloadKind) -> WardenError {
    WardenError::InvalidPayload(format!("expected a {} request, got {}", expected, found))
}

impl<'tx> Session<'tx> {
    /// Execute `name` and run its effect to completion.
    ///
    /// `drops` are the airdrop entries to add when the proposal is an
    /// airdrop; they must be empty for every other kind.
    pub fn execute_and_apply(&mut self, name: &str, drops: &[(Address, u64)]) -> Result<Applied> {
        let request = self.execute(name)?;
        let kind = request.kind()?;
        if kind != PayloadKind::Airdrop && !drops.is_empty() {
            return Err(WardenError::InvalidPayload(format!(
                "airdrop entries given for a {} proposal",
                kind
            )));
        }
        self.apply(request, drops)
    }

    fn apply(&mut self, request: ExecutionRequest<'tx>, drops: &[(Address, u64)]) -> Result<Applied> {
        match request.kind()? {
            PayloadKind::Modify => {
                let intent = self.start_modify(request)?;
                self.complete_modify(intent)?;
                let config = self.state().config();
                Ok(Applied::Modify {
                    version: config.version(),
                    threshold: config.threshold(),
                })
            }
            PayloadKind::Transfer => {
                let intent = self.start_transfer(request)?;
                let applied = Applied::Transfer {
                    recipient: intent.transfer().recipient.clone(),
                    amount: intent.transfer().amount,
                };
                self.complete_transfer(intent)?;
                Ok(applied)
            }
            PayloadKind::UpdateMetadata => {
                let intent = self.start_update_metadata(request)?;
                self.complete_update_metadata(intent)?;
                let metadata = self.state().metadata();
                Ok(Applied::UpdateMetadata {
                    name: metadata.name.clone(),
                    symbol: metadata.symbol.clone(),
                })
            }
            PayloadKind::Airdrop => {
                let mut intent = self.start_airdrop(request)?;
                for (recipient, amount) in drops {
                    intent.add_drop(recipient.clone(), *amount)?;
                }
                let recipients = intent.len();
                let total = self.complete_airdrop(intent)?;
                Ok(Applied::Airdrop { recipients, total })
            }
            PayloadKind::Vesting => {
                let intent = self.start_vesting(request)?;
                let grants = self.complete_vesting(intent)?;
                Ok(Applied::Vesting { grants })
            }
            PayloadKind::LaunchStaking => {
                let intent = self.start_launch_staking(request)?;
                self.complete_launch_staking(intent)?;
                Ok(Applied::LaunchStaking { start: self.now() })
            }
        }
    }
}
