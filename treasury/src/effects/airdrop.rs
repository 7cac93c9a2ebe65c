//! Airdrop batches
//!
//! The airdrop request names only the funding bucket. Recipients are added
//! to the open intent, capped per request, and funded in one debit when the
//! intent completes.

use log::info;

use super::wrong_kind;
use crate::session::Session;
use warden_core::{checked_add, Address, Entity, Result, WardenError};
use warden_governance::{AirdropBatch, ExecutionRequest, Payload, PayloadKind, Ticket};

/// Most drops a single airdrop request may carry
pub const MAX_DROPS_PER_REQUEST: usize = 500;

#[must_use]
#[derive(Debug)]
pub struct AirdropIntent<'tx> {
    ticket: Ticket<'tx>,
    batch: AirdropBatch,
    drops: Vec<(Address, u64)>,
}

impl<'tx> AirdropIntent<'tx> {
    pub fn stakeholder(&self) -> &str {
        &self.batch.stakeholder
    }

    pub fn add_drop(&mut self, recipient: Address, amount: u64) -> Result<()> {
        if amount == 0 {
            return Err(WardenError::InvalidPayload(format!(
                "airdrop to {} has zero amount",
                recipient
            )));
        }
        if self.drops.len() >= MAX_DROPS_PER_REQUEST {
            return Err(WardenError::InvalidPayload(format!(
                "airdrop request holds at most {} drops",
                MAX_DROPS_PER_REQUEST
            )));
        }
        self.drops.push((recipient, amount));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.drops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.drops.is_empty()
    }

    pub fn total(&self) -> Result<u64> {
        self.drops
            .iter()
            .try_fold(0u64, |acc, (_, amount)| checked_add(acc, *amount))
    }
}

impl<'tx> Session<'tx> {
    pub fn start_airdrop(&self, request: ExecutionRequest<'tx>) -> Result<AirdropIntent<'tx>> {
        match request.decode()? {
            (ticket, Payload::Airdrop(batch)) => Ok(AirdropIntent {
                ticket,
                batch,
                drops: Vec::new(),
            }),
            (_, other) => Err(wrong_kind(PayloadKind::Airdrop, other.kind())),
        }
    }

    /// Fund every drop from the bucket. Returns the total allocated.
    pub fn complete_airdrop(&mut self, intent: AirdropIntent<'tx>) -> Result<u64> {
        let total = intent.total()?;
        let AirdropIntent { ticket, batch, drops } = intent;
        self.atomic(|s| {
            s.state.vault.debit_bucket(&batch.stakeholder, total)?;
            for (recipient, amount) in &drops {
                if s.state.airdrops.allocate(recipient, *amount)? {
                    s.changes.created(Entity::AirdropAllocation(recipient.clone()));
                } else {
                    s.changes.mutated(Entity::AirdropAllocation(recipient.clone()));
                }
            }
            let name = s.redeem(ticket)?;

            s.changes.mutated(Entity::VaultBucket(batch.stakeholder.clone()));
            info!(
                "{}: airdropped {} to {} recipients from {}",
                name,
                total,
                drops.len(),
                batch.stakeholder
            );
            Ok(total)
        })
    }
}
