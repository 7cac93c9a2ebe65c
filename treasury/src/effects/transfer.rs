use log::info;

use super::wrong_kind;
use crate::session::Session;
use warden_core::{Entity, Result};
use warden_governance::{ExecutionRequest, Payload, PayloadKind, Ticket, TransferFunds};

#[must_use]
#[derive(Debug)]
pub struct TransferIntent<'tx> {
    ticket: Ticket<'tx>,
    transfer: TransferFunds,
}

impl<'tx> TransferIntent<'tx> {
    pub fn transfer(&self) -> &TransferFunds {
        &self.transfer
    }
}

impl<'tx> Session<'tx> {
    pub fn start_transfer(&self, request: ExecutionRequest<'tx>) -> Result<TransferIntent<'tx>> {
        match request.decode()? {
            (ticket, Payload::Transfer(transfer)) => Ok(TransferIntent { ticket, transfer }),
            (_, other) => Err(wrong_kind(PayloadKind::Transfer, other.kind())),
        }
    }

    /// Pay out of the stakeholder bucket into the recipient's account.
    pub fn complete_transfer(&mut self, intent: TransferIntent<'tx>) -> Result<()> {
        let TransferIntent { ticket, transfer } = intent;
        self.atomic(|s| {
            s.state.vault.debit_bucket(&transfer.stakeholder, transfer.amount)?;
            s.state.vault.credit_account(&transfer.recipient, transfer.amount)?;
            let name = s.redeem(ticket)?;

            s.changes.mutated(Entity::VaultBucket(transfer.stakeholder.clone()));
            s.changes.mutated(Entity::Account(transfer.recipient.clone()));
            info!(
                "{}: transferred {} from {} to {}",
                name, transfer.amount, transfer.stakeholder, transfer.recipient
            );
            Ok(())
        })
    }
}
