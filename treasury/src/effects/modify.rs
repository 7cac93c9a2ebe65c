//! Multisig self-amendment

use log::info;

use super::wrong_kind;
use crate::session::Session;
use warden_core::{Entity, Result};
use warden_governance::{ExecutionRequest, ModifyConfig, Payload, PayloadKind, Ticket};

#[must_use]
#[derive(Debug)]
pub struct ModifyIntent<'tx> {
    ticket: Ticket<'tx>,
    change: ModifyConfig,
}

impl<'tx> ModifyIntent<'tx> {
    pub fn change(&self) -> &ModifyConfig {
        &self.change
    }
}

impl<'tx> Session<'tx> {
    pub fn start_modify(&self, request: ExecutionRequest<'tx>) -> Result<ModifyIntent<'tx>> {
        match request.decode()? {
            (ticket, Payload::Modify(change)) => Ok(ModifyIntent { ticket, change }),
            (_, other) => Err(wrong_kind(PayloadKind::Modify, other.kind())),
        }
    }

    /// Amend members and threshold. `InvalidThreshold` leaves the config
    /// as it was.
    pub fn complete_modify(&mut self, intent: ModifyIntent<'tx>) -> Result<()> {
        let next = self.state.config.amended(&intent.change)?;
        let name = self.redeem(intent.ticket)?;

        info!(
            "{}: multisig now {} of {} members (version {})",
            name,
            next.threshold(),
            next.member_count(),
            next.version()
        );
        self.state.config = next;
        self.changes.mutated(Entity::Config);
        Ok(())
    }
}
