use log::info;

use super::wrong_kind;
use crate::metadata::CoinMetadata;
use crate::session::Session;
use warden_core::{Entity, Result};
use warden_governance::{ExecutionRequest, MetadataUpdate, Payload, PayloadKind, Ticket};

#[must_use]
#[derive(Debug)]
pub struct MetadataIntent<'tx> {
    ticket: Ticket<'tx>,
    update: MetadataUpdate,
}

impl<'tx> MetadataIntent<'tx> {
    pub fn update(&self) -> &MetadataUpdate {
        &self.update
    }
}

impl<'tx> Session<'tx> {
    pub fn start_update_metadata(
        &self,
        request: ExecutionRequest<'tx>,
    ) -> Result<MetadataIntent<'tx>> {
        match request.decode()? {
            (ticket, Payload::UpdateMetadata(update)) => Ok(MetadataIntent { ticket, update }),
            (_, other) => Err(wrong_kind(PayloadKind::UpdateMetadata, other.kind())),
        }
    }

    pub fn complete_update_metadata(&mut self, intent: MetadataIntent<'tx>) -> Result<()> {
        let name = self.redeem(intent.ticket)?;
        info!("{}: metadata set to {} ({})", name, intent.update.name, intent.update.symbol);
        self.state.metadata = CoinMetadata::from(intent.update);
        self.changes.mutated(Entity::Metadata);
        Ok(())
    }
}
