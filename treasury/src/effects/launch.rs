//! Staking launch

use log::info;

use super::wrong_kind;
use crate::session::Session;
use crate::vault::STAKING_BUCKET;
use warden_core::{Entity, Result, WardenError};
use warden_economics::{EmissionSchedule, StakingBook};
use warden_governance::{ExecutionRequest, Payload, PayloadKind, Ticket};

#[must_use]
#[derive(Debug)]
pub struct LaunchIntent<'tx> {
    ticket: Ticket<'tx>,
    schedule: EmissionSchedule,
}

impl<'tx> LaunchIntent<'tx> {
    pub fn schedule(&self) -> &EmissionSchedule {
        &self.schedule
    }
}

impl<'tx> Session<'tx> {
    /// The emission curve is anchored at the current transaction time.
    pub fn start_launch_staking(&self, request: ExecutionRequest<'tx>) -> Result<LaunchIntent<'tx>> {
        match request.decode()? {
            (ticket, Payload::LaunchStaking(launch)) => Ok(LaunchIntent {
                ticket,
                schedule: EmissionSchedule::new(launch.emissions, self.now())?,
            }),
            (_, other) => Err(wrong_kind(PayloadKind::LaunchStaking, other.kind())),
        }
    }

    /// Moves the schedule's whole emission out of the staking bucket into
    /// the pool's reserve.
    pub fn complete_launch_staking(&mut self, intent: LaunchIntent<'tx>) -> Result<()> {
        if self.state.staking.is_some() {
            return Err(WardenError::AlreadyExists("staking pool".to_string()));
        }
        let total = intent.schedule.total()?;
        let book = StakingBook::new(intent.schedule)?;
        self.state.vault.debit_bucket(STAKING_BUCKET, total)?;
        let name = self.redeem(intent.ticket)?;

        info!(
            "{}: staking live from {}, {} to emit over {} weeks",
            name,
            book.pool().schedule().start(),
            total,
            book.pool().schedule().emissions().len()
        );
        self.state.staking = Some(book);
        self.changes.mutated(Entity::VaultBucket(STAKING_BUCKET.to_string()));
        self.changes.created(Entity::RewardPool);
        Ok(())
    }
}
