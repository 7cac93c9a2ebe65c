use log::info;

use super::wrong_kind;
use crate::session::Session;
use warden_core::{checked_add, Entity, Result};
use warden_governance::{ExecutionRequest, Payload, PayloadKind, Ticket, VestingPlan};

#[must_use]
#[derive(Debug)]
pub struct VestingIntent<'tx> {
    ticket: Ticket<'tx>,
    plan: VestingPlan,
}

impl<'tx> VestingIntent<'tx> {
    pub fn plan(&self) -> &VestingPlan {
        &self.plan
    }
}

impl<'tx> Session<'tx> {
    pub fn start_vesting(&self, request: ExecutionRequest<'tx>) -> Result<VestingIntent<'tx>> {
        match request.decode()? {
            (ticket, Payload::Vesting(plan)) => Ok(VestingIntent { ticket, plan }),
            (_, other) => Err(wrong_kind(PayloadKind::Vesting, other.kind())),
        }
    }

    /// Lock each amount in a linear grant starting now. Returns the grant ids
    /// in plan order.
    pub fn complete_vesting(&mut self, intent: VestingIntent<'tx>) -> Result<Vec<u64>> {
        let VestingIntent { ticket, plan } = intent;
        let total = plan
            .amounts
            .iter()
            .try_fold(0u64, |acc, amount| checked_add(acc, *amount))?;

        self.atomic(|s| {
            let now = s.now();
            s.state.vault.debit_bucket(&plan.stakeholder, total)?;
            let mut grants = Vec::with_capacity(plan.recipients.len());
            for (recipient, amount) in plan.recipients.iter().zip(&plan.amounts) {
                let id = s.state.vesting.create(
                    recipient,
                    &plan.stakeholder,
                    *amount,
                    now,
                    plan.duration_ms,
                )?;
                s.changes.created(Entity::VestingGrant(id));
                grants.push(id);
            }
            let name = s.redeem(ticket)?;

            s.changes.mutated(Entity::VaultBucket(plan.stakeholder.clone()));
            info!(
                "{}: vesting {} from {} over {} ms in {} grants",
                name,
                total,
                plan.stakeholder,
                plan.duration_ms,
                grants.len()
            );
            Ok(grants)
        })
    }
}
