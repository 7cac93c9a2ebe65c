//! Transaction session
//!
//! A [`Session`] is the handle a transaction closure works through. It
//! exposes the multisig lifecycle, the holder-side operations and the
//! start/complete brackets of the guarded effects (see [`crate::effects`]).

use log::debug;

use crate::state::TreasuryState;
use warden_core::{Address, ChangeLog, Entity, Member, Result, Timestamp, WardenError};
use warden_economics::StakingBook;
use warden_governance::{CleanReport, ExecutionRequest, Payload, RequestTracker, Ticket};

pub struct Session<'tx> {
    pub(crate) state: &'tx mut TreasuryState,
    requests: RequestTracker<'tx>,
    pub(crate) changes: ChangeLog,
    now: Timestamp,
}

impl<'tx> Session<'tx> {
    pub(crate) fn new(state: &'tx mut TreasuryState, now: Timestamp) -> Self {
        Self {
            state,
            requests: RequestTracker::new(),
            changes: ChangeLog::new(),
            now,
        }
    }

    pub fn now(&self) -> Timestamp {
        self.now
    }

    /// The working state, including everything done so far in this
    /// transaction.
    pub fn state(&self) -> &TreasuryState {
        &*self.state
    }

    /// Requests issued by this session that have not been completed yet.
    pub fn outstanding_requests(&self) -> usize {
        self.requests.outstanding()
    }

    // ---- multisig lifecycle ----

    pub fn propose(&mut self, name: &str, proposer: &Member, payload: &Payload) -> Result<()> {
        let state = &mut *self.state;
        state
            .proposals
            .propose(&state.config, name, proposer, payload, self.now)?;
        self.changes.created(Entity::Proposal(name.to_string()));
        Ok(())
    }

    pub fn approve(&mut self, name: &str, member: &Member) -> Result<u64> {
        let state = &mut *self.state;
        let count = state.proposals.approve(&state.config, name, member)?;
        self.changes.mutated(Entity::Proposal(name.to_string()));
        Ok(count)
    }

    pub fn remove_approval(&mut self, name: &str, member: &Member) -> Result<u64> {
        let count = self.state.proposals.remove_approval(name, member)?;
        self.changes.mutated(Entity::Proposal(name.to_string()));
        Ok(count)
    }

    /// Consume an approved proposal and open its execution request. The
    /// request must be completed before the transaction ends.
    pub fn execute(&mut self, name: &str) -> Result<ExecutionRequest<'tx>> {
        let state = &mut *self.state;
        let request = state
            .proposals
            .execute(&state.config, name, &mut self.requests)?;
        self.changes.deleted(Entity::Proposal(name.to_string()));
        Ok(request)
    }

    pub fn delete(&mut self, name: &str) -> Result<()> {
        self.state.proposals.delete(name)?;
        self.changes.deleted(Entity::Proposal(name.to_string()));
        Ok(())
    }

    pub fn clean(&mut self) -> CleanReport {
        let state = &mut *self.state;
        let report = state.proposals.clean(&state.config);
        for name in &report.removed {
            self.changes.deleted(Entity::Proposal(name.clone()));
        }
        report
    }

    // ---- holder operations ----

    /// Move `recipient`'s airdrop allocation into their account.
    pub fn claim_airdrop(&mut self, recipient: &Address) -> Result<u64> {
        self.atomic(|s| {
            let amount = s.state.airdrops.claim(recipient)?;
            s.state.vault.credit_account(recipient, amount)?;
            s.changes.deleted(Entity::AirdropAllocation(recipient.clone()));
            s.changes.mutated(Entity::Account(recipient.clone()));
            debug!("{} claimed airdrop of {}", recipient, amount);
            Ok(amount)
        })
    }

    /// Release `amount` of a grant's vested tokens to its beneficiary.
    pub fn unlock_vesting(&mut self, grant: u64, beneficiary: &Address, amount: u64) -> Result<u64> {
        self.atomic(|s| {
            let unlocked = s.state.vesting.unlock(grant, beneficiary, amount, s.now)?;
            s.state.vault.credit_account(beneficiary, unlocked.amount)?;
            if unlocked.closed {
                s.changes.deleted(Entity::VestingGrant(grant));
            } else {
                s.changes.mutated(Entity::VestingGrant(grant));
            }
            s.changes.mutated(Entity::Account(beneficiary.clone()));
            debug!("{} unlocked {} from grant {}", beneficiary, unlocked.amount, grant);
            Ok(unlocked.amount)
        })
    }

    // ---- staking ----

    /// Stake `amount` from `owner`'s account into a new position.
    pub fn stake(&mut self, owner: &Address, amount: u64, lock_ms: u64) -> Result<u64> {
        self.atomic(|s| {
            let now = s.now;
            let id = staking_mut(s.state)?.open(owner, amount, lock_ms, now)?;
            s.state.vault.debit_account(owner, amount)?;
            s.changes.created(Entity::StakePosition(id));
            s.changes.mutated(Entity::RewardPool);
            s.changes.mutated(Entity::Account(owner.clone()));
            debug!("{} staked {} in position {}", owner, amount, id);
            Ok(id)
        })
    }

    /// Pay out a position's accrued reward.
    pub fn claim(&mut self, position: u64, caller: &Address) -> Result<u64> {
        self.atomic(|s| {
            let now = s.now;
            let reward = staking_mut(s.state)?.claim(position, caller, now)?;
            s.pay_reward(caller, reward)?;
            s.changes.mutated(Entity::StakePosition(position));
            s.changes.mutated(Entity::RewardPool);
            Ok(reward)
        })
    }

    /// Close a position. Returns `(principal, reward)`.
    pub fn unstake(&mut self, position: u64, caller: &Address) -> Result<(u64, u64)> {
        self.atomic(|s| {
            let now = s.now;
            let (value, reward) = staking_mut(s.state)?.unstake(position, caller, now)?;
            s.pay_reward(caller, reward)?;
            s.state.vault.credit_account(caller, value)?;
            s.changes.deleted(Entity::StakePosition(position));
            s.changes.mutated(Entity::RewardPool);
            s.changes.mutated(Entity::Account(caller.clone()));
            debug!("{} unstaked position {}: {} + {} reward", caller, position, value, reward);
            Ok((value, reward))
        })
    }

    /// What claiming `position` now would pay, without touching the pool.
    pub fn pending_rewards(&self, position: u64) -> Result<u64> {
        staking_ref(&*self.state)?.pending_rewards(position, self.now)
    }

    // ---- internals ----

    pub(crate) fn redeem(&mut self, ticket: Ticket<'tx>) -> Result<String> {
        self.requests.redeem(ticket)
    }

    /// Run `op`, restoring the working state and change log if it fails, so
    /// a caller that recovers from the error continues from a clean state.
    pub(crate) fn atomic<R>(&mut self, op: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let state = (*self.state).clone();
        let changes = self.changes.clone();
        match op(self) {
            Ok(value) => Ok(value),
            Err(e) => {
                *self.state = state;
                self.changes = changes;
                Err(e)
            }
        }
    }

    /// Credit a reward the pool has already drawn from its reserve.
    fn pay_reward(&mut self, to: &Address, reward: u64) -> Result<()> {
        if reward == 0 {
            return Ok(());
        }
        self.state.vault.credit_account(to, reward)?;
        self.changes.mutated(Entity::Account(to.clone()));
        Ok(())
    }

    pub(crate) fn finish(self) -> Result<ChangeLog> {
        self.requests.settle()?;
        Ok(self.changes)
    }
}

fn staking_mut(state: &mut TreasuryState) -> Result<&mut StakingBook> {
    state
        .staking
        .as_mut()
        .ok_or_else(|| WardenError::NotFound("staking pool (not launched)".to_string()))
}

fn staking_ref(state: &TreasuryState) -> Result<&StakingBook> {
    state
        .staking
        .as_ref()
        .ok_or_else(|| WardenError::NotFound("staking pool (not launched)".to_string()))
}
