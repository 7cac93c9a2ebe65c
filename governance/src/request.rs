//! One-shot execution requests
//!
//! A successful `execute` hands out an [`ExecutionRequest`]. It is the only
//! thing that can open a guarded effect, and the effect's completion is the
//! only thing that can consume it.
//!
//! Two mechanisms keep a request single-use:
//! - it is move-only (no `Clone`, no `Serialize`) and branded with the
//!   lifetime of the transaction that issued it, so it cannot be returned out
//!   of that transaction or handed to another one;
//! - the issuing [`RequestTracker`] keeps the ids of open requests. Redeeming
//!   removes the id, and a transaction whose tracker still has open ids
//!   refuses to commit.

use std::collections::BTreeMap;
use std::marker::PhantomData;

use crate::payload::{Payload, PayloadKind};
use warden_core::{Result, WardenError};

/// Invariant lifetime marker tying a value to one transaction.
type Brand<'tx> = PhantomData<fn(&'tx ()) -> &'tx ()>;

/// Capability to run the guarded effect of an executed proposal.
///
/// ```compile_fail
/// fn duplicate(req: warden_governance::ExecutionRequest<'_>) {
///     let _copy = req.clone();
/// }
/// ```
#[must_use = "an execution request must be completed in the transaction that issued it"]
#[derive(Debug)]
pub struct ExecutionRequest<'tx> {
    id: u64,
    proposal: String,
    payload: String,
    _brand: Brand<'tx>,
}

impl<'tx> ExecutionRequest<'tx> {
    pub fn proposal(&self) -> &str {
        &self.proposal
    }

    /// Peek at the payload kind to pick the matching start/complete pair.
    pub fn kind(&self) -> Result<PayloadKind> {
        Payload::decode(&self.payload).map(|p| p.kind())
    }

    /// Decode the payload, trading the request for a completion ticket.
    ///
    /// On failure the request is gone but its id stays open, so the
    /// transaction cannot commit.
    pub fn decode(self) -> Result<(Ticket<'tx>, Payload)> {
        let payload = Payload::decode(&self.payload)?;
        Ok((
            Ticket {
                id: self.id,
                proposal: self.proposal,
                _brand: PhantomData,
            },
            payload,
        ))
    }
}

/// What a typed intent carries between start and complete.
#[must_use = "a ticket must be redeemed by the matching completion"]
#[derive(Debug)]
pub struct Ticket<'tx> {
    id: u64,
    proposal: String,
    _brand: Brand<'tx>,
}

impl<'tx> Ticket<'tx> {
    pub fn proposal(&self) -> &str {
        &self.proposal
    }
}

/// Per-transaction registry of issued, not yet consumed requests.
#[derive(Debug)]
pub struct RequestTracker<'tx> {
    next_id: u64,
    open: BTreeMap<u64, String>,
    _brand: Brand<'tx>,
}

impl<'tx> Default for RequestTracker<'tx> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'tx> RequestTracker<'tx> {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            open: BTreeMap::new(),
            _brand: PhantomData,
        }
    }

    pub(crate) fn issue(&mut self, proposal: String, payload: String) -> ExecutionRequest<'tx> {
        let id = self.next_id;
        self.next_id += 1;
        self.open.insert(id, proposal.clone());
        ExecutionRequest {
            id,
            proposal,
            payload,
            _brand: PhantomData,
        }
    }

    /// Consume a ticket. Returns the name of the executed proposal.
    pub fn redeem(&mut self, ticket: Ticket<'tx>) -> Result<String> {
        match self.open.remove(&ticket.id) {
            Some(name) => Ok(name),
            None => Err(WardenError::NotFound(format!(
                "open execution request for {}",
                ticket.proposal
            ))),
        }
    }

    pub fn outstanding(&self) -> usize {
        self.open.len()
    }

    /// Fails if any issued request was not consumed.
    pub fn settle(&self) -> Result<()> {
        match self.open.len() {
            0 => Ok(()),
            n => Err(WardenError::UnsettledRequest(n)),
        }
    }
}
