//! Transactional ledger
//!
//! The ledger owns the authoritative [`TreasuryState`]. Every external call
//! runs through [`Ledger::transact`]: the closure works on a copy, and the
//! copy replaces the state only if the closure succeeded and every execution
//! request it opened was completed.
//!
//! The closure is generic over the session's brand lifetime, so nothing
//! branded (requests, tickets, intents) can be smuggled out of it:
//!
//! ```compile_fail
//! use treasury::{Ledger, Session};
//! use warden_governance::ExecutionRequest;
//!
//! fn leak(ledger: &Ledger) {
//!     let mut kept: Option<ExecutionRequest<'_>> = None;
//!     let _ = ledger.transact(1, |session: &mut Session<'_>| {
//!         kept = Some(session.execute("payout")?);
//!         Ok(())
//!     });
//! }
//! ```

use log::{debug, warn};
use parking_lot::Mutex;
use serde::Serialize;

use crate::session::Session;
use crate::state::{Genesis, TreasuryState};
use warden_core::{Change, Result, Timestamp, WardenError};

/// Result of a committed transaction.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receipt<T> {
    pub value: T,
    /// Entities created, mutated or deleted by the transaction
    pub changes: Vec<Change>,
    pub committed_at: Timestamp,
}

#[derive(Debug)]
pub struct Ledger {
    state: Mutex<TreasuryState>,
}

impl Ledger {
    pub fn new(state: TreasuryState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn from_genesis(genesis: Genesis) -> Result<Self> {
        Ok(Self::new(TreasuryState::from_genesis(genesis)?))
    }

    /// Run `f` as one all-or-nothing transaction at time `now`.
    ///
    /// Fails with `StaleClock` if `now` is earlier than the last committed
    /// transaction, and with `UnsettledRequest` if `f` returned while an
    /// execution request it opened was still pending. On any failure the
    /// state is left exactly as it was.
    pub fn transact<T, F>(&self, now: Timestamp, f: F) -> Result<Receipt<T>>
    where
        F: for<'tx> FnOnce(&mut Session<'tx>) -> Result<T>,
    {
        let mut guard = self.state.lock();
        if now < guard.clock {
            return Err(WardenError::StaleClock {
                now,
                last_updated: guard.clock,
            });
        }

        let mut working = guard.clone();
        let outcome = {
            let mut session = Session::new(&mut working, now);
            f(&mut session).and_then(|value| session.finish().map(|changes| (value, changes)))
        };

        match outcome {
            Ok((value, changes)) => {
                working.clock = now;
                *guard = working;
                debug!("committed transaction at {} ({} changes)", now, changes.len());
                Ok(Receipt {
                    value,
                    changes: changes.into_vec(),
                    committed_at: now,
                })
            }
            Err(e) => {
                warn!("transaction at {} rolled back: {}", now, e);
                Err(e)
            }
        }
    }

    /// Read the committed state.
    pub fn view<R>(&self, f: impl FnOnce(&TreasuryState) -> R) -> R {
        f(&self.state.lock())
    }

    pub fn snapshot(&self) -> TreasuryState {
        self.state.lock().clone()
    }

    pub fn into_state(self) -> TreasuryState {
        self.state.into_inner()
    }
}
