//! Error taxonomy shared by every warden crate

use thiserror::Error;

/// Every core operation is all-or-nothing: when one of these is returned the
/// store is exactly as it was before the call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WardenError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Member {member} already approved proposal {proposal}")]
    AlreadyApproved { proposal: String, member: String },

    #[error("Member {member} has not approved proposal {proposal}")]
    NotApproved { proposal: String, member: String },

    #[error("Insufficient approvals: {approvals} of {threshold} required")]
    InsufficientApprovals { approvals: u64, threshold: u64 },

    #[error("Invalid threshold {threshold} for {members} members")]
    InvalidThreshold { threshold: u64, members: u64 },

    #[error("Proposal {proposal} still has {approvals} approvals")]
    NonEmptyApprovals { proposal: String, approvals: u64 },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    #[error("Stale clock: now {now} is before last update {last_updated}")]
    StaleClock { now: u64, last_updated: u64 },

    #[error("Insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance { requested: u64, available: u64 },

    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Proposal {proposal} was created under config version {version}, current is {current}")]
    StaleProposal {
        proposal: String,
        version: u64,
        current: u64,
    },

    #[error("{0} execution request(s) left unconsumed")]
    UnsettledRequest(usize),

    #[error("Position is locked until {unlock_time}")]
    Locked { unlock_time: u64 },
}

pub type Result<T> = std::result::Result<T, WardenError>;
