//! Warden Governance Module
//!
//! Threshold multisig that gates every privileged treasury action:
//! - a member set with an approval threshold, amended only through itself
//! - named pending proposals carrying a typed payload
//! - one-shot execution requests handed out once approvals reach threshold

pub mod config;
pub mod payload;
pub mod proposal;
pub mod registry;
pub mod request;

pub use config::MultisigConfig;
pub use payload::{
    AirdropBatch, MetadataUpdate, ModifyConfig, Payload, PayloadKind, StakingLaunch,
    TransferFunds, VestingPlan,
};
pub use proposal::{ApprovalPolicy, Proposal};
pub use registry::{CleanReport, ProposalRegistry};
pub use request::{ExecutionRequest, RequestTracker, Ticket};

pub use warden_core::{Member, Result, WardenError};
