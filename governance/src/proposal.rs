//! Pending proposals

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::config::MultisigConfig;
use crate::payload::{Payload, PayloadKind};
use warden_core::{Member, Result, Timestamp};

/// How approvals cast before a config amendment are treated afterwards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalPolicy {
    /// A proposal created under an older config version counts zero
    /// approvals and can no longer be approved; `clean` removes it.
    #[default]
    InvalidateOnConfigChange,
    /// Approvals keep counting as long as the approver is still a member.
    RetainCurrentMembers,
}

/// A named request for a privileged action, waiting for approvals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Proposal {
    pub name: String,
    pub proposer: Member,
    /// Encoded [`Payload`], decoded when execution starts
    pub payload: String,
    pub approvals: BTreeSet<Member>,
    /// Config version the proposal was created under
    pub version: u64,
    pub created_at: Timestamp,
}

impl Proposal {
    pub fn approval_count(&self) -> u64 {
        self.approvals.len() as u64
    }

    pub fn is_stale(&self, config: &MultisigConfig) -> bool {
        self.version != config.version()
    }

    pub fn decode_payload(&self) -> Result<Payload> {
        Payload::decode(&self.payload)
    }

    pub fn kind(&self) -> Result<PayloadKind> {
        self.decode_payload().map(|p| p.kind())
    }

    /// Approvals that count towards the threshold right now.
    pub fn effective_approvals(&self, config: &MultisigConfig, policy: ApprovalPolicy) -> u64 {
        match policy {
            ApprovalPolicy::InvalidateOnConfigChange if self.is_stale(config) => 0,
            _ => self
                .approvals
                .iter()
                .filter(|m| config.is_member(m))
                .count() as u64,
        }
    }
}
