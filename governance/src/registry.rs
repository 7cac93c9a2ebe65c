//! Proposal registry
//!
//! Holds the named pending proposals and their approval sets, checks the
//! threshold and hands out execution requests. Every method validates
//! fully before it mutates, so a failed call leaves the registry untouched.

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::MultisigConfig;
use crate::payload::Payload;
use crate::proposal::{ApprovalPolicy, Proposal};
use crate::request::{ExecutionRequest, RequestTracker};
use warden_core::{Member, Result, Timestamp, WardenError};

/// Outcome of a `clean` sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CleanReport {
    pub removed: Vec<String>,
    /// Entries whose stored payload no longer decodes; left in place
    pub skipped: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposalRegistry {
    proposals: BTreeMap<String, Proposal>,
    #[serde(default)]
    policy: ApprovalPolicy,
}

impl ProposalRegistry {
    pub fn new(policy: ApprovalPolicy) -> Self {
        Self {
            proposals: BTreeMap::new(),
            policy,
        }
    }

    pub fn policy(&self) -> ApprovalPolicy {
        self.policy
    }

    pub fn get(&self, name: &str) -> Option<&Proposal> {
        self.proposals.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.proposals.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.proposals.values()
    }

    pub fn len(&self) -> usize {
        self.proposals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.proposals.is_empty()
    }

    /// Register a new pending proposal. Only members may propose.
    pub fn propose(
        &mut self,
        config: &MultisigConfig,
        name: &str,
        proposer: &Member,
        payload: &Payload,
        now: Timestamp,
    ) -> Result<()> {
        if self.proposals.contains_key(name) {
            return Err(WardenError::AlreadyExists(format!("proposal {}", name)));
        }
        if !config.is_member(proposer) {
            return Err(WardenError::Unauthorized(format!(
                "{} is not a multisig member",
                proposer
            )));
        }
        payload.validate()?;
        let encoded = payload.encode()?;

        debug!("proposal {} ({}) created by {}", name, payload.kind(), proposer);
        self.proposals.insert(
            name.to_string(),
            Proposal {
                name: name.to_string(),
                proposer: proposer.clone(),
                payload: encoded,
                approvals: Default::default(),
                version: config.version(),
                created_at: now,
            },
        );
        Ok(())
    }

    /// Record `member`'s approval. Returns the new approval count.
    pub fn approve(
        &mut self,
        config: &MultisigConfig,
        name: &str,
        member: &Member,
    ) -> Result<u64> {
        let policy = self.policy;
        let proposal = self.lookup_mut(name)?;
        if !config.is_member(member) {
            return Err(WardenError::Unauthorized(format!(
                "{} is not a multisig member",
                member
            )));
        }
        if policy == ApprovalPolicy::InvalidateOnConfigChange && proposal.is_stale(config) {
            return Err(WardenError::StaleProposal {
                proposal: name.to_string(),
                version: proposal.version,
                current: config.version(),
            });
        }
        if !proposal.approvals.insert(member.clone()) {
            return Err(WardenError::AlreadyApproved {
                proposal: name.to_string(),
                member: member.to_string(),
            });
        }

        debug!("{} approved {} ({} approvals)", member, name, proposal.approval_count());
        Ok(proposal.approval_count())
    }

    /// Withdraw an earlier approval. Returns the new approval count.
    pub fn remove_approval(&mut self, name: &str, member: &Member) -> Result<u64> {
        let proposal = self.lookup_mut(name)?;
        if !proposal.approvals.remove(member) {
            return Err(WardenError::NotApproved {
                proposal: name.to_string(),
                member: member.to_string(),
            });
        }

        debug!("{} withdrew approval of {}", member, name);
        Ok(proposal.approval_count())
    }

    /// Consume a proposal whose approvals reach the current threshold.
    pub fn execute<'tx>(
        &mut self,
        config: &MultisigConfig,
        name: &str,
        requests: &mut RequestTracker<'tx>,
    ) -> Result<ExecutionRequest<'tx>> {
        let proposal = self
            .proposals
            .get(name)
            .ok_or_else(|| WardenError::NotFound(format!("proposal {}", name)))?;

        let approvals = proposal.effective_approvals(config, self.policy);
        if approvals < config.threshold() {
            return Err(WardenError::InsufficientApprovals {
                approvals,
                threshold: config.threshold(),
            });
        }

        let proposal = self
            .proposals
            .remove(name)
            .ok_or_else(|| WardenError::NotFound(format!("proposal {}", name)))?;
        debug!("proposal {} executed with {} approvals", name, approvals);
        Ok(requests.issue(proposal.name, proposal.payload))
    }

    /// Drop a proposal nobody has approved yet.
    pub fn delete(&mut self, name: &str) -> Result<Proposal> {
        let proposal = self.lookup_mut(name)?;
        if !proposal.approvals.is_empty() {
            return Err(WardenError::NonEmptyApprovals {
                proposal: name.to_string(),
                approvals: proposal.approval_count(),
            });
        }
        self.proposals
            .remove(name)
            .ok_or_else(|| WardenError::NotFound(format!("proposal {}", name)))
    }

    /// Remove proposals created under an older config version.
    ///
    /// Best effort: an entry whose stored payload cannot be decoded is
    /// reported and left alone rather than failing the sweep.
    pub fn clean(&mut self, config: &MultisigConfig) -> CleanReport {
        let mut report = CleanReport::default();

        for (name, proposal) in &self.proposals {
            if !proposal.is_stale(config) {
                continue;
            }
            match proposal.kind() {
                Ok(kind) => {
                    debug!(
                        "cleaning stale {} proposal {} (version {} < {})",
                        kind,
                        name,
                        proposal.version,
                        config.version()
                    );
                    report.removed.push(name.clone());
                }
                Err(e) => {
                    warn!("skipping malformed proposal {}: {}", name, e);
                    report.skipped.push(name.clone());
                }
            }
        }

        for name in &report.removed {
            self.proposals.remove(name);
        }
        report
    }

    fn lookup_mut(&mut self, name: &str) -> Result<&mut Proposal> {
        self.proposals
            .get_mut(name)
            .ok_or_else(|| WardenError::NotFound(format!("proposal {}", name)))
    }

    /// Insert a proposal as-is, bypassing validation.
    #[cfg(test)]
    fn insert_raw(&mut self, proposal: Proposal) {
        self.proposals.insert(proposal.name.clone(), proposal);
    }
}
