//! Subcommands
//!
//! Every command that changes the treasury loads the snapshot, runs exactly
//! one ledger transaction, and writes the snapshot and a journal entry back
//! only if that transaction committed.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Subcommand};
use log::info;
use serde::{Deserialize, Serialize};
use std::path::Path;

use treasury::{
    CoinMetadata, Ledger, Receipt, Session, TreasuryState, AIRDROP_BUCKET, MAX_DROPS_PER_REQUEST,
};
use warden_core::{Address, Change, Member, Timestamp};
use warden_economics::{constants::SCHEDULE_WEEKS, PoolStats};
use warden_governance::{
    AirdropBatch, ApprovalPolicy, MetadataUpdate, ModifyConfig, Payload, StakingLaunch,
    TransferFunds, VestingPlan,
};
use warden_storage::Storage;

use crate::config::Config;

/// Snapshot name of the treasury state
pub const STATE_SNAPSHOT: &str = "treasury";

/// Journal of committed commands
pub const JOURNAL: &str = "journal";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Create a treasury from the [genesis] section of the config
    Init {
        /// Replace an existing treasury
        #[arg(long)]
        force: bool,
    },

    /// Create a named proposal
    Propose {
        name: String,

        /// Member creating the proposal
        #[arg(long)]
        proposer: String,

        #[command(subcommand)]
        kind: ProposalKind,
    },

    /// Approve a pending proposal
    Approve {
        name: String,
        #[arg(long)]
        member: String,
    },

    /// Withdraw an approval
    RemoveApproval {
        name: String,
        #[arg(long)]
        member: String,
    },

    /// Execute an approved proposal and apply its effect
    Execute {
        name: String,

        /// Airdrop entry as ADDRESS=AMOUNT (airdrop proposals only)
        #[arg(long = "drop", value_name = "ADDRESS=AMOUNT", value_parser = parse_allocation)]
        drops: Vec<(String, u64)>,
    },

    /// Delete a proposal that has no approvals
    Delete { name: String },

    /// Remove proposals made stale by a config change
    Clean,

    /// Stake tokens from an account into a new position
    Stake {
        #[arg(long)]
        owner: String,
        #[arg(long)]
        amount: u64,
        /// Lockup before the position can be unstaked
        #[arg(long, default_value = "0")]
        lock_ms: u64,
    },

    /// Pay out a position's accrued rewards
    Claim {
        #[arg(long)]
        position: u64,
        #[arg(long)]
        owner: String,
    },

    /// Close a position, returning principal and rewards
    Unstake {
        #[arg(long)]
        position: u64,
        #[arg(long)]
        owner: String,
    },

    /// Claim an airdrop allocation
    ClaimAirdrop {
        #[arg(long)]
        recipient: String,
    },

    /// Unlock vested tokens from a grant
    Unlock {
        #[arg(long)]
        grant: u64,
        #[arg(long)]
        beneficiary: String,
        #[arg(long)]
        amount: u64,
    },

    /// Preview the rewards a claim would pay now
    Rewards {
        #[arg(long)]
        position: u64,
    },

    /// Show the treasury state
    Status,

    /// Show recently committed commands
    History {
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum ProposalKind {
    /// Change multisig members and threshold
    Modify(ModifyArgs),

    /// Pay from a stakeholder bucket
    Transfer {
        #[arg(long)]
        stakeholder: String,
        #[arg(long)]
        amount: u64,
        #[arg(long)]
        recipient: String,
    },

    /// Replace the coin metadata
    Metadata {
        #[arg(long)]
        name: String,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        description: String,
        #[arg(long)]
        icon_url: String,
    },

    /// Open an airdrop funded from a bucket
    Airdrop {
        #[arg(long, default_value = AIRDROP_BUCKET)]
        stakeholder: String,
    },

    /// Create linear vesting grants
    Vesting {
        #[arg(long)]
        stakeholder: String,
        /// Grant as ADDRESS=AMOUNT, repeatable
        #[arg(long = "grant", value_name = "ADDRESS=AMOUNT", value_parser = parse_allocation, required = true)]
        grants: Vec<(String, u64)>,
        #[arg(long)]
        duration_ms: u64,
    },

    /// Launch staking with a 72-week emission schedule
    LaunchStaking {
        /// Same emission every week
        #[arg(long, conflicts_with = "emissions", required_unless_present = "emissions")]
        per_week: Option<u64>,
        /// Comma-separated weekly emissions
        #[arg(long, value_delimiter = ',')]
        emissions: Vec<u64>,
    },
}

#[derive(Args, Debug)]
pub struct ModifyArgs {
    /// Remove the addresses instead of adding them
    #[arg(long)]
    pub remove: bool,
    /// Threshold after the change
    #[arg(long)]
    pub threshold: u64,
    #[arg(required = true)]
    pub addresses: Vec<String>,
}

impl ProposalKind {
    pub fn into_payload(self) -> Payload {
        match self {
            ProposalKind::Modify(args) => Payload::Modify(ModifyConfig {
                add: !args.remove,
                new_threshold: args.threshold,
                addresses: args.addresses.into_iter().map(Member::from).collect(),
            }),
            ProposalKind::Transfer {
                stakeholder,
                amount,
                recipient,
            } => Payload::Transfer(TransferFunds {
                stakeholder,
                amount,
                recipient: Address::from(recipient),
            }),
            ProposalKind::Metadata {
                name,
                symbol,
                description,
                icon_url,
            } => Payload::UpdateMetadata(MetadataUpdate {
                name,
                symbol,
                description,
                icon_url,
            }),
            ProposalKind::Airdrop { stakeholder } => Payload::Airdrop(AirdropBatch { stakeholder }),
            ProposalKind::Vesting {
                stakeholder,
                grants,
                duration_ms,
            } => {
                let (recipients, amounts) = grants
                    .into_iter()
                    .map(|(address, amount)| (Address::from(address), amount))
                    .unzip();
                Payload::Vesting(VestingPlan {
                    stakeholder,
                    recipients,
                    amounts,
                    duration_ms,
                })
            }
            ProposalKind::LaunchStaking {
                per_week,
                emissions,
            } => Payload::LaunchStaking(StakingLaunch {
                emissions: match per_week {
                    Some(amount) => vec![amount; SCHEDULE_WEEKS],
                    None => emissions,
                },
            }),
        }
    }
}

/// Parse `ADDRESS=AMOUNT`.
pub fn parse_allocation(s: &str) -> std::result::Result<(String, u64), String> {
    let (address, amount) = s
        .split_once('=')
        .ok_or_else(|| format!("expected ADDRESS=AMOUNT, got '{}'", s))?;
    let address = address.trim();
    if address.is_empty() {
        return Err(format!("missing address in '{}'", s));
    }
    let amount = amount
        .trim()
        .parse::<u64>()
        .map_err(|e| format!("invalid amount in '{}': {}", s, e))?;
    Ok((address.to_string(), amount))
}

/// One line of the journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JournalEntry {
    pub command: String,
    pub committed_at: Timestamp,
    pub recorded_at: DateTime<Utc>,
    pub changes: Vec<Change>,
}

/// The data directory of one treasury.
pub struct Workspace {
    storage: Storage,
}

impl Workspace {
    pub fn open(data_dir: &Path) -> Result<Self> {
        let storage = Storage::open(data_dir)
            .with_context(|| format!("Failed to open data dir {}", data_dir.display()))?;
        Ok(Self { storage })
    }

    pub fn is_initialized(&self) -> bool {
        self.storage.has_snapshot(STATE_SNAPSHOT)
    }

    pub fn load(&self) -> Result<Ledger> {
        if !self.is_initialized() {
            bail!(
                "No treasury in {}; run `wardenctl init` first",
                self.storage.data_dir().display()
            );
        }
        let state: TreasuryState = self
            .storage
            .load_snapshot(STATE_SNAPSHOT)
            .context("Failed to load treasury snapshot")?;
        Ok(Ledger::new(state))
    }

    pub fn save(&self, state: &TreasuryState) -> Result<()> {
        self.storage
            .save_snapshot(STATE_SNAPSHOT, state)
            .context("Failed to save treasury snapshot")
    }

    fn record<T>(&self, command: &str, receipt: &Receipt<T>) -> Result<()> {
        let entry = JournalEntry {
            command: command.to_string(),
            committed_at: receipt.committed_at,
            recorded_at: Utc::now(),
            changes: receipt.changes.clone(),
        };
        self.storage
            .append_record(JOURNAL, &entry)
            .context("Failed to append journal entry")
    }

    pub fn history(&self, limit: usize) -> Result<Vec<JournalEntry>> {
        let mut entries: Vec<JournalEntry> = self
            .storage
            .read_records(JOURNAL)
            .context("Failed to read journal")?;
        let skip = entries.len().saturating_sub(limit);
        Ok(entries.split_off(skip))
    }

    /// Run one transaction and persist it if it commits.
    pub fn transact<T, F>(&self, command: &str, now: Timestamp, f: F) -> Result<Receipt<T>>
    where
        F: for<'tx> FnOnce(&mut Session<'tx>) -> warden_core::Result<T>,
    {
        let ledger = self.load()?;
        let receipt = ledger
            .transact(now, f)
            .with_context(|| format!("{} failed", command))?;
        self.save(&ledger.into_state())?;
        self.record(command, &receipt)?;
        info!("{} committed at {} ({} changes)", command, now, receipt.changes.len());
        Ok(receipt)
    }
}

#[derive(Debug, Serialize)]
pub struct ProposalSummary {
    pub name: String,
    pub proposer: Member,
    pub kind: Option<String>,
    pub approvals: Vec<Member>,
    pub stale: bool,
}

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub clock: Timestamp,
    pub members: Vec<Member>,
    pub threshold: u64,
    pub config_version: u64,
    pub approval_policy: ApprovalPolicy,
    pub proposals: Vec<ProposalSummary>,
    pub buckets: Vec<(String, u64)>,
    pub accounts: Vec<(Address, u64)>,
    pub metadata: CoinMetadata,
    pub airdrop_unclaimed: u64,
    pub vesting_grants: usize,
    pub vesting_locked: u64,
    pub staking: Option<PoolStats>,
    pub stake_positions: usize,
    pub total_supply: u64,
}

impl StatusReport {
    pub fn from_state(state: &TreasuryState) -> warden_core::Result<Self> {
        let config = state.config();
        Ok(Self {
            clock: state.clock(),
            members: config.members().cloned().collect(),
            threshold: config.threshold(),
            config_version: config.version(),
            approval_policy: state.proposals().policy(),
            proposals: state
                .proposals()
                .iter()
                .map(|p| ProposalSummary {
                    name: p.name.clone(),
                    proposer: p.proposer.clone(),
                    kind: p.kind().ok().map(|k| k.to_string()),
                    approvals: p.approvals.iter().cloned().collect(),
                    stale: p.is_stale(config),
                })
                .collect(),
            buckets: state.vault().buckets().map(|(k, v)| (k.clone(), *v)).collect(),
            accounts: state.vault().accounts().map(|(k, v)| (k.clone(), *v)).collect(),
            metadata: state.metadata().clone(),
            airdrop_unclaimed: state.airdrops().unclaimed()?,
            vesting_grants: state.vesting().len(),
            vesting_locked: state.vesting().locked()?,
            staking: state.staking().map(|book| book.pool().stats()),
            stake_positions: state.staking().map(|book| book.position_count()).unwrap_or(0),
            total_supply: state.total_supply()?,
        })
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Run `command` at time `now`. Returns the JSON to print.
pub fn dispatch(config: &Config, command: Command, now: Timestamp) -> Result<String> {
    let ws = Workspace::open(&config.data_dir)?;

    match command {
        Command::Init { force } => {
            if ws.is_initialized() && !force {
                bail!(
                    "Treasury already initialized in {} (use --force to replace it)",
                    config.data_dir.display()
                );
            }
            let state = TreasuryState::from_genesis(config.genesis()?)
                .context("Invalid genesis parameters")?;
            ws.save(&state)?;
            info!("initialized treasury in {}", config.data_dir.display());
            to_json(&StatusReport::from_state(&state)?)
        }

        Command::Propose {
            name,
            proposer,
            kind,
        } => {
            let payload = kind.into_payload();
            let proposer = Member::from(proposer);
            to_json(&ws.transact("propose", now, |s| s.propose(&name, &proposer, &payload))?)
        }

        Command::Approve { name, member } => {
            let member = Member::from(member);
            to_json(&ws.transact("approve", now, |s| s.approve(&name, &member))?)
        }

        Command::RemoveApproval { name, member } => {
            let member = Member::from(member);
            to_json(&ws.transact("remove-approval", now, |s| s.remove_approval(&name, &member))?)
        }

        Command::Execute { name, drops } => {
            if drops.len() > MAX_DROPS_PER_REQUEST {
                bail!(
                    "{} airdrop entries given; one request takes at most {}, split them over several proposals",
                    drops.len(),
                    MAX_DROPS_PER_REQUEST
                );
            }
            let drops: Vec<(Address, u64)> = drops
                .into_iter()
                .map(|(address, amount)| (Address::from(address), amount))
                .collect();
            to_json(&ws.transact("execute", now, |s| s.execute_and_apply(&name, &drops))?)
        }

        Command::Delete { name } => to_json(&ws.transact("delete", now, |s| s.delete(&name))?),

        Command::Clean => to_json(&ws.transact("clean", now, |s| Ok(s.clean()))?),

        Command::Stake {
            owner,
            amount,
            lock_ms,
        } => {
            let owner = Address::from(owner);
            to_json(&ws.transact("stake", now, |s| s.stake(&owner, amount, lock_ms))?)
        }

        Command::Claim { position, owner } => {
            let owner = Address::from(owner);
            to_json(&ws.transact("claim", now, |s| s.claim(position, &owner))?)
        }

        Command::Unstake { position, owner } => {
            let owner = Address::from(owner);
            to_json(&ws.transact("unstake", now, |s| s.unstake(position, &owner))?)
        }

        Command::ClaimAirdrop { recipient } => {
            let recipient = Address::from(recipient);
            to_json(&ws.transact("claim-airdrop", now, |s| s.claim_airdrop(&recipient))?)
        }

        Command::Unlock {
            grant,
            beneficiary,
            amount,
        } => {
            let beneficiary = Address::from(beneficiary);
            to_json(&ws.transact("unlock", now, |s| {
                s.unlock_vesting(grant, &beneficiary, amount)
            })?)
        }

        Command::Rewards { position } => {
            let ledger = ws.load()?;
            let pending = ledger.view(|state| match state.staking() {
                Some(book) => book.pending_rewards(position, now),
                None => Err(warden_core::WardenError::NotFound(
                    "staking pool (not launched)".to_string(),
                )),
            })?;
            to_json(&serde_json::json!({ "position": position, "pending": pending, "at": now }))
        }

        Command::Status => {
            let ledger = ws.load()?;
            let report = ledger.view(StatusReport::from_state)?;
            to_json(&report)
        }

        Command::History { limit } => to_json(&ws.history(limit)?),
    }
}
