//! Typed proposal payloads
//!
//! Proposals are stored with their payload encoded, and decoded back into
//! this closed enum when an execution request is opened. Dispatch on the
//! decoded value is an exhaustive `match`, never a string lookup.

use serde::{Deserialize, Serialize};
use std::fmt;

use warden_core::{Address, Member, Result, WardenError, SCHEDULE_WEEKS};

/// Change the member set and threshold of the multisig itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModifyConfig {
    /// `true` unions `addresses` into the members, `false` removes them
    pub add: bool,
    pub new_threshold: u64,
    pub addresses: Vec<Member>,
}

/// Pay `amount` out of a stakeholder bucket of the vault.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferFunds {
    pub stakeholder: String,
    pub amount: u64,
    pub recipient: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataUpdate {
    pub name: String,
    pub symbol: String,
    pub description: String,
    pub icon_url: String,
}

/// Open an airdrop funded from `stakeholder`. Individual drops are added
/// while the request is open.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AirdropBatch {
    pub stakeholder: String,
}

/// Lock `amounts[i]` for `recipients[i]`, vesting linearly over `duration_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VestingPlan {
    pub stakeholder: String,
    pub recipients: Vec<Address>,
    pub amounts: Vec<u64>,
    pub duration_ms: u64,
}

/// Anchor the weekly emission curve at execution time and open staking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakingLaunch {
    pub emissions: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Payload {
    Modify(ModifyConfig),
    Transfer(TransferFunds),
    UpdateMetadata(MetadataUpdate),
    Airdrop(AirdropBatch),
    Vesting(VestingPlan),
    LaunchStaking(StakingLaunch),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadKind {
    Modify,
    Transfer,
    UpdateMetadata,
    Airdrop,
    Vesting,
    LaunchStaking,
}

impl fmt::Display for PayloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PayloadKind::Modify => "modify",
            PayloadKind::Transfer => "transfer",
            PayloadKind::UpdateMetadata => "update_metadata",
            PayloadKind::Airdrop => "airdrop",
            PayloadKind::Vesting => "vesting",
            PayloadKind::LaunchStaking => "launch_staking",
        };
        f.write_str(name)
    }
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Modify(_) => PayloadKind::Modify,
            Payload::Transfer(_) => PayloadKind::Transfer,
            Payload::UpdateMetadata(_) => PayloadKind::UpdateMetadata,
            Payload::Airdrop(_) => PayloadKind::Airdrop,
            Payload::Vesting(_) => PayloadKind::Vesting,
            Payload::LaunchStaking(_) => PayloadKind::LaunchStaking,
        }
    }

    /// Shape checks that do not depend on any store state.
    ///
    /// Threshold and balance checks happen at completion time, against the
    /// state that is current then.
    pub fn validate(&self) -> Result<()> {
        match self {
            Payload::Modify(_) | Payload::UpdateMetadata(_) => Ok(()),
            Payload::Transfer(t) => {
                require_stakeholder(&t.stakeholder)?;
                if t.amount == 0 {
                    return Err(invalid("transfer amount must be positive"));
                }
                Ok(())
            }
            Payload::Airdrop(a) => require_stakeholder(&a.stakeholder),
            Payload::Vesting(v) => {
                require_stakeholder(&v.stakeholder)?;
                if v.recipients.is_empty() {
                    return Err(invalid("vesting plan has no recipients"));
                }
                if v.recipients.len() != v.amounts.len() {
                    return Err(invalid(format!(
                        "vesting plan has {} recipients but {} amounts",
                        v.recipients.len(),
                        v.amounts.len()
                    )));
                }
                if v.amounts.iter().any(|a| *a == 0) {
                    return Err(invalid("vesting amounts must be positive"));
                }
                Ok(())
            }
            Payload::LaunchStaking(l) => {
                if l.emissions.len() != SCHEDULE_WEEKS {
                    return Err(invalid(format!(
                        "emission schedule needs {} weekly buckets, got {}",
                        SCHEDULE_WEEKS,
                        l.emissions.len()
                    )));
                }
                Ok(())
            }
        }
    }

    /// Encode to the JSON text a proposal stores.
    pub fn encode(&self) -> Result<String> {
        serde_json::to_string(self).map_err(|e| invalid(e.to_string()))
    }

    /// Decode and validate a stored payload.
    pub fn decode(encoded: &str) -> Result<Payload> {
        let payload: Payload =
            serde_json::from_str(encoded).map_err(|e| invalid(e.to_string()))?;
        payload.validate()?;
        Ok(payload)
    }
}

fn require_stakeholder(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(invalid("stakeholder name is empty"));
    }
    Ok(())
}

fn invalid(msg: impl Into<String>) -> WardenError {
    WardenError::InvalidPayload(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encoded_payload_is_tagged() {
        let payload = Payload::Transfer(TransferFunds {
            stakeholder: "public_sale".to_string(),
            amount: 10,
            recipient: Address::from("0xdc2d"),
        });
        let encoded = payload.encode().unwrap();
        let value: serde_json::Value = serde_json::from_str(&encoded).unwrap();
        assert_eq!(value["kind"], "transfer");
        assert_eq!(Payload::decode(&encoded).unwrap(), payload);
    }

    #[test]
    fn test_unknown_kind_is_invalid() {
        let err = Payload::decode(&json!({ "kind": "mint", "amount": 5 }).to_string()).unwrap_err();
        assert!(matches!(err, WardenError::InvalidPayload(_)));
    }

    #[test]
    fn test_vesting_lengths_must_match() {
        let payload = Payload::Vesting(VestingPlan {
            stakeholder: "team".to_string(),
            recipients: vec![Address::from("a"), Address::from("b")],
            amounts: vec![1],
            duration_ms: 0,
        });
        assert!(matches!(
            payload.validate(),
            Err(WardenError::InvalidPayload(_))
        ));
    }

    #[test]
    fn test_zero_transfer_is_invalid() {
        let payload = Payload::Transfer(TransferFunds {
            stakeholder: "team".to_string(),
            amount: 0,
            recipient: Address::from("a"),
        });
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_launch_needs_every_week() {
        let launch = |weeks: usize| {
            Payload::LaunchStaking(StakingLaunch {
                emissions: vec![100; weeks],
            })
        };
        assert!(launch(SCHEDULE_WEEKS).validate().is_ok());
        for weeks in [0, SCHEDULE_WEEKS - 1, SCHEDULE_WEEKS + 1] {
            assert!(matches!(
                launch(weeks).validate(),
                Err(WardenError::InvalidPayload(_))
            ));
        }
    }

    #[test]
    fn test_kind_display_matches_serde_tag() {
        let payload = Payload::UpdateMetadata(MetadataUpdate {
            name: "n".to_string(),
            symbol: "s".to_string(),
            description: "d".to_string(),
            icon_url: "u".to_string(),
        });
        let value: serde_json::Value = serde_json::from_str(&payload.encode().unwrap()).unwrap();
        assert_eq!(value["kind"], payload.kind().to_string());
    }
}
