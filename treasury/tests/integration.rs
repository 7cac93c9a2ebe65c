//! Multisig scenarios through the transactional ledger

use std::collections::BTreeMap;

use treasury::*;
use warden_core::{Address, ChangeKind, Entity, Member};
use warden_governance::{ApprovalPolicy, MetadataUpdate, ModifyConfig, Payload, TransferFunds};

fn member(id: &str) -> Member {
    Member::from(id)
}

fn ledger(threshold: u64, policy: ApprovalPolicy) -> Ledger {
    let mut allocations = BTreeMap::new();
    allocations.insert("public_sale".to_string(), 1_000_000);
    allocations.insert("team".to_string(), 500);
    Ledger::from_genesis(Genesis {
        members: vec![member("A"), member("B"), member("C")],
        threshold,
        allocations,
        metadata: CoinMetadata {
            name: "Warden".to_string(),
            symbol: "WRD".to_string(),
            description: "Warden treasury coin".to_string(),
            icon_url: "https://example.invalid/wrd.svg".to_string(),
        },
        approval_policy: policy,
    })
    .unwrap()
}

fn metadata() -> Payload {
    Payload::UpdateMetadata(MetadataUpdate {
        name: "New name".to_string(),
        symbol: "NEW".to_string(),
        description: "New description".to_string(),
        icon_url: "New icon url".to_string(),
    })
}

fn shrink(addresses: &[&str], new_threshold: u64) -> Payload {
    Payload::Modify(ModifyConfig {
        add: false,
        new_threshold,
        addresses: addresses.iter().map(|a| member(a)).collect(),
    })
}

fn propose_approved(ledger: &Ledger, now: u64, name: &str, payload: &Payload, approvers: &[&str]) {
    ledger
        .transact(now, |s| {
            s.propose(name, &member("A"), payload)?;
            for approver in approvers {
                s.approve(name, &member(approver))?;
            }
            Ok(())
        })
        .expect("proposal setup");
}

/// Members {A,B,C}, threshold 2.
#[test]
fn test_threshold_scenario() {
    let ledger = ledger(2, ApprovalPolicy::default());
    propose_approved(&ledger, 1, "x", &metadata(), &["A"]);

    let err = ledger
        .transact(2, |s| s.execute_and_apply("x", &[]))
        .unwrap_err();
    assert_eq!(
        err,
        WardenError::InsufficientApprovals {
            approvals: 1,
            threshold: 2
        }
    );

    ledger.transact(3, |s| s.approve("x", &member("B"))).unwrap();
    let receipt = ledger
        .transact(4, |s| {
            let request = s.execute("x")?;
            let intent = s.start_update_metadata(request)?;
            s.complete_update_metadata(intent)
        })
        .expect("two approvals reach the threshold");

    assert!(ledger.view(|st| !st.proposals().contains("x")));
    assert_eq!(ledger.view(|st| st.metadata().symbol.clone()), "NEW");
    assert!(receipt.changes.iter().any(|c| c.kind == ChangeKind::Deleted
        && c.entity == Entity::Proposal("x".to_string())));
    assert!(receipt
        .changes
        .iter()
        .any(|c| c.entity == Entity::Metadata && c.kind == ChangeKind::Mutated));
}

/// Members {A,B,C}, threshold 3; removing two members would leave one.
#[test]
fn test_self_amendment_guard() {
    let ledger = ledger(3, ApprovalPolicy::default());
    propose_approved(&ledger, 1, "shrink", &shrink(&["B", "C"], 3), &["A", "B", "C"]);
    let before = ledger.snapshot();

    let err = ledger
        .transact(2, |s| {
            let request = s.execute("shrink")?;
            let intent = s.start_modify(request)?;
            s.complete_modify(intent)
        })
        .unwrap_err();

    assert_eq!(err, WardenError::InvalidThreshold { threshold: 3, members: 1 });
    assert_eq!(ledger.snapshot(), before, "config and proposal untouched");
    assert_eq!(ledger.view(|st| st.config().member_count()), 3);
    assert!(ledger.view(|st| st.proposals().contains("shrink")));
}

#[test]
fn test_amendment_applies_and_bumps_version() {
    let ledger = ledger(2, ApprovalPolicy::default());
    propose_approved(&ledger, 1, "drop-c", &shrink(&["C"], 1), &["A", "B"]);

    let receipt = ledger
        .transact(2, |s| s.execute_and_apply("drop-c", &[]))
        .unwrap();
    assert_eq!(receipt.value, Applied::Modify { version: 1, threshold: 1 });

    ledger.view(|st| {
        assert!(!st.config().is_member(&member("C")));
        assert_eq!(st.config().threshold(), 1);
    });
    let err = ledger
        .transact(3, |s| s.propose("y", &member("C"), &metadata()))
        .unwrap_err();
    assert!(matches!(err, WardenError::Unauthorized(_)));
}

#[test]
fn test_config_change_invalidates_pending_approvals() {
    let ledger = ledger(2, ApprovalPolicy::InvalidateOnConfigChange);
    propose_approved(&ledger, 1, "meta", &metadata(), &["A", "B"]);
    propose_approved(&ledger, 1, "drop-c", &shrink(&["C"], 2), &["A", "B"]);
    ledger
        .transact(2, |s| s.execute_and_apply("drop-c", &[]))
        .unwrap();

    let err = ledger
        .transact(3, |s| s.execute_and_apply("meta", &[]))
        .unwrap_err();
    assert!(matches!(err, WardenError::InsufficientApprovals { approvals: 0, .. }));

    let report = ledger.transact(4, |s| Ok(s.clean())).unwrap().value;
    assert_eq!(report.removed, vec!["meta".to_string()]);
    assert!(ledger.view(|st| st.proposals().is_empty()));
}

#[test]
fn test_retained_approvals_survive_config_change() {
    let ledger = ledger(2, ApprovalPolicy::RetainCurrentMembers);
    propose_approved(&ledger, 1, "meta", &metadata(), &["A", "B"]);
    propose_approved(&ledger, 1, "drop-c", &shrink(&["C"], 2), &["A", "B"]);
    ledger
        .transact(2, |s| s.execute_and_apply("drop-c", &[]))
        .unwrap();

    let applied = ledger
        .transact(3, |s| s.execute_and_apply("meta", &[]))
        .unwrap()
        .value;
    assert!(matches!(applied, Applied::UpdateMetadata { .. }));
}

#[test]
fn test_delete_requires_no_approvals() {
    let ledger = ledger(2, ApprovalPolicy::default());
    propose_approved(&ledger, 1, "x", &metadata(), &["B"]);
    let before = ledger.snapshot();

    let err = ledger.transact(2, |s| s.delete("x")).unwrap_err();
    assert_eq!(
        err,
        WardenError::NonEmptyApprovals {
            proposal: "x".to_string(),
            approvals: 1
        }
    );
    assert_eq!(ledger.snapshot(), before);

    ledger
        .transact(3, |s| {
            s.remove_approval("x", &member("B"))?;
            s.delete("x")
        })
        .unwrap();
    assert!(ledger.view(|st| st.proposals().is_empty()));
}

#[test]
fn test_transfer_pays_recipient() {
    let ledger = ledger(1, ApprovalPolicy::default());
    let recipient = Address::from("0xdc2d");
    let payout = Payload::Transfer(TransferFunds {
        stakeholder: "public_sale".to_string(),
        amount: 250_000,
        recipient: recipient.clone(),
    });
    propose_approved(&ledger, 1, "payout", &payout, &["A"]);
    let supply = ledger.view(|st| st.total_supply().unwrap());

    ledger
        .transact(2, |s| {
            let request = s.execute("payout")?;
            let intent = s.start_transfer(request)?;
            s.complete_transfer(intent)
        })
        .unwrap();

    ledger.view(|st| {
        assert_eq!(st.vault().account_balance(&recipient), 250_000);
        assert_eq!(st.vault().bucket_balance("public_sale"), Some(750_000));
        assert_eq!(st.total_supply().unwrap(), supply);
    });
}

#[test]
fn test_short_transfer_cannot_commit_even_if_caught() {
    let ledger = ledger(1, ApprovalPolicy::default());
    let payout = Payload::Transfer(TransferFunds {
        stakeholder: "team".to_string(),
        amount: 501,
        recipient: Address::from("0xdc2d"),
    });
    propose_approved(&ledger, 1, "payout", &payout, &["A"]);
    let before = ledger.snapshot();

    let err = ledger
        .transact(2, |s| {
            let request = s.execute("payout")?;
            let intent = s.start_transfer(request)?;
            let outcome = s.complete_transfer(intent);
            assert_eq!(
                outcome,
                Err(WardenError::InsufficientBalance {
                    requested: 501,
                    available: 500
                })
            );
            Ok(())
        })
        .unwrap_err();

    assert_eq!(err, WardenError::UnsettledRequest(1));
    assert_eq!(ledger.snapshot(), before);
}

#[test]
fn test_start_rejects_other_kind() {
    let ledger = ledger(1, ApprovalPolicy::default());
    propose_approved(&ledger, 1, "meta", &metadata(), &["A"]);

    let err = ledger
        .transact(2, |s| {
            let request = s.execute("meta")?;
            s.start_transfer(request).map(|_| ())
        })
        .unwrap_err();
    assert!(matches!(err, WardenError::InvalidPayload(_)));
    assert!(ledger.view(|st| st.proposals().contains("meta")));
}

#[test]
fn test_delete_then_repropose() {
    let ledger = ledger(2, ApprovalPolicy::default());
    ledger
        .transact(1, |s| {
            s.propose("x", &member("A"), &metadata())?;
            s.delete("x")?;
            s.propose("x", &member("B"), &metadata())
        })
        .unwrap();
    assert_eq!(
        ledger.view(|st| st.proposals().get("x").map(|p| p.proposer.clone())),
        Some(member("B"))
    );
}
