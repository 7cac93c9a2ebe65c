//! Reward accrual scenarios and accounting properties

use economics_props::*;
use proptest::prelude::*;
use warden_core::Address;
use warden_economics::constants::{SCHEDULE_WEEKS, WEEK};
use warden_economics::*;

const START: u64 = 1_717_200_000_000;

mod economics_props {
    use super::*;

    /// One step of a random staking session.
    #[derive(Debug, Clone)]
    pub enum Op {
        Stake { user: usize, amount: u64 },
        Claim { slot: usize },
        Unstake { slot: usize },
    }

    pub fn op() -> impl Strategy<Value = (Op, u64)> {
        let op = prop_oneof![
            (0..3usize, 1..1_000_000u64).prop_map(|(user, amount)| Op::Stake { user, amount }),
            (0..8usize).prop_map(|slot| Op::Claim { slot }),
            (0..8usize).prop_map(|slot| Op::Unstake { slot }),
        ];
        (op, 0..3 * WEEK)
    }

    pub fn emissions() -> impl Strategy<Value = Vec<u64>> {
        prop::collection::vec(0..1_000_000_000_000u64, SCHEDULE_WEEKS)
    }
}

/// All 72 buckets = 100, 1000 units staked from start, claim half a week in.
#[test]
fn test_half_week_emission_scenario() {
    let alice = Address::from("alice");
    let mut book = StakingBook::new(EmissionSchedule::uniform(100, START)).unwrap();
    let id = book.open(&alice, 1_000, 0, START).unwrap();

    let emitted = book
        .pool()
        .schedule()
        .emitted(START, START + WEEK / 2)
        .unwrap();
    assert_eq!(emitted, 50);

    let reward = book.claim(id, &alice, START + WEEK / 2).unwrap();
    assert_eq!(book.pool().index(), 50 * SCALE / 1_000, "index step");
    assert_eq!(reward, 50, "full emission goes to the only staker");
}

#[test]
fn test_late_joiner_earns_only_after_joining() {
    let alice = Address::from("alice");
    let bob = Address::from("bob");
    let mut book = StakingBook::new(EmissionSchedule::uniform(1_000, START)).unwrap();

    let a = book.open(&alice, 100, 0, START).unwrap();
    let b = book.open(&bob, 100, 0, START + WEEK).unwrap();

    assert_eq!(book.claim(b, &bob, START + WEEK).unwrap(), 0);
    assert_eq!(book.claim(a, &alice, START + 2 * WEEK).unwrap(), 1_500);
    assert_eq!(book.claim(b, &bob, START + 2 * WEEK).unwrap(), 500);
}

#[test]
fn test_no_rewards_past_horizon() {
    let alice = Address::from("alice");
    let mut book = StakingBook::new(EmissionSchedule::uniform(10, START)).unwrap();
    let id = book.open(&alice, 1, 0, START).unwrap();

    let horizon = START + SCHEDULE_WEEKS as u64 * WEEK;
    assert_eq!(book.claim(id, &alice, horizon).unwrap(), 720);
    assert_eq!(book.claim(id, &alice, horizon + 52 * WEEK).unwrap(), 0);
}

proptest! {
    #[test]
    fn prop_emission_is_additive(
        emissions in emissions(),
        a in 0..80 * WEEK,
        b in 0..80 * WEEK,
        c in 0..80 * WEEK,
    ) {
        let mut t = [START + a, START + b, START + c];
        t.sort_unstable();
        let schedule = EmissionSchedule::new(emissions, START).unwrap();

        let whole = schedule.emitted(t[0], t[2]).unwrap();
        let split = schedule.emitted(t[0], t[1]).unwrap() + schedule.emitted(t[1], t[2]).unwrap();
        prop_assert_eq!(whole, split);
    }

    #[test]
    fn prop_rewards_never_exceed_emission(
        emissions in emissions(),
        ops in prop::collection::vec(op(), 1..60),
    ) {
        let users = [Address::from("a"), Address::from("b"), Address::from("c")];
        let mut book = StakingBook::new(EmissionSchedule::new(emissions, START).unwrap()).unwrap();
        let mut open: Vec<(u64, usize)> = Vec::new();
        let mut now = START;
        let mut paid: u128 = 0;

        for (op, dt) in ops {
            now += dt;
            match op {
                Op::Stake { user, amount } => {
                    let id = book.open(&users[user], amount, 0, now).unwrap();
                    open.push((id, user));
                }
                Op::Claim { slot } if !open.is_empty() => {
                    let (id, user) = open[slot % open.len()];
                    paid += book.claim(id, &users[user], now).unwrap() as u128;
                }
                Op::Unstake { slot } if !open.is_empty() => {
                    let (id, user) = open.remove(slot % open.len());
                    paid += book.unstake(id, &users[user], now).unwrap().1 as u128;
                }
                _ => {}
            }
        }
        for (id, user) in open {
            paid += book.unstake(id, &users[user], now).unwrap().1 as u128;
        }

        let emitted = book.pool().schedule().emitted(START, now).unwrap() as u128;
        prop_assert!(paid <= emitted, "paid {} > emitted {}", paid, emitted);
        let stats = book.pool().stats();
        prop_assert_eq!(paid, stats.distributed as u128);
        prop_assert_eq!(
            (stats.reserve + stats.distributed) as u128,
            book.pool().schedule().total().unwrap() as u128
        );
    }
}
