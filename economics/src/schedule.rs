//! Weekly emission schedule

use serde::{Deserialize, Serialize};

use crate::constants::{SCHEDULE_WEEKS, WEEK};
use warden_core::{to_u64, Result, Timestamp, WardenError};

/// Pre-committed per-week token release, fixed once created.
///
/// Deserialization goes through [`EmissionSchedule::new`], so a stored
/// schedule with the wrong number of buckets is rejected on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "StoredSchedule")]
pub struct EmissionSchedule {
    emissions: Vec<u64>,
    start: Timestamp,
}

#[derive(Deserialize)]
struct StoredSchedule {
    emissions: Vec<u64>,
    start: Timestamp,
}

impl TryFrom<StoredSchedule> for EmissionSchedule {
    type Error = WardenError;

    fn try_from(stored: StoredSchedule) -> Result<Self> {
        EmissionSchedule::new(stored.emissions, stored.start)
    }
}

impl EmissionSchedule {
    pub fn new(emissions: Vec<u64>, start: Timestamp) -> Result<Self> {
        if emissions.len() != SCHEDULE_WEEKS {
            return Err(WardenError::InvalidPayload(format!(
                "emission schedule needs {} weekly buckets, got {}",
                SCHEDULE_WEEKS,
                emissions.len()
            )));
        }
        Ok(Self { emissions, start })
    }

    /// Same amount released every week.
    pub fn uniform(per_week: u64, start: Timestamp) -> Self {
        Self {
            emissions: vec![per_week; SCHEDULE_WEEKS],
            start,
        }
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn emissions(&self) -> &[u64] {
        &self.emissions
    }

    /// Everything the schedule will ever release.
    pub fn total(&self) -> Result<u64> {
        to_u64(self.emissions.iter().map(|e| *e as u128).sum())
    }

    /// Total emission over `(last_updated, now]`.
    ///
    /// Each bucket is walked from the last update's week to the current
    /// week: the current week contributes its elapsed fraction, the last
    /// update's week gives back the fraction already counted, every week
    /// before the current one contributes in full. Fractions are floored on
    /// the same cumulative curve, so consecutive intervals add up exactly.
    /// Both week indices clamp to the final bucket, after which nothing more
    /// accrues.
    pub fn emitted(&self, last_updated: Timestamp, now: Timestamp) -> Result<u64> {
        if now < last_updated {
            return Err(WardenError::StaleClock { now, last_updated });
        }
        let last = last_updated.max(self.start) - self.start;
        let current = now.max(self.start) - self.start;

        let last_week = week_index(last);
        let current_week = week_index(current);

        let mut total: u128 = 0;
        for week in last_week..=current_week {
            let full = match self.emissions.get(week) {
                Some(amount) => *amount as u128,
                None => {
                    return Err(WardenError::InvalidPayload(format!(
                        "no emission bucket for week {}",
                        week
                    )))
                }
            };
            let mut add = 0u128;
            let mut sub = 0u128;

            if week == current_week {
                add += partial(full, current, week);
            } else {
                add += full;
            }
            if week == last_week {
                sub = partial(full, last, week);
            }

            total = total
                .checked_add(add)
                .and_then(|t| t.checked_sub(sub))
                .ok_or(WardenError::Overflow)?;
        }
        to_u64(total)
    }
}

fn week_index(elapsed: u64) -> usize {
    ((elapsed / WEEK) as usize).min(SCHEDULE_WEEKS - 1)
}

/// Share of bucket `week` released by `elapsed` ms after start.
fn partial(amount: u128, elapsed: u64, week: usize) -> u128 {
    let into_week = elapsed
        .saturating_sub(week as u64 * WEEK)
        .min(WEEK);
    amount * into_week as u128 / WEEK as u128
}
