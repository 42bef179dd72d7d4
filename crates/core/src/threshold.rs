//! Delay-buffer threshold optimization.
//!
//! For a candidate buffer τ (minutes) every chained record falls in at most
//! one bucket:
//!
//! - **missed**: `delay > τ`; the buffer would not have absorbed the delay
//!   and the next rental is lost anyway;
//! - **cancelled**: `next_gap < τ` and `delay < τ`; the buffer blocked the
//!   next rental although the return would not have collided with it.
//!
//! A delay equal to τ is absorbed; a gap equal to τ fits the buffer.
//! Records with no following rental never contribute.
//!
//! [`optimize`] sorts `delay` and `max(delay, gap)` once and answers every
//! candidate with two binary searches. [`classify`] and [`evaluate`] are the
//! direct per-record definition.

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::delay::{DelayFilter, DelayRecord};
use crate::error::{from_validation_errors, out_of_range, CoreError};

/// Upper bound on the number of candidates one search may evaluate.
pub const MAX_CANDIDATES: usize = 10_000;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
pub struct CostConfig {
    /// Cost of a rental lost to a delay the buffer did not absorb.
    #[validate(range(min = 0.0, message = "cost per missed rental must not be negative"))]
    pub cost_per_missed_rental: f64,
    /// Cost of blocking a rental that would not have collided.
    #[validate(range(min = 0.0, message = "cost per late cancellation must not be negative"))]
    pub cost_per_late_cancellation: f64,
}

impl CostConfig {
    pub fn checked(self) -> Result<Self, CoreError> {
        if !self.cost_per_missed_rental.is_finite() {
            return Err(out_of_range("cost_per_missed_rental", "must be a finite number"));
        }
        if !self.cost_per_late_cancellation.is_finite() {
            return Err(out_of_range("cost_per_late_cancellation", "must be a finite number"));
        }
        self.validate().map_err(from_validation_errors)?;
        Ok(self)
    }
}

/// Candidate thresholds `min_minutes..=max_minutes` stepped by `step_minutes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct ThresholdSearch {
    pub min_minutes: u32,
    pub max_minutes: u32,
    #[validate(range(min = 1, message = "step must be at least 1 minute"))]
    pub step_minutes: u32,
}

impl Default for ThresholdSearch {
    fn default() -> Self {
        Self {
            min_minutes: 0,
            max_minutes: 180,
            step_minutes: 15,
        }
    }
}

impl ThresholdSearch {
    pub fn checked(self) -> Result<Self, CoreError> {
        self.validate().map_err(from_validation_errors)?;
        if self.max_minutes < self.min_minutes {
            return Err(out_of_range(
                "max_minutes",
                format!(
                    "max_minutes ({}) must not be below min_minutes ({})",
                    self.max_minutes, self.min_minutes
                ),
            ));
        }
        let count = self.candidate_count();
        if count > MAX_CANDIDATES {
            return Err(out_of_range(
                "step_minutes",
                format!("search would evaluate {count} thresholds, the limit is {MAX_CANDIDATES}"),
            ));
        }
        Ok(self)
    }

    pub fn candidate_count(&self) -> usize {
        if self.max_minutes < self.min_minutes || self.step_minutes == 0 {
            return 0;
        }
        ((self.max_minutes - self.min_minutes) / self.step_minutes) as usize + 1
    }

    pub fn candidates(&self) -> impl Iterator<Item = u32> {
        let step = self.step_minutes.max(1) as usize;
        (self.min_minutes..=self.max_minutes).step_by(step)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostPoint {
    pub threshold_minutes: u32,
    pub missed_rentals: usize,
    pub cancelled_rentals: usize,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdResult {
    pub threshold_minutes: u32,
    pub total_cost: f64,
    /// One point per candidate, in ascending threshold order.
    pub curve: Vec<CostPoint>,
    /// Chained records left after filtering.
    pub records_considered: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Missed,
    Cancelled,
    Unaffected,
    /// No following rental, so the buffer is irrelevant.
    NotChained,
}

// ---------------------------------------------------------------------------
// Direct definition
// ---------------------------------------------------------------------------

pub fn classify(record: &DelayRecord, threshold_minutes: u32) -> Outcome {
    let Some(gap) = record.next_gap_minutes() else {
        return Outcome::NotChained;
    };
    let tau = i64::from(threshold_minutes);
    let delay = record.delay_minutes();

    if delay > tau {
        Outcome::Missed
    } else if gap < tau && delay < tau {
        Outcome::Cancelled
    } else {
        Outcome::Unaffected
    }
}

/// Cost of one threshold, counted record by record.
pub fn evaluate<'a>(
    records: impl IntoIterator<Item = &'a DelayRecord>,
    threshold_minutes: u32,
    cost: &CostConfig,
) -> CostPoint {
    let mut missed = 0;
    let mut cancelled = 0;
    for record in records {
        match classify(record, threshold_minutes) {
            Outcome::Missed => missed += 1,
            Outcome::Cancelled => cancelled += 1,
            Outcome::Unaffected | Outcome::NotChained => {}
        }
    }
    point(threshold_minutes, missed, cancelled, cost)
}

fn point(threshold_minutes: u32, missed: usize, cancelled: usize, cost: &CostConfig) -> CostPoint {
    CostPoint {
        threshold_minutes,
        missed_rentals: missed,
        cancelled_rentals: cancelled,
        cost: missed as f64 * cost.cost_per_missed_rental
            + cancelled as f64 * cost.cost_per_late_cancellation,
    }
}

// ---------------------------------------------------------------------------
// Sweep
// ---------------------------------------------------------------------------

/// Find the threshold with the lowest total cost.
///
/// Ties resolve to the smallest threshold. Fails with
/// [`CoreError::InsufficientData`] when there are no records, or none left
/// with a following rental after `filter`.
pub fn optimize(
    records: &[DelayRecord],
    filter: &DelayFilter,
    cost: &CostConfig,
    search: &ThresholdSearch,
) -> Result<ThresholdResult, CoreError> {
    let cost = cost.checked()?;
    let search = search.checked()?;

    if records.is_empty() {
        return Err(CoreError::InsufficientData("no delay records supplied".into()));
    }

    // (delay, gap) of every chained record that passes the filter.
    let chained: Vec<(i64, i64)> = records
        .iter()
        .filter(|r| filter.matches(r))
        .filter_map(|r| r.next_gap_minutes().map(|gap| (r.delay_minutes(), gap)))
        .collect();
    if chained.is_empty() {
        return Err(CoreError::InsufficientData(format!(
            "none of the {} records has a following rental after filtering",
            records.len()
        )));
    }

    let mut delays: Vec<i64> = chained.iter().map(|(d, _)| *d).collect();
    delays.sort_unstable();
    // A record is cancelled at τ exactly when max(delay, gap) < τ.
    let mut cancel_keys: Vec<i64> = chained.iter().map(|(d, g)| (*d).max(*g)).collect();
    cancel_keys.sort_unstable();

    let n = delays.len();
    let curve: Vec<CostPoint> = search
        .candidates()
        .map(|threshold| {
            let tau = i64::from(threshold);
            let missed = n - delays.partition_point(|d| *d <= tau);
            let cancelled = cancel_keys.partition_point(|k| *k < tau);
            point(threshold, missed, cancelled, &cost)
        })
        .collect();

    let best = curve
        .iter()
        .fold(None::<&CostPoint>, |best, p| match best {
            Some(b) if b.cost <= p.cost => Some(b),
            _ => Some(p),
        })
        .ok_or_else(|| CoreError::Internal("threshold search produced no candidates".into()))?;

    Ok(ThresholdResult {
        threshold_minutes: best.threshold_minutes,
        total_cost: best.cost,
        records_considered: n,
        curve,
    })
}
