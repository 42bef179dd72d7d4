//! Historical rental-delay records and the descriptive KPIs built on them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{out_of_range, CoreError};
use crate::types::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckinType {
    Mobile,
    Connect,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RentalState {
    #[default]
    Ended,
    Canceled,
}

/// One completed (or cancelled) rental and, if any, the rental after it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DelayRecord {
    pub scheduled_end: Timestamp,
    pub actual_return: Timestamp,
    #[serde(default)]
    pub next_scheduled_start: Option<Timestamp>,
    #[serde(default)]
    pub checkin_type: Option<CheckinType>,
    #[serde(default)]
    pub state: RentalState,
}

impl DelayRecord {
    /// Build a record from minute offsets relative to `scheduled_end`.
    pub fn from_minutes(
        scheduled_end: Timestamp,
        delay_minutes: i64,
        next_gap_minutes: Option<i64>,
    ) -> Self {
        Self {
            scheduled_end,
            actual_return: scheduled_end + chrono::Duration::minutes(delay_minutes),
            next_scheduled_start: next_gap_minutes
                .map(|g| scheduled_end + chrono::Duration::minutes(g)),
            checkin_type: None,
            state: RentalState::Ended,
        }
    }

    pub fn with_checkin(mut self, checkin_type: CheckinType) -> Self {
        self.checkin_type = Some(checkin_type);
        self
    }

    pub fn with_state(mut self, state: RentalState) -> Self {
        self.state = state;
        self
    }

    /// Minutes between scheduled end and actual return. Negative when early.
    pub fn delay_minutes(&self) -> i64 {
        (self.actual_return - self.scheduled_end).num_minutes()
    }

    /// Minutes between scheduled end and the next rental's scheduled start.
    pub fn next_gap_minutes(&self) -> Option<i64> {
        self.next_scheduled_start
            .map(|next| (next - self.scheduled_end).num_minutes())
    }

    /// Whether another rental follows this one.
    pub fn is_chained(&self) -> bool {
        self.next_scheduled_start.is_some()
    }

    pub fn is_late(&self) -> bool {
        self.delay_minutes() > 0
    }
}

// ---------------------------------------------------------------------------
// Filtering
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckinScope {
    #[default]
    All,
    ConnectOnly,
}

/// Which records an analysis looks at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DelayFilter {
    pub ended_only: bool,
    pub scope: CheckinScope,
}

impl Default for DelayFilter {
    fn default() -> Self {
        Self {
            ended_only: true,
            scope: CheckinScope::All,
        }
    }
}

impl DelayFilter {
    pub fn matches(&self, record: &DelayRecord) -> bool {
        if self.ended_only && record.state != RentalState::Ended {
            return false;
        }
        match self.scope {
            CheckinScope::All => true,
            CheckinScope::ConnectOnly => record.checkin_type == Some(CheckinType::Connect),
        }
    }

    pub fn apply<'a>(&self, records: &'a [DelayRecord]) -> Vec<&'a DelayRecord> {
        records.iter().filter(|r| self.matches(r)).collect()
    }
}

// ---------------------------------------------------------------------------
// Single-threshold impact
// ---------------------------------------------------------------------------

/// What a given buffer would have meant for the selected records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdImpact {
    pub threshold_minutes: u32,
    pub records_considered: usize,
    pub chained_rentals: usize,
    /// Records returned after their scheduled end.
    pub late_returns: usize,
    /// Late returns whose delay fits inside the buffer.
    pub covered_late_returns: usize,
    /// `covered_late_returns / late_returns`, 0 when nothing was late.
    pub coverage_share: f64,
    /// Chained rentals whose next start falls inside the buffer.
    pub blocked_rentals: usize,
    /// `blocked_rentals / chained_rentals`, 0 when nothing is chained.
    pub blocked_share: f64,
    /// Late returns whose next start falls inside the buffer.
    pub late_returns_affecting_next: usize,
}

pub fn impact(
    records: &[DelayRecord],
    filter: &DelayFilter,
    threshold_minutes: u32,
) -> ThresholdImpact {
    let tau = i64::from(threshold_minutes);
    let selected = filter.apply(records);

    let mut chained = 0;
    let mut late = 0;
    let mut covered = 0;
    let mut blocked = 0;
    let mut late_affecting_next = 0;

    for record in &selected {
        let delay = record.delay_minutes();
        let inside_buffer = record.next_gap_minutes().is_some_and(|gap| gap < tau);

        if record.is_chained() {
            chained += 1;
        }
        if inside_buffer {
            blocked += 1;
        }
        if delay > 0 {
            late += 1;
            if delay <= tau {
                covered += 1;
            }
            if inside_buffer {
                late_affecting_next += 1;
            }
        }
    }

    ThresholdImpact {
        threshold_minutes,
        records_considered: selected.len(),
        chained_rentals: chained,
        late_returns: late,
        covered_late_returns: covered,
        coverage_share: share(covered, late),
        blocked_rentals: blocked,
        blocked_share: share(blocked, chained),
        late_returns_affecting_next: late_affecting_next,
    }
}

fn share(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Half-open bucket `[lower_minutes, upper_minutes)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistogramBin {
    pub lower_minutes: i64,
    pub upper_minutes: i64,
    pub count: usize,
}

/// Bucket the positive delays of the selected records. Empty bins are
/// omitted; bins are ordered by lower bound.
pub fn delay_histogram(
    records: &[DelayRecord],
    filter: &DelayFilter,
    bin_width_minutes: u32,
) -> Result<Vec<HistogramBin>, CoreError> {
    if bin_width_minutes == 0 {
        return Err(out_of_range("bin_width_minutes", "bin width must be at least 1 minute"));
    }
    let width = i64::from(bin_width_minutes);

    let mut counts: BTreeMap<i64, usize> = BTreeMap::new();
    for record in filter.apply(records) {
        let delay = record.delay_minutes();
        if delay > 0 {
            *counts.entry(delay / width * width).or_default() += 1;
        }
    }

    Ok(counts
        .into_iter()
        .map(|(lower, count)| HistogramBin {
            lower_minutes: lower,
            upper_minutes: lower + width,
            count,
        })
        .collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use assert_matches::assert_matches;
    use chrono::TimeZone;

    use super::*;

    pub(crate) fn base_time() -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    pub(crate) fn record(delay: i64, gap: Option<i64>) -> DelayRecord {
        DelayRecord::from_minutes(base_time(), delay, gap)
    }

    #[test]
    fn derived_minutes() {
        let r = record(-15, Some(90));
        assert_eq!(r.delay_minutes(), -15);
        assert_eq!(r.next_gap_minutes(), Some(90));
        assert!(r.is_chained());
        assert!(!r.is_late());

        let alone = record(30, None);
        assert_eq!(alone.next_gap_minutes(), None);
        assert!(!alone.is_chained());
        assert!(alone.is_late());
    }

    #[test]
    fn deserializes_with_defaults() {
        let json = serde_json::json!({
            "scheduled_end": "2024-05-01T12:00:00Z",
            "actual_return": "2024-05-01T12:45:00Z"
        });
        let r: DelayRecord = serde_json::from_value(json).unwrap();
        assert_eq!(r.delay_minutes(), 45);
        assert_eq!(r.state, RentalState::Ended);
        assert_eq!(r.checkin_type, None);
        assert!(!r.is_chained());
    }

    #[test]
    fn filter_by_state_and_scope() {
        let records = vec![
            record(10, Some(60)).with_checkin(CheckinType::Connect),
            record(10, Some(60)).with_checkin(CheckinType::Mobile),
            record(10, Some(60))
                .with_checkin(CheckinType::Connect)
                .with_state(RentalState::Canceled),
            record(10, Some(60)),
        ];
        assert_eq!(DelayFilter::default().apply(&records).len(), 3);

        let connect = DelayFilter {
            ended_only: true,
            scope: CheckinScope::ConnectOnly,
        };
        assert_eq!(connect.apply(&records).len(), 1);

        let everything = DelayFilter {
            ended_only: false,
            scope: CheckinScope::All,
        };
        assert_eq!(everything.apply(&records).len(), 4);
    }

    #[test]
    fn impact_kpis() {
        let records = vec![
            record(10, Some(5)),
            record(0, Some(30)),
            record(20, Some(15)),
            record(90, None),
            record(-5, Some(200)),
        ];
        let kpi = impact(&records, &DelayFilter::default(), 20);
        assert_eq!(kpi.records_considered, 5);
        assert_eq!(kpi.chained_rentals, 4);
        assert_eq!(kpi.late_returns, 3);
        assert_eq!(kpi.covered_late_returns, 2);
        assert!((kpi.coverage_share - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(kpi.blocked_rentals, 2);
        assert!((kpi.blocked_share - 0.5).abs() < 1e-12);
        assert_eq!(kpi.late_returns_affecting_next, 2);
    }

    #[test]
    fn impact_on_nothing_is_all_zero() {
        let kpi = impact(&[], &DelayFilter::default(), 60);
        assert_eq!(kpi.records_considered, 0);
        assert_eq!(kpi.coverage_share, 0.0);
        assert_eq!(kpi.blocked_share, 0.0);
    }

    #[test]
    fn histogram_buckets_positive_delays() {
        let records: Vec<DelayRecord> = [-3, 0, 1, 14, 15, 47]
            .into_iter()
            .map(|delay| record(delay, None))
            .collect();
        let bins = delay_histogram(&records, &DelayFilter::default(), 15).unwrap();
        assert_eq!(
            bins,
            vec![
                HistogramBin { lower_minutes: 0, upper_minutes: 15, count: 2 },
                HistogramBin { lower_minutes: 15, upper_minutes: 30, count: 1 },
                HistogramBin { lower_minutes: 45, upper_minutes: 60, count: 1 },
            ]
        );
    }

    #[test]
    fn histogram_rejects_zero_width() {
        assert_matches!(
            delay_histogram(&[], &DelayFilter::default(), 0),
            Err(CoreError::Validation(v)) if v.field == "bin_width_minutes"
        );
    }
}
