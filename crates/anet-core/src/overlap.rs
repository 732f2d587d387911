//! Conflict checks for tenure histories (who held which position when).

use serde::{Deserialize, Serialize};

/// A tenure interval in epoch milliseconds. A missing end means the tenure
/// is still running.
///
/// Only an absent `end_time` is open-ended: `Some(0)` is the Unix epoch,
/// not "no end".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenureInterval {
    pub start_time: i64,
    #[serde(default)]
    pub end_time: Option<i64>,
}

impl TenureInterval {
    pub fn new(start_time: i64, end_time: Option<i64>) -> Self {
        Self {
            start_time,
            end_time,
        }
    }

    fn end_or_infinity(&self) -> i128 {
        self.end_time.map_or(i128::MAX, i128::from)
    }

    /// Half-open overlap test.
    pub fn overlaps(&self, other: &Self) -> bool {
        i128::from(self.start_time) < other.end_or_infinity()
            && self.end_or_infinity() > i128::from(other.start_time)
    }
}

/// Every index pair `(i, j)`, `i < j`, whose intervals overlap.
#[tracing::instrument(skip_all, fields(count = intervals.len()))]
pub fn overlapping_period_indexes(intervals: &[TenureInterval]) -> Vec<(usize, usize)> {
    let mut out = Vec::new();
    for (i, first) in intervals.iter().enumerate() {
        for (j, second) in intervals.iter().enumerate().skip(i + 1) {
            if first.overlaps(second) {
                out.push((i, j));
            }
        }
    }
    tracing::debug!(overlaps = out.len(), "checked tenure overlaps");
    out
}

/// Indexes of intervals that end before they start.
pub fn invalid_interval_indexes(intervals: &[TenureInterval]) -> Vec<usize> {
    intervals
        .iter()
        .enumerate()
        .filter(|(_, interval)| i128::from(interval.start_time) > interval.end_or_infinity())
        .map(|(idx, _)| idx)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{TenureInterval, invalid_interval_indexes, overlapping_period_indexes};

    fn closed(start: i64, end: i64) -> TenureInterval {
        TenureInterval::new(start, Some(end))
    }

    #[test]
    fn finds_single_overlap() {
        let intervals = [closed(0, 10), closed(5, 15), closed(20, 30)];
        assert_eq!(overlapping_period_indexes(&intervals), vec![(0, 1)]);
    }

    #[test]
    fn touching_intervals_do_not_overlap() {
        let intervals = [closed(0, 10), closed(10, 20)];
        assert!(overlapping_period_indexes(&intervals).is_empty());
    }

    #[test]
    fn open_ended_tenure_overlaps_everything_after_it() {
        let intervals = [
            TenureInterval::new(100, None),
            closed(0, 50),
            closed(150, 200),
            TenureInterval::new(500, None),
        ];
        assert_eq!(
            overlapping_period_indexes(&intervals),
            vec![(0, 2), (0, 3)]
        );
    }

    #[test]
    fn empty_and_single_inputs_have_no_pairs() {
        assert!(overlapping_period_indexes(&[]).is_empty());
        assert!(overlapping_period_indexes(&[closed(1, 2)]).is_empty());
    }

    #[test]
    fn zero_end_time_is_the_epoch() {
        let intervals = [closed(-10, 0), closed(5, 15)];
        assert!(overlapping_period_indexes(&intervals).is_empty());
        assert_eq!(invalid_interval_indexes(&[closed(5, 0)]), vec![0]);
    }

    #[test]
    fn flags_reversed_intervals() {
        let intervals = [closed(0, 10), closed(30, 20), TenureInterval::new(40, None)];
        assert_eq!(invalid_interval_indexes(&intervals), vec![1]);
    }

    #[test]
    fn deserializes_history_records() {
        let intervals: Vec<TenureInterval> =
            serde_json::from_str(r#"[{"startTime": 1, "endTime": 5}, {"startTime": 3}]"#)
                .expect("parse intervals");
        assert_eq!(
            intervals,
            vec![closed(1, 5), TenureInterval::new(3, None)]
        );
        assert_eq!(overlapping_period_indexes(&intervals), vec![(0, 1)]);
    }
}
