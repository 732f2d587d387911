use std::fmt;

use chrono::{Datelike, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::datetime::boundary_serde;
use crate::recurrence::RecurrenceKind;

const ASSESSMENT_PERIOD_DATE_FORMAT: &str = "%Y-%m-%d";

const START_SHORT: &str = "%-d";
const START_MIDDLE: &str = "%-d %B";
const START_LONG: &str = "%-d %B %Y";
const END_LONG: &str = "%-d %B %Y";

/// A closed calendar interval `[start, end]` in local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    #[serde(with = "boundary_serde")]
    pub start: NaiveDateTime,
    #[serde(with = "boundary_serde")]
    pub end: NaiveDateTime,
    /// Set only for periods generated for periodic assessments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_new_assessments: Option<bool>,
}

impl Period {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        debug_assert!(start <= end, "period start after end");
        Self {
            start,
            end,
            allow_new_assessments: None,
        }
    }

    pub fn contains(&self, instant: NaiveDateTime) -> bool {
        date_belongs_to_period(instant, self)
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&period_to_string(self))
    }
}

/// Periods generated for one (recurrence, count, offset) request, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodsConfig {
    pub recurrence: RecurrenceKind,
    pub periods: Vec<Period>,
}

impl PeriodsConfig {
    /// Earliest start and latest end across all periods.
    pub fn span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let start = self.periods.iter().map(|p| p.start).min()?;
        let end = self.periods.iter().map(|p| p.end).max()?;
        Some((start, end))
    }
}

/// Formats a boundary as the `YYYY-MM-DD` key assessments are stored under.
pub fn format_period_boundary(boundary: NaiveDateTime) -> String {
    boundary.format(ASSESSMENT_PERIOD_DATE_FORMAT).to_string()
}

/// True when `instant` is on the start day of `period`, or strictly
/// between its start and end.
///
/// The start check is at day granularity while the end check compares raw
/// instants, so an instant equal to `period.end` is outside the period.
pub fn date_belongs_to_period(instant: NaiveDateTime, period: &Period) -> bool {
    instant.date() == period.start.date() || (instant > period.start && instant < period.end)
}

/// Human-readable label such as `9 December - 22 December 2019`.
pub fn period_to_string(period: &Period) -> String {
    if period.start.date() == period.end.date() {
        return period.end.format(END_LONG).to_string();
    }

    let start_format = if period.start.year() != period.end.year() {
        START_LONG
    } else if period.start.month() != period.end.month() {
        START_MIDDLE
    } else {
        START_SHORT
    };

    format!(
        "{} - {}",
        period.start.format(start_format),
        period.end.format(END_LONG)
    )
}
