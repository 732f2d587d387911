//! Recurring assessment-period calculator.
//!
//! Every period is a run of whole days: it starts at local midnight of its
//! first day and ends at the last millisecond of its last day. Offsets count
//! recurrence units backwards from the reference instant, so `0` is the
//! period containing the reference, `1` the one before it and `-1` the next.

use chrono::{Datelike, Months, NaiveDate, NaiveDateTime, TimeDelta, Weekday};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::config::Settings;
use crate::datetime::{end_of_day, now_in, start_of_day};
use crate::error::PeriodError;
use crate::period::{Period, PeriodsConfig};
use crate::recurrence::RecurrenceKind;

/// First Monday of 2021. Biweekly periods start an even number of weeks
/// away from the week containing this date.
pub const BIWEEKLY_ANCHOR: NaiveDate = match NaiveDate::from_ymd_opt(2021, 1, 4) {
    Some(date) => date,
    None => panic!("invalid biweekly anchor"),
};

const SECOND_HALF_START_DAY: u32 = 15;
const MONTHS_IN_HALF_YEAR: u32 = 6;

/// Week-start convention, fixed once from settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStart {
    /// ISO 8601 weeks.
    #[default]
    Monday,
    Sunday,
}

impl WeekStart {
    pub fn from_iso8601(use_iso8601: bool) -> Self {
        if use_iso8601 {
            WeekStart::Monday
        } else {
            WeekStart::Sunday
        }
    }

    pub fn first_day(&self) -> Weekday {
        match self {
            WeekStart::Monday => Weekday::Mon,
            WeekStart::Sunday => Weekday::Sun,
        }
    }

    /// First day of the week containing `date`.
    pub fn start_of_week(&self, date: NaiveDate) -> Option<NaiveDate> {
        let back = date.weekday().days_since(self.first_day());
        days_before(date, i64::from(back))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct PeriodCalculator {
    week_start: WeekStart,
    timezone: Tz,
}

impl Default for PeriodCalculator {
    fn default() -> Self {
        Self::new(WeekStart::default())
    }
}

impl PeriodCalculator {
    /// Calculator reading "now" from the UTC wall clock.
    pub fn new(week_start: WeekStart) -> Self {
        Self {
            week_start,
            timezone: chrono_tz::UTC,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            week_start: WeekStart::from_iso8601(settings.use_iso8601),
            timezone: settings.timezone,
        }
    }

    pub fn week_start(&self) -> WeekStart {
        self.week_start
    }

    pub fn timezone(&self) -> Tz {
        self.timezone
    }

    /// The single period `offset` recurrence units before `reference`.
    pub fn compute_period(
        &self,
        recurrence: RecurrenceKind,
        reference: NaiveDateTime,
        offset: i64,
    ) -> Result<Period, PeriodError> {
        let date = reference.date();
        let bounds = match recurrence {
            RecurrenceKind::Daily => days_before(date, offset).map(|day| (day, day)),
            RecurrenceKind::Weekly => self.weekly(date, offset),
            RecurrenceKind::Biweekly => self.biweekly(date, offset),
            RecurrenceKind::Semimonthly => semimonthly(date, offset),
            RecurrenceKind::Monthly => months_before(date, offset).and_then(month_bounds),
            RecurrenceKind::Quarterly => offset
                .checked_mul(3)
                .and_then(|months| months_before(date, months))
                .and_then(quarter_bounds),
            RecurrenceKind::Semiannually => semiannually(date, offset),
            RecurrenceKind::Annually => offset
                .checked_mul(12)
                .and_then(|months| months_before(date, months))
                .and_then(|day| year_bounds(day.year())),
            RecurrenceKind::Once | RecurrenceKind::OnDemand => {
                return Err(PeriodError::NotPeriodic(recurrence));
            }
        };

        let (first, last) = bounds.ok_or(PeriodError::DateOutOfRange { recurrence, offset })?;
        let period = Period::new(start_of_day(first), end_of_day(last));
        trace!(%recurrence, offset, start = %period.start, end = %period.end, "computed period");
        Ok(period)
    }

    /// The period before the one containing `reference`.
    pub fn previous_period(
        &self,
        recurrence: RecurrenceKind,
        reference: NaiveDateTime,
    ) -> Result<Period, PeriodError> {
        self.compute_period(recurrence, reference, 1)
    }

    /// `number_of_periods` consecutive periods ending at `offset`, relative
    /// to the current time in the configured timezone.
    pub fn compute_periods_config(
        &self,
        recurrence: RecurrenceKind,
        number_of_periods: usize,
        offset: i64,
        for_periodic_assessments: bool,
        allow_future_assessments: bool,
    ) -> Result<PeriodsConfig, PeriodError> {
        let now = now_in(&self.timezone);
        self.compute_periods_config_at(
            recurrence,
            number_of_periods,
            offset,
            for_periodic_assessments,
            allow_future_assessments,
            now,
        )
    }

    /// Same as [`compute_periods_config`](Self::compute_periods_config) with
    /// an explicit reference instant shared by every generated period.
    ///
    /// Periods come out oldest first.
    #[tracing::instrument(skip(self))]
    pub fn compute_periods_config_at(
        &self,
        recurrence: RecurrenceKind,
        number_of_periods: usize,
        offset: i64,
        for_periodic_assessments: bool,
        allow_future_assessments: bool,
        reference: NaiveDateTime,
    ) -> Result<PeriodsConfig, PeriodError> {
        if !recurrence.is_periodic() {
            return Err(PeriodError::NotPeriodic(recurrence));
        }

        // Grown on demand: the oldest period is computed first, so an
        // unrepresentable count fails before anything is allocated.
        let mut periods = Vec::new();
        for i in (0..number_of_periods).rev() {
            let period_offset = i64::try_from(i)
                .ok()
                .and_then(|i| offset.checked_add(i))
                .ok_or_else(|| PeriodError::DateOutOfRange {
                    recurrence,
                    offset: i64::try_from(i).map_or(i64::MAX, |i| offset.saturating_add(i)),
                })?;

            let mut period = self.compute_period(recurrence, reference, period_offset)?;
            if for_periodic_assessments {
                period.allow_new_assessments =
                    Some(allow_future_assessments || period_offset > 0);
            }
            periods.push(period);
        }

        debug!(%recurrence, count = periods.len(), "generated periods");
        Ok(PeriodsConfig {
            recurrence,
            periods,
        })
    }

    fn weekly(&self, date: NaiveDate, offset: i64) -> Option<(NaiveDate, NaiveDate)> {
        let day = days_before(date, offset.checked_mul(7)?)?;
        let first = self.week_start.start_of_week(day)?;
        Some((first, days_before(first, -6)?))
    }

    fn biweekly(&self, date: NaiveDate, offset: i64) -> Option<(NaiveDate, NaiveDate)> {
        let anchor_week = self.week_start.start_of_week(BIWEEKLY_ANCHOR)?;
        let current_week = self.week_start.start_of_week(date)?;

        let diff_in_weeks = (anchor_week - current_week).num_days() / 7;
        let current_start = if diff_in_weeks.rem_euclid(2) == 0 {
            current_week
        } else {
            days_before(current_week, 7)?
        };

        let first = days_before(current_start, offset.checked_mul(14)?)?;
        Some((first, days_before(first, -13)?))
    }
}

/// Month halves are days 1-14 and 15-end.
fn semimonthly(date: NaiveDate, offset: i64) -> Option<(NaiveDate, NaiveDate)> {
    let in_first_half = date.day() < SECOND_HALF_START_DAY;

    let (target_first_half, months_to_target) = if offset.rem_euclid(2) == 0 {
        (in_first_half, offset / 2)
    } else if in_first_half {
        // ceil(offset / 2)
        (false, offset.div_euclid(2) + 1)
    } else {
        // floor(offset / 2)
        (true, offset.div_euclid(2))
    };

    let target = months_before(date, months_to_target)?;
    if target_first_half {
        Some((
            target.with_day(1)?,
            target.with_day(SECOND_HALF_START_DAY - 1)?,
        ))
    } else {
        Some((
            target.with_day(SECOND_HALF_START_DAY)?,
            last_day_of_month(target)?,
        ))
    }
}

/// Year halves are January-June and July-December.
fn semiannually(date: NaiveDate, offset: i64) -> Option<(NaiveDate, NaiveDate)> {
    let in_first_half = date.month0() < MONTHS_IN_HALF_YEAR;
    let target = months_before(date, offset.checked_mul(i64::from(MONTHS_IN_HALF_YEAR))?)?;
    let target_first_half = if offset.rem_euclid(2) == 0 {
        in_first_half
    } else {
        !in_first_half
    };

    let year = target.year();
    if target_first_half {
        Some((
            NaiveDate::from_ymd_opt(year, 1, 1)?,
            NaiveDate::from_ymd_opt(year, MONTHS_IN_HALF_YEAR, 30)?,
        ))
    } else {
        Some((
            NaiveDate::from_ymd_opt(year, MONTHS_IN_HALF_YEAR + 1, 1)?,
            NaiveDate::from_ymd_opt(year, 12, 31)?,
        ))
    }
}

fn month_bounds(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    Some((date.with_day(1)?, last_day_of_month(date)?))
}

fn quarter_bounds(date: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    let first_month = date.month0() / 3 * 3 + 1;
    let first = NaiveDate::from_ymd_opt(date.year(), first_month, 1)?;
    let last = last_day_of_month(first.checked_add_months(Months::new(2))?)?;
    Some((first, last))
}

fn year_bounds(year: i32) -> Option<(NaiveDate, NaiveDate)> {
    Some((
        NaiveDate::from_ymd_opt(year, 1, 1)?,
        NaiveDate::from_ymd_opt(year, 12, 31)?,
    ))
}

fn last_day_of_month(date: NaiveDate) -> Option<NaiveDate> {
    date.with_day(1)?
        .checked_add_months(Months::new(1))?
        .pred_opt()
}

/// `days` before `date`; negative values move forward.
fn days_before(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_sub_signed(TimeDelta::try_days(days)?)
}

/// `months` before `date`, clamping the day to the target month's length.
fn months_before(date: NaiveDate, months: i64) -> Option<NaiveDate> {
    let magnitude = Months::new(u32::try_from(months.unsigned_abs()).ok()?);
    if months >= 0 {
        date.checked_sub_months(magnitude)
    } else {
        date.checked_add_months(magnitude)
    }
}
