use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PeriodError;

/// Cadence at which assessment periods repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecurrenceKind {
    Once,
    Daily,
    Weekly,
    Biweekly,
    Semimonthly,
    Monthly,
    Quarterly,
    Semiannually,
    Annually,
    OnDemand,
}

impl RecurrenceKind {
    pub const ALL: [RecurrenceKind; 10] = [
        RecurrenceKind::Once,
        RecurrenceKind::Daily,
        RecurrenceKind::Weekly,
        RecurrenceKind::Biweekly,
        RecurrenceKind::Semimonthly,
        RecurrenceKind::Monthly,
        RecurrenceKind::Quarterly,
        RecurrenceKind::Semiannually,
        RecurrenceKind::Annually,
        RecurrenceKind::OnDemand,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecurrenceKind::Once => "once",
            RecurrenceKind::Daily => "daily",
            RecurrenceKind::Weekly => "weekly",
            RecurrenceKind::Biweekly => "biweekly",
            RecurrenceKind::Semimonthly => "semimonthly",
            RecurrenceKind::Monthly => "monthly",
            RecurrenceKind::Quarterly => "quarterly",
            RecurrenceKind::Semiannually => "semiannually",
            RecurrenceKind::Annually => "annually",
            RecurrenceKind::OnDemand => "ondemand",
        }
    }

    /// Whether the calculator can generate periods for this kind.
    ///
    /// `Once` and `OnDemand` assessments are not tied to a calendar period.
    pub fn is_periodic(&self) -> bool {
        !matches!(self, RecurrenceKind::Once | RecurrenceKind::OnDemand)
    }

    /// Periodic kinds, shortest cadence first.
    pub fn periodic_kinds() -> impl Iterator<Item = RecurrenceKind> {
        Self::ALL.into_iter().filter(RecurrenceKind::is_periodic)
    }
}

impl fmt::Display for RecurrenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecurrenceKind {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == lower)
            .ok_or_else(|| PeriodError::UnknownRecurrence(s.to_string()))
    }
}
