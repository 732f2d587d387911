//! Error types for period computation.

use thiserror::Error;

use crate::recurrence::RecurrenceKind;

/// Precondition violations raised by the period utilities.
///
/// None of these are runtime conditions to recover from: they mean the
/// caller asked for something the calculator cannot answer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PeriodError {
    /// The recurrence has no period factory (`once`, `ondemand`).
    #[error("recurrence '{0}' does not produce periods")]
    NotPeriodic(RecurrenceKind),

    /// No responsive bucket matched the display width.
    #[error("invalid width or screen sizes are not continuous: width={0}")]
    UnmatchedWidth(f64),

    /// Calendar arithmetic left the representable date range.
    #[error("date out of range: {recurrence} offset {offset}")]
    DateOutOfRange {
        /// Recurrence being computed.
        recurrence: RecurrenceKind,
        /// Offset that overflowed.
        offset: i64,
    },

    /// A recurrence name did not match any known kind.
    #[error("unknown recurrence: {0}")]
    UnknownRecurrence(String),
}
