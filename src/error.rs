use std::fmt;

use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::models::interval::TimeInterval;

/// Why a calendar date is closed for meetings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClosedReason {
    Weekend,
    Holiday { name: Option<String> },
}

impl fmt::Display for ClosedReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClosedReason::Weekend => write!(f, "weekend"),
            ClosedReason::Holiday { name: Some(name) } => write!(f, "holiday: {}", name),
            ClosedReason::Holiday { name: None } => write!(f, "holiday"),
        }
    }
}

/// The rule a rejected booking attempt violated.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConflictReason {
    #[error("meeting must end after it starts")]
    InvalidInterval,
    #[error("cannot schedule meeting on {date}, it's not a working day ({reason})")]
    NotAWorkingDay { date: NaiveDate, reason: ClosedReason },
    #[error("meeting time must be within working hours ({start_hour}:00 to {end_hour}:00)")]
    OutsideWorkingHours { start_hour: u32, end_hour: u32 },
    #[error("meeting time overlaps with an existing meeting from {0}")]
    Overlap(TimeInterval),
}

/// Returned by slot queries on a date with no working hours.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[error("{date} is not a working day ({reason})")]
pub struct ClosedDay {
    pub date: NaiveDate,
    pub reason: ClosedReason,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid month-day '{0}', expected MM-DD")]
pub struct InvalidMonthDay(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("working hours must lie within 0-23, got {start}-{end}")]
    HourOutOfRange { start: u32, end: u32 },
    #[error("working day must open before it closes, got {start}-{end}")]
    EmptyWindow { start: u32, end: u32 },
}
