use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

use crate::error::{ClosedReason, InvalidMonthDay, PolicyError};
use crate::models::interval::TimeInterval;

pub const DEFAULT_WORK_START_HOUR: u32 = 9;
pub const DEFAULT_WORK_END_HOUR: u32 = 17;

/// A holiday that repeats every year on the same month and day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    pub fn new(month: u32, day: u32) -> Option<Self> {
        // 2000 is a leap year, so 02-29 is accepted.
        NaiveDate::from_ymd_opt(2000, month, day)?;
        Some(Self { month, day })
    }

    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

impl FromStr for MonthDay {
    type Err = InvalidMonthDay;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || InvalidMonthDay(s.to_string());
        let (month, day) = s.trim().split_once('-').ok_or_else(invalid)?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        let day: u32 = day.parse().map_err(|_| invalid())?;
        MonthDay::new(month, day).ok_or_else(invalid)
    }
}

/// Injected holiday set. Fixed dates and recurring month-days both apply.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HolidayCalendar {
    dates: BTreeMap<NaiveDate, Option<String>>,
    recurring: BTreeMap<MonthDay, Option<String>>,
}

impl HolidayCalendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_date(mut self, date: NaiveDate, name: Option<String>) -> Self {
        self.dates.insert(date, name);
        self
    }

    pub fn with_recurring(mut self, month_day: MonthDay, name: Option<String>) -> Self {
        self.recurring.insert(month_day, name);
        self
    }

    /// Fixed dates win over recurring patterns when both carry a name.
    pub fn lookup(&self, date: NaiveDate) -> Option<Option<&str>> {
        if let Some(name) = self.dates.get(&date) {
            return Some(name.as_deref());
        }
        self.recurring
            .get(&MonthDay::of(date))
            .map(|name| name.as_deref())
    }

    pub fn is_holiday(&self, date: NaiveDate) -> bool {
        self.lookup(date).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty() && self.recurring.is_empty()
    }

    /// The US federal holidays the scheduler has always shipped with.
    pub fn us_defaults() -> Self {
        let entries = [
            (1, 1, "New Year's Day"),
            (12, 25, "Christmas"),
            (7, 4, "Independence Day"),
        ];
        entries
            .into_iter()
            .fold(Self::new(), |calendar, (month, day, name)| match MonthDay::new(month, day) {
                Some(month_day) => calendar.with_recurring(month_day, Some(name.to_string())),
                None => calendar,
            })
    }
}

/// Operating hours and closed days. Built once and shared read-only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarPolicy {
    work_start_hour: u32,
    work_end_hour: u32,
    holidays: HolidayCalendar,
}

impl Default for CalendarPolicy {
    fn default() -> Self {
        Self {
            work_start_hour: DEFAULT_WORK_START_HOUR,
            work_end_hour: DEFAULT_WORK_END_HOUR,
            holidays: HolidayCalendar::us_defaults(),
        }
    }
}

impl CalendarPolicy {
    pub fn new(
        work_start_hour: u32,
        work_end_hour: u32,
        holidays: HolidayCalendar,
    ) -> Result<Self, PolicyError> {
        if work_start_hour > 23 || work_end_hour > 23 {
            return Err(PolicyError::HourOutOfRange {
                start: work_start_hour,
                end: work_end_hour,
            });
        }
        if work_start_hour >= work_end_hour {
            return Err(PolicyError::EmptyWindow {
                start: work_start_hour,
                end: work_end_hour,
            });
        }
        Ok(Self {
            work_start_hour,
            work_end_hour,
            holidays,
        })
    }

    pub fn work_hours(&self) -> (u32, u32) {
        (self.work_start_hour, self.work_end_hour)
    }

    pub fn holidays(&self) -> &HolidayCalendar {
        &self.holidays
    }

    pub fn is_working_day(&self, date: NaiveDate) -> bool {
        self.closed_reason(date).is_none()
    }

    pub fn closed_reason(&self, date: NaiveDate) -> Option<ClosedReason> {
        if matches!(date.weekday(), Weekday::Sat | Weekday::Sun) {
            return Some(ClosedReason::Weekend);
        }
        self.holidays.lookup(date).map(|name| ClosedReason::Holiday {
            name: name.map(str::to_string),
        })
    }

    pub fn is_within_working_hours(&self, time: NaiveTime) -> bool {
        (self.work_start_hour..self.work_end_hour).contains(&time.hour())
    }

    pub fn opening(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(hour_start(self.work_start_hour))
    }

    pub fn closing(&self, date: NaiveDate) -> NaiveDateTime {
        date.and_time(hour_start(self.work_end_hour))
    }

    /// Whole-interval check against `[opening, closing)` of the start date.
    /// An interval may end exactly at closing time.
    pub fn contains(&self, interval: &TimeInterval) -> bool {
        let date = interval.date();
        self.is_within_working_hours(interval.start().time())
            && interval.start() >= self.opening(date)
            && interval.end() <= self.closing(date)
    }
}

fn hour_start(hour: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, 0, 0).unwrap_or(NaiveTime::MIN)
}
