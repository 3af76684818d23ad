use std::collections::HashMap;
use std::fs;

use chrono::NaiveDate;
use thiserror::Error;

use crate::error::{InvalidMonthDay, PolicyError};
use crate::models::schedule::SlotMode;
use crate::service::calendar_policy::{
    CalendarPolicy, DEFAULT_WORK_END_HOUR, DEFAULT_WORK_START_HOUR, HolidayCalendar, MonthDay,
};

pub const DEFAULT_SLOT_GRANULARITY_MINUTES: u32 = 30;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config line {line}: {content}")]
    MalformedLine { line: usize, content: String },
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: &'static str, message: String },
    #[error("invalid value for RECURRING_HOLIDAYS: {0}")]
    RecurringHoliday(#[from] InvalidMonthDay),
    #[error(transparent)]
    Policy(#[from] PolicyError),
}

/// Flat `KEY=VALUE` file, as written for shells and `.env` loaders.
#[derive(Debug, Default, Clone)]
pub struct AppConfig {
    values: HashMap<String, String>,
}

impl AppConfig {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_string(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut values = HashMap::new();
        for (idx, line) in content.lines().enumerate() {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let trimmed = trimmed.strip_prefix("export ").unwrap_or(trimmed);
            let Some((key, value)) = trimmed.split_once('=') else {
                return Err(ConfigError::MalformedLine {
                    line: idx + 1,
                    content: line.to_string(),
                });
            };
            let key = key.trim();
            let mut value = value.trim().to_string();
            if value.len() >= 2
                && ((value.starts_with('"') && value.ends_with('"'))
                    || (value.starts_with('\'') && value.ends_with('\'')))
            {
                value = value[1..value.len() - 1].to_string();
            }
            values.insert(key.to_string(), value);
        }
        Ok(Self { values })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

/// Everything the scheduler needs at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulerSettings {
    pub policy: CalendarPolicy,
    pub slot_mode: SlotMode,
}

impl Default for SchedulerSettings {
    fn default() -> Self {
        Self {
            policy: CalendarPolicy::default(),
            slot_mode: SlotMode::Gaps,
        }
    }
}

impl SchedulerSettings {
    /// Reads settings through `get_prop`, which decides where values come
    /// from (config file first, then environment, in `main`).
    pub fn from_lookup<F>(get_prop: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let start = parse_hour(&get_prop, "WORK_START_HOUR", DEFAULT_WORK_START_HOUR)?;
        let end = parse_hour(&get_prop, "WORK_END_HOUR", DEFAULT_WORK_END_HOUR)?;

        let fixed = get_prop("HOLIDAYS");
        let recurring = get_prop("RECURRING_HOLIDAYS");
        let holidays = if fixed.is_none() && recurring.is_none() {
            HolidayCalendar::us_defaults()
        } else {
            let mut calendar = HolidayCalendar::new();
            for (raw, name) in split_entries(fixed.as_deref()) {
                let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
                    ConfigError::InvalidValue {
                        key: "HOLIDAYS",
                        message: format!("'{}' is not a YYYY-MM-DD date", raw),
                    }
                })?;
                calendar = calendar.with_date(date, name);
            }
            for (raw, name) in split_entries(recurring.as_deref()) {
                let month_day: MonthDay = raw.parse()?;
                calendar = calendar.with_recurring(month_day, name);
            }
            calendar
        };

        let policy = CalendarPolicy::new(start, end, holidays)?;
        let slot_mode = parse_slot_mode(&get_prop)?;
        Ok(Self { policy, slot_mode })
    }
}

fn parse_hour<F>(get_prop: &F, key: &'static str, default: u32) -> Result<u32, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match get_prop(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidValue {
            key,
            message: format!("'{}' is not an hour", raw),
        }),
        None => Ok(default),
    }
}

fn parse_slot_mode<F>(get_prop: &F) -> Result<SlotMode, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let granularity = match get_prop("SLOT_GRANULARITY_MINUTES") {
        Some(raw) => raw
            .trim()
            .parse::<u32>()
            .map_err(|_| ConfigError::InvalidValue {
                key: "SLOT_GRANULARITY_MINUTES",
                message: format!("'{}' is not a number of minutes", raw),
            })?,
        None => DEFAULT_SLOT_GRANULARITY_MINUTES,
    };
    let mode = get_prop("SLOT_MODE").unwrap_or_else(|| "gaps".to_string());
    match mode.trim().to_lowercase().as_str() {
        "gaps" => Ok(SlotMode::Gaps),
        "grid" => SlotMode::grid(granularity).ok_or(ConfigError::InvalidValue {
            key: "SLOT_GRANULARITY_MINUTES",
            message: "must be greater than zero".to_string(),
        }),
        other => Err(ConfigError::InvalidValue {
            key: "SLOT_MODE",
            message: format!("'{}' is not one of gaps, grid", other),
        }),
    }
}

// "2025-01-01:New Year, 2025-04-18" -> [("2025-01-01", Some("New Year")), ("2025-04-18", None)]
fn split_entries(raw: Option<&str>) -> Vec<(&str, Option<String>)> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| match entry.split_once(':') {
            Some((value, name)) if !name.trim().is_empty() => {
                (value.trim(), Some(name.trim().to_string()))
            }
            Some((value, _)) => (value.trim(), None),
            None => (entry, None),
        })
        .collect()
}
