use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;

use crate::models::schedule::SlotMode;

pub const USAGE: &str = "\
Commands:
  schedule <user> <YYYY-MM-DD> <HH:MM> <minutes>
  slots <user> <YYYY-MM-DD> [gaps|grid[:<minutes>]]
  list <user>
  users
  help
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Schedule {
        user: String,
        date: NaiveDate,
        start: NaiveTime,
        duration_minutes: i64,
    },
    Slots {
        user: String,
        date: NaiveDate,
        mode: Option<SlotMode>,
    },
    List {
        user: String,
    },
    Users,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,
    #[error("unknown command '{0}'")]
    Unknown(String),
    #[error("usage: {0}")]
    Usage(&'static str),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("invalid time '{0}', expected HH:MM")]
    InvalidTime(String),
    #[error("invalid duration '{0}', expected a positive number of minutes")]
    InvalidDuration(String),
    #[error("invalid slot mode '{0}', expected gaps or grid[:<minutes>]")]
    InvalidMode(String),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = parts.split_first() else {
            return Err(CommandError::Empty);
        };
        match name.to_lowercase().as_str() {
            "schedule" => {
                let [user, date, start, duration] = args else {
                    return Err(CommandError::Usage(
                        "schedule <user> <YYYY-MM-DD> <HH:MM> <minutes>",
                    ));
                };
                Ok(Command::Schedule {
                    user: user.to_string(),
                    date: parse_date(date)?,
                    start: parse_time(start)?,
                    duration_minutes: parse_duration(duration)?,
                })
            }
            "slots" => {
                let (user, date, mode) = match args {
                    [user, date] => (user, date, None),
                    [user, date, mode] => (user, date, Some(parse_mode(mode)?)),
                    _ => {
                        return Err(CommandError::Usage(
                            "slots <user> <YYYY-MM-DD> [gaps|grid[:<minutes>]]",
                        ));
                    }
                };
                Ok(Command::Slots {
                    user: user.to_string(),
                    date: parse_date(date)?,
                    mode,
                })
            }
            "list" => match args {
                [user] => Ok(Command::List {
                    user: user.to_string(),
                }),
                _ => Err(CommandError::Usage("list <user>")),
            },
            "users" => Ok(Command::Users),
            "help" => Ok(Command::Help),
            "quit" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, CommandError> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| CommandError::InvalidDate(raw.to_string()))
}

fn parse_time(raw: &str) -> Result<NaiveTime, CommandError> {
    NaiveTime::parse_from_str(raw, "%H:%M").map_err(|_| CommandError::InvalidTime(raw.to_string()))
}

fn parse_duration(raw: &str) -> Result<i64, CommandError> {
    match raw.parse::<i64>() {
        Ok(minutes) if minutes > 0 => Ok(minutes),
        _ => Err(CommandError::InvalidDuration(raw.to_string())),
    }
}

fn parse_mode(raw: &str) -> Result<SlotMode, CommandError> {
    let invalid = || CommandError::InvalidMode(raw.to_string());
    match raw.to_lowercase().split_once(':') {
        None if raw.eq_ignore_ascii_case("gaps") => Ok(SlotMode::Gaps),
        None if raw.eq_ignore_ascii_case("grid") => {
            SlotMode::grid(crate::config::DEFAULT_SLOT_GRANULARITY_MINUTES).ok_or_else(invalid)
        }
        Some(("grid", minutes)) => minutes
            .parse::<u32>()
            .ok()
            .and_then(SlotMode::grid)
            .ok_or_else(invalid),
        _ => Err(invalid()),
    }
}
