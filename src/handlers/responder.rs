use chrono::{NaiveDate, NaiveTime};
use serde_json::json;

use crate::error::{ClosedDay, ConflictReason};
use crate::models::interval::TimeInterval;
use crate::service::scheduler_service::BookingResult;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

pub fn render_booking(
    format: OutputFormat,
    user: &str,
    result: Result<TimeInterval, ConflictReason>,
) -> String {
    match format {
        OutputFormat::Json => {
            let body = BookingResult::from(result);
            json!({ "command": "schedule", "user": user, "result": body }).to_string()
        }
        OutputFormat::Text => match result {
            Ok(meeting) => format!(
                "Meeting scheduled for {} on {} for {} minutes.",
                user,
                meeting.start().format(TIMESTAMP_FORMAT),
                meeting.duration_minutes()
            ),
            Err(reason) => capitalize(&format!("{}.", reason)),
        },
    }
}

pub fn render_slots(
    format: OutputFormat,
    user: &str,
    date: NaiveDate,
    result: Result<Vec<(NaiveTime, NaiveTime)>, ClosedDay>,
) -> String {
    match format {
        OutputFormat::Json => {
            let body = match result {
                Ok(slots) => {
                    let listed: Vec<serde_json::Value> = slots
                        .iter()
                        .map(|(start, end)| {
                            json!({
                                "start": start.format("%H:%M").to_string(),
                                "end": end.format("%H:%M").to_string(),
                            })
                        })
                        .collect();
                    json!({ "closed": false, "slots": listed })
                }
                Err(closed) => json!({ "closed": true, "reason": closed.reason }),
            };
            json!({ "command": "slots", "user": user, "date": date, "result": body }).to_string()
        }
        OutputFormat::Text => match result {
            Ok(slots) if slots.is_empty() => format!(
                "No available slots for {} on {}.",
                user,
                date.format("%Y-%m-%d")
            ),
            Ok(slots) => {
                let listed: Vec<String> = slots
                    .iter()
                    .map(|(start, end)| format!("{}-{}", start.format("%H:%M"), end.format("%H:%M")))
                    .collect();
                format!(
                    "Available slots for {} on {}: {}",
                    user,
                    date.format("%Y-%m-%d"),
                    listed.join(", ")
                )
            }
            Err(closed) => capitalize(&format!("{}.", closed)),
        },
    }
}

pub fn render_meetings(format: OutputFormat, user: &str, meetings: &[TimeInterval]) -> String {
    match format {
        OutputFormat::Json => {
            json!({ "command": "list", "user": user, "meetings": meetings }).to_string()
        }
        OutputFormat::Text => {
            if meetings.is_empty() {
                return format!("No meetings scheduled for {}.", user);
            }
            let mut body = format!("Scheduled meetings for {}:", user);
            for meeting in meetings {
                body.push_str(&format!(
                    "\n- From {} to {}",
                    meeting.start().format(TIMESTAMP_FORMAT),
                    meeting.end().format(TIMESTAMP_FORMAT)
                ));
            }
            body
        }
    }
}

pub fn render_users(format: OutputFormat, users: &[String]) -> String {
    match format {
        OutputFormat::Json => json!({ "command": "users", "users": users }).to_string(),
        OutputFormat::Text if users.is_empty() => "No users have requested meetings yet.".to_string(),
        OutputFormat::Text => format!("Users: {}", users.join(", ")),
    }
}

pub fn render_error(format: OutputFormat, message: &str) -> String {
    match format {
        OutputFormat::Json => json!({ "error": message }).to_string(),
        OutputFormat::Text => format!("Error: {}", message),
    }
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
