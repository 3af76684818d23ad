use std::sync::Arc;

use crate::handlers::command::{Command, USAGE};
use crate::handlers::responder::{self, OutputFormat};
use crate::service::scheduler_service::SchedulerService;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Quit,
    Nothing,
}

/// Executes edge commands against a shared scheduler.
#[derive(Clone)]
pub struct Session {
    service: Arc<SchedulerService>,
    format: OutputFormat,
}

impl Session {
    pub fn new(service: Arc<SchedulerService>, format: OutputFormat) -> Self {
        Self { service, format }
    }

    pub async fn handle_line(&self, line: &str) -> Reply {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            return Reply::Nothing;
        }
        match trimmed.parse::<Command>() {
            Ok(command) => self.execute(command).await,
            Err(err) => {
                tracing::debug!(line = trimmed, error = %err, "rejected command");
                Reply::Text(responder::render_error(self.format, &err.to_string()))
            }
        }
    }

    pub async fn execute(&self, command: Command) -> Reply {
        let format = self.format;
        match command {
            Command::Schedule {
                user,
                date,
                start,
                duration_minutes,
            } => {
                let result = self
                    .service
                    .schedule_meeting(&user, date, start, duration_minutes)
                    .await;
                Reply::Text(responder::render_booking(format, &user, result))
            }
            Command::Slots { user, date, mode } => {
                let mode = mode.unwrap_or(self.service.default_mode());
                let result = self
                    .service
                    .check_available_slots_with(&user, date, mode)
                    .await;
                Reply::Text(responder::render_slots(format, &user, date, result))
            }
            Command::List { user } => {
                let meetings = self.service.view_scheduled_meetings(&user).await;
                Reply::Text(responder::render_meetings(format, &user, &meetings))
            }
            Command::Users => {
                let users = self.service.user_ids().await;
                Reply::Text(responder::render_users(format, &users))
            }
            Command::Help => Reply::Text(USAGE.to_string()),
            Command::Quit => Reply::Quit,
        }
    }
}
