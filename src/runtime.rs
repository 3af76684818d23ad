use std::env;
use std::sync::Arc;

use anyhow::Context;
use inquire::InquireError;
use inquire::Text;

use crate::config::{AppConfig, SchedulerSettings};
use crate::handlers::command::USAGE;
use crate::handlers::responder::OutputFormat;
use crate::handlers::session::{Reply, Session};
use crate::service::scheduler_service::SchedulerService;

/// Loads settings from `config_file` when given, falling back to the
/// environment for keys the file does not set.
pub fn load_settings(config_file: Option<&str>) -> anyhow::Result<SchedulerSettings> {
    let config = match config_file {
        Some(path) => AppConfig::from_file(path)?,
        None => AppConfig::default(),
    };
    let get_prop = |key: &str| -> Option<String> { config.get(key).or_else(|| env::var(key).ok()) };
    let settings = SchedulerSettings::from_lookup(get_prop).context("invalid scheduler settings")?;
    let (start_hour, end_hour) = settings.policy.work_hours();
    tracing::info!(start_hour, end_hour, slot_mode = ?settings.slot_mode, "scheduler configured");
    Ok(settings)
}

pub fn build_session(settings: SchedulerSettings, format: OutputFormat) -> Session {
    let service = Arc::new(SchedulerService::new(settings.policy, settings.slot_mode));
    Session::new(service, format)
}

/// Runs every line of `content` in order and collects the replies. Stops at
/// the first `quit`.
pub async fn execute_script(session: &Session, content: &str) -> Vec<String> {
    let mut replies = Vec::new();
    for line in content.lines() {
        match session.handle_line(line).await {
            Reply::Text(body) => replies.push(body),
            Reply::Nothing => {}
            Reply::Quit => break,
        }
    }
    replies
}

pub async fn run_script(session: &Session, path: &str) -> anyhow::Result<()> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read script {}", path))?;
    tracing::info!(path, "running script");
    for reply in execute_script(session, &content).await {
        println!("{}", reply);
    }
    Ok(())
}

pub async fn run_interactive(session: &Session) -> anyhow::Result<()> {
    println!("{}", USAGE);
    loop {
        let line = match Text::new(">").prompt() {
            Ok(line) => line,
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => break,
            Err(err) => return Err(err).context("failed to read command"),
        };
        match session.handle_line(&line).await {
            Reply::Text(body) => println!("{}", body),
            Reply::Nothing => {}
            Reply::Quit => break,
        }
    }
    Ok(())
}
