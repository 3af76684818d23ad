#![allow(non_snake_case)]

mod cli;

use std::env;

use clap::Parser;
use meetingScheduler::runtime;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "meetingScheduler=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config_file = env::var("CONFIG_FILE").ok();
    let settings = runtime::load_settings(config_file.as_deref())?;
    let session = runtime::build_session(settings, args.format());
    cli::cli(args, session).await
}
