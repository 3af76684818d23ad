use clap::{Parser, Subcommand};

use meetingScheduler::handlers::responder::OutputFormat;
use meetingScheduler::handlers::session::Session;
use meetingScheduler::runtime;

#[derive(Parser)]
#[command(about = "Book meetings inside working hours and list free time")]
pub struct Cli {
    /// Print outcomes as JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Read commands from a prompt until `quit`.
    Interactive,
    /// Execute a file of commands, one per line.
    Run { file: String },
}

impl Cli {
    pub fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn cli(cli: Cli, session: Session) -> anyhow::Result<()> {
    match &cli.command {
        Commands::Interactive => runtime::run_interactive(&session).await,
        Commands::Run { file } => runtime::run_script(&session, file).await,
    }
}
