use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "ticker", version, about = "Periodic synthetic stock price updater")]
pub struct Cli {
    /// Overrides DATABASE_URL.
    #[arg(long, global = true)]
    pub database_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run a cycle every CYCLE_INTERVAL_SECS until Ctrl-C (default).
    Run,
    /// Run a single cycle and exit.
    Once,
    /// Create the schema and exit.
    Migrate,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.unwrap_or(Command::Run)
    }
}
