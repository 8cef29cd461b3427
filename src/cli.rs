use crate::command::Command;
use clap::{ArgAction, Parser};

#[derive(Parser)]
#[command(name = "txfs", version, about = "Apply a batch of file writes as one transaction")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(long, short = 'v', action = ArgAction::Count, global = true)]
    pub verbose: u8,
}

impl Cli {
    /// Default log filter for the verbosity level. `RUST_LOG` takes precedence.
    pub fn log_filter(&self) -> &'static str {
        match self.verbose {
            0 => "warn",
            1 => "info",
            _ => "debug",
        }
    }
}
