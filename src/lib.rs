#![doc = include_str!("../README.md")]

pub mod cli;
pub mod command;
pub mod error;
pub mod fs;
pub mod plan;
pub mod transaction;

pub use error::*;
pub use transaction::{Transaction, TransactionStats, start_transaction};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn run() -> Result<()> {
    use clap::Parser;
    use command::Command;

    let cli = cli::Cli::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_filter()))
        .init();

    match cli.command {
        Command::Apply(args) => command::apply::execute(args),
    }
}
