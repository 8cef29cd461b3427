pub mod apply;

use clap::Subcommand;

#[derive(Subcommand)]
pub enum Command {
    /// Apply a plan's writes inside a single transaction.
    Apply(apply::ApplyArgs),
}
