//! # Policy Sync CLI
//!
//! Binary entry point for the `policy-sync` command-line tool.
//!
//! It parses arguments with `clap`, installs the logger and dispatches to a
//! subcommand. Errors bubble up as `anyhow::Error` and exit with status 1.
//! All pipeline logic lives in the `policy_sync` library.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
