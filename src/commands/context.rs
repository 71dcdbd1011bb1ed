//! # Context Command Implementation
//!
//! Builds the execution context for a node and prints the unit activation
//! order followed by every file in load order.

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;

use policy_sync::output::OutputConfig;
use policy_sync::policy::PolicySource;

use crate::cli::SettingsArgs;
use crate::commands::{load_node, open_policy};

/// Build a node's execution context and print its load order
#[derive(Args, Debug)]
pub struct ContextArgs {
    /// Node definition file (JSON or YAML).
    #[arg(short, long, value_name = "FILE")]
    pub node: PathBuf,

    /// Extra recipe file loaded after the run list; may be repeated.
    #[arg(long = "extra-file", value_name = "FILE")]
    pub extra_files: Vec<PathBuf>,

    /// Use the repository as it is on disk without syncing it.
    #[arg(long)]
    pub offline: bool,
}

/// Execute the `context` command.
pub fn execute(args: ContextArgs, settings: &SettingsArgs, output: &OutputConfig) -> Result<()> {
    let config = settings.load()?;
    let node = load_node(&args.node)?;
    let mut policy = open_policy(&config, node, args.offline);

    let node_name = policy.node().name.clone();
    let context = policy
        .setup_execution_context(&args.extra_files)
        .map_err(|e| anyhow::anyhow!("Failed to build context for {}: {}", node_name, e))?;

    println!("{}", output.heading("Units:"));
    for name in context.unit_order() {
        let version = context
            .units()
            .get(name)
            .map(|unit| unit.version.to_string())
            .unwrap_or_default();
        println!("  {} {}", output.name(name), output.detail(version));
    }

    println!("{}", output.heading("Load order:"));
    for file in context.loaded_files() {
        println!("  {:<11} {}", file.kind.to_string(), file.path.display());
    }

    Ok(())
}
