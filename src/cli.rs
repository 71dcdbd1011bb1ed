//! CLI argument parsing and command dispatch

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};

use policy_sync::config::{self, Config};
use policy_sync::output::OutputConfig;

use crate::commands;

/// Policy Sync - sync a configuration policy repository and expand node run lists
#[derive(Parser, Debug)]
#[command(name = "policy-sync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    command: Commands,

    /// Colorize output (always, never, auto)
    #[arg(
        long,
        global = true,
        value_name = "WHEN",
        default_value = "auto",
        value_parser = ["auto", "always", "never"]
    )]
    color: String,

    /// Set log level (off, error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(
        long,
        global = true,
        value_name = "LEVEL",
        default_value = "warn",
        value_parser = ["off", "error", "warn", "info", "debug", "trace"]
    )]
    log_level: String,

    #[command(flatten)]
    settings: SettingsArgs,
}

/// Options shared by every subcommand that touches the repository.
#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    /// Path to the policy-sync.yaml configuration file.
    ///
    /// Defaults to `policy-sync/policy-sync.yaml` in the platform config
    /// directory when that file exists.
    #[arg(long, global = true, value_name = "FILE", env = "POLICY_SYNC_CONFIG")]
    pub config: Option<PathBuf>,

    /// Local path of the policy repository, overriding the configuration.
    #[arg(long, global = true, value_name = "DIR", env = "POLICY_SYNC_REPOSITORY")]
    pub repository: Option<PathBuf>,
}

impl SettingsArgs {
    /// Loads the configuration file and applies command-line overrides.
    pub fn load(&self) -> Result<Config> {
        let loaded = config::load(self.config.as_deref()).map_err(|e| match &self.config {
            Some(path) => anyhow::anyhow!("Failed to load config from {}: {}", path.display(), e),
            None => anyhow::anyhow!("Failed to load config: {}", e),
        })?;

        Ok(match &self.repository {
            Some(repository) => loaded.with_repository(repository),
            None => loaded,
        })
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Sync the repository to an environment and install dependencies
    Sync(commands::sync::SyncArgs),

    /// Expand a node's run list into version-constrained recipes
    Expand(commands::expand::ExpandArgs),

    /// List the units available in the repository
    Units(commands::units::UnitsArgs),

    /// Build a node's execution context and print its load order
    Context(commands::context::ContextArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        let output = OutputConfig::from_env_and_flag(&self.color);
        let settings = self.settings;

        match self.command {
            Commands::Sync(args) => commands::sync::execute(args, &settings, &output),
            Commands::Expand(args) => commands::expand::execute(args, &settings, &output),
            Commands::Units(args) => commands::units::execute(args, &settings, &output),
            Commands::Context(args) => commands::context::execute(args, &settings, &output),
        }
    }
}

fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .try_init();
}
