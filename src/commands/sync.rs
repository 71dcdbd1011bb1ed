//! # Sync Command Implementation
//!
//! Runs the repository sync sequence for one environment, then the
//! dependency resolver, and prints the resulting search paths.

use anyhow::Result;
use clap::Args;

use policy_sync::defaults;
use policy_sync::output::OutputConfig;
use policy_sync::repository::RepositorySynchronizer;

use crate::cli::SettingsArgs;

/// Sync the repository to an environment's branch
#[derive(Args, Debug)]
pub struct SyncArgs {
    /// Environment whose branch is checked out.
    #[arg(short, long, value_name = "ENV", default_value = defaults::ENVIRONMENT)]
    pub environment: String,
}

/// Execute the `sync` command.
pub fn execute(args: SyncArgs, settings: &SettingsArgs, output: &OutputConfig) -> Result<()> {
    let config = settings.load()?;
    let mut synchronizer = RepositorySynchronizer::new(&config);

    let paths = synchronizer.ensure_synced(&args.environment).map_err(|e| {
        anyhow::anyhow!(
            "Failed to sync {} to '{}': {}",
            config.repository.display(),
            args.environment,
            e
        )
    })?;

    println!(
        "{} {} to {}",
        output.success("Synced"),
        config.repository.display(),
        output.name(&args.environment)
    );
    println!("{}", output.heading("Unit paths:"));
    for path in &paths.unit_paths {
        println!("  {}", path.display());
    }
    println!(
        "{} {}",
        output.heading("Bundle path:"),
        paths.bundle_path.display()
    );

    Ok(())
}
