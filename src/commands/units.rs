//! # Units Command Implementation
//!
//! Lists the units found on the repository's search paths with their
//! versions, recipes and declared dependencies.

use anyhow::Result;
use clap::Args;

use policy_sync::defaults;
use policy_sync::output::OutputConfig;
use policy_sync::repository::{RepositorySynchronizer, SearchPaths};
use policy_sync::unit::UnitLoader;

use crate::cli::SettingsArgs;

/// List the units available in the repository
#[derive(Args, Debug)]
pub struct UnitsArgs {
    /// Use the repository as it is on disk without syncing it.
    #[arg(long)]
    pub offline: bool,

    /// Environment to sync to before listing.
    #[arg(short, long, value_name = "ENV", default_value = defaults::ENVIRONMENT)]
    pub environment: String,

    /// Also list each unit's recipes and dependencies.
    #[arg(short, long)]
    pub long: bool,
}

/// Execute the `units` command.
pub fn execute(args: UnitsArgs, settings: &SettingsArgs, output: &OutputConfig) -> Result<()> {
    let config = settings.load()?;

    let paths = if args.offline {
        SearchPaths::for_repository(&config.repository)
    } else {
        RepositorySynchronizer::new(&config)
            .ensure_synced(&args.environment)
            .map_err(|e| {
                anyhow::anyhow!(
                    "Failed to sync {} to '{}': {}",
                    config.repository.display(),
                    args.environment,
                    e
                )
            })?
            .clone()
    };

    let units = UnitLoader::new()
        .load(&paths.unit_paths)
        .map_err(|e| anyhow::anyhow!("Failed to load units: {}", e))?;

    if units.is_empty() {
        println!("No units found in {}", config.repository.display());
        return Ok(());
    }

    for unit in units.iter() {
        println!(
            "{} {} {}",
            output.name(&unit.name),
            unit.version,
            output.detail(unit.root.display())
        );
        if args.long {
            println!("  recipes: {}", unit.recipe_names().join(", "));
            for (dependency, constraint) in &unit.dependencies {
                println!("  depends: {} {}", dependency, constraint);
            }
        }
    }

    Ok(())
}
