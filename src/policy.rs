//! # Policy Sources
//!
//! A policy source is where a node's configuration policy comes from. The
//! [`PolicySource`] trait is the capability the rest of a configuration run
//! relies on: check the source out, expand the run list, and set up the
//! execution context. [`GitPolicy`] is the git-backed implementation; other
//! sources (a remote policy service, say) implement the same trait.
//!
//! `GitPolicy` drives the whole pipeline for one run:
//!
//! ```text
//! ensure_synced -> resolver install -> UnitLoader::load
//!               -> RunListExpander::expand -> ExecutionContextBuilder::build
//! ```
//!
//! Each stage runs at most once per `GitPolicy` and its result is kept for
//! the later stages. Stages run strictly one after another on the calling
//! thread.

use std::path::PathBuf;

use crate::bundle::DiskBundleLoader;
use crate::config::Config;
use crate::context::{EventSink, ExecutionContext, ExecutionContextBuilder, LogEventSink};
use crate::error::Result;
use crate::expansion::{RunListExpander, RunListExpansion};
use crate::node::Node;
use crate::repository::{RepositorySynchronizer, SearchPaths};
use crate::unit::{UnitCollection, UnitLoader};

/// Capability interface of a policy source.
pub trait PolicySource {
    /// Makes the policy available locally and returns where to find it.
    fn check_out_source(&mut self) -> Result<&SearchPaths>;

    /// Expands the node's run list.
    fn expand_run_list(&mut self) -> Result<&RunListExpansion>;

    /// Loads units and builds the execution context, with `extra_files`
    /// loaded after the run list.
    fn setup_execution_context(&mut self, extra_files: &[PathBuf]) -> Result<ExecutionContext<'_>>;
}

/// Policy read from a git working copy synced to the node's environment.
pub struct GitPolicy {
    node: Node,
    repository: PathBuf,
    synchronizer: Option<RepositorySynchronizer>,
    events: Box<dyn EventSink>,
    search_paths: Option<SearchPaths>,
    units: Option<UnitCollection>,
    expansion: Option<RunListExpansion>,
}

impl GitPolicy {
    /// A policy that syncs the configured repository with real commands.
    pub fn new(config: &Config, node: Node) -> Self {
        Self::with_synchronizer(config, node, RepositorySynchronizer::new(config))
    }

    /// A policy using a custom synchronizer.
    pub fn with_synchronizer(
        config: &Config,
        node: Node,
        synchronizer: RepositorySynchronizer,
    ) -> Self {
        Self {
            node,
            repository: config.repository.clone(),
            synchronizer: Some(synchronizer),
            events: Box::new(LogEventSink),
            search_paths: None,
            units: None,
            expansion: None,
        }
    }

    /// A policy that uses the working copy as it is, running no commands.
    pub fn offline(config: &Config, node: Node) -> Self {
        Self {
            node,
            repository: config.repository.clone(),
            synchronizer: None,
            events: Box::new(LogEventSink),
            search_paths: None,
            units: None,
            expansion: None,
        }
    }

    /// Replaces the event sink handed to execution contexts.
    pub fn with_events(mut self, events: Box<dyn EventSink>) -> Self {
        self.events = events;
        self
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    fn resolve_search_paths(&mut self) -> Result<SearchPaths> {
        if let Some(paths) = &self.search_paths {
            return Ok(paths.clone());
        }

        let paths = match self.synchronizer.as_mut() {
            Some(synchronizer) => synchronizer.ensure_synced(&self.node.environment)?.clone(),
            None => {
                log::info!(
                    "offline: using {} without syncing",
                    self.repository.display()
                );
                SearchPaths::for_repository(&self.repository)
            }
        };
        self.search_paths = Some(paths.clone());
        Ok(paths)
    }

    /// Loads the units of the checked-out policy.
    pub fn load_units(&mut self) -> Result<&UnitCollection> {
        let units = match self.units.take() {
            Some(units) => units,
            None => {
                let paths = self.resolve_search_paths()?;
                UnitLoader::new().load(&paths.unit_paths)?
            }
        };
        Ok(self.units.insert(units))
    }
}

impl PolicySource for GitPolicy {
    fn check_out_source(&mut self) -> Result<&SearchPaths> {
        let paths = self.resolve_search_paths()?;
        Ok(self.search_paths.insert(paths))
    }

    fn expand_run_list(&mut self) -> Result<&RunListExpansion> {
        let expansion = match self.expansion.take() {
            Some(expansion) => expansion,
            None => {
                let paths = self.resolve_search_paths()?;
                expand_from_disk(&self.node, &paths)?
            }
        };
        Ok(self.expansion.insert(expansion))
    }

    fn setup_execution_context(&mut self, extra_files: &[PathBuf]) -> Result<ExecutionContext<'_>> {
        let paths = self.resolve_search_paths()?;

        let expansion = match self.expansion.take() {
            Some(expansion) => expansion,
            None => expand_from_disk(&self.node, &paths)?,
        };
        let expansion = self.expansion.insert(expansion);

        let units = match self.units.take() {
            Some(units) => units,
            None => UnitLoader::new().load(&paths.unit_paths)?,
        };
        let units = self.units.insert(units);

        ExecutionContextBuilder::new(self.events.as_ref()).build(
            &self.node,
            units,
            expansion,
            extra_files,
        )
    }
}

fn expand_from_disk(node: &Node, paths: &SearchPaths) -> Result<RunListExpansion> {
    let bundles = DiskBundleLoader::new(&paths.bundle_path);
    let expansion = RunListExpander::new().expand(node, &bundles)?;
    log::info!(
        "run list for {} expanded to {:?}",
        node.name,
        expansion.with_version_constraints_strings()
    );
    Ok(expansion)
}
