//! Dependency resolution.
//!
//! Only the invocation contract of the resolver matters here: it runs from
//! the synced repository root, and on success leaves resolved units under
//! [`DEPENDENCY_CACHE_DIR`](crate::defaults::DEPENDENCY_CACHE_DIR). A failure
//! is a nonzero exit or a signal, observed through the
//! [`ProcessRunner`].

use std::path::Path;

use crate::error::Result;
use crate::process::ProcessRunner;

/// Trait for dependency resolvers - allows swapping the tool or faking it in tests
pub trait DependencyResolver {
    /// Populates the dependency cache inside `repo_root`.
    fn install(&self, runner: &dyn ProcessRunner, repo_root: &Path) -> Result<()>;
}

/// Runs a fixed resolver argv, e.g. `librarian-chef install`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResolver {
    argv: Vec<String>,
}

impl CommandResolver {
    pub fn new(argv: Vec<String>) -> Self {
        Self { argv }
    }

    pub fn argv(&self) -> &[String] {
        &self.argv
    }
}

impl Default for CommandResolver {
    fn default() -> Self {
        Self::new(crate::defaults::resolver_command())
    }
}

impl DependencyResolver for CommandResolver {
    fn install(&self, runner: &dyn ProcessRunner, repo_root: &Path) -> Result<()> {
        log::info!("resolving dependencies with {:?}", self.argv.join(" "));
        runner.run_checked(&self.argv, repo_root)
    }
}
