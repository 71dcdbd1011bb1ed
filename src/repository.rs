//! # Repository Synchronization
//!
//! This module provides the `RepositorySynchronizer`, which brings the local
//! policy repository clone to the exact state a node's environment requires
//! and then runs dependency resolution inside it.
//!
//! ## Design
//!
//! The synchronizer never shells out directly. Commands go through a
//! [`ProcessRunner`] and dependency resolution through a
//! [`DependencyResolver`], both injected as trait objects so tests can count
//! and fail invocations without touching git.
//!
//! Synchronization is idempotent within one pipeline run: after the first
//! successful `ensure_synced`, later calls return the recorded
//! [`SearchPaths`] without running anything. The synced flag lives only in
//! memory and is never persisted, so every run starts unsynced.
//!
//! The clone path is shared mutable state on disk. Two pipelines syncing the
//! same path at once can interleave `reset`/`clean` and corrupt the working
//! tree; callers must serialize runs against one path.

use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::defaults;
use crate::error::{Error, Result};
use crate::git::GitCommands;
use crate::process::{ProcessRunner, SystemProcessRunner};
use crate::resolver::{CommandResolver, DependencyResolver};

/// Search locations derived from a synced repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchPaths {
    /// Unit search paths, in precedence order.
    pub unit_paths: Vec<PathBuf>,
    /// Directory holding bundle definitions.
    pub bundle_path: PathBuf,
}

impl SearchPaths {
    /// The fixed layout below a repository root.
    pub fn for_repository(root: &Path) -> Self {
        Self {
            unit_paths: vec![
                root.join(defaults::UNITS_DIR),
                root.join(defaults::DEPENDENCY_CACHE_DIR),
            ],
            bundle_path: root.join(defaults::BUNDLES_DIR),
        }
    }
}

/// Sync state of the local clone for the current run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryState {
    path: PathBuf,
    synced: Option<SyncedState>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct SyncedState {
    environment: String,
    search_paths: SearchPaths,
}

impl RepositoryState {
    fn new(path: PathBuf) -> Self {
        Self { path, synced: None }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_synced(&self) -> bool {
        self.synced.is_some()
    }

    /// The environment the clone was synced against, if synced.
    pub fn environment(&self) -> Option<&str> {
        self.synced.as_ref().map(|s| s.environment.as_str())
    }

    pub fn search_paths(&self) -> Option<&SearchPaths> {
        self.synced.as_ref().map(|s| &s.search_paths)
    }
}

/// Brings a local clone in line with an environment's ref.
pub struct RepositorySynchronizer {
    runner: Box<dyn ProcessRunner>,
    resolver: Box<dyn DependencyResolver>,
    git: GitCommands,
    state: RepositoryState,
}

impl RepositorySynchronizer {
    /// Creates a synchronizer that runs real commands, as configured.
    pub fn new(config: &Config) -> Self {
        Self::with_operations(
            config,
            Box::new(SystemProcessRunner),
            Box::new(CommandResolver::new(config.resolver.clone())),
        )
    }

    /// Creates a synchronizer with custom `ProcessRunner` and
    /// `DependencyResolver` implementations.
    pub fn with_operations(
        config: &Config,
        runner: Box<dyn ProcessRunner>,
        resolver: Box<dyn DependencyResolver>,
    ) -> Self {
        Self {
            runner,
            resolver,
            git: GitCommands::new(config.git.clone(), config.remote.clone()),
            state: RepositoryState::new(config.repository.clone()),
        }
    }

    pub fn state(&self) -> &RepositoryState {
        &self.state
    }

    /// Syncs the clone to `<remote>/<environment>` and resolves dependencies,
    /// unless that already happened during this run.
    ///
    /// The sequence is fetch, hard reset, clean, checkout, then the resolver's
    /// install. The first failure aborts the rest and leaves the state
    /// unsynced; the clone is left however the last successful command left
    /// it.
    pub fn ensure_synced(&mut self, environment: &str) -> Result<&SearchPaths> {
        let synced = match self.state.synced.take() {
            Some(synced) => {
                if synced.environment != environment {
                    log::warn!(
                        "repository already synced to '{}' this run; ignoring request for '{}'",
                        synced.environment,
                        environment
                    );
                }
                synced
            }
            None => self.sync(environment)?,
        };

        Ok(&self.state.synced.insert(synced).search_paths)
    }

    fn sync(&self, environment: &str) -> Result<SyncedState> {
        if environment.trim().is_empty() {
            return Err(Error::Repository {
                message: "cannot sync to an empty environment name".to_string(),
            });
        }

        let root = self.state.path.as_path();
        if !root.is_dir() {
            return Err(Error::Repository {
                message: format!("repository path {} is not a directory", root.display()),
            });
        }

        log::info!(
            "syncing {} to {}",
            root.display(),
            crate::git::remote_ref(self.git.remote(), environment)
        );

        for argv in self.git.sync_sequence(environment) {
            self.runner.run_checked(&argv, root)?;
        }

        self.resolver.install(self.runner.as_ref(), root)?;

        Ok(SyncedState {
            environment: environment.to_string(),
            search_paths: SearchPaths::for_repository(root),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TerminationCause;
    use crate::process::TerminationResult;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    type Calls = Arc<Mutex<Vec<Vec<String>>>>;

    /// Fake runner recording every argv and failing the Nth call if asked
    struct MockRunner {
        calls: Calls,
        fail_on: Option<(usize, TerminationResult)>,
    }

    impl MockRunner {
        fn new() -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                fail_on: None,
            }
        }

        fn failing_at(index: usize, result: TerminationResult) -> Self {
            Self {
                calls: Arc::new(Mutex::new(Vec::new())),
                fail_on: Some((index, result)),
            }
        }
    }

    impl ProcessRunner for MockRunner {
        fn run(&self, argv: &[String], _working_dir: &Path) -> Result<TerminationResult> {
            let mut calls = self.calls.lock().unwrap();
            let index = calls.len();
            calls.push(argv.to_vec());
            match self.fail_on {
                Some((fail_index, result)) if fail_index == index => Ok(result),
                _ => Ok(TerminationResult::success()),
            }
        }
    }

    fn synchronizer(dir: &TempDir, runner: MockRunner) -> (RepositorySynchronizer, Calls) {
        let calls = runner.calls.clone();
        let config = Config::default().with_repository(dir.path());
        let sync = RepositorySynchronizer::with_operations(
            &config,
            Box::new(runner),
            Box::new(CommandResolver::default()),
        );
        (sync, calls)
    }

    #[test]
    fn test_sync_runs_sequence_then_resolver() {
        let dir = TempDir::new().unwrap();
        let (mut sync, calls) = synchronizer(&dir, MockRunner::new());

        sync.ensure_synced("production").unwrap();

        let calls = calls.lock().unwrap();
        assert_eq!(
            *calls,
            vec![
                vec!["git", "fetch", "origin"],
                vec!["git", "reset", "--hard"],
                vec!["git", "clean", "-fd"],
                vec!["git", "checkout", "origin/production"],
                vec!["librarian-chef", "install"],
            ]
        );
    }

    #[test]
    fn test_sync_is_idempotent_within_a_run() {
        let dir = TempDir::new().unwrap();
        let (mut sync, calls) = synchronizer(&dir, MockRunner::new());

        sync.ensure_synced("production").unwrap();
        sync.ensure_synced("production").unwrap();

        assert_eq!(calls.lock().unwrap().len(), 5);
        assert!(sync.state().is_synced());
    }

    #[test]
    fn test_second_sync_with_other_environment_is_noop() {
        let dir = TempDir::new().unwrap();
        let (mut sync, calls) = synchronizer(&dir, MockRunner::new());

        sync.ensure_synced("production").unwrap();
        sync.ensure_synced("staging").unwrap();

        assert_eq!(calls.lock().unwrap().len(), 5);
        assert_eq!(sync.state().environment(), Some("production"));
    }

    #[test]
    fn test_sync_records_search_paths() {
        let dir = TempDir::new().unwrap();
        let (mut sync, _) = synchronizer(&dir, MockRunner::new());

        let paths = sync.ensure_synced("production").unwrap().clone();
        assert_eq!(
            paths.unit_paths,
            vec![
                dir.path().join("units"),
                dir.path().join("tmp/dependency-cache/units"),
            ]
        );
        assert_eq!(paths.bundle_path, dir.path().join("bundles"));
        assert_eq!(sync.state().search_paths(), Some(&paths));
    }

    #[test]
    fn test_failure_aborts_remaining_commands() {
        let dir = TempDir::new().unwrap();
        let (mut sync, calls) =
            synchronizer(&dir, MockRunner::failing_at(1, TerminationResult::Exited(7)));

        let err = sync.ensure_synced("production").unwrap_err();

        match err {
            Error::CommandExecutionFailed { argv, cause } => {
                assert_eq!(argv, vec!["git", "reset", "--hard"]);
                assert_eq!(cause, TerminationCause::ExitedNonZero { code: 7 });
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(calls.lock().unwrap().len(), 2);
        assert!(!sync.state().is_synced());
    }

    #[test]
    fn test_signal_failure_maps_to_killed_by_signal() {
        let dir = TempDir::new().unwrap();
        let (mut sync, _) =
            synchronizer(&dir, MockRunner::failing_at(0, TerminationResult::Signaled(9)));

        let err = sync.ensure_synced("production").unwrap_err();
        assert_eq!(
            err.termination_cause(),
            Some(TerminationCause::KilledBySignal { signal: 9 })
        );
    }

    #[test]
    fn test_resolver_failure_leaves_unsynced_and_retry_reruns() {
        let dir = TempDir::new().unwrap();
        let (mut sync, calls) =
            synchronizer(&dir, MockRunner::failing_at(4, TerminationResult::Exited(1)));

        assert!(sync.ensure_synced("production").is_err());
        assert!(!sync.state().is_synced());

        // Nothing was recorded as done, so a new request starts over
        sync.ensure_synced("production").unwrap();
        assert_eq!(calls.lock().unwrap().len(), 10);
    }

    #[test]
    fn test_missing_repository_runs_nothing() {
        let dir = TempDir::new().unwrap();
        let runner = MockRunner::new();
        let calls = runner.calls.clone();
        let config = Config::default().with_repository(dir.path().join("absent"));
        let mut sync = RepositorySynchronizer::with_operations(
            &config,
            Box::new(runner),
            Box::new(CommandResolver::default()),
        );

        let err = sync.ensure_synced("production").unwrap_err();
        assert!(matches!(err, Error::Repository { .. }));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn test_empty_environment_rejected() {
        let dir = TempDir::new().unwrap();
        let (mut sync, calls) = synchronizer(&dir, MockRunner::new());

        assert!(matches!(
            sync.ensure_synced(""),
            Err(Error::Repository { .. })
        ));
        assert!(calls.lock().unwrap().is_empty());
    }
}
