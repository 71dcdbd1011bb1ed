//! Default values for policy-sync configuration.
//!
//! This module provides centralized default values and the fixed repository
//! layout, so the synchronizer, loader and CLI agree on them.

use std::path::PathBuf;

/// Where the policy repository clone lives unless configured otherwise.
pub const REPOSITORY_PATH: &str = "/var/lib/policy-sync/git";

/// Name of the remote fetched and checked out from.
pub const REMOTE: &str = "origin";

/// Git executable used for the sync sequence.
pub const GIT_PROGRAM: &str = "git";

/// Environment assumed for nodes that do not declare one.
pub const ENVIRONMENT: &str = "_default";

/// Primary unit search path, relative to the repository root.
pub const UNITS_DIR: &str = "units";

/// Resolved-dependency unit search path, relative to the repository root.
pub const DEPENDENCY_CACHE_DIR: &str = "tmp/dependency-cache/units";

/// Bundle definition path, relative to the repository root.
pub const BUNDLES_DIR: &str = "bundles";

/// Name of the optional configuration file.
pub const CONFIG_FILE_NAME: &str = "policy-sync.yaml";

/// Default dependency resolver invocation.
pub fn resolver_command() -> Vec<String> {
    vec!["librarian-chef".to_string(), "install".to_string()]
}

/// Returns the default configuration file location.
///
/// Uses the platform-appropriate config directory:
/// - Linux: `~/.config/policy-sync/policy-sync.yaml` (XDG Base Directory)
/// - macOS: `~/Library/Application Support/policy-sync/policy-sync.yaml`
///
/// Falls back to `policy-sync.yaml` in the current directory if the
/// platform config directory cannot be determined.
///
/// This can be overridden by the `--config` CLI flag or the
/// `POLICY_SYNC_CONFIG` environment variable.
pub fn default_config_path() -> PathBuf {
    match dirs::config_dir() {
        Some(dir) => dir.join("policy-sync").join(CONFIG_FILE_NAME),
        None => PathBuf::from(CONFIG_FILE_NAME),
    }
}
