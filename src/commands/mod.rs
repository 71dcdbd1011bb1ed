//! # CLI Command Implementations
//!
//! One module per `policy-sync` subcommand. Each holds an `Args` struct
//! derived with `clap` and an `execute` function that loads the
//! configuration, calls into the `policy_sync` library and prints the result.

pub mod context;
pub mod expand;
pub mod sync;
pub mod units;

use std::path::Path;

use anyhow::Result;

use policy_sync::config::Config;
use policy_sync::node::Node;
use policy_sync::policy::GitPolicy;

/// Loads a node definition file.
pub fn load_node(path: &Path) -> Result<Node> {
    Node::from_file(path)
        .map_err(|e| anyhow::anyhow!("Failed to load node from {}: {}", path.display(), e))
}

/// Opens the git-backed policy for `node`, syncing unless `offline`.
pub fn open_policy(config: &Config, node: Node, offline: bool) -> GitPolicy {
    if offline {
        GitPolicy::offline(config, node)
    } else {
        GitPolicy::new(config, node)
    }
}
