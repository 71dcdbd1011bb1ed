//! # Policy Sync Library
//!
//! This library keeps a local clone of a git-backed configuration policy
//! repository in step with a node's environment, and turns the node's run list
//! into the ordered set of recipes and support files a configuration run
//! loads. It is used by the `policy-sync` command-line tool but the pipeline
//! stages are usable on their own.
//!
//! ## Quick Example
//!
//! ```
//! use policy_sync::node::{parse_run_list, Node};
//!
//! let run_list = parse_run_list(&["role[base]", "recipe[nginx::server@1.2.0]"]).unwrap();
//! let node = Node::new("web01", "production", run_list);
//!
//! assert_eq!(node.run_list.len(), 2);
//! assert_eq!(node.run_list[1].to_string(), "recipe[nginx::server@1.2.0]");
//! ```
//!
//! ## Core Concepts
//!
//! - **Repository sync (`repository`, `git`, `process`, `resolver`)**: brings the
//!   working copy to the environment's branch with a fixed git command
//!   sequence and then installs resolved dependencies.
//! - **Units (`unit`)**: versioned directories of recipes and support files,
//!   loaded from the repository's search paths.
//! - **Bundles and expansion (`bundle`, `expansion`)**: named groups of
//!   run-list entries, flattened into an ordered, duplicate-free recipe list.
//! - **Execution context (`context`)**: the activation order of units and
//!   files for one run.
//! - **Policy sources (`policy`)**: the [`policy::PolicySource`] capability and
//!   its git-backed implementation, which drives the stages above in order.
//!
//! ## Execution Flow
//!
//! 1.  **Sync**: fetch, reset, clean and check out `<remote>/<environment>`.
//! 2.  **Resolve**: run the dependency resolver in the repository root.
//! 3.  **Load**: read units from the primary and dependency-cache paths.
//! 4.  **Expand**: flatten the node's run list through bundle definitions.
//! 5.  **Build**: activate units and files in load order.

pub mod bundle;
pub mod config;
pub mod context;
pub mod defaults;
pub mod error;
pub mod expansion;
pub mod git;
pub mod node;
pub mod output;
pub mod policy;
pub mod process;
pub mod repository;
pub mod resolver;
pub mod unit;
