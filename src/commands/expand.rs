//! # Expand Command Implementation
//!
//! Expands a node's run list through the repository's bundles and prints the
//! recipes in load order with their version constraints, or the bundle tree
//! with `--tree`.

use std::borrow::Cow;
use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use ptree::{print_tree, TreeItem};

use policy_sync::expansion::ExpansionNode;
use policy_sync::output::OutputConfig;
use policy_sync::policy::PolicySource;

use crate::cli::SettingsArgs;
use crate::commands::{load_node, open_policy};

/// Expand a node's run list
#[derive(Args, Debug)]
pub struct ExpandArgs {
    /// Node definition file (JSON or YAML).
    #[arg(short, long, value_name = "FILE")]
    pub node: PathBuf,

    /// Use the repository as it is on disk without syncing it.
    #[arg(long)]
    pub offline: bool,

    /// Print the run list as a tree of bundles instead of a flat list.
    #[arg(long)]
    pub tree: bool,
}

/// Execute the `expand` command.
pub fn execute(args: ExpandArgs, settings: &SettingsArgs, output: &OutputConfig) -> Result<()> {
    let config = settings.load()?;
    let node = load_node(&args.node)?;
    let mut policy = open_policy(&config, node, args.offline);

    let node_name = policy.node().name.clone();
    let expansion = policy
        .expand_run_list()
        .map_err(|e| anyhow::anyhow!("Failed to expand run list for {}: {}", node_name, e))?;

    if args.tree {
        let root = TreeNode {
            label: node_name,
            children: expansion.tree().iter().map(TreeNode::from).collect(),
        };
        print_tree(&root).map_err(|e| anyhow::anyhow!("Failed to display tree: {}", e))?;
        return Ok(());
    }

    for (recipe, constraint) in expansion.with_version_constraints() {
        println!("{} {}", output.name(recipe), output.detail(constraint));
    }

    Ok(())
}

/// Tree node structure for ptree visualization
#[derive(Clone)]
struct TreeNode {
    label: String,
    children: Vec<TreeNode>,
}

impl From<&ExpansionNode> for TreeNode {
    fn from(node: &ExpansionNode) -> Self {
        let label = if node.skipped {
            format!("{} (skipped)", node.item)
        } else {
            node.item.to_string()
        };
        Self {
            label,
            children: node.children.iter().map(TreeNode::from).collect(),
        }
    }
}

impl TreeItem for TreeNode {
    type Child = TreeNode;

    fn write_self<W: std::io::Write>(
        &self,
        f: &mut W,
        _style: &ptree::Style,
    ) -> std::io::Result<()> {
        write!(f, "{}", self.label)
    }

    fn children(&self) -> Cow<'_, [Self::Child]> {
        Cow::Borrowed(&self.children)
    }
}
