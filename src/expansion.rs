//! # Run List Expansion
//!
//! Expansion flattens a node's run list into the ordered list of recipes to
//! load. It is a pre-order walk: a recipe reference is appended as it is met,
//! and a bundle reference is replaced in place by the expansion of the
//! bundle's own run list before the walk moves on.
//!
//! Given `[role[a], recipe[x]]` where bundle `a` is `[recipe[y], recipe[z]]`,
//! the result is `[y, z, x]`.
//!
//! ## Duplicates and cycles
//!
//! - A recipe already in the output is skipped; its first position stands.
//!   `nginx` and `nginx::default` are the same recipe. A pin on the later
//!   reference is copied onto an unpinned earlier one; two different pins
//!   for the same recipe are a `StructuralLoad` error.
//! - A bundle that was already expanded on another branch (a diamond) is not
//!   expanded again.
//! - A bundle reachable from itself is a cycle and fails the expansion with
//!   `Error::StructuralLoad` naming the path, e.g. `a -> b -> a`.
//!
//! All three rules depend only on the run list and the bundle definitions, so
//! expanding the same input twice gives identical output.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::bundle::BundleLoader;
use crate::error::{Error, Result};
use crate::node::{Node, RunListItem, UnitRef};
use crate::unit::parse_version;

/// Constraint used for entries without a pinned version.
pub const DEFAULT_CONSTRAINT: &str = ">= 0.0.0";

/// Where bundle definitions were read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpansionSource {
    /// Bundles read from the synced local repository.
    Disk,
}

impl fmt::Display for ExpansionSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpansionSource::Disk => f.write_str("disk"),
        }
    }
}

/// One run-list item as it was visited, for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpansionNode {
    pub item: RunListItem,
    /// The item was a duplicate and contributed nothing.
    pub skipped: bool,
    pub children: Vec<ExpansionNode>,
}

/// The flattened result of expanding a run list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunListExpansion {
    entries: Vec<UnitRef>,
    bundles: Vec<String>,
    tree: Vec<ExpansionNode>,
    source: ExpansionSource,
}

impl RunListExpansion {
    /// Recipe references in load order.
    pub fn entries(&self) -> &[UnitRef] {
        &self.entries
    }

    /// Bundles applied, in the order they were first expanded.
    pub fn bundles(&self) -> &[String] {
        &self.bundles
    }

    /// The visited run-list tree, including skipped duplicates.
    pub fn tree(&self) -> &[ExpansionNode] {
        &self.tree
    }

    pub fn source(&self) -> ExpansionSource {
        self.source
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `(recipe, constraint)` pairs, e.g. `("nginx::server", "= 1.2.0")`.
    pub fn with_version_constraints(&self) -> Vec<(String, String)> {
        self.entries
            .iter()
            .map(|entry| {
                let constraint = match &entry.version {
                    Some(version) => format!("= {}", version),
                    None => DEFAULT_CONSTRAINT.to_string(),
                };
                (entry.qualified_name(), constraint)
            })
            .collect()
    }

    /// Entries as strings: `recipe@version` when pinned, otherwise `recipe`.
    pub fn with_version_constraints_strings(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| match &entry.version {
                Some(version) => format!("{}@{}", entry.qualified_name(), version),
                None => entry.qualified_name(),
            })
            .collect()
    }
}

#[derive(Default)]
struct Walk {
    entries: Vec<UnitRef>,
    /// `(unit, recipe)` to index in `entries`.
    seen_recipes: HashMap<(String, String), usize>,
    bundles: Vec<String>,
    applied: HashSet<String>,
    stack: Vec<String>,
}

/// Expands run lists against bundle definitions.
#[derive(Debug, Default, Clone, Copy)]
pub struct RunListExpander;

impl RunListExpander {
    pub fn new() -> Self {
        Self
    }

    /// Expands `node`'s run list, reading bundles through `bundles`.
    pub fn expand(&self, node: &Node, bundles: &dyn BundleLoader) -> Result<RunListExpansion> {
        let mut walk = Walk::default();
        let tree = expand_items(&node.run_list, &node.environment, bundles, &mut walk)?;

        log::debug!(
            "expanded run list for {} into {} recipes via {} bundles",
            node.name,
            walk.entries.len(),
            walk.bundles.len()
        );

        Ok(RunListExpansion {
            entries: walk.entries,
            bundles: walk.bundles,
            tree,
            source: ExpansionSource::Disk,
        })
    }
}

fn expand_items(
    items: &[RunListItem],
    environment: &str,
    bundles: &dyn BundleLoader,
    walk: &mut Walk,
) -> Result<Vec<ExpansionNode>> {
    let mut nodes = Vec::with_capacity(items.len());

    for item in items {
        let node = match item {
            RunListItem::Recipe(unit_ref) => {
                let key = (unit_ref.unit.clone(), unit_ref.recipe_name().to_string());
                let added = match walk.seen_recipes.get(&key).copied() {
                    Some(index) => {
                        merge_pin(&mut walk.entries[index], unit_ref)?;
                        false
                    }
                    None => {
                        walk.seen_recipes.insert(key, walk.entries.len());
                        walk.entries.push(unit_ref.clone());
                        true
                    }
                };
                ExpansionNode {
                    item: item.clone(),
                    skipped: !added,
                    children: Vec::new(),
                }
            }
            RunListItem::Role(name) => {
                if walk.stack.contains(name) {
                    let mut cycle = walk.stack.clone();
                    cycle.push(name.clone());
                    return Err(Error::structural(format!(
                        "bundle cycle detected: {}",
                        cycle.join(" -> ")
                    )));
                }

                if walk.applied.contains(name) {
                    ExpansionNode {
                        item: item.clone(),
                        skipped: true,
                        children: Vec::new(),
                    }
                } else {
                    let bundle = bundles.load_bundle(name)?;
                    walk.applied.insert(name.clone());
                    walk.bundles.push(name.clone());

                    walk.stack.push(name.clone());
                    let children =
                        expand_items(bundle.run_list_for(environment), environment, bundles, walk)?;
                    walk.stack.pop();

                    ExpansionNode {
                        item: item.clone(),
                        skipped: false,
                        children,
                    }
                }
            }
        };
        nodes.push(node);
    }

    Ok(nodes)
}

/// Applies a repeated reference's pin to the entry already in the output.
fn merge_pin(existing: &mut UnitRef, repeated: &UnitRef) -> Result<()> {
    let Some(pin) = &repeated.version else {
        return Ok(());
    };
    let Some(current) = existing.version.clone() else {
        existing.version = Some(pin.clone());
        return Ok(());
    };
    if parse_version(&current)? == parse_version(pin)? {
        return Ok(());
    }
    Err(Error::structural(format!(
        "run list requires {} at {} and {}",
        existing.qualified_name(),
        current,
        pin
    )))
}
