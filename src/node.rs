//! # Nodes and Run Lists
//!
//! A [`Node`] is the immutable input to the pipeline: its name, the
//! environment that selects the repository ref, and an ordered run list.
//!
//! Run-list items use the conventional textual forms:
//!
//! - `recipe[nginx]`, `recipe[nginx::server]`, `recipe[nginx::server@1.2.0]`
//! - `role[webserver]`
//! - a bare `nginx` or `nginx::server` is a recipe reference
//!
//! A recipe reference without `::` names the unit's `default` recipe.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::defaults;
use crate::error::{Error, Result};

/// Recipe loaded when a reference names only the unit.
pub const DEFAULT_RECIPE: &str = "default";

/// A reference to one recipe of a unit, optionally pinned to a version.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UnitRef {
    pub unit: String,
    /// Explicit recipe name; `None` means the default recipe.
    pub recipe: Option<String>,
    /// Pinned unit version, e.g. `1.2.0`.
    pub version: Option<String>,
}

impl UnitRef {
    pub fn new(unit: impl Into<String>) -> Self {
        Self {
            unit: unit.into(),
            recipe: None,
            version: None,
        }
    }

    /// The recipe name to load, falling back to `default`.
    pub fn recipe_name(&self) -> &str {
        self.recipe.as_deref().unwrap_or(DEFAULT_RECIPE)
    }

    /// `unit` or `unit::recipe`, as written.
    pub fn qualified_name(&self) -> String {
        match &self.recipe {
            Some(recipe) => format!("{}::{}", self.unit, recipe),
            None => self.unit.clone(),
        }
    }
}

/// One entry of a run list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RunListItem {
    Recipe(UnitRef),
    Role(String),
}

fn item_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?:(?P<kind>recipe|role)\[(?P<inner>[^\[\]]+)\]|(?P<bare>[^\[\]\s]+))$")
            .expect("run list item pattern is valid")
    })
}

fn name_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_.\-]+$").expect("run list name pattern is valid")
    })
}

fn invalid_item(item: &str, reason: &str) -> Error {
    Error::structural(format!("invalid run list item '{}': {}", item, reason))
}

fn parse_unit_ref(item: &str, spec: &str) -> Result<UnitRef> {
    let (name, version) = match spec.split_once('@') {
        Some((name, version)) => (name, Some(version.trim())),
        None => (spec, None),
    };

    let (unit, recipe) = match name.split_once("::") {
        Some((unit, recipe)) => (unit, Some(recipe)),
        None => (name, None),
    };

    if !name_pattern().is_match(unit) {
        return Err(invalid_item(item, "bad unit name"));
    }
    if let Some(recipe) = recipe {
        if !name_pattern().is_match(recipe) {
            return Err(invalid_item(item, "bad recipe name"));
        }
    }
    if let Some(version) = version {
        crate::unit::parse_version(version).map_err(|_| invalid_item(item, "bad version"))?;
    }

    Ok(UnitRef {
        unit: unit.to_string(),
        recipe: recipe.map(str::to_string),
        version: version.map(str::to_string),
    })
}

impl FromStr for RunListItem {
    type Err = Error;

    fn from_str(item: &str) -> Result<Self> {
        let trimmed = item.trim();
        let captures = item_pattern()
            .captures(trimmed)
            .ok_or_else(|| invalid_item(item, "expected recipe[...] or role[...]"))?;

        if let Some(bare) = captures.name("bare") {
            return parse_unit_ref(item, bare.as_str()).map(RunListItem::Recipe);
        }

        let inner = captures.name("inner").map_or("", |m| m.as_str()).trim();
        match captures.name("kind").map(|m| m.as_str()) {
            Some("role") => {
                if !name_pattern().is_match(inner) {
                    return Err(invalid_item(item, "bad role name"));
                }
                Ok(RunListItem::Role(inner.to_string()))
            }
            _ => parse_unit_ref(item, inner).map(RunListItem::Recipe),
        }
    }
}

impl fmt::Display for RunListItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunListItem::Role(name) => write!(f, "role[{}]", name),
            RunListItem::Recipe(unit_ref) => {
                write!(f, "recipe[{}", unit_ref.qualified_name())?;
                if let Some(version) = &unit_ref.version {
                    write!(f, "@{}", version)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl Serialize for RunListItem {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RunListItem {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Parses a list of textual run-list items.
pub fn parse_run_list<S: AsRef<str>>(items: &[S]) -> Result<Vec<RunListItem>> {
    items.iter().map(|item| item.as_ref().parse()).collect()
}

fn default_environment() -> String {
    defaults::ENVIRONMENT.to_string()
}

/// The machine a pipeline run is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(rename = "chef_environment", alias = "environment", default = "default_environment")]
    pub environment: String,
    #[serde(default)]
    pub run_list: Vec<RunListItem>,
}

impl Node {
    pub fn new(
        name: impl Into<String>,
        environment: impl Into<String>,
        run_list: Vec<RunListItem>,
    ) -> Self {
        Self {
            name: name.into(),
            environment: environment.into(),
            run_list,
        }
    }

    /// Loads a node from a `.json`, `.yaml` or `.yml` file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("yaml") | Some("yml") => Ok(serde_yaml::from_str(&content)?),
            _ => Ok(serde_json::from_str(&content)?),
        }
    }
}
