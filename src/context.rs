//! # Execution Context
//!
//! The [`ExecutionContextBuilder`] turns a loaded [`UnitCollection`] and a
//! [`RunListExpansion`] into the [`ExecutionContext`] handed to the execution
//! engine. Building a context activates unit code, meaning it records which
//! files the engine must evaluate and in what order. Nothing is executed
//! here.
//!
//! ## Load order
//!
//! 1. **Unit order**: every unit named by the expansion, in expansion order,
//!    each preceded depth-first by its metadata dependencies. A unit appears
//!    once, at its first position.
//! 2. **Support files**: for each segment in `libraries`, `attributes`,
//!    `definitions`, `resources`, `providers` order, that segment's files of
//!    every unit in unit order.
//! 3. **Recipes**: the recipe file of each expansion entry, in expansion order.
//! 4. **Extra files**: explicitly named files, in the order given, so a one-off
//!    run can extend or override the resolved set.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::expansion::RunListExpansion;
use crate::node::{Node, UnitRef};
use crate::unit::{parse_version, Segment, Unit, UnitCollection};

/// Segments activated before any recipe, in activation order.
const SUPPORT_SEGMENTS: [Segment; 5] = [
    Segment::Libraries,
    Segment::Attributes,
    Segment::Definitions,
    Segment::Resources,
    Segment::Providers,
];

/// What a loaded file is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadKind {
    Support(Segment),
    Recipe,
    ExtraFile,
}

impl fmt::Display for LoadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadKind::Support(segment) => write!(f, "{}", segment),
            LoadKind::Recipe => f.write_str("recipe"),
            LoadKind::ExtraFile => f.write_str("extra"),
        }
    }
}

/// A file activated in the context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedFile {
    pub kind: LoadKind,
    /// Owning unit; `None` for extra files.
    pub unit: Option<String>,
    pub path: PathBuf,
}

/// Receives notifications as the context is assembled.
pub trait EventSink {
    fn unit_activated(&self, _unit: &Unit) {}

    fn file_loaded(&self, _file: &LoadedFile) {}
}

/// Discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {}

/// Reports events through the `log` facade at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEventSink;

impl EventSink for LogEventSink {
    fn unit_activated(&self, unit: &Unit) {
        log::debug!("activated unit {} {}", unit.name, unit.version);
    }

    fn file_loaded(&self, file: &LoadedFile) {
        log::debug!("loaded {} file {}", file.kind, file.path.display());
    }
}

/// Everything the execution engine needs for one run.
pub struct ExecutionContext<'a> {
    node: &'a Node,
    units: &'a UnitCollection,
    expansion: &'a RunListExpansion,
    events: &'a dyn EventSink,
    unit_order: Vec<String>,
    loaded: Vec<LoadedFile>,
}

impl<'a> ExecutionContext<'a> {
    pub fn node(&self) -> &'a Node {
        self.node
    }

    pub fn units(&self) -> &'a UnitCollection {
        self.units
    }

    pub fn expansion(&self) -> &'a RunListExpansion {
        self.expansion
    }

    /// Activated units, dependencies first.
    pub fn unit_order(&self) -> &[String] {
        &self.unit_order
    }

    /// Every activated file, in load order.
    pub fn loaded_files(&self) -> &[LoadedFile] {
        &self.loaded
    }

    /// Loaded files of one kind, in load order.
    pub fn files_of(&self, kind: LoadKind) -> impl Iterator<Item = &Path> + '_ {
        self.loaded
            .iter()
            .filter(move |file| file.kind == kind)
            .map(|file| file.path.as_path())
    }

    fn push(&mut self, kind: LoadKind, unit: Option<&str>, path: &Path) {
        let file = LoadedFile {
            kind,
            unit: unit.map(str::to_string),
            path: path.to_path_buf(),
        };
        self.events.file_loaded(&file);
        self.loaded.push(file);
    }

    fn unit(&self, name: &str) -> Result<&'a Unit> {
        self.units.get(name).ok_or_else(|| {
            Error::structural(format!("unit '{}' is not in the loaded collection", name))
        })
    }

    /// Appends `name` and, first, its dependencies to the unit order.
    fn activate_unit(&mut self, name: &str, seen: &mut HashSet<String>) -> Result<()> {
        if !seen.insert(name.to_string()) {
            return Ok(());
        }

        let unit = self.unit(name)?;
        for dependency in unit.dependencies.keys() {
            if !self.units.contains(dependency) {
                return Err(Error::structural(format!(
                    "unit '{}' depends on '{}', which is not in the loaded collection",
                    name, dependency
                )));
            }
            self.activate_unit(dependency, seen)?;
        }

        self.events.unit_activated(unit);
        self.unit_order.push(unit.name.clone());
        Ok(())
    }

    fn check_pin(unit: &Unit, entry: &UnitRef) -> Result<()> {
        if let Some(raw) = &entry.version {
            let pinned = parse_version(raw)?;
            if pinned != unit.version {
                return Err(Error::structural(format!(
                    "run list pins {}@{} but loaded unit '{}' is version {}",
                    entry.qualified_name(),
                    raw,
                    unit.name,
                    unit.version
                )));
            }
        }
        Ok(())
    }

    fn load_expansion(&mut self) -> Result<()> {
        let expansion = self.expansion;

        let mut seen = HashSet::new();
        for entry in expansion.entries() {
            let unit = self.unit(&entry.unit)?;
            Self::check_pin(unit, entry)?;
            self.activate_unit(&entry.unit, &mut seen)?;
        }

        for segment in SUPPORT_SEGMENTS {
            for index in 0..self.unit_order.len() {
                let unit = self.unit(&self.unit_order[index])?;
                for path in unit.segment(segment) {
                    self.push(LoadKind::Support(segment), Some(unit.name.as_str()), path);
                }
            }
        }

        for entry in expansion.entries() {
            let unit = self.unit(&entry.unit)?;
            let path = unit.recipe_file(entry.recipe_name()).ok_or_else(|| {
                Error::structural(format!(
                    "unit '{}' has no recipe '{}'",
                    unit.name,
                    entry.recipe_name()
                ))
            })?;
            self.push(LoadKind::Recipe, Some(unit.name.as_str()), path);
        }

        Ok(())
    }

    /// Loads one explicitly named file after everything else.
    pub fn load_recipe_file(&mut self, path: &Path) -> Result<()> {
        if !path.is_file() {
            return Err(Error::structural(format!(
                "recipe file {} does not exist",
                path.display()
            )));
        }
        self.push(LoadKind::ExtraFile, None, path);
        Ok(())
    }
}

/// Builds execution contexts.
pub struct ExecutionContextBuilder<'e> {
    events: &'e dyn EventSink,
}

impl<'e> ExecutionContextBuilder<'e> {
    pub fn new(events: &'e dyn EventSink) -> Self {
        Self { events }
    }

    /// Builds a fresh context: expansion units and recipes first, then
    /// `extra_files` in order.
    pub fn build<'a>(
        &self,
        node: &'a Node,
        units: &'a UnitCollection,
        expansion: &'a RunListExpansion,
        extra_files: &[PathBuf],
    ) -> Result<ExecutionContext<'a>>
    where
        'e: 'a,
    {
        let mut context = ExecutionContext {
            node,
            units,
            expansion,
            events: self.events,
            unit_order: Vec::new(),
            loaded: Vec::new(),
        };

        context.load_expansion()?;
        for file in extra_files {
            context.load_recipe_file(file)?;
        }

        Ok(context)
    }
}

impl Default for ExecutionContextBuilder<'static> {
    fn default() -> Self {
        Self::new(&NullEventSink)
    }
}
