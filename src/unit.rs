//! # Unit Loading
//!
//! A unit is a directory of configuration code and data: recipes,
//! attributes, libraries, templates and so on, plus a metadata file naming
//! its version and dependencies. The [`UnitLoader`] scans an ordered list of
//! search paths and builds a [`UnitCollection`] with one [`Unit`] per name.
//!
//! ## Precedence
//!
//! Search paths are scanned in order and the **first match wins**: once a
//! unit name is loaded, any unit with the same name found later (in the same
//! or a later search path) is ignored. With the default layout this means a
//! unit committed to the policy repository shadows a resolved dependency of
//! the same name. Shadowed units are logged at debug level, never treated as
//! an error. A unit directory that fails to load is skipped as shadowed when
//! its directory name is already loaded; otherwise the failure aborts the
//! load.
//!
//! ## Manifests
//!
//! Each unit's manifest maps a [`Segment`] to the sorted list of files in it.
//! Entries are first collected relative to the unit root (`recipes/default.rb`)
//! and then resolved to absolute paths under that root.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use semver::Version;
use serde::Deserialize;
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Metadata file names, in lookup order.
const METADATA_FILES: [&str; 3] = ["metadata.json", "metadata.yaml", "metadata.yml"];

/// A category of files inside a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Segment {
    Recipes,
    Attributes,
    Definitions,
    Libraries,
    Providers,
    Resources,
    Templates,
    Files,
    RootFiles,
}

impl Segment {
    pub const ALL: [Segment; 9] = [
        Segment::Recipes,
        Segment::Attributes,
        Segment::Definitions,
        Segment::Libraries,
        Segment::Providers,
        Segment::Resources,
        Segment::Templates,
        Segment::Files,
        Segment::RootFiles,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Segment::Recipes => "recipes",
            Segment::Attributes => "attributes",
            Segment::Definitions => "definitions",
            Segment::Libraries => "libraries",
            Segment::Providers => "providers",
            Segment::Resources => "resources",
            Segment::Templates => "templates",
            Segment::Files => "files",
            Segment::RootFiles => "root_files",
        }
    }

    /// Whether the segment holds executable code (only `.rb` files count).
    fn is_code(&self) -> bool {
        !matches!(
            self,
            Segment::Templates | Segment::Files | Segment::RootFiles
        )
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Manifest entries relative to a unit root, e.g. `recipes/default.rb`.
pub type RelativeManifest = BTreeMap<Segment, Vec<String>>;

/// Manifest entries resolved to absolute paths.
pub type Manifest = BTreeMap<Segment, Vec<PathBuf>>;

/// Parses a unit version, accepting the two-part `1.2` form as `1.2.0`.
pub fn parse_version(raw: &str) -> Result<Version> {
    let raw = raw.trim();
    let padded = match raw.matches('.').count() {
        0 => format!("{}.0.0", raw),
        1 => format!("{}.0", raw),
        _ => raw.to_string(),
    };
    Ok(Version::parse(&padded)?)
}

#[derive(Debug, Deserialize)]
struct Metadata {
    name: Option<String>,
    version: Option<String>,
    #[serde(default)]
    dependencies: BTreeMap<String, String>,
}

/// A loaded unit. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unit {
    pub name: String,
    pub version: Version,
    pub root: PathBuf,
    /// Declared dependencies: unit name to version constraint.
    pub dependencies: BTreeMap<String, String>,
    pub manifest: Manifest,
}

impl Unit {
    /// Files of one segment, in manifest order.
    pub fn segment(&self, segment: Segment) -> &[PathBuf] {
        self.manifest
            .get(&segment)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// The file for recipe `name`, if the unit has one.
    pub fn recipe_file(&self, name: &str) -> Option<&Path> {
        let wanted = self
            .root
            .join(Segment::Recipes.as_str())
            .join(format!("{}.rb", name));
        self.segment(Segment::Recipes)
            .iter()
            .find(|path| **path == wanted)
            .map(PathBuf::as_path)
    }

    /// Recipe names provided by this unit, sorted.
    pub fn recipe_names(&self) -> Vec<String> {
        let recipes_dir = self.root.join(Segment::Recipes.as_str());
        self.segment(Segment::Recipes)
            .iter()
            .filter(|path| path.parent() == Some(recipes_dir.as_path()))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()))
            .map(str::to_string)
            .collect()
    }
}

/// Units by name. Names are unique; iteration is sorted by name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitCollection {
    units: BTreeMap<String, Unit>,
}

impl UnitCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `unit` unless the name is taken. Returns whether it was added.
    fn insert_first(&mut self, unit: Unit) -> bool {
        if self.units.contains_key(&unit.name) {
            return false;
        }
        self.units.insert(unit.name.clone(), unit);
        true
    }

    pub fn get(&self, name: &str) -> Option<&Unit> {
        self.units.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Unit> {
        self.units.values()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }
}

impl FromIterator<Unit> for UnitCollection {
    fn from_iter<I: IntoIterator<Item = Unit>>(iter: I) -> Self {
        let mut collection = UnitCollection::new();
        for unit in iter {
            collection.insert_first(unit);
        }
        collection
    }
}

/// Resolves every relative manifest entry against `root`.
pub fn resolve_manifest(root: &Path, relative: &RelativeManifest) -> Manifest {
    relative
        .iter()
        .map(|(segment, entries)| {
            let paths = entries.iter().map(|entry| root.join(entry)).collect();
            (*segment, paths)
        })
        .collect()
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.starts_with('.'))
}

fn relative_entry(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    let parts: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    Some(parts.join("/"))
}

/// Collects the relative manifest of the unit rooted at `root`.
pub fn scan_manifest(root: &Path) -> Result<RelativeManifest> {
    let mut manifest = RelativeManifest::new();

    for segment in Segment::ALL {
        let entries = if segment == Segment::RootFiles {
            let mut files = Vec::new();
            for entry in std::fs::read_dir(root)? {
                let path = entry?.path();
                if path.is_file() && !is_hidden(&path) {
                    files.extend(relative_entry(root, &path));
                }
            }
            files.sort();
            files
        } else {
            let dir = root.join(segment.as_str());
            if !dir.is_dir() {
                continue;
            }
            let mut files = Vec::new();
            for entry in WalkDir::new(&dir)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !is_hidden(e.path()))
            {
                let entry = entry.map_err(|e| {
                    Error::structural(format!("cannot read {}: {}", dir.display(), e))
                })?;
                let path = entry.path();
                if !entry.file_type().is_file() {
                    continue;
                }
                if segment.is_code() && path.extension().and_then(|e| e.to_str()) != Some("rb")
                {
                    continue;
                }
                files.extend(relative_entry(root, path));
            }
            files
        };

        if !entries.is_empty() {
            manifest.insert(segment, entries);
        }
    }

    Ok(manifest)
}

fn read_metadata(root: &Path) -> Result<Metadata> {
    let path = METADATA_FILES
        .iter()
        .map(|name| root.join(name))
        .find(|path| path.is_file())
        .ok_or_else(|| {
            Error::structural(format!(
                "unit at {} has no metadata.json or metadata.yaml",
                root.display()
            ))
        })?;

    let content = std::fs::read_to_string(&path)?;
    let parsed = if path.extension().and_then(|e| e.to_str()) == Some("json") {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        serde_yaml::from_str(&content).map_err(|e| e.to_string())
    };

    parsed.map_err(|e| Error::structural(format!("malformed {}: {}", path.display(), e)))
}

fn dir_name_loaded(collection: &UnitCollection, dir: &Path) -> bool {
    dir.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| collection.contains(name))
}

/// Loads the single unit rooted at `root`.
pub fn load_unit(root: &Path) -> Result<Unit> {
    let metadata = read_metadata(root)?;

    let dir_name = root
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_string();
    let name = metadata.name.unwrap_or(dir_name);
    if name.is_empty() {
        return Err(Error::structural(format!(
            "unit at {} has no name",
            root.display()
        )));
    }

    let raw_version = metadata.version.ok_or_else(|| {
        Error::structural(format!("unit '{}' does not declare a version", name))
    })?;
    let version = parse_version(&raw_version).map_err(|e| {
        Error::structural(format!(
            "unit '{}' has invalid version '{}': {}",
            name, raw_version, e
        ))
    })?;

    let manifest = resolve_manifest(root, &scan_manifest(root)?);

    Ok(Unit {
        name,
        version,
        root: root.to_path_buf(),
        dependencies: metadata.dependencies,
        manifest,
    })
}

/// Scans search paths for units.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnitLoader;

impl UnitLoader {
    pub fn new() -> Self {
        Self
    }

    /// Loads every unit under `search_paths`, first match winning.
    ///
    /// Missing search paths are skipped. A malformed unit aborts the whole
    /// load.
    pub fn load<P: AsRef<Path>>(&self, search_paths: &[P]) -> Result<UnitCollection> {
        let mut collection = UnitCollection::new();

        for search_path in search_paths {
            let search_path = search_path.as_ref();
            if !search_path.is_dir() {
                log::debug!("skipping missing unit path {}", search_path.display());
                continue;
            }

            let mut unit_dirs = Vec::new();
            for entry in std::fs::read_dir(search_path)? {
                let path = entry?.path();
                if path.is_dir() && !is_hidden(&path) {
                    unit_dirs.push(path);
                }
            }
            unit_dirs.sort();

            for dir in unit_dirs {
                let unit = match load_unit(&dir) {
                    Ok(unit) => unit,
                    Err(err) if dir_name_loaded(&collection, &dir) => {
                        log::debug!(
                            "skipping unreadable unit at {}, shadowed by an earlier search path entry: {}",
                            dir.display(),
                            err
                        );
                        continue;
                    }
                    Err(err) => return Err(err),
                };
                let name = unit.name.clone();
                if !collection.insert_first(unit) {
                    log::debug!(
                        "unit '{}' at {} is shadowed by an earlier search path entry",
                        name,
                        dir.display()
                    );
                }
            }
        }

        Ok(collection)
    }
}
