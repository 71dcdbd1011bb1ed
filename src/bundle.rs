//! Bundle definitions and how they are read from disk.
//!
//! A bundle is a named, reusable group of run-list entries. On disk it is
//! `<bundles>/<name>.json`, `<name>.yaml` or `<name>.yml`, looked up in that
//! order:
//!
//! ```json
//! {
//!   "name": "webserver",
//!   "run_list": ["role[base]", "recipe[nginx]"],
//!   "env_run_lists": { "production": ["role[base]", "recipe[nginx::hardened]"] }
//! }
//! ```
//!
//! When the node's environment has an entry in `env_run_lists`, that list is
//! used instead of `run_list`. Other keys are ignored.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};
use crate::node::RunListItem;

const BUNDLE_EXTENSIONS: [&str; 3] = ["json", "yaml", "yml"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Bundle {
    pub name: String,
    #[serde(default)]
    pub run_list: Vec<RunListItem>,
    #[serde(default)]
    pub env_run_lists: BTreeMap<String, Vec<RunListItem>>,
}

impl Bundle {
    pub fn new(name: impl Into<String>, run_list: Vec<RunListItem>) -> Self {
        Self {
            name: name.into(),
            run_list,
            env_run_lists: BTreeMap::new(),
        }
    }

    /// The run list that applies in `environment`.
    pub fn run_list_for(&self, environment: &str) -> &[RunListItem] {
        self.env_run_lists
            .get(environment)
            .unwrap_or(&self.run_list)
    }
}

/// Capability to look up bundle definitions by name.
pub trait BundleLoader {
    fn load_bundle(&self, name: &str) -> Result<Bundle>;
}

/// Reads bundles from a directory of definition files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiskBundleLoader {
    path: PathBuf,
}

impl DiskBundleLoader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn definition_file(&self, name: &str) -> Option<PathBuf> {
        BUNDLE_EXTENSIONS
            .iter()
            .map(|ext| self.path.join(format!("{}.{}", name, ext)))
            .find(|path| path.is_file())
    }
}

impl BundleLoader for DiskBundleLoader {
    fn load_bundle(&self, name: &str) -> Result<Bundle> {
        if name.is_empty() || name.contains(['/', '\\']) || name.starts_with('.') {
            return Err(Error::structural(format!("invalid bundle name '{}'", name)));
        }

        let path = self.definition_file(name).ok_or_else(|| {
            Error::structural(format!(
                "bundle '{}' not found in {}",
                name,
                self.path.display()
            ))
        })?;

        let content = std::fs::read_to_string(&path)?;
        let parsed = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_str::<Bundle>(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str::<Bundle>(&content).map_err(|e| e.to_string())
        };
        let bundle = parsed
            .map_err(|e| Error::structural(format!("malformed {}: {}", path.display(), e)))?;

        if bundle.name != name {
            return Err(Error::structural(format!(
                "{} defines bundle '{}', expected '{}'",
                path.display(),
                bundle.name,
                name
            )));
        }

        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::UnitRef;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_json_bundle() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("base.json"),
            r#"{"name": "base", "json_class": "Chef::Role", "run_list": ["recipe[ntp]", "role[users]"]}"#,
        )
        .unwrap();

        let bundle = DiskBundleLoader::new(dir.path()).load_bundle("base").unwrap();

        assert_eq!(
            bundle.run_list,
            vec![
                RunListItem::Recipe(UnitRef::new("ntp")),
                RunListItem::Role("users".to_string()),
            ]
        );
    }

    #[test]
    fn test_load_yaml_bundle_with_env_run_lists() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("web.yml"),
            "name: web\nrun_list: [nginx]\nenv_run_lists:\n  production: [nginx, 'nginx::hardened']\n",
        )
        .unwrap();

        let bundle = DiskBundleLoader::new(dir.path()).load_bundle("web").unwrap();

        assert_eq!(bundle.run_list_for("staging").len(), 1);
        assert_eq!(bundle.run_list_for("production").len(), 2);
    }

    #[test]
    fn test_json_takes_precedence_over_yaml() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("db.json"), r#"{"name": "db", "run_list": ["pg"]}"#).unwrap();
        fs::write(dir.path().join("db.yaml"), "name: db\nrun_list: [mysql]\n").unwrap();

        let bundle = DiskBundleLoader::new(dir.path()).load_bundle("db").unwrap();
        assert_eq!(bundle.run_list, vec![RunListItem::Recipe(UnitRef::new("pg"))]);
    }

    #[test]
    fn test_missing_bundle_is_structural_error() {
        let dir = TempDir::new().unwrap();
        let err = DiskBundleLoader::new(dir.path())
            .load_bundle("nope")
            .unwrap_err();
        assert!(matches!(err, Error::StructuralLoad { .. }));
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_name_mismatch_is_structural_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"name": "b"}"#).unwrap();

        let err = DiskBundleLoader::new(dir.path()).load_bundle("a").unwrap_err();
        assert!(err.to_string().contains("expected 'a'"));
    }

    #[test]
    fn test_malformed_run_list_is_structural_error() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.json"), r#"{"name": "a", "run_list": ["role[]"]}"#).unwrap();

        let err = DiskBundleLoader::new(dir.path()).load_bundle("a").unwrap_err();
        assert!(matches!(err, Error::StructuralLoad { .. }));
    }

    #[test]
    fn test_path_like_names_rejected() {
        let loader = DiskBundleLoader::new("/nonexistent");
        for name in ["../secrets", "a/b", ".hidden", ""] {
            assert!(loader.load_bundle(name).is_err(), "{name:?} should be rejected");
        }
    }
}
