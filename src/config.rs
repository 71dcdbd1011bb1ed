//! # Configuration
//!
//! This module defines the `policy-sync.yaml` configuration file and the
//! logic for parsing it. Every key is optional; anything left out falls back
//! to the values in [`crate::defaults`].
//!
//! ```yaml
//! repository: /var/lib/policy-sync/git
//! remote: origin
//! git: git
//! resolver: [librarian-chef, install]
//! ```
//!
//! The configuration is an explicit value threaded into the pipeline. Nothing
//! here is global, and nothing in the pipeline writes back to it.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::error::{Error, Result};

/// Settings for one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct Config {
    /// Local path of the policy repository clone.
    pub repository: PathBuf,
    /// Remote fetched from and checked out against.
    pub remote: String,
    /// Git executable.
    pub git: String,
    /// Dependency resolver argv, run from the repository root.
    pub resolver: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            repository: PathBuf::from(defaults::REPOSITORY_PATH),
            remote: defaults::REMOTE.to_string(),
            git: defaults::GIT_PROGRAM.to_string(),
            resolver: defaults::resolver_command(),
        }
    }
}

impl Config {
    /// Returns a copy with the repository path replaced.
    pub fn with_repository(mut self, repository: impl Into<PathBuf>) -> Self {
        self.repository = repository.into();
        self
    }

    fn validate(self) -> Result<Self> {
        if self.resolver.is_empty() {
            return Err(Error::ConfigParse {
                message: "resolver command is empty".to_string(),
                hint: Some("Set 'resolver:' to an argv such as [librarian-chef, install]".to_string()),
            });
        }
        if self.remote.is_empty() || self.remote.contains('/') {
            return Err(Error::ConfigParse {
                message: format!("invalid remote name '{}'", self.remote),
                hint: Some("Remote names must be non-empty and contain no '/'".to_string()),
            });
        }
        Ok(self)
    }
}

/// Parses a YAML string into a `Config`.
///
/// An empty document yields the default configuration.
pub fn parse(yaml_content: &str) -> Result<Config> {
    if yaml_content.trim().is_empty() {
        return Ok(Config::default());
    }

    let config: Config = serde_yaml::from_str(yaml_content).map_err(|e| {
        let message = e.to_string();
        let hint = message
            .contains("unknown field")
            .then(|| "Valid keys are: repository, remote, git, resolver".to_string());
        Error::ConfigParse { message, hint }
    })?;

    config.validate()
}

/// Reads and parses a configuration file.
pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(Error::Io)?;
    parse(&content)
}

/// Loads `path` if given, otherwise the default location if it exists,
/// otherwise the built-in defaults.
pub fn load(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => from_file(path),
        None => {
            let default_path = defaults::default_config_path();
            if default_path.is_file() {
                log::debug!("using configuration from {}", default_path.display());
                from_file(default_path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
repository: /srv/policy
remote: upstream
git: /usr/bin/git
resolver: [berks, vendor]
"#;
        let config = parse(yaml).unwrap();
        assert_eq!(config.repository, PathBuf::from("/srv/policy"));
        assert_eq!(config.remote, "upstream");
        assert_eq!(config.git, "/usr/bin/git");
        assert_eq!(config.resolver, vec!["berks", "vendor"]);
    }

    #[test]
    fn test_parse_partial_config_uses_defaults() {
        let config = parse("repository: /srv/policy\n").unwrap();
        assert_eq!(config.repository, PathBuf::from("/srv/policy"));
        assert_eq!(config.remote, defaults::REMOTE);
        assert_eq!(config.resolver, defaults::resolver_command());
    }

    #[test]
    fn test_documented_defaults_match_default_config() {
        let documented = "repository: /var/lib/policy-sync/git\nremote: origin\ngit: git\nresolver: [librarian-chef, install]\n";
        assert_eq!(parse(documented).unwrap(), Config::default());
    }

    #[test]
    fn test_parse_empty_config() {
        assert_eq!(parse("").unwrap(), Config::default());
        assert_eq!(parse("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_unknown_field_has_hint() {
        let err = parse("repo: /srv/policy\n").unwrap_err();
        match err {
            Error::ConfigParse { message, hint } => {
                assert!(message.contains("unknown field"));
                assert!(hint.unwrap().contains("repository"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_empty_resolver_rejected() {
        let err = parse("resolver: []\n").unwrap_err();
        assert!(matches!(err, Error::ConfigParse { .. }));
    }

    #[test]
    fn test_remote_with_slash_rejected() {
        let err = parse("remote: origin/main\n").unwrap_err();
        assert!(err.to_string().contains("invalid remote name"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("policy-sync.yaml");
        std::fs::write(&path, "remote: mirror\n").unwrap();

        let config = from_file(&path).unwrap();
        assert_eq!(config.remote, "mirror");
    }

    #[test]
    fn test_load_explicit_missing_file_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let result = load(Some(&dir.path().join("missing.yaml")));
        assert!(matches!(result, Err(Error::Io(_))));
    }

    #[test]
    fn test_with_repository() {
        let config = Config::default().with_repository("/tmp/repo");
        assert_eq!(config.repository, PathBuf::from("/tmp/repo"));
    }
}
