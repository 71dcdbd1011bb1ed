//! Shared test utilities for CLI end-to-end tests.
//!
//! ## Usage
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new().with_standard_repo();
//!     fixture.command().args(["units", "--offline"]).assert().success();
//! }
//! ```

use std::path::{Path, PathBuf};

use assert_fs::prelude::*;

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::nodes;
    pub use super::TestFixture;
}

/// Node definitions used across tests.
#[allow(dead_code)]
pub mod nodes {
    /// Runs the `webserver` bundle.
    pub const WEB: &str = r#"{
  "name": "web01",
  "chef_environment": "production",
  "run_list": ["role[webserver]"]
}"#;

    /// Pins `nginx` to a version the repository does not have.
    pub const BAD_PIN: &str = r#"{
  "name": "web02",
  "run_list": ["recipe[nginx@9.9.9]"]
}"#;

    /// Runs a bundle that includes itself through another bundle.
    pub const CYCLIC: &str = r#"{
  "name": "loop01",
  "run_list": ["role[left]"]
}"#;
}

/// A temporary directory holding a policy repository under `repo/` and a
/// `policy-sync.yaml` pointing at it.
///
/// The config uses `true` for git and the resolver, so syncing succeeds
/// without a remote.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

impl TestFixture {
    pub fn new() -> Self {
        let fixture = Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        };
        fixture
            .temp_dir
            .child("repo")
            .create_dir_all()
            .expect("Failed to create repo directory");
        let config = format!(
            "repository: '{}'\ngit: 'true'\nresolver: ['true']\n",
            fixture.repo_path().display()
        );
        fixture.with_file("policy-sync.yaml", &config)
    }

    /// Replaces the config file.
    #[allow(dead_code)]
    pub fn with_config(self, content: &str) -> Self {
        self.with_file("policy-sync.yaml", content)
    }

    /// Adds a file relative to the fixture root.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.temp_dir
            .child(path)
            .write_str(content)
            .expect("Failed to write file");
        self
    }

    /// Adds a file relative to the repository root.
    pub fn with_repo_file(self, path: &str, content: &str) -> Self {
        self.with_file(&format!("repo/{}", path), content)
    }

    /// A repository with two primary units, one resolved dependency and a
    /// few bundles.
    ///
    /// - `nginx` 1.2.0 depends on `openssl`, has `default` and `server`
    ///   recipes and a library file.
    /// - `ntp` 0.5.0 has a `default` recipe and an attributes file.
    /// - `openssl` 3.0.0 sits in the dependency cache.
    /// - `webserver` runs `base` then `nginx::server`; `base` runs `ntp`.
    /// - `left` and `right` include each other.
    #[allow(dead_code)]
    pub fn with_standard_repo(self) -> Self {
        self.with_repo_file(
            "units/nginx/metadata.json",
            r#"{"name": "nginx", "version": "1.2.0", "dependencies": {"openssl": ">= 3.0"}}"#,
        )
        .with_repo_file("units/nginx/recipes/default.rb", "package 'nginx'\n")
        .with_repo_file("units/nginx/recipes/server.rb", "service 'nginx'\n")
        .with_repo_file("units/nginx/libraries/helpers.rb", "module Helpers; end\n")
        .with_repo_file("units/ntp/metadata.yaml", "name: ntp\nversion: 0.5.0\n")
        .with_repo_file("units/ntp/recipes/default.rb", "package 'ntp'\n")
        .with_repo_file("units/ntp/attributes/default.rb", "default['ntp'] = {}\n")
        .with_repo_file(
            "tmp/dependency-cache/units/openssl/metadata.json",
            r#"{"name": "openssl", "version": "3.0.0"}"#,
        )
        .with_repo_file("tmp/dependency-cache/units/openssl/recipes/default.rb", "")
        .with_repo_file(
            "bundles/webserver.json",
            r#"{"name": "webserver", "run_list": ["role[base]", "recipe[nginx::server]"]}"#,
        )
        .with_repo_file("bundles/base.yaml", "name: base\nrun_list:\n  - recipe[ntp]\n")
        .with_repo_file("bundles/left.json", r#"{"name": "left", "run_list": ["role[right]"]}"#)
        .with_repo_file("bundles/right.json", r#"{"name": "right", "run_list": ["role[left]"]}"#)
    }

    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn repo_path(&self) -> PathBuf {
        self.temp_dir.path().join("repo")
    }

    pub fn config_path(&self) -> PathBuf {
        self.temp_dir.path().join("policy-sync.yaml")
    }

    /// Create a command running in this fixture's directory with its config
    /// and colors off.
    pub fn command(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("policy-sync");
        cmd.current_dir(self.path())
            .env_remove("POLICY_SYNC_CONFIG")
            .env_remove("POLICY_SYNC_REPOSITORY")
            .env_remove("RUST_LOG")
            .arg("--color")
            .arg("never")
            .arg("--config")
            .arg(self.config_path());
        cmd
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}
