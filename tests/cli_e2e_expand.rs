//! End-to-end tests for the `expand` command.

mod common;
use common::prelude::*;

#[test]
fn test_expand_prints_constraints_in_order() {
    let fixture = TestFixture::new()
        .with_standard_repo()
        .with_file("web01.json", nodes::WEB);

    fixture
        .command()
        .args(["expand", "--offline", "--node", "web01.json"])
        .assert()
        .success()
        .stdout("ntp >= 0.0.0\nnginx::server >= 0.0.0\n");
}

#[test]
fn test_expand_pinned_version() {
    let fixture = TestFixture::new().with_standard_repo().with_file(
        "node.yaml",
        "name: db01\nrun_list:\n  - recipe[nginx@1.2.0]\n  - ntp\n",
    );

    fixture
        .command()
        .args(["expand", "--offline", "--node", "node.yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nginx = 1.2.0"))
        .stdout(predicate::str::contains("ntp >= 0.0.0"));
}

#[test]
fn test_expand_tree_shows_bundles() {
    let fixture = TestFixture::new()
        .with_standard_repo()
        .with_file("web01.json", nodes::WEB);

    fixture
        .command()
        .args(["expand", "--offline", "--tree", "--node", "web01.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("web01"))
        .stdout(predicate::str::contains("role[webserver]"))
        .stdout(predicate::str::contains("role[base]"))
        .stdout(predicate::str::contains("recipe[nginx::server]"));
}

#[test]
fn test_expand_cycle_fails() {
    let fixture = TestFixture::new()
        .with_standard_repo()
        .with_file("loop.json", nodes::CYCLIC);

    fixture
        .command()
        .args(["expand", "--offline", "--node", "loop.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("left -> right -> left"));
}

#[test]
fn test_expand_missing_bundle_fails() {
    let fixture = TestFixture::new()
        .with_standard_repo()
        .with_file("node.json", r#"{"name": "x", "run_list": ["role[nope]"]}"#);

    fixture
        .command()
        .args(["expand", "--offline", "--node", "node.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("bundle 'nope' not found"));
}

#[test]
fn test_expand_invalid_node_fails() {
    let fixture = TestFixture::new().with_file("node.json", r#"{"name": "x", "run_list": ["role[]"]}"#);

    fixture
        .command()
        .args(["expand", "--offline", "--node", "node.json"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to load node"));
}

#[test]
fn test_expand_syncs_before_expanding() {
    let fixture = TestFixture::new()
        .with_standard_repo()
        .with_file("web01.json", nodes::WEB);

    fixture
        .command()
        .args(["expand", "--node", "web01.json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("nginx::server"));
}
