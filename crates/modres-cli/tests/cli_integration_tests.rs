//! CLI integration tests
//!
//! Drive the `modres` binary against a registry laid out in a temp directory.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

fn publish(registry: &Path, name: &str, version: &str, deps: &[(&str, &str)]) {
    let dir = registry.join("modules").join(name).join(version);
    fs::create_dir_all(&dir).unwrap();
    let mut text = format!("[module]\nname = \"{name}\"\nversion = \"{version}\"\n");
    for (dep, dep_version) in deps {
        text.push_str(&format!(
            "\n[[deps]]\nname = \"{dep}\"\nversion = \"{dep_version}\"\n"
        ));
    }
    fs::write(dir.join("MODULE.toml"), text).unwrap();
}

/// Workspace with root `aaa@0.1 -> bbb@1.0 -> ccc@2.0`
fn setup_workspace() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let registry = temp_dir.path().join("registry");
    publish(&registry, "bbb", "1.0", &[("ccc", "2.0")]);
    publish(&registry, "ccc", "2.0", &[]);
    fs::write(
        temp_dir.path().join("MODULE.toml"),
        "[module]\nname = \"aaa\"\nversion = \"0.1\"\n\n[[deps]]\nname = \"bbb\"\nversion = \"1.0\"\n",
    )
    .unwrap();
    fs::write(
        temp_dir.path().join("modres.toml"),
        "registries = [\"registry\"]\n",
    )
    .unwrap();
    temp_dir
}

fn modres(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_modres"))
        .current_dir(dir)
        .env("RUST_LOG", "off")
        .args(args)
        .output()
        .expect("Failed to execute CLI")
}

#[test]
fn test_cli_resolve_lists_live_modules() {
    let temp_dir = setup_workspace();

    let output = modres(temp_dir.path(), &["resolve"]);

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines, vec!["bbb~1.0 (registry)", "ccc~2.0 (registry)"]);
}

#[test]
fn test_cli_resolve_json() {
    let temp_dir = setup_workspace();

    let output = modres(temp_dir.path(), &["resolve", "--json"]);

    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["root"], "aaa");
    assert_eq!(value["modules"][1]["canonical_name"], "ccc~2.0");
    assert_eq!(value["modules"][1]["version"], "2.0");
    assert_eq!(value["warnings"].as_array().unwrap().len(), 0);
}

#[test]
fn test_cli_repo_spec_prints_local_repository() {
    let temp_dir = setup_workspace();

    let output = modres(temp_dir.path(), &["repo-spec", "ccc~2.0"]);

    assert!(output.status.success());
    let spec: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(spec["rule_class"], "local_repository");
    assert_eq!(spec["attributes"]["name"], "ccc~2.0");
}

#[test]
fn test_cli_repo_spec_unknown_name_fails() {
    let temp_dir = setup_workspace();

    let output = modres(temp_dir.path(), &["repo-spec", "zzz"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: no repository named 'zzz'"));
}

#[test]
fn test_cli_registry_flag_replaces_config() {
    let temp_dir = setup_workspace();
    let other = temp_dir.path().join("other");
    publish(&other, "bbb", "1.0", &[]);

    let output = modres(
        temp_dir.path(),
        &["resolve", "--registry", other.to_str().unwrap()],
    );

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(stdout.lines().count(), 1);
    assert!(stdout.starts_with("bbb~1.0"));
}

#[test]
fn test_cli_missing_dependency_reports_error() {
    let temp_dir = setup_workspace();
    fs::remove_dir_all(temp_dir.path().join("registry/modules/ccc")).unwrap();

    let output = modres(temp_dir.path(), &["resolve"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error:"));
    assert!(stderr.contains("ccc"));
}

#[test]
fn test_cli_without_local_registry_fails_early() {
    let temp_dir = setup_workspace();
    fs::remove_file(temp_dir.path().join("modres.toml")).unwrap();

    let output = modres(temp_dir.path(), &["resolve"]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Error: no usable registry"));
    assert!(stderr.contains("https://bcr.bazel.build"));
    assert!(stderr.contains("--registry"));
}
