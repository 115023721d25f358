use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;

fn write(dir: &Path, name: &str, text: &str) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("failed to create fixture dir");
    }
    fs::write(&path, text).expect("failed to write fixture");
    path
}

fn run(args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_yaml-include"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("failed to run yaml-include")
}

fn stdout_json(output: &Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout should be JSON")
}

/// Three-file project: main includes a and b.
fn write_project(dir: &Path) -> PathBuf {
    write(dir, "a.yaml", "name: a\nshared: [1]\n");
    write(dir, "b.yaml", "shared: [2]\nowner: b\n");
    write(dir, "main.yaml", "includes: [a.yaml, b.yaml]\nname: main\n")
}

// ---------------------------------------------------------------------------
// resolve
// ---------------------------------------------------------------------------

#[test]
fn resolve_prints_merged_json() {
    let dir = tempfile::tempdir().unwrap();
    let main = write_project(dir.path());

    let out = run(&["resolve", main.to_str().unwrap(), "--format", "json"]);
    assert!(out.status.success(), "resolve should succeed");
    assert_eq!(
        stdout_json(&out),
        serde_json::json!({"name": "main", "shared": [1, 2], "owner": "b"})
    );
}

#[test]
fn resolve_defaults_to_yaml() {
    let dir = tempfile::tempdir().unwrap();
    let main = write_project(dir.path());

    let out = run(&["resolve", main.to_str().unwrap()]);
    assert!(out.status.success());
    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains("name: main"));
    assert!(stdout.contains("owner: b"));
    assert!(!stdout.contains("includes"));
}

#[test]
fn resolve_writes_output_file() {
    let dir = tempfile::tempdir().unwrap();
    let main = write_project(dir.path());
    let target = dir.path().join("out/merged.json");

    let out = run(&[
        "resolve",
        main.to_str().unwrap(),
        "--format",
        "json",
        "--output",
        target.to_str().unwrap(),
    ]);
    assert!(out.status.success());
    assert!(out.stdout.is_empty());

    let raw = fs::read_to_string(&target).expect("output file should exist");
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value["owner"], "b");
}

#[test]
fn resolve_missing_root_is_empty_unless_strict() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("absent.yaml");

    let out = run(&["resolve", missing.to_str().unwrap(), "--format", "json"]);
    assert!(out.status.success());
    assert_eq!(stdout_json(&out), serde_json::json!({}));
    assert!(String::from_utf8_lossy(&out.stderr).contains("warning:"));

    let out = run(&["resolve", missing.to_str().unwrap(), "--strict"]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("error:"));
}

#[test]
fn resolve_reports_cycle() {
    let dir = tempfile::tempdir().unwrap();
    let a = write(dir.path(), "a.yaml", "includes: [b.yaml]\n");
    write(dir.path(), "b.yaml", "includes: [a.yaml]\n");

    let out = run(&["resolve", a.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("circular include"), "stderr: {stderr}");
}

#[test]
fn resolve_broken_include_prints_snippet() {
    let dir = tempfile::tempdir().unwrap();
    let main = write(dir.path(), "main.yaml", "includes: [broken.yaml]\n");
    write(dir.path(), "broken.yaml", "ok: 1\nbad: [1, 2\n");

    let out = run(&["resolve", main.to_str().unwrap()]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("| bad: [1, 2"), "stderr: {stderr}");
    assert!(stderr.contains("broken.yaml"));
    assert!(stderr.contains("main.yaml"));
}

#[test]
fn resolve_honors_config_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(
        dir.path(),
        "resolver.yaml",
        "includes_key: extends\nmerge:\n  array_policy: value_from_second\n",
    );
    write(dir.path(), "base.yaml", "tags: [base]\n");
    let main = write(dir.path(), "main.yaml", "extends: [base.yaml]\ntags: [main]\n");

    let out = run(&[
        "resolve",
        main.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert!(out.status.success());
    assert_eq!(stdout_json(&out), serde_json::json!({"tags": ["main"]}));
}

// ---------------------------------------------------------------------------
// parse
// ---------------------------------------------------------------------------

#[test]
fn parse_keeps_includes_directive() {
    let dir = tempfile::tempdir().unwrap();
    let main = write_project(dir.path());

    let out = run(&["parse", main.to_str().unwrap(), "--format", "json"]);
    assert!(out.status.success());
    assert_eq!(
        stdout_json(&out),
        serde_json::json!({"includes": ["a.yaml", "b.yaml"], "name": "main"})
    );
}

#[test]
fn parse_error_shows_numbered_lines() {
    let dir = tempfile::tempdir().unwrap();
    let bad = write(dir.path(), "bad.yaml", "first: 1\nsecond: {a: 1\n");

    let out = run(&["parse", bad.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("| second: {a: 1"), "stderr: {stderr}");
    assert!(stderr.contains("error: Failed to parse"));
}

#[test]
fn parse_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = run(&["parse", dir.path().join("nope.yaml").to_str().unwrap()]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Failed to read"));
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

#[test]
fn merge_uses_default_policies() {
    let dir = tempfile::tempdir().unwrap();
    let first = write(dir.path(), "first.yaml", "a: 1\nlist: [1]\nnested: {x: 1, y: 1}\n");
    let second = write(dir.path(), "second.yaml", "a: 2\nlist: [2]\nnested: {y: 2}\n");

    let out = run(&[
        "merge",
        first.to_str().unwrap(),
        second.to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert!(out.status.success());
    assert_eq!(
        stdout_json(&out),
        serde_json::json!({"a": 2, "list": [1, 2], "nested": {"x": 1, "y": 2}})
    );
}

#[test]
fn merge_with_custom_policies() {
    let dir = tempfile::tempdir().unwrap();
    let first = write(dir.path(), "first.yaml", "a: 1\nlist: [1]\nnested: {x: 1}\n");
    let second = write(dir.path(), "second.yaml", "a: 2\nlist: [2]\nnested: {y: 2}\n");

    let out = run(&[
        "merge",
        first.to_str().unwrap(),
        second.to_str().unwrap(),
        "--key-policy",
        "first",
        "--array-policy",
        "prepend",
        "--shallow",
        "--format",
        "json",
    ]);
    assert!(out.status.success());
    assert_eq!(
        stdout_json(&out),
        serde_json::json!({"a": 1, "list": [2, 1], "nested": {"x": 1}})
    );
}

#[test]
fn merge_conflict_fails_under_error_policy() {
    let dir = tempfile::tempdir().unwrap();
    let first = write(dir.path(), "first.yaml", "server: {port: 80}\n");
    let second = write(dir.path(), "second.yaml", "server: {port: 8080}\n");

    let out = run(&[
        "merge",
        first.to_str().unwrap(),
        second.to_str().unwrap(),
        "--key-policy",
        "error",
    ]);
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("server.port"), "stderr: {stderr}");
}

#[test]
fn resolve_accepts_comment_only_config() {
    let dir = tempfile::tempdir().unwrap();
    let config = write(dir.path(), "resolver.yaml", "# every setting at its default\n");
    let main = write_project(dir.path());

    let out = run(&[
        "resolve",
        main.to_str().unwrap(),
        "--config",
        config.to_str().unwrap(),
        "--format",
        "json",
    ]);
    assert!(out.status.success(), "stderr: {}", String::from_utf8_lossy(&out.stderr));
    assert_eq!(stdout_json(&out)["shared"], serde_json::json!([1, 2]));
}

#[test]
fn parse_rejects_keys_that_collide_once_stringified() {
    let dir = tempfile::tempdir().unwrap();
    let doc = write(dir.path(), "keys.yaml", "1: a\n\"1\": b\n");

    let out = run(&["parse", doc.to_str().unwrap()]);
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("duplicate mapping key"));
}
