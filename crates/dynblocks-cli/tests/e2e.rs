//! End-to-end tests for dynblocks CLI commands.
//!
//! Only paths that never spawn an interpreter or compiler are covered here;
//! the engine itself is exercised with scripted runners in dynblocks-core.

#![allow(deprecated)] // Allow deprecated Command::cargo_bin for tests

use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

// =============================================================================
// Test Helpers
// =============================================================================

/// A document written into its own temporary directory.
struct TestDocument {
    temp_dir: TempDir,
    path: PathBuf,
}

impl TestDocument {
    fn new(json: serde_json::Value) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let path = temp_dir.path().join("guide.json");
        fs::write(&path, serde_json::to_string_pretty(&json).unwrap())
            .expect("Failed to write document");
        Self { temp_dir, path }
    }

    fn path(&self) -> &PathBuf {
        &self.path
    }

    fn dir(&self) -> PathBuf {
        self.temp_dir.path().to_path_buf()
    }
}

fn python_listing(source: &str) -> serde_json::Value {
    serde_json::json!({
        "type": "listing",
        "language": "python",
        "source": source,
        "options": ["dynamic"]
    })
}

/// A document with two dynamic Python blocks and no marker attribute.
fn python_document() -> serde_json::Value {
    serde_json::json!({
        "name": "guide",
        "blocks": [
            { "type": "paragraph", "text": "Intro" },
            python_listing("x = 21"),
            python_listing("print(x * 2)")
        ]
    })
}

fn dynblocks() -> Command {
    Command::cargo_bin("dynblocks").unwrap()
}

// =============================================================================
// Script Command
// =============================================================================

#[test]
fn test_script_prints_session_script() {
    let doc = TestDocument::new(python_document());

    dynblocks()
        .arg("script")
        .arg(doc.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("shell.run_cell("))
        .stdout(predicate::str::contains(r#"'code': "print(x * 2)","#))
        .stdout(predicate::str::contains("json.dumps(results)"))
        .stderr(predicate::str::contains("dynamic-blocks"));
}

#[test]
fn test_script_without_python_blocks() {
    let doc = TestDocument::new(serde_json::json!({
        "name": "plain",
        "attributes": { "dynamic-blocks": "" },
        "blocks": [{ "type": "paragraph", "text": "Nothing to run" }]
    }));

    dynblocks()
        .arg("script")
        .arg(doc.path())
        .assert()
        .success()
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("No dynamic Python blocks found."));
}

// =============================================================================
// Run Command
// =============================================================================

#[test]
fn test_run_without_marker_leaves_document_unchanged() {
    let doc = TestDocument::new(python_document());

    let output = dynblocks()
        .arg("run")
        .arg(doc.path())
        .assert()
        .success()
        .stderr(predicate::str::contains("Dynamic blocks disabled"))
        .get_output()
        .stdout
        .clone();

    let written: serde_json::Value = serde_json::from_slice(&output).unwrap();
    assert_eq!(written, python_document());
}

#[test]
fn test_run_writes_output_file() {
    let doc = TestDocument::new(python_document());
    let out = doc.dir().join("spliced.json");
    let html = doc.dir().join("preview.html");

    dynblocks()
        .arg("run")
        .arg(doc.path())
        .arg("-o")
        .arg(&out)
        .arg("--html")
        .arg(&html)
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["name"], "guide");
    assert_eq!(written["blocks"].as_array().unwrap().len(), 3);
    assert!(html.exists());
}

#[test]
fn test_run_missing_document() {
    dynblocks()
        .arg("run")
        .arg("does-not-exist.json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Document not found"));
}

#[test]
fn test_run_rejects_malformed_document() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("broken.json");
    fs::write(&path, "{ not json").unwrap();

    dynblocks().arg("run").arg(&path).assert().failure();
}

// =============================================================================
// Help Output
// =============================================================================

#[test]
fn test_help_lists_commands() {
    dynblocks()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("run"))
        .stdout(predicate::str::contains("script"));
}
