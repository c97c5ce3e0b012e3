use std::fs;
use std::path::PathBuf;

use assert_cmd::Command;
use tempfile::TempDir;

fn write_spec(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).expect("write spec");
    path
}

const MINI_SPEC: &str = r#"{
  "id": "mini",
  "title": "Mini",
  "version": "1.0.0",
  "children": [
    { "type": "instruction", "identifier": "intro", "title": "Welcome" },
    { "type": "question", "identifier": "q1", "title": "How many hours?", "answer_kind": "integer", "required": true },
    { "type": "question", "identifier": "q2", "title": "Feeling okay?", "answer_kind": "boolean" },
    { "type": "completion", "identifier": "done", "title": "All done" }
  ]
}"#;

const BROKEN_SPEC: &str = r#"{
  "id": "broken",
  "title": "Broken",
  "version": "1.0.0",
  "children": [
    { "type": "instruction", "identifier": "intro", "title": "Welcome" },
    { "type": "instruction", "identifier": "intro", "title": "Again" },
    { "type": "question", "identifier": "q1", "title": "Pick", "answer_kind": "choice" }
  ]
}"#;

#[test]
fn validate_passes_a_clean_spec() {
    let dir = TempDir::new().expect("tempdir");
    let spec = write_spec(&dir, "mini.json", MINI_SPEC);
    let output = Command::cargo_bin("assess")
        .expect("binary")
        .args(["validate", "--spec"])
        .arg(&spec)
        .output()
        .expect("run");
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("No findings."));
}

#[test]
fn validate_reports_authoring_errors() {
    let dir = TempDir::new().expect("tempdir");
    let spec = write_spec(&dir, "broken.json", BROKEN_SPEC);
    let output = Command::cargo_bin("assess")
        .expect("binary")
        .args(["validate", "--spec"])
        .arg(&spec)
        .output()
        .expect("run");
    assert!(!output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("duplicate_identifier"));
    assert!(stdout.contains("missing_choices"));
}

#[test]
fn run_walks_the_flow_and_prints_the_answer_export() {
    let dir = TempDir::new().expect("tempdir");
    let spec = write_spec(&dir, "mini.json", MINI_SPEC);
    let output = Command::cargo_bin("assess")
        .expect("binary")
        .args(["run", "--spec"])
        .arg(&spec)
        .write_stdin("7\ny\n")
        .output()
        .expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Assessment: Mini"));
    assert!(stdout.contains("Welcome"));
    assert!(stdout.contains("Done"));
    assert!(stdout.contains("Answers (CBOR hex):"));
}

#[test]
fn run_supports_back_navigation_and_revised_answers() {
    let dir = TempDir::new().expect("tempdir");
    let spec = write_spec(&dir, "mini.json", MINI_SPEC);
    let output = Command::cargo_bin("assess")
        .expect("binary")
        .args(["run", "--answers-json", "--spec"])
        .arg(&spec)
        .write_stdin("1\n:back\n2\ny\n")
        .output()
        .expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Current answer: 1"));
    assert!(stdout.contains("\"q1\": 2"));
    assert!(stdout.contains("\"q2\": true"));
}

#[test]
fn run_rejects_invalid_input_and_reprompts() {
    let dir = TempDir::new().expect("tempdir");
    let spec = write_spec(&dir, "mini.json", MINI_SPEC);
    let output = Command::cargo_bin("assess")
        .expect("binary")
        .args(["run", "--spec"])
        .arg(&spec)
        .write_stdin("soon\n7\n:skip\n")
        .output()
        .expect("run");
    assert!(output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("not an integer"));
}

#[test]
fn schema_emits_the_answer_schema() {
    let dir = TempDir::new().expect("tempdir");
    let spec = write_spec(&dir, "mini.json", MINI_SPEC);
    let output = Command::cargo_bin("assess")
        .expect("binary")
        .args(["schema", "--spec"])
        .arg(&spec)
        .output()
        .expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("\"properties\""));
    assert!(stdout.contains("\"q1\""));
    assert!(stdout.contains("\"required\""));
}

#[test]
fn describe_lists_nodes_with_rules() {
    let dir = TempDir::new().expect("tempdir");
    let spec = write_spec(
        &dir,
        "branching.json",
        r#"{
          "id": "branching",
          "title": "Branching",
          "version": "1.0.0",
          "children": [
            { "type": "question", "identifier": "mood", "title": "Mood?", "answer_kind": "choice",
              "choices": ["great", "low"],
              "survey_rules": [ { "matching_value": "great", "skip_to": "done" } ] },
            { "type": "question", "identifier": "notes", "title": "Notes?", "answer_kind": "string" },
            { "type": "completion", "identifier": "done", "title": "Done" }
          ]
        }"#,
    );
    let output = Command::cargo_bin("assess")
        .expect("binary")
        .args(["describe", "--spec"])
        .arg(&spec)
        .output()
        .expect("run");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("mood [question: choice]"));
    assert!(stdout.contains("=\"great\" -> done"));
    assert!(stdout.contains("done [completion]"));
}
