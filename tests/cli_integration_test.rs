//! CLI integration tests for the edugen binary.

mod common;

use serde_json::Value;
use std::path::Path;
use std::process::{Command, Output};

fn edugen(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_edugen"))
        .args(args)
        .current_dir(dir)
        .env_remove("EDUGEN_CONFIG")
        .env("EDUGEN_LOGGING__LEVEL", "warn")
        .output()
        .expect("Failed to run edugen")
}

/// Run a command with `--json`, assert success, and parse stdout.
fn run_json(dir: &Path, args: &[&str]) -> Value {
    let mut full = args.to_vec();
    full.push("--json");
    let output = edugen(dir, &full);
    assert!(
        output.status.success(),
        "{args:?} failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    serde_json::from_slice(&output.stdout)
        .unwrap_or_else(|e| panic!("Failed to parse JSON from {args:?}: {e}"))
}

#[test]
fn test_profiles_json_lists_catalog() {
    let dir = tempfile::tempdir().unwrap();
    let value = run_json(dir.path(), &["profiles"]);

    let names: Vec<&str> = value["profiles"]
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|p| p["name"].as_str())
        .collect();
    assert!(names.contains(&"subtopics"));
    assert!(names.contains(&"word-bank"));
    assert_eq!(value["total"].as_u64(), Some(names.len() as u64));
}

#[test]
fn test_parse_twice_converges() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("reply.txt"), common::DUPLICATE_REPLY).unwrap();
    let args = [
        "parse",
        "--profile",
        "subtopics",
        "--reply",
        "reply.txt",
        "--state",
        "state.json",
        "--out",
        "state.json",
    ];

    let first = run_json(dir.path(), &args);
    assert_eq!(first["state"]["attempt"], 1);
    assert_eq!(first["state"]["changed"], "pending");
    assert_eq!(first["state"]["fields"]["subtopics"]["records"][1][0], "B");

    let second = run_json(dir.path(), &args);
    assert_eq!(second["state"]["attempt"], 2);
    assert_eq!(second["state"]["changed"], "converged");
}

#[test]
fn test_format_reply_fills_slots() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("prompt.txt"),
        "Name the subtopics.\n{subtopics_output}@@{summary_output}\n",
    )
    .unwrap();
    std::fs::write(dir.path().join("reply.txt"), "Adding | Subtracting @@ Basics\n").unwrap();
    let args = [
        "format", "--prompt", "prompt.txt", "--reply", "reply.txt", "--state", "state.json",
        "--out", "state.json",
    ];

    let first = run_json(dir.path(), &args);
    assert_eq!(first["outcome"], "completed");
    assert_eq!(first["state"]["values"]["subtopics"][1], "Subtracting");
    assert_eq!(first["state"]["values"]["summary"], "Basics");
    assert_eq!(first["state"]["changed"], "pending");

    let second = run_json(dir.path(), &args);
    assert_eq!(second["state"]["attempt"], 2);
    assert_eq!(second["state"]["changed"], "converged");
}

#[test]
fn test_plan_from_file() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("plan.txt"),
        "1. Numbers\n1.1 Fractions\n1.2 Decimals\n2. Geometry\n2.1 Angles\n",
    )
    .unwrap();

    let value = run_json(dir.path(), &["plan", "--input", "plan.txt"]);
    assert_eq!(value["total_topics"], 3);
    assert_eq!(value["sections"][1]["section"], "Geometry");
}

#[test]
fn test_invalid_config_fails_validation() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("bad.yaml"), "engine:\n  max_attempts: 0\n").unwrap();

    let output = edugen(dir.path(), &["--config", "bad.yaml", "config", "validate"]);
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("max_attempts"));
}

#[test]
fn test_unknown_profile_fails() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("reply.txt"), "Start:\nA;1\nEnd:").unwrap();

    let output = edugen(
        dir.path(),
        &["parse", "--profile", "nope", "--reply", "reply.txt"],
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Unknown generator profile"));
}
