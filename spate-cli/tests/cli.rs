use assert_cmd::prelude::*;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

#[test]
fn init_then_load_round_trips() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("flow.yml");

    Command::cargo_bin("spate")?
        .args(["init", "example-1", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created empty workflow 'example-1'"));

    Command::cargo_bin("spate")?
        .args(["load", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("0 jobs, 0 paths"));

    Ok(())
}

#[test]
fn load_rejects_missing_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let missing = dir.path().join("does-not-exist.yml");

    Command::cargo_bin("spate")?
        .args(["load", missing.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Error:"));

    Ok(())
}

fn write_sample_flow(path: &std::path::Path) {
    let contents = r#"
name: example-1
jobs:
  - id: x
    inputs: [A]
    outputs: [B, C]
    template: "cp $INPUT $OUTPUT"
    created_at: 0
  - id: y
    inputs: [A, C]
    outputs: [D]
    template: "cat $INPUTS > $OUTPUT"
    created_at: 1
"#;
    fs::write(path, contents).unwrap();
}

#[test]
fn echo_rejects_colorized_without_decorated() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("flow.yml");
    write_sample_flow(&file);

    Command::cargo_bin("spate")?
        .args(["echo", file.to_str().unwrap(), "--colorized"])
        .assert()
        .failure();

    Ok(())
}

#[test]
fn echo_prints_stanzas_and_summary() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("flow.yml");
    write_sample_flow(&file);

    Command::cargo_bin("spate")?
        .args(["echo", file.to_str().unwrap(), "--decorated"])
        .assert()
        .success()
        .stdout(predicate::str::contains("< A"))
        .stdout(predicate::str::contains("> D"))
        .stdout(predicate::str::contains("total: "));

    Ok(())
}

#[test]
fn to_shell_emits_shebang_and_job_comments() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("flow.yml");
    write_sample_flow(&file);

    Command::cargo_bin("spate")?
        .args(["to-shell", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("#!/bin/bash\nset -e\n"))
        .stdout(predicate::str::contains("# x"));

    Ok(())
}

#[test]
fn to_make_emits_phony_all_target() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let file = dir.path().join("flow.yml");
    write_sample_flow(&file);

    Command::cargo_bin("spate")?
        .args(["to-make", file.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(".PHONY: all"))
        .stdout(predicate::str::contains("D: A C"));

    Ok(())
}

#[test]
fn export_is_byte_identical_regardless_of_construction_order() -> Result<(), Box<dyn std::error::Error>> {
    // Two documents describing the same structure with jobs listed in a
    // different order must still export identically, since export always
    // walks the canonical topological order.
    let dir = tempdir()?;
    let forward = dir.path().join("forward.yml");
    let reversed = dir.path().join("reversed.yml");

    fs::write(
        &forward,
        r#"
name: example-1
jobs:
  - id: x
    inputs: [A]
    outputs: [B, C]
    created_at: 0
  - id: y
    inputs: [A, C]
    outputs: [D]
    created_at: 1
"#,
    )?;
    fs::write(
        &reversed,
        r#"
name: example-1
jobs:
  - id: y
    inputs: [A, C]
    outputs: [D]
    created_at: 1
  - id: x
    inputs: [A]
    outputs: [B, C]
    created_at: 0
"#,
    )?;

    let forward_output = Command::cargo_bin("spate")?
        .args(["to-make", forward.to_str().unwrap()])
        .output()?;
    let reversed_output = Command::cargo_bin("spate")?
        .args(["to-make", reversed.to_str().unwrap()])
        .output()?;

    assert_eq!(forward_output.stdout, reversed_output.stdout);
    Ok(())
}
