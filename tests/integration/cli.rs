//! Integration tests for the stepviz binary
//!
//! Each test points `--data-dir` at a temporary directory so no state leaks
//! into the user's home.

use assert_cmd::Command;
use predicates::prelude::*;

use super::common::fixtures::TraceDir;
use super::common::traces::bubble_sort;

fn stepviz(dir: &TraceDir) -> Command {
    let mut cmd = Command::cargo_bin("stepviz").expect("binary builds");
    cmd.arg("--data-dir").arg(dir.data_dir());
    cmd
}

/// Test that `chunks` summarises every step of a trace
#[test]
fn test_chunks_lists_steps() {
    let dir = TraceDir::new();
    let trace = dir.write_trace("bubble.json", &bubble_sort(&[2, 1]));

    stepviz(&dir)
        .arg("chunks")
        .arg(&trace)
        .assert()
        .success()
        .stdout(predicate::str::contains("4 steps"))
        .stdout(predicate::str::contains("line    6"));

    assert!(dir.exists("data/logs/stepviz.log"));
    assert!(dir.exists("data/config.toml"));
}

/// Test that `chunks --json` emits the chunk list
#[test]
fn test_chunks_as_json() {
    let dir = TraceDir::new();
    let trace = dir.write_trace("bubble.json", &bubble_sort(&[2, 1]));

    let output = stepviz(&dir)
        .args(["chunks", "--json"])
        .arg(&trace)
        .output()
        .unwrap();
    assert!(output.status.success());
    let chunks: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(chunks.as_array().map(Vec::len), Some(4));
    assert_eq!(chunks[1]["line_number"], 4);
    assert!(chunks[3]["line_number"].is_null());
}

/// Test that `render` prints the root view at the requested step
#[test]
fn test_render_at_cursor() {
    let dir = TraceDir::new();
    let trace = dir.write_trace("bubble.json", &bubble_sort(&[2, 1]));

    let output = stepviz(&dir)
        .args(["render", "--cursor", "1"])
        .arg(&trace)
        .output()
        .unwrap();
    assert!(output.status.success());
    let view: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(view["type"], "layout");
    let array = &view["panes"][1]["view"];
    assert_eq!(array["type"], "array");
    assert_eq!(array["rows"][0][0]["text"], "2");

    stepviz(&dir)
        .args(["render", "--cursor", "9"])
        .arg(&trace)
        .assert()
        .failure()
        .stderr(predicate::str::contains("out of range"));
}

/// Test that `play` prints each step in order
#[test]
fn test_play_prints_steps() {
    let dir = TraceDir::new();
    dir.write_config("[playback]\nbase_interval_ms = 20\n");
    let trace = dir.write_trace("bubble.json", &bubble_sort(&[2, 1]));

    stepviz(&dir)
        .arg("play")
        .arg(&trace)
        .assert()
        .success()
        .stdout(predicate::str::contains("step 1/4  line 0"))
        .stdout(predicate::str::contains("step 4/4  line -"));
}

/// Test that `--save-speed` persists the speed to the config file
#[test]
fn test_play_saves_speed() {
    let dir = TraceDir::new();
    let config = dir.write_config("[playback]\nbase_interval_ms = 20\n");
    let trace = dir.write_trace("bubble.json", &bubble_sort(&[2, 1]));

    stepviz(&dir)
        .args(["play", "--speed", "3.5", "--save-speed"])
        .arg(&trace)
        .assert()
        .success();

    let written = std::fs::read_to_string(config).unwrap();
    assert!(written.contains("base_interval_ms = 20"));
    assert!(written.contains("speed = 3.5"));
}

/// Test that unsupported languages fail with a clear message
#[test]
fn test_unsupported_language_fails() {
    let dir = TraceDir::new();
    let source = dir.write("main.rb", "puts 1");

    stepviz(&dir)
        .arg("chunks")
        .arg(&source)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Language not supported: rb"));

    stepviz(&dir)
        .arg("play")
        .arg(&source)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Language not supported: rb"));
}

/// Test that javascript needs an interpreter in the config before it plays
#[test]
fn test_javascript_without_interpreter_fails() {
    let dir = TraceDir::new();
    let source = dir.write("bubble.js", "tracer.delay();");

    stepviz(&dir)
        .arg("play")
        .arg(&source)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Language not supported: js"));
}
