// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! End-to-end tests of the `shapescript` binary against real source files.

use assert_cmd::Command;
use predicates::prelude::*;

fn shapescript() -> Command {
    Command::cargo_bin("shapescript").expect("binary built by this workspace")
}

fn write_source(dir: &std::path::Path, name: &str, body: &str) -> std::path::PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, body).expect("write fixture source");
    path
}

#[test]
fn valid_source_reports_top_level_node_count() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let source = write_source(dir.path(), "scene.shape", "cube { position 1 }\nsphere {}\n");

    shapescript()
        .arg(&source)
        .assert()
        .success()
        .stdout(predicate::str::contains("ok: 2 top-level node(s)"));
}

#[test]
fn syntax_error_exits_non_zero_with_diagnostic() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let source = write_source(dir.path(), "broken.shape", "cube { position }\n");

    shapescript().arg(&source).assert().failure().stderr(predicate::str::is_empty().not());
}

#[test]
fn missing_file_fails_with_context() {
    shapescript().arg("/nonexistent/path/does-not-exist.shape").assert().failure();
}

#[test]
fn seed_flag_overrides_default_zero_seed() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let source = write_source(dir.path(), "scene.shape", "cube { position rnd }\n");

    shapescript().arg(&source).arg("--seed").arg("7").assert().success();
}

#[test]
fn export_to_an_output_path_always_fails() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let source = write_source(dir.path(), "scene.shape", "cube {}\n");
    let output = dir.path().join("scene.obj");

    shapescript()
        .arg(&source)
        .arg(&output)
        .assert()
        .failure()
        .stderr(predicate::str::contains("export codec not implemented"));
}
