//! CLI binary integration tests using assert_cmd + predicates.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

#[allow(deprecated)]
fn cmd() -> Command {
    Command::cargo_bin("jsonwalk").expect("binary should exist")
}

#[test]
fn walks_a_label_from_stdin() {
    cmd()
        .args(["-w", "[a]"])
        .write_stdin(r#"{"a":1,"b":2}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains('1'));
}

#[test]
fn inserts_into_a_file_and_writes_back_with_force() {
    let dir = TempDir::new().unwrap();
    let input = dir.path().join("doc.json");
    fs::write(&input, r#"{"a":1}"#).unwrap();

    cmd()
        .args(["-u", "2", "-w", "[a]", "-f"])
        .arg(input.to_str().unwrap())
        .assert()
        .success();

    let contents = fs::read_to_string(&input).unwrap();
    assert!(contents.contains('2'));
}

#[test]
fn guide_flag_prints_a_usage_summary_and_exits() {
    cmd()
        .arg("-g")
        .assert()
        .success()
        .stdout(predicate::str::contains("walk path syntax"));
}

#[test]
fn missing_shell_terminator_reports_a_cli_error() {
    cmd()
        .args(["-e", "echo", "hi", "-i", "[a]"])
        .write_stdin(r#"{"a":1}"#)
        .assert()
        .failure()
        .code(41);
}

#[test]
fn label_update_form_renames_instead_of_replacing_value() {
    cmd()
        .args(["-w", "<age>k", "-u", "\"years\""])
        .write_stdin(r#"{"age":30}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("years").and(predicate::str::contains("30")));
}

#[test]
fn move_semantics_purges_the_walk_source_after_insert() {
    cmd()
        .args(["-w", "[dst]", "-i", "[src]", "-p"])
        .write_stdin(r#"{"src":1,"dst":null}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("src").not());
}

#[test]
fn x_and_y_assemble_into_walk_strings() {
    cmd()
        .args(["-x", "[a]", "-y", "[b]"])
        .write_stdin(r#"{"a":{"b":7}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains('7'));
}

#[test]
fn doubled_l_glean_inner_labels() {
    cmd()
        .args(["-w", "[a]", "-ll", "-jj"])
        .write_stdin(r#"{"a":{"x":1,"y":2}}"#)
        .assert()
        .success()
        .stdout(predicate::str::contains("\"x\"").and(predicate::str::contains("\"y\"")));
}
