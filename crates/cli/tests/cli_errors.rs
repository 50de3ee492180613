use std::fs;

use predicates::prelude::*;
use tempfile::tempdir;

/// A missing input file is a plain failure with context.
#[test]
fn missing_input_file_fails() {
    let dir = tempdir().expect("tempdir");

    assert_cmd::cargo::cargo_bin_cmd!("ilc")
        .current_dir(dir.path())
        .arg("absent.c")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read input file"));
}

/// A syntax error exits with status 1 and a one-line diagnostic naming the
/// file and line.
#[test]
fn syntax_error_exits_with_status_one() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    fs::write(root.join("bad.c"), "int func (").expect("write fixture");

    assert_cmd::cargo::cargo_bin_cmd!("ilc")
        .current_dir(root)
        .arg("bad.c")
        .assert()
        .failure()
        .code(1)
        .stderr(
            predicate::str::contains("syntax error in bad.c at line 1")
                .and(predicate::str::contains("end of input")),
        );

    // No output file is left behind on a failed parse.
    assert!(!root.join("bad_ilc.c").exists());
    assert!(!root.join("ilc.dat").exists());
}

/// An unbalanced brace is also a status-1 syntax error.
#[test]
fn unbalanced_brace_exits_with_status_one() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    fs::write(root.join("brace.c"), "int f(void) { if (1) {\n").expect("write fixture");

    assert_cmd::cargo::cargo_bin_cmd!("ilc")
        .current_dir(root)
        .arg("brace.c")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("syntax error"));
}

/// A coverage data path that opens but cannot be read (a directory) is
/// fatal, unlike a missing file.
#[test]
fn unreadable_data_file_is_fatal() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    fs::write(root.join("ok.c"), "int f(void) { }\n").expect("write fixture");
    fs::create_dir(root.join("data_dir")).expect("mkdir");

    assert_cmd::cargo::cargo_bin_cmd!("ilc")
        .current_dir(root)
        .arg("ok.c")
        .arg("-f")
        .arg("data_dir")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load coverage data"));
}

/// A coverage data path that cannot be written only warns; the instrumented
/// output is still produced and the run succeeds.
#[test]
fn unwritable_data_file_only_warns() {
    let dir = tempdir().expect("tempdir");
    let root = dir.path();
    fs::write(root.join("ok.c"), "int f(void) { /* ILC: here */ }\n").expect("write fixture");

    assert_cmd::cargo::cargo_bin_cmd!("ilc")
        .current_dir(root)
        .arg("ok.c")
        .arg("-f")
        .arg("no_such_dir/coverage.dat")
        .assert()
        .success()
        .stderr(predicate::str::contains("warning:"));

    assert!(root.join("ok_ilc.c").exists());
}
