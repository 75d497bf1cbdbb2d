//! Integration tests for error handling and exit codes.
//!
//! - Exit code 0: Success
//! - Exit code 1: Semantic failure (nothing at a path, wrong type)
//! - Exit code 2: Path conflicts with the tree's shape
//! - Exit code 4: Invalid arguments
//! - Exit code 7: Configuration error

mod common;

use common::TestEnv;
use predicates::prelude::*;

#[test]
fn test_missing_value() {
    let env = TestEnv::with_file("a: 1\n");
    env.command()
        .args(["get", "b"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no value at 'b'"));
}

#[test]
fn test_path_through_scalar() {
    let env = TestEnv::with_file("a: 1\n");
    env.command()
        .args(["set", "a.b", "2"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("a"));
    assert_eq!(env.contents(), "a: 1\n");
}

#[test]
fn test_invalid_type_argument() {
    let env = TestEnv::with_file("a: 1\n");
    env.command()
        .args(["get", "a", "--type", "list<"])
        .assert()
        .code(4);
    env.command()
        .args(["get", "a", "--type", "int", "--default", "nope"])
        .assert()
        .success()
        .stdout("1\n");
}

#[test]
fn test_empty_separator_rejected() {
    let env = TestEnv::with_file("a: 1\n");
    env.command()
        .args(["--separator", "", "keys"])
        .assert()
        .code(4);
}

#[test]
fn test_broken_file() {
    let env = TestEnv::with_file("a: [unclosed\n");
    env.command()
        .arg("dump")
        .assert()
        .code(7)
        .stderr(predicate::str::starts_with("Error: Configuration error"));
}

#[test]
fn test_unknown_command_is_usage_error() {
    let env = TestEnv::new();
    env.command().arg("frobnicate").assert().code(2);
}
