use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("gchat")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("exec"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("--reveal-interval-ms"));
}

#[test]
fn test_exec_help_shows_prompt_and_global_overrides() {
    cargo_bin_cmd!("gchat")
        .args(["exec", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--prompt"))
        .stdout(predicate::str::contains("--model"))
        .stdout(predicate::str::contains("--settle-delay-ms"));
}

#[test]
fn test_exec_requires_prompt() {
    cargo_bin_cmd!("gchat")
        .arg("exec")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--prompt"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("gchat")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}
