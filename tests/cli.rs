use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("phonechat").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: phonechat [OPTIONS] <COMMAND>"))
        .stdout(predicate::str::contains("Commands:"))
        .stdout(predicate::str::contains("serve"))
        .stdout(predicate::str::contains("chat"))
        .stdout(predicate::str::contains("lookup"))
        .stdout(predicate::str::contains("generate-catalog"))
        .stdout(predicate::str::contains("--seed <SEED>"))
        .stdout(predicate::str::contains("--version"));
}

#[test]
fn test_cli_serve_help() {
    let mut cmd = Command::cargo_bin("phonechat").unwrap();
    cmd.arg("serve")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage: phonechat serve"))
        .stdout(predicate::str::contains("--port <PORT>"))
        .stdout(predicate::str::contains("--strategy <STRATEGY>"))
        .stdout(predicate::str::contains("--catalog <CATALOG>"));
}

#[test]
fn test_cli_no_command() {
    let mut cmd = Command::cargo_bin("phonechat").unwrap();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage: phonechat [OPTIONS] <COMMAND>"));
}

#[test]
fn test_lookup_with_table_strategy() {
    let mut cmd = Command::cargo_bin("phonechat").unwrap();
    cmd.args(["--seed", "7", "lookup", "iPhone 15", "--review", "The camera is excellent"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Make: Apple"))
        .stdout(predicate::str::contains("Series: iPhone"))
        .stdout(predicate::str::contains("IMEI Number: "))
        .stdout(predicate::str::contains("Sentiment Analysis of your comment: Positive"));
}

#[test]
fn test_generate_then_lookup_in_catalog() {
    let dir = TempDir::new().unwrap();
    let csv = dir.path().join("phones.csv");

    Command::cargo_bin("phonechat")
        .unwrap()
        .args(["--seed", "1", "generate-catalog", "--output"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("generated with 240 phones"));

    Command::cargo_bin("phonechat")
        .unwrap()
        .args(["lookup", "galaxy note 4", "--strategy", "catalog", "--catalog"])
        .arg(&csv)
        .assert()
        .success()
        .stdout(predicate::str::contains("Make: Samsung"))
        .stdout(predicate::str::contains("Model: Galaxy Note 4"));

    Command::cargo_bin("phonechat")
        .unwrap()
        .args(["lookup", "Nonexistent Model 9999", "--strategy", "catalog", "--catalog"])
        .arg(&csv)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Sorry, no data found for this mobile."));
}

#[test]
fn test_catalog_strategy_needs_a_readable_file() {
    let dir = TempDir::new().unwrap();
    Command::cargo_bin("phonechat")
        .unwrap()
        .args(["lookup", "iPhone 1", "--strategy", "catalog", "--catalog"])
        .arg(dir.path().join("missing.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to load catalog"));
}
