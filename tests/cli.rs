//! CLI argument handling, run against the built binary.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cmd(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("cdvl-crawler").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.path())
        .env_remove("CDVL_USERNAME")
        .env_remove("CDVL_PASSWORD")
        .current_dir(home.path());
    cmd
}

#[test]
fn test_help_lists_subcommands() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(
            predicate::str::contains("crawl")
                .and(predicate::str::contains("download"))
                .and(predicate::str::contains("export"))
                .and(predicate::str::contains("generate")),
        );
}

#[test]
fn test_download_rejects_non_numeric_ids() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["download", "1,abc"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Invalid video ID format"));
}

#[test]
fn test_download_rejects_zero_id() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["download", "0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("positive integers"));
}

#[test]
fn test_download_output_requires_single_id() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["download", "1,2", "--output", "a.bin"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("single video ID"));
}

#[test]
fn test_crawl_declined_license_exits_1() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .arg("crawl")
        .write_stdin("no\n")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("License terms not accepted"));
    assert!(!home.path().join("cdvl-crawler").join("license_accepted").exists());
}

#[test]
fn test_export_missing_input_exits_1() {
    let home = TempDir::new().unwrap();
    cmd(&home)
        .args(["export", "-i", "missing.jsonl"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("input file not found"));
}

#[test]
fn test_generate_writes_page() {
    let home = TempDir::new().unwrap();
    std::fs::write(home.path().join("videos.jsonl"), "{\"id\": 1, \"title\": \"Clip\"}\n").unwrap();
    cmd(&home)
        .args(["generate", "-o", "site/index.html"])
        .assert()
        .success();
    assert!(home.path().join("site").join("index.html").exists());
}
