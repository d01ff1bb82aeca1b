use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use std::fs;

fn get_board_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("benchboard").unwrap();
    cmd.env("HOME", temp_dir.path());
    cmd
}

#[test]
fn test_version() {
    let (temp_dir, _guard) = test_env::setup_with_rc("");

    get_board_cmd(&temp_dir).arg("--version").assert().success()
        .stdout(predicate::str::contains(format!("benchboard {}", env!("CARGO_PKG_VERSION"))));
}

#[test]
fn test_unknown_command_is_user_error() {
    let (temp_dir, _guard) = test_env::setup_with_rc("");

    get_board_cmd(&temp_dir).arg("frobnicate").assert().code(1);
}

#[test]
fn test_ambiguous_abbreviation() {
    let (temp_dir, _guard) = test_env::setup_with_rc("");

    get_board_cmd(&temp_dir).arg("s").assert()
        .code(1)
        .stderr(predicate::str::contains("Ambiguous command 's'"));
}

#[test]
fn test_command_abbreviation() {
    let (temp_dir, _guard) = test_env::setup_with_orders();

    get_board_cmd(&temp_dir).args(&["cap"]).assert().success()
        .stdout(predicate::str::contains("Casting"));
}

#[test]
fn test_invalid_config_is_reported() {
    let (temp_dir, _guard) = test_env::setup_with_rc("board.bottleneck_ratio=3\n");

    get_board_cmd(&temp_dir).args(&["board"]).assert()
        .failure()
        .stderr(predicate::str::contains("board.bottleneck_ratio"));
}

#[test]
fn test_stage_customization_persists_in_ledger() {
    let (temp_dir, _guard) = test_env::setup_with_rc("");

    get_board_cmd(&temp_dir).args(&["stages", "add", "Engraving"]).assert().success();
    assert!(temp_dir.path().join("test.db").exists());

    get_board_cmd(&temp_dir).args(&["stages", "list"]).assert().success()
        .stdout(predicate::str::contains("id=engraving"));
}

#[test]
fn test_sample_is_deterministic_per_seed() {
    let (temp_dir, _guard) = test_env::setup_with_rc("");
    let out = temp_dir.path().join("sample.json");

    get_board_cmd(&temp_dir)
        .args(&["sample", "--count", "6", "--seed", "7", "--out", out.to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("Wrote 6 sample work order(s)"));

    let first: serde_json::Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    let orders = first.as_array().unwrap();
    assert_eq!(orders.len(), 6);
    assert_eq!(orders[0]["id"], "wo-0001");

    let output = get_board_cmd(&temp_dir)
        .args(&["sample", "--count", "6", "--seed", "7"])
        .assert()
        .success();
    let second: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    let stages = |v: &serde_json::Value| -> Vec<String> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|o| format!("{}:{}:{}", o["currentStage"], o["priority"], o["customerName"]))
            .collect()
    };
    assert_eq!(stages(&first), stages(&second));
}

#[test]
fn test_sample_output_feeds_the_board() {
    let (temp_dir, _guard) = test_env::setup_with_rc("");

    get_board_cmd(&temp_dir)
        .args(&["sample", "--count", "4", "--out", test_env::orders_path(&temp_dir).to_str().unwrap()])
        .assert()
        .success();

    get_board_cmd(&temp_dir).args(&["board"]).assert().success()
        .stderr(predicate::str::contains("sample data").not());
}
