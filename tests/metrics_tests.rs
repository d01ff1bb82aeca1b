use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;
use std::fs;

fn get_board_cmd(temp_dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("benchboard").unwrap();
    cmd.env("HOME", temp_dir.path());
    cmd
}

fn metrics_json(temp_dir: &TempDir) -> serde_json::Value {
    let output = get_board_cmd(temp_dir).args(&["metrics", "--json"]).assert().success();
    serde_json::from_slice(&output.get_output().stdout).unwrap()
}

#[test]
fn test_metrics_json() {
    let (temp_dir, _guard) = test_env::setup_with_orders();
    let metrics = metrics_json(&temp_dir);

    assert_eq!(metrics["totalWip"], 5);
    // Two finished orders with 10h and 20h of closed history
    assert_eq!(metrics["averageCycleTime"], 15.0);
    assert_eq!(metrics["throughput"], 0.4);
    assert_eq!(metrics["bottlenecks"].as_array().unwrap().len(), 0);

    let workload = metrics["craftspersonWorkload"].as_array().unwrap();
    assert_eq!(workload[0]["name"], "Mara");
    assert_eq!(workload[0]["count"], 2);
    assert_eq!(workload[1]["name"], "Theo");
    assert_eq!(workload[2]["name"], "Unassigned");
    assert_eq!(workload[2]["count"], 1);

    let counts = metrics["stageWipCounts"].as_array().unwrap();
    assert_eq!(counts.len(), 6);
    assert_eq!(counts[1]["stageId"], "casting");
    assert_eq!(counts[1]["count"], 2);
    assert_eq!(counts[1]["wipLimit"], 4);

    let by_stage = metrics["cycleTimeByStage"].as_array().unwrap();
    // design: 24h (wo-2) and 10h (wo-4)
    assert_eq!(by_stage[0]["stageId"], "design");
    assert_eq!(by_stage[0]["samples"], 2);
    assert_eq!(by_stage[0]["averageHours"], 17.0);
}

#[test]
fn test_metrics_respects_config() {
    let (temp_dir, _guard) = test_env::setup_with_rc("metrics.throughput_window_days=2\nboard.terminal_stage=casting\n");
    fs::write(test_env::orders_path(&temp_dir), test_env::ORDERS_FIXTURE).unwrap();

    let metrics = metrics_json(&temp_dir);
    assert_eq!(metrics["throughput"], 1.0);
    // Only wo-2 has closed history (24h in design); wo-3 has none and is left out
    assert_eq!(metrics["averageCycleTime"], 24.0);
}

#[test]
fn test_metrics_dashboard() {
    let (temp_dir, _guard) = test_env::setup_with_orders();

    get_board_cmd(&temp_dir).args(&["metrics"]).assert().success()
        .stdout(predicate::str::contains("=== Production Overview ==="))
        .stdout(predicate::str::contains("Work in progress: 5"))
        .stdout(predicate::str::contains("Avg cycle time (completed, in 'Ready'): 15h0m"))
        .stdout(predicate::str::contains("Throughput: 0.4 orders/day"))
        .stdout(predicate::str::contains("No bottlenecks."))
        .stdout(predicate::str::contains("Unassigned"));
}

#[test]
fn test_metrics_bottleneck_listing() {
    let (temp_dir, _guard) = test_env::setup_with_orders();

    get_board_cmd(&temp_dir).args(&["stages", "limit", "ready", "2"]).assert().success();
    let metrics = metrics_json(&temp_dir);
    assert_eq!(metrics["bottlenecks"], serde_json::json!(["ready"]));
}

#[test]
fn test_capacity_json() {
    let (temp_dir, _guard) = test_env::setup_with_orders();

    let output = get_board_cmd(&temp_dir).args(&["capacity", "--json"]).assert().success();
    let report: serde_json::Value = serde_json::from_slice(&output.get_output().stdout).unwrap();
    let stages = report["stages"].as_array().unwrap();
    assert_eq!(stages.len(), 6);
    assert_eq!(stages[0]["stageId"], "design");
    assert_eq!(stages[0]["count"], 1);
    assert_eq!(stages[0]["capacity"], 5);
    assert_eq!(stages[0]["isBottleneck"], false);
}

#[test]
fn test_capacity_table() {
    let (temp_dir, _guard) = test_env::setup_with_orders();

    get_board_cmd(&temp_dir).args(&["capacity"]).assert().success()
        .stdout(predicate::str::contains("Casting"))
        .stdout(predicate::str::contains("2/4"))
        .stdout(predicate::str::contains("50%"))
        .stdout(predicate::str::contains("[AT CAPACITY]").not());
}
