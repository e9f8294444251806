mod support;

use predicates::prelude::*;
use serde_json::Value;

use support::TestEnv;

fn add_and_complete(env: &TestEnv, name: &str) {
    let output = env
        .cmd_as("alice")
        .args(["add", name, "--json"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let value: Value = serde_json::from_slice(&output).expect("add json");
    let id = value["data"]["id"].as_str().expect("task id").to_string();
    env.cmd_as("alice").args(["done", &id]).assert().success();
}

fn archive(env: &TestEnv, extra: &[&str]) -> Value {
    let mut args = vec!["archive", "--json"];
    args.extend_from_slice(extra);
    let output = env
        .cmd_as("alice")
        .args(&args)
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    serde_json::from_slice(&output).expect("archive json")
}

#[test]
fn empty_archive_reports_zero() {
    let env = TestEnv::new();
    let value = archive(&env, &[]);
    assert_eq!(value["data"]["range"], "month");
    assert_eq!(value["data"]["total_in_range"], 0);
    assert_eq!(value["data"]["has_more"], false);
}

#[test]
fn completions_appear_in_every_range() {
    let env = TestEnv::new();
    add_and_complete(&env, "Fresh");

    for range in ["today", "week", "month"] {
        let value = archive(&env, &["--range", range]);
        assert_eq!(value["data"]["total_in_range"], 1, "range {range}");
        assert_eq!(value["data"]["tasks"][0]["name"], "Fresh");
    }
}

#[test]
fn open_tasks_stay_out_of_the_archive() {
    let env = TestEnv::new();
    env.cmd_as("alice")
        .args(["add", "Still open"])
        .assert()
        .success();

    let value = archive(&env, &[]);
    assert_eq!(value["data"]["total_in_range"], 0);
}

#[test]
fn unknown_range_is_rejected() {
    let env = TestEnv::new();
    env.cmd_as("alice")
        .args(["archive", "--range", "year"])
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("unknown archive range"));
}

#[test]
fn pagination_walks_the_archive() {
    let env = TestEnv::new();
    for index in 0..3 {
        add_and_complete(&env, &format!("Task {index}"));
    }

    let first = archive(&env, &["--page-size", "2"]);
    assert_eq!(first["data"]["total_in_range"], 3);
    assert_eq!(first["data"]["tasks"].as_array().unwrap().len(), 2);
    assert_eq!(first["data"]["has_more"], true);

    let second = archive(&env, &["--page-size", "2", "--page", "1"]);
    assert_eq!(second["data"]["tasks"].as_array().unwrap().len(), 1);
    assert_eq!(second["data"]["has_more"], false);
}

#[test]
fn export_prints_csv_to_stdout() {
    let env = TestEnv::new();
    add_and_complete(&env, "Exported task");

    env.cmd_as("alice")
        .arg("export")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "id,name,description,priority,tags,project,due_date,created_at,completed_at",
        ))
        .stdout(predicate::str::contains("Exported task"));
}

#[test]
fn export_writes_file_with_row_count() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnv::new();
    add_and_complete(&env, "Task one");
    add_and_complete(&env, "Task two");

    let path = env.data_dir().join("archive.csv");
    let output = env
        .cmd_as("alice")
        .args(["export", "--output"])
        .arg(&path)
        .arg("--json")
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();

    let value: Value = serde_json::from_slice(&output)?;
    assert_eq!(value["data"]["rows"], 2);

    let csv = std::fs::read_to_string(&path)?;
    assert_eq!(csv.trim_end().lines().count(), 3);
    assert!(csv.contains("Task one"));
    assert!(csv.contains("Task two"));
    Ok(())
}
