mod support;

use predicates::prelude::*;
use serde_json::Value;

use support::TestEnv;

#[test]
fn help_lists_commands() {
    support::tally_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("add"))
        .stdout(predicate::str::contains("stats"))
        .stdout(predicate::str::contains("archive"));
}

#[test]
fn missing_user_is_a_user_error() {
    let env = TestEnv::new();

    env.cmd()
        .arg("list")
        .assert()
        .failure()
        .code(2)
        .stderr(predicate::str::contains("no user identity"));
}

#[test]
fn json_error_envelope_has_kind_and_code() -> Result<(), Box<dyn std::error::Error>> {
    let env = TestEnv::new();

    let output = env
        .cmd_as("alice")
        .args(["done", "nope", "--json"])
        .assert()
        .failure()
        .code(2)
        .get_output()
        .stdout
        .clone();

    let value: Value = serde_json::from_slice(&output)?;
    assert_eq!(value["schema_version"], "tally.v1");
    assert_eq!(value["status"], "error");
    assert_eq!(value["error"]["kind"], "user_error");
    assert_eq!(value["error"]["code"], 2);
    Ok(())
}

#[test]
fn user_flag_after_subcommand_is_accepted() {
    let env = TestEnv::new();

    env.cmd()
        .args(["list", "--user", "erin", "--json"])
        .assert()
        .success();
}

#[test]
fn config_default_user_is_used() {
    let env = TestEnv::new();
    env.write_config("[user]\ndefault = \"carol\"\n");

    env.cmd()
        .args(["user", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("carol"));
}

#[test]
fn user_set_persists_identity() {
    let env = TestEnv::new();

    env.cmd().args(["user", "set", "dave"]).assert().success();

    env.cmd()
        .args(["user", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dave"));

    // list now resolves the persisted user instead of failing
    env.cmd().arg("list").assert().success();
}
