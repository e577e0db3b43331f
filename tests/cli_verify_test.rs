//! Integration tests for `ferry verify`.

mod common;

use common::{GO_MOD, TestEnv, parse_json};
use predicates::prelude::*;

#[test]
fn test_verify_empty_project() {
    let env = TestEnv::new();
    env.ferry()
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("Requirements: 0/0 done"))
        .stdout(predicate::str::contains("All requirements implemented."));
}

#[test]
fn test_verify_lists_pending() {
    let env = TestEnv::new();
    env.ferry().args(["req", "set", "server/cli", "flags"]).assert().success();
    env.ferry().args(["req", "set", "db/schema", "tables"]).assert().success();
    env.ferry().args(["req", "done", "db/schema"]).assert().success();

    env.ferry()
        .arg("verify")
        .assert()
        .success()
        .stdout(predicate::str::contains("Requirements: 1/2 done"))
        .stdout(predicate::str::contains("  [ ] server/cli"))
        .stdout(predicate::str::contains("Migration not yet complete."));
}

#[test]
fn test_verify_coverage_from_manifest() {
    let env = TestEnv::new();
    env.write("go.mod", GO_MOD);
    env.ferry()
        .args(["req", "set", "server/cli/flags", "port flag"])
        .assert()
        .success();

    env.ferry()
        .args(["verify", "--manifest", "go.mod"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Coverage (cli, web):"))
        .stdout(predicate::str::contains("[ ] cli (*/cli): 0/1 done in server/cli"))
        .stdout(predicate::str::contains("[!] web (*/api): no requirements"));

    let output = env
        .ferry()
        .args(["--json", "verify", "--manifest", "go.mod"])
        .assert()
        .success()
        .get_output()
        .stdout
        .clone();
    let report = parse_json(&output);
    assert_eq!(report["complete"], false);
    // Ordered by pattern, so */api comes first.
    assert_eq!(report["coverage"][0]["category"], "web");
    assert_eq!(report["coverage"][0]["count"], 0);
    assert_eq!(report["coverage"][1]["pattern"], "*/cli");
    assert_eq!(report["coverage"][1]["count"], 1);
}
