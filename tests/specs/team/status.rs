//! The status verb and its parseable line.

use crate::prelude::{omx, project, seed_team};

#[test]
fn status_emits_the_contract_line() {
    let dir = project();
    seed_team(dir.path(), "t1");

    let output = omx(dir.path()).args(["team", "status", "t1"]).output().unwrap();
    assert_eq!(output.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&output.stdout);
    let contract = stdout
        .lines()
        .find(|l| l.starts_with("tasks:"))
        .unwrap_or_else(|| panic!("no tasks: line in {:?}", stdout));
    assert_eq!(
        contract,
        "tasks: pending=1 blocked=0 in_progress=0 completed=0 failed=0"
    );
}

#[test]
fn status_second_line_is_machine_readable() {
    let dir = project();
    seed_team(dir.path(), "t1");

    let output = omx(dir.path()).args(["team", "status", "t1"]).output().unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let json_line = stdout
        .lines()
        .find(|l| l.trim_start().starts_with('{'))
        .unwrap_or_else(|| panic!("no JSON line in {:?}", stdout));
    let parsed: serde_json::Value = serde_json::from_str(json_line).unwrap();
    assert_eq!(parsed["team"], "t1");
    assert_eq!(parsed["tasks"]["pending"], 1);
}

#[test]
fn json_output_mode_prints_only_json() {
    let dir = project();
    seed_team(dir.path(), "t1");

    let output = omx(dir.path())
        .args(["team", "status", "t1", "-o", "json"])
        .output()
        .unwrap();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["phase"], "start");
}
