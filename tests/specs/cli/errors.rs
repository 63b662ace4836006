//! Exit code contract: 0 success, 1 expected failure, 2 usage error.

use crate::prelude::{omx, project};

#[test]
fn no_arguments_is_a_usage_error() {
    let dir = project();
    let output = omx(dir.path()).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn unknown_verb_is_a_usage_error() {
    let dir = project();
    let output = omx(dir.path()).args(["team", "explode"]).output().unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn status_of_unknown_team_is_an_expected_failure() {
    let dir = project();
    let output = omx(dir.path())
        .args(["team", "status", "ghost"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("team not found"));
}

#[test]
fn events_of_unknown_team_is_an_expected_failure() {
    let dir = project();
    let output = omx(dir.path())
        .args(["team", "events", "ghost"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn start_with_bad_worker_spec_is_an_expected_failure() {
    let dir = project();
    let output = omx(dir.path())
        .args(["team", "start", "t1", "bogus", "do a thing"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid worker spec"));
}

#[test]
fn start_without_tasks_is_a_usage_error() {
    let dir = project();
    let output = omx(dir.path())
        .args(["team", "start", "t1", "2"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn cleanup_of_unknown_team_succeeds_quietly() {
    // Cleanup is crash-safe: nothing to do is a success
    let dir = project();
    let output = omx(dir.path())
        .args(["team", "cleanup", "ghost"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(0));
}
