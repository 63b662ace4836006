// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{parse_task, parse_worker_spec};

#[yare::parameterized(
    plain      = { "2", 2, "executor" },
    typed      = { "3:claude", 3, "claude" },
    one        = { "1:planner", 1, "planner" },
    empty_type = { "2:", 2, "executor" },
)]
fn worker_specs(spec: &str, count: u32, agent_type: &str) {
    let (n, t) = parse_worker_spec(spec).unwrap();
    assert_eq!(n, count);
    assert_eq!(t, agent_type);
}

#[yare::parameterized(
    not_a_number = { "many" },
    zero         = { "0" },
    garbage_type = { "x:executor" },
)]
fn bad_worker_specs_are_rejected(spec: &str) {
    assert!(parse_worker_spec(spec).is_err());
}

#[test]
fn task_descriptor_splits_subject_and_description() {
    let task = parse_task("fix the bug\nsteps:\n- look\n- fix");
    assert_eq!(task.subject, "fix the bug");
    assert_eq!(task.description, "steps:\n- look\n- fix");
}

#[test]
fn single_line_descriptor_has_empty_description() {
    let task = parse_task("just do it");
    assert_eq!(task.subject, "just do it");
    assert!(task.description.is_empty());
}
