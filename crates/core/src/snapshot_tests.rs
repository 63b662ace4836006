// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{MonitorSnapshot, TaskCounts};
use crate::id::TaskId;
use crate::phase::TeamPhase;
use crate::task::{Task, TaskStatus};
use chrono::Utc;

fn task(id: &str, status: TaskStatus) -> Task {
    let mut t = Task::new(TaskId::new(id), "s", "d", Utc::now());
    t.status = status;
    t
}

#[test]
fn tally_counts_every_status() {
    let tasks = vec![
        task("1", TaskStatus::Pending),
        task("2", TaskStatus::Pending),
        task("3", TaskStatus::InProgress),
        task("4", TaskStatus::Completed),
        task("5", TaskStatus::Failed),
        task("6", TaskStatus::Blocked),
    ];
    let counts = TaskCounts::tally(&tasks);
    assert_eq!(counts.pending, 2);
    assert_eq!(counts.in_progress, 1);
    assert_eq!(counts.completed, 1);
    assert_eq!(counts.failed, 1);
    assert_eq!(counts.blocked, 1);
    assert_eq!(counts.total(), 6);
}

#[test]
fn all_terminal_requires_work_present() {
    assert!(!TaskCounts::default().all_terminal());
    let counts = TaskCounts {
        completed: 2,
        failed: 1,
        ..Default::default()
    };
    assert!(counts.all_terminal());
}

#[test]
fn status_line_token_contract() {
    let counts = TaskCounts {
        pending: 3,
        blocked: 1,
        in_progress: 2,
        completed: 5,
        failed: 0,
    };
    assert_eq!(
        counts.status_line(),
        "tasks: pending=3 blocked=1 in_progress=2 completed=5 failed=0"
    );
}

#[test]
fn initial_snapshot_starts_in_start_phase() {
    let snap = MonitorSnapshot::initial("t1", Utc::now());
    assert_eq!(snap.phase, TeamPhase::Start);
    assert!(snap.workers.is_empty());
    assert!(snap.phase_log.is_empty());
}

#[test]
fn snapshot_round_trips() {
    let snap = MonitorSnapshot::initial("t1", Utc::now());
    let json = serde_json::to_string(&snap).unwrap();
    let back: MonitorSnapshot = serde_json::from_str(&json).unwrap();
    assert_eq!(back.team, "t1");
    assert_eq!(back.phase, TeamPhase::Start);
}
