// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{format_uptime, render_status};
use chrono::Utc;
use omx_core::{
    MonitorSnapshot, Recommendation, ScaleDirection, TaskCounts, WorkerName, WorkerState,
};

#[yare::parameterized(
    zero          = { 0, "0s" },
    seconds_only  = { 45, "45s" },
    minutes_only  = { 180, "3m" },
    whole_hour    = { 7200, "2h" },
    hour_and_min  = { 3660, "1h1m" },
    day_and_hours = { 187_200, "2d4h" },
    day_exact     = { 86_400, "1d0h" },
)]
fn uptime_shows_two_largest_units(secs: u64, expected: &str) {
    assert_eq!(format_uptime(secs), expected);
}

fn snapshot() -> MonitorSnapshot {
    let mut snap = MonitorSnapshot::initial("t1", Utc::now());
    snap.task_counts = TaskCounts {
        pending: 2,
        blocked: 0,
        in_progress: 1,
        completed: 3,
        failed: 0,
    };
    snap.workers
        .insert(WorkerName::for_index(1), WorkerState::Idle);
    snap.workers
        .insert(WorkerName::for_index(2), WorkerState::Working);
    snap
}

#[test]
fn status_contains_contract_line() {
    let rendered = render_status(&snapshot(), 2, 3660);
    assert!(rendered
        .lines()
        .any(|l| l == "tasks: pending=2 blocked=0 in_progress=1 completed=3 failed=0"));
}

#[test]
fn status_summarizes_workers() {
    let rendered = render_status(&snapshot(), 2, 3660);
    assert!(rendered.contains("(up 1h1m)"));
    assert!(rendered.contains("workers 2 active (1 idle, 1 working), 0 dead"));
}

#[test]
fn status_lists_recommendations() {
    let mut snap = snapshot();
    snap.recommendations.push(Recommendation {
        direction: ScaleDirection::Up,
        count: 2,
        reason: "backlog".into(),
        high_confidence: true,
    });
    let rendered = render_status(&snap, 2, 60);
    assert!(rendered.contains("recommendation: scale_up 2 (backlog) [high confidence]"));
}
