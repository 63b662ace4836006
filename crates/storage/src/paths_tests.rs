// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{list_teams, TeamPaths};
use omx_core::{TaskId, WorkerName};
use std::path::Path;

#[test]
fn layout_matches_contract() {
    let paths = TeamPaths::new(Path::new("/proj"), "t1");
    let root = Path::new("/proj/.omx/state/team/t1");
    let w = WorkerName::for_index(2);

    assert_eq!(paths.root(), root);
    assert_eq!(paths.manifest(), root.join("manifest.v2.json"));
    assert_eq!(paths.task(&TaskId::new("7")), root.join("tasks/7.json"));
    assert_eq!(
        paths.worker_identity(&w),
        root.join("workers/worker-2/identity.json")
    );
    assert_eq!(
        paths.worker_heartbeat(&w),
        root.join("workers/worker-2/heartbeat.json")
    );
    assert_eq!(
        paths.worker_status(&w),
        root.join("workers/worker-2/status.json")
    );
    assert_eq!(
        paths.worker_inbox(&w),
        root.join("workers/worker-2/inbox.md")
    );
    assert_eq!(
        paths.shutdown_request(&w),
        root.join("workers/worker-2/shutdown-request.json")
    );
    assert_eq!(
        paths.shutdown_ack(&w),
        root.join("workers/worker-2/shutdown-ack.json")
    );
    assert_eq!(paths.mailbox("worker-2"), root.join("mailbox/worker-2.json"));
    assert_eq!(paths.events(), root.join("events.ndjson"));
    assert_eq!(
        paths.approval(&TaskId::new("3")),
        root.join("approvals/3.json")
    );
    assert_eq!(paths.monitor_snapshot(), root.join("monitor.snapshot.json"));
    assert_eq!(paths.scaling_history(), root.join("scaling-history.json"));
    assert_eq!(paths.scaling_lock(), root.join("scaling.lock"));
}

#[test]
fn list_teams_returns_sorted_subdirs() {
    let dir = tempfile::tempdir().unwrap();
    for team in ["zeta", "alpha"] {
        std::fs::create_dir_all(TeamPaths::new(dir.path(), team).root()).unwrap();
    }
    assert_eq!(list_teams(dir.path()), vec!["alpha", "zeta"]);
}

#[test]
fn list_teams_tolerates_missing_state_dir() {
    let dir = tempfile::tempdir().unwrap();
    assert!(list_teams(dir.path()).is_empty());
}
