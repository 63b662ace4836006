// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{ApprovalDecision, ApprovalRecord, ApprovalStore};
use crate::paths::TeamPaths;
use chrono::Utc;
use omx_core::TaskId;

fn store(dir: &std::path::Path) -> ApprovalStore {
    ApprovalStore::new(TeamPaths::new(dir, "t1"))
}

fn record(task: &str, decision: ApprovalDecision) -> ApprovalRecord {
    ApprovalRecord {
        task_id: TaskId::new(task),
        decision,
        reason: None,
        decided_by: "leader".into(),
        decided_at: Utc::now(),
        announced: false,
    }
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    store.write(&record("1", ApprovalDecision::Approve)).unwrap();

    let back = store.read(&TaskId::new("1")).unwrap();
    assert_eq!(back.decision, ApprovalDecision::Approve);
    assert!(!back.announced);
}

#[test]
fn unannounced_excludes_announced_records() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    store.write(&record("1", ApprovalDecision::Approve)).unwrap();
    store.write(&record("2", ApprovalDecision::Reject)).unwrap();

    assert!(store.mark_announced(&TaskId::new("1")).unwrap());

    let pending = store.unannounced();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending[0].task_id, TaskId::new("2"));
}

#[test]
fn mark_announced_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    store.write(&record("1", ApprovalDecision::Approve)).unwrap();

    assert!(store.mark_announced(&TaskId::new("1")).unwrap());
    assert!(!store.mark_announced(&TaskId::new("1")).unwrap());
}

#[test]
fn mark_announced_on_missing_record_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    assert!(!store(dir.path()).mark_announced(&TaskId::new("404")).unwrap());
}
