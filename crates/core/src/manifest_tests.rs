// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{LeaderIdentity, TeamManifest, ABSOLUTE_MAX_WORKERS, MANIFEST_SCHEMA_VERSION};
use crate::id::WorkerName;
use chrono::Utc;

fn manifest() -> TeamManifest {
    TeamManifest::new(
        "t1",
        "do the thing",
        LeaderIdentity {
            session_id: "sess-1".into(),
            worker_id: "leader".into(),
            role: "lead".into(),
        },
        "omx-t1",
        Utc::now(),
    )
}

#[test]
fn new_manifest_has_current_schema() {
    let m = manifest();
    assert_eq!(m.schema_version, MANIFEST_SCHEMA_VERSION);
    assert_eq!(m.next_task_id, 1);
    assert_eq!(m.next_worker_index, 1);
}

#[test]
fn task_ids_allocate_monotonically() {
    let mut m = manifest();
    assert_eq!(m.alloc_task_id(), "1");
    assert_eq!(m.alloc_task_id(), "2");
    assert_eq!(m.next_task_id, 3);
}

#[test]
fn worker_allocation_advances_index_and_counts() {
    let mut m = manifest();
    let w1 = m.alloc_worker("executor");
    let w2 = m.alloc_worker("executor");
    assert_eq!(w1.name, "worker-1");
    assert_eq!(w2.name, "worker-2");
    assert_eq!(m.active_worker_count, 2);
    assert_eq!(m.worker_count, 2);
}

#[test]
fn removed_indexes_are_never_reissued() {
    let mut m = manifest();
    m.alloc_worker("executor");
    let w2 = m.alloc_worker("executor");
    m.remove_worker(&w2.name);
    let w3 = m.alloc_worker("executor");
    assert_eq!(w3.index, 3);
    assert_eq!(m.active_worker_count, 2);
}

#[test]
fn remove_clears_draining_mark() {
    let mut m = manifest();
    let w = m.alloc_worker("executor");
    m.mark_draining(w.name.clone());
    assert!(m.is_draining(&w.name));
    m.remove_worker(&w.name);
    assert!(!m.is_draining(&w.name));
}

#[test]
fn mark_draining_is_idempotent() {
    let mut m = manifest();
    let w = m.alloc_worker("executor");
    m.mark_draining(w.name.clone());
    m.mark_draining(w.name.clone());
    assert_eq!(m.draining_workers.len(), 1);
}

#[test]
fn original_role_is_lowest_index() {
    let mut m = manifest();
    m.alloc_worker("planner");
    m.alloc_worker("executor");
    assert_eq!(m.original_role(), Some("planner"));
}

#[test]
fn clamp_enforces_worker_ceiling() {
    let mut m = manifest();
    m.scaling.max_workers = 100;
    m.scaling.min_workers = 0;
    m.clamp();
    assert_eq!(m.scaling.max_workers, ABSOLUTE_MAX_WORKERS);
    assert_eq!(m.scaling.min_workers, 1);
}

#[test]
fn protected_addresses_cover_leader_and_hud() {
    let mut m = manifest();
    assert!(m.protected_addresses().is_empty());
    m.leader_pane = Some("%1".into());
    m.hud_pane = Some("%9".into());
    assert_eq!(m.protected_addresses(), vec!["%1", "%9"]);
}

#[test]
fn manifest_round_trips_through_json() {
    let mut m = manifest();
    m.alloc_worker("executor");
    m.mark_draining(WorkerName::for_index(1));
    let json = serde_json::to_string(&m).unwrap();
    let mut back: TeamManifest = serde_json::from_str(&json).unwrap();
    back.clamp();
    assert_eq!(back.team, "t1");
    assert_eq!(back.workers.len(), 1);
    assert!(back.is_draining(&WorkerName::for_index(1)));
}
