// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::HeartbeatStore;
use crate::paths::TeamPaths;
use chrono::{Duration, Utc};
use omx_core::{Heartbeat, WorkerName};

fn store(dir: &std::path::Path) -> HeartbeatStore {
    HeartbeatStore::new(TeamPaths::new(dir, "t1"))
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let worker = WorkerName::for_index(1);
    let hb = Heartbeat::new(4321, Utc::now());

    store.write(&worker, &hb).unwrap();

    let back = store.read(&worker).unwrap();
    assert_eq!(back.pid, 4321);
    assert_eq!(back.turn_count, 0);
    assert!(back.alive);
}

#[test]
fn record_turn_updates_persisted_state() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let worker = WorkerName::for_index(1);
    let start = Utc::now();
    store.write(&worker, &Heartbeat::new(1, start)).unwrap();

    let later = start + Duration::seconds(3);
    assert!(store.record_turn(&worker, later).unwrap());

    let back = store.read(&worker).unwrap();
    assert_eq!(back.turn_count, 1);
    assert_eq!(back.last_turn_at, later);
}

#[test]
fn record_turn_without_heartbeat_is_noop() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    assert!(!store
        .record_turn(&WorkerName::for_index(9), Utc::now())
        .unwrap());
}

#[test]
fn mark_dead_preserves_record() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let worker = WorkerName::for_index(1);
    let mut hb = Heartbeat::new(1, Utc::now());
    hb.turn_count = 7;
    store.write(&worker, &hb).unwrap();

    assert!(store.mark_dead(&worker).unwrap());
    // Second call reports no change
    assert!(!store.mark_dead(&worker).unwrap());

    let back = store.read(&worker).unwrap();
    assert!(!back.alive);
    assert_eq!(back.turn_count, 7);
}
