// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::SignalStore;
use crate::paths::TeamPaths;
use chrono::{Duration, Utc};
use omx_core::{AckStatus, WorkerName};

fn store(dir: &std::path::Path) -> SignalStore {
    SignalStore::new(TeamPaths::new(dir, "t1"))
}

#[test]
fn request_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let worker = WorkerName::for_index(1);
    let now = Utc::now();

    store.request_shutdown(&worker, "leader", now).unwrap();

    let request = store.read_request(&worker).unwrap();
    assert_eq!(request.requested_by, "leader");
    assert_eq!(request.requested_at, now);
}

#[test]
fn stale_ack_is_invisible() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let worker = WorkerName::for_index(1);
    let request_at = Utc::now();

    // Ack left over from a previous run, 50 units before the request
    store
        .write_ack(
            &worker,
            AckStatus::Accept,
            None,
            request_at - Duration::seconds(50),
        )
        .unwrap();

    assert!(store.read_ack_with_min(&worker, request_at).is_none());
}

#[test]
fn fresh_ack_is_returned() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let worker = WorkerName::for_index(1);
    let request_at = Utc::now();

    store
        .write_ack(
            &worker,
            AckStatus::Accept,
            None,
            request_at + Duration::seconds(20),
        )
        .unwrap();

    let ack = store.read_ack_with_min(&worker, request_at).unwrap();
    assert_eq!(ack.status, AckStatus::Accept);
}

#[test]
fn missing_ack_reads_none() {
    let dir = tempfile::tempdir().unwrap();
    assert!(store(dir.path())
        .read_ack_with_min(&WorkerName::for_index(1), Utc::now())
        .is_none());
}

#[test]
fn reject_ack_preserves_reason() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let worker = WorkerName::for_index(2);
    let request_at = Utc::now();
    store
        .write_ack(
            &worker,
            AckStatus::Reject,
            Some("mid-task".into()),
            request_at,
        )
        .unwrap();

    let ack = store.read_ack_with_min(&worker, request_at).unwrap();
    assert_eq!(ack.status, AckStatus::Reject);
    assert_eq!(ack.reason.as_deref(), Some("mid-task"));
}

#[test]
fn clear_removes_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = store(dir.path());
    let worker = WorkerName::for_index(1);
    let now = Utc::now();
    store.request_shutdown(&worker, "leader", now).unwrap();
    store.write_ack(&worker, AckStatus::Accept, None, now).unwrap();

    store.clear(&worker);

    assert!(store.read_request(&worker).is_none());
    assert!(store.read_ack_with_min(&worker, now).is_none());
}
