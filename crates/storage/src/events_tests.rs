// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::EventLog;
use crate::atomic::append_line;
use crate::paths::TeamPaths;
use chrono::Utc;
use omx_core::{EventId, EventKind, TeamEvent};

fn log(dir: &std::path::Path) -> EventLog {
    EventLog::new(TeamPaths::new(dir, "t1"), "t1")
}

fn event(id: &str, kind: EventKind) -> TeamEvent {
    TeamEvent::new(EventId::new(id), "t1", kind, Utc::now())
}

#[test]
fn append_then_read_preserves_order() {
    let dir = tempfile::tempdir().unwrap();
    let log = log(dir.path());
    log.append(&event("e-1", EventKind::WorkerIdle)).unwrap();
    log.append(&event("e-2", EventKind::TaskCompleted)).unwrap();

    let events = log.read_all();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].event_id, "e-1");
    assert_eq!(events[1].event_id, "e-2");
}

#[test]
fn missing_log_reads_empty() {
    let dir = tempfile::tempdir().unwrap();
    assert!(log(dir.path()).read_all().is_empty());
}

#[test]
fn unparseable_lines_are_skipped() {
    let dir = tempfile::tempdir().unwrap();
    let log = log(dir.path());
    log.append(&event("e-1", EventKind::WorkerIdle)).unwrap();
    append_line(&TeamPaths::new(dir.path(), "t1").events(), "not json").unwrap();
    log.append(&event("e-2", EventKind::WorkerIdle)).unwrap();

    assert_eq!(log.read_all().len(), 2);
}

#[test]
fn tail_returns_most_recent() {
    let dir = tempfile::tempdir().unwrap();
    let log = log(dir.path());
    for i in 0..5 {
        log.append(&event(&format!("e-{}", i), EventKind::WorkerIdle))
            .unwrap();
    }
    let tail = log.tail(2);
    assert_eq!(tail.len(), 2);
    assert_eq!(tail[0].event_id, "e-3");
    assert_eq!(tail[1].event_id, "e-4");
}
