// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{FakeTransport, SlotSpec, Transport, TransportCall, TransportError};
use std::path::Path;
use std::time::Duration;

fn spec(title: &str) -> SlotSpec {
    SlotSpec {
        title: title.into(),
        cwd: "/tmp".into(),
        command: "fake-cli".into(),
        env: Vec::new(),
    }
}

#[tokio::test]
async fn slots_get_percent_addresses() {
    let transport = FakeTransport::new();
    let handle = transport.create_session("t1", Path::new("/tmp")).await.unwrap();
    let a1 = transport.add_slot(&handle, &spec("worker-1")).await.unwrap();
    let a2 = transport.add_slot(&handle, &spec("worker-2")).await.unwrap();
    assert_eq!(a1, "%1");
    assert_eq!(a2, "%2");
}

#[tokio::test]
async fn kill_removes_from_listing_but_records_call() {
    let transport = FakeTransport::new();
    let handle = transport.create_session("t1", Path::new("/tmp")).await.unwrap();
    let address = transport.add_slot(&handle, &spec("worker-1")).await.unwrap();

    transport.kill_slot(&address, Duration::from_secs(1)).await.unwrap();

    assert!(transport.list_slots(&handle).await.unwrap().is_empty());
    assert_eq!(transport.killed(), vec![address]);
}

#[tokio::test]
async fn foreign_slots_appear_in_listing_only() {
    let transport = FakeTransport::new();
    let handle = transport.create_session("t1", Path::new("/tmp")).await.unwrap();
    transport.add_foreign_slot(&handle, "%999");

    let slots = transport.list_slots(&handle).await.unwrap();
    assert_eq!(slots, vec!["%999"]);
    // But capture of a foreign slot fails like a real missing pane
    let result = transport.capture("%999", 10).await;
    assert!(matches!(result, Err(TransportError::SlotNotFound(_))));
}

#[tokio::test]
async fn scripted_output_drives_capture() {
    let transport = FakeTransport::new();
    let handle = transport.create_session("t1", Path::new("/tmp")).await.unwrap();
    let address = transport.add_slot(&handle, &spec("worker-1")).await.unwrap();
    transport.set_output(&address, vec!["line1".into(), "line2".into()]);

    assert_eq!(transport.capture(&address, 1).await.unwrap(), "line2");
    assert_eq!(transport.capture(&address, 10).await.unwrap(), "line1\nline2");
}

#[tokio::test]
async fn records_trigger_and_text_calls() {
    let transport = FakeTransport::new();
    let handle = transport.create_session("t1", Path::new("/tmp")).await.unwrap();
    let address = transport.add_slot(&handle, &spec("worker-1")).await.unwrap();

    transport.send_text(&address, "hello ").await.unwrap();
    transport.send_text(&address, "world").await.unwrap();
    transport.send_trigger(&address).await.unwrap();

    assert_eq!(transport.sent_text(&address), "hello world");
    assert_eq!(transport.trigger_count(&address), 1);
    assert!(matches!(
        transport.calls().first(),
        Some(TransportCall::CreateSession { .. })
    ));
}

#[tokio::test]
async fn destroy_clears_session_state() {
    let transport = FakeTransport::new();
    let handle = transport.create_session("t1", Path::new("/tmp")).await.unwrap();
    transport.add_slot(&handle, &spec("worker-1")).await.unwrap();

    transport.destroy_session(&handle).await.unwrap();

    assert!(!transport.session_exists(&handle));
    assert!(transport.list_slots(&handle).await.is_err());
}
