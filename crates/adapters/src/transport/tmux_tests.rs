// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{SlotSpec, TmuxTransport, Transport, TransportError};
use serial_test::serial;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::LazyLock;
use std::time::Duration;

/// Random prefix for this test run to avoid conflicts with parallel test runs.
static TEST_PREFIX: LazyLock<String> = LazyLock::new(|| {
    use std::time::{SystemTime, UNIX_EPOCH};
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .subsec_nanos();
    format!("t{:04x}", nanos & 0xFFFF)
});

/// Counter for generating unique session names across parallel tests.
static SESSION_COUNTER: AtomicU64 = AtomicU64::new(0);

fn unique_name(suffix: &str) -> String {
    let id = SESSION_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}-{}", *TEST_PREFIX, suffix, id)
}

fn tmux_available() -> bool {
    std::process::Command::new("tmux")
        .arg("-V")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

macro_rules! skip_without_tmux {
    () => {
        if !tmux_available() {
            eprintln!("skipping: tmux not available");
            return;
        }
    };
}

fn slot_spec(cmd: &str) -> SlotSpec {
    SlotSpec {
        title: "worker-1".into(),
        cwd: "/tmp".into(),
        command: cmd.into(),
        env: vec![("OMX_TEST_VAR".into(), "1".into())],
    }
}

// Serialized: tests share one tmux server.

#[tokio::test]
#[serial(tmux)]
async fn create_session_returns_prefixed_handle() {
    skip_without_tmux!();
    let transport = TmuxTransport::new();
    let name = unique_name("create");

    let handle = transport.create_session(&name, Path::new("/tmp")).await.unwrap();
    assert_eq!(handle, format!("omx-{}", name));

    transport.destroy_session(&handle).await.unwrap();
}

#[tokio::test]
#[serial(tmux)]
async fn add_slot_returns_percent_pane_id() {
    skip_without_tmux!();
    let transport = TmuxTransport::new();
    let name = unique_name("slot");
    let handle = transport.create_session(&name, Path::new("/tmp")).await.unwrap();

    let address = transport.add_slot(&handle, &slot_spec("sleep 60")).await.unwrap();
    assert!(address.starts_with('%'), "address {} not normalized", address);

    let slots = transport.list_slots(&handle).await.unwrap();
    assert!(slots.contains(&address));

    transport.destroy_session(&handle).await.unwrap();
}

#[tokio::test]
#[serial(tmux)]
async fn kill_slot_removes_pane_from_listing() {
    skip_without_tmux!();
    let transport = TmuxTransport::new();
    let name = unique_name("kill");
    let handle = transport.create_session(&name, Path::new("/tmp")).await.unwrap();
    let address = transport.add_slot(&handle, &slot_spec("sleep 60")).await.unwrap();

    transport
        .kill_slot(&address, Duration::from_millis(500))
        .await
        .unwrap();

    let slots = transport.list_slots(&handle).await.unwrap();
    assert!(!slots.contains(&address));

    transport.destroy_session(&handle).await.unwrap();
}

#[tokio::test]
#[serial(tmux)]
async fn capture_returns_pane_tail() {
    skip_without_tmux!();
    let transport = TmuxTransport::new();
    let name = unique_name("capture");
    let handle = transport.create_session(&name, Path::new("/tmp")).await.unwrap();
    let address = transport
        .add_slot(&handle, &slot_spec("echo omx-marker && sleep 60"))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    let output = transport.capture(&address, 50).await.unwrap();
    assert!(output.contains("omx-marker"));

    transport.destroy_session(&handle).await.unwrap();
}

#[tokio::test]
async fn malformed_addresses_are_rejected_without_tmux() {
    // Validation happens before any tmux invocation, so no server needed
    let transport = TmuxTransport::new();
    for bad in ["5", "pane-5", "%", "%5x", ""] {
        let result = transport.send_text(bad, "hello").await;
        assert!(
            matches!(result, Err(TransportError::InvalidAddress(_))),
            "address {:?} should be invalid",
            bad
        );
    }
}

#[tokio::test]
async fn create_session_requires_existing_cwd() {
    let transport = TmuxTransport::new();
    let result = transport
        .create_session("ghost", Path::new("/definitely/not/here"))
        .await;
    assert!(matches!(result, Err(TransportError::SpawnFailed(_))));
}
