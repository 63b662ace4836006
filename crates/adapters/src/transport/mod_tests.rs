// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{detect_transport, pid_alive, TransportKind};
use serial_test::serial;

#[test]
fn pid_alive_for_own_process() {
    assert!(pid_alive(std::process::id() as i32));
}

#[test]
fn pid_alive_rejects_reaped_child() {
    let mut child = std::process::Command::new("true")
        .spawn()
        .unwrap_or_else(|e| panic!("spawn: {}", e));
    let pid = child.id() as i32;
    let _ = child.wait();
    assert!(!pid_alive(pid));
}

#[tokio::test]
#[serial(env)]
async fn force_override_wins_over_probe() {
    std::env::set_var("OMX_FORCE_TRANSPORT", "process");
    assert_eq!(detect_transport().await, TransportKind::Process);
    std::env::set_var("OMX_FORCE_TRANSPORT", "tmux");
    assert_eq!(detect_transport().await, TransportKind::Tmux);
    std::env::remove_var("OMX_FORCE_TRANSPORT");
}

#[tokio::test]
#[serial(env)]
async fn probe_downgrades_when_tmux_missing() {
    std::env::remove_var("OMX_FORCE_TRANSPORT");
    let old_path = std::env::var("PATH").unwrap_or_default();
    std::env::set_var("PATH", "/nonexistent");
    let kind = detect_transport().await;
    std::env::set_var("PATH", &old_path);
    assert_eq!(kind, TransportKind::Process);
}

#[test]
fn kind_display() {
    assert_eq!(TransportKind::Tmux.to_string(), "tmux");
    assert_eq!(TransportKind::Process.to_string(), "process");
}
