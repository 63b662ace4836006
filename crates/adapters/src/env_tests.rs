// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use std::time::Duration;

// Env-var tests are serialized: process environment is global state.

#[test]
#[serial(env)]
fn defaults_without_env() {
    for var in [
        "OMX_FORCE_TRANSPORT",
        "OMX_READY_TIMEOUT_MS",
        "OMX_CLAIM_LEASE_MS",
        "OMX_SCALE_UP_THRESHOLD",
    ] {
        std::env::remove_var(var);
    }
    assert_eq!(force_transport(), None);
    assert_eq!(ready_timeout(), Duration::from_secs(45));
    assert_eq!(claim_lease(), Duration::from_secs(900));
    assert_eq!(scale_up_threshold(), 3.0);
    assert_eq!(scale_down_threshold(), 0.5);
    assert_eq!(shutdown_grace(), Duration::from_secs(15));
    assert_eq!(drain_timeout(), Duration::from_secs(300));
    assert_eq!(scale_min_workers(), 1);
    assert_eq!(scale_per_worker_mem_mb(), 200);
    assert!(!auto_scale());
}

#[test]
#[serial(env)]
fn force_transport_accepts_both_spellings() {
    std::env::set_var("OMX_FORCE_TRANSPORT", "1");
    assert_eq!(force_transport(), Some("tmux"));
    std::env::set_var("OMX_FORCE_TRANSPORT", "process");
    assert_eq!(force_transport(), Some("process"));
    std::env::set_var("OMX_FORCE_TRANSPORT", "whatever");
    assert_eq!(force_transport(), None);
    std::env::remove_var("OMX_FORCE_TRANSPORT");
}

#[test]
#[serial(env)]
fn duration_overrides_parse_millis() {
    std::env::set_var("OMX_READY_TIMEOUT_MS", "250");
    assert_eq!(ready_timeout(), Duration::from_millis(250));
    std::env::remove_var("OMX_READY_TIMEOUT_MS");
}

#[test]
#[serial(env)]
fn malformed_values_fall_back() {
    std::env::set_var("OMX_CLAIM_LEASE_MS", "soon");
    assert_eq!(claim_lease(), Duration::from_secs(900));
    std::env::remove_var("OMX_CLAIM_LEASE_MS");
}
