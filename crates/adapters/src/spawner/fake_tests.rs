// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{FakeSpawner, SpawnConfig, Spawner};
use std::path::PathBuf;

#[test]
fn default_is_always_ready() {
    let spawner = FakeSpawner::new();
    assert!(spawner.is_ready(""));
    assert!(spawner.is_ready("anything"));
}

#[test]
fn marker_gates_readiness() {
    let spawner = FakeSpawner::ready_on("PROMPT");
    assert!(!spawner.is_ready("booting"));
    assert!(spawner.is_ready("at PROMPT now"));
}

#[test]
fn command_carries_team_worker() {
    let cfg = SpawnConfig::new("t1", "worker-1", PathBuf::from("/tmp"));
    let cmd = FakeSpawner::new().build_command(&cfg);
    assert_eq!(cmd, "TEAM_WORKER=t1/worker-1 exec fake-cli");
}
