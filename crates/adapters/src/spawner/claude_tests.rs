// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{ClaudeSpawner, SpawnConfig, Spawner};
use std::path::PathBuf;

fn cfg() -> SpawnConfig {
    SpawnConfig::new("t1", "worker-3", PathBuf::from("/tmp"))
}

#[test]
fn command_sets_team_worker_and_execs() {
    let cmd = ClaudeSpawner::new().build_command(&cfg());
    assert!(cmd.starts_with("TEAM_WORKER=t1/worker-3 exec claude "));
}

#[test]
fn fallback_model_when_nothing_is_inherited() {
    let cmd = ClaudeSpawner::new().build_command(&cfg());
    assert!(cmd.contains("--model claude-sonnet-4"));
}

#[test]
fn exactly_one_model_flag_is_emitted() {
    let mut cfg = cfg();
    cfg.inherited_args = vec!["--model=claude-opus-4".into()];
    let cmd = ClaudeSpawner::new().build_command(&cfg);
    assert_eq!(cmd.matches("--model").count(), 1);
    assert!(cmd.contains("--model claude-opus-4"));
}

#[test]
fn deep_model_names_run_high_effort() {
    let mut cfg = cfg();
    cfg.inherited_args = vec!["--model".into(), "claude-opus-4".into()];
    let cmd = ClaudeSpawner::new().build_command(&cfg);
    assert!(cmd.contains("--effort high"));
}

#[test]
fn explicit_effort_is_not_overridden() {
    let mut cfg = cfg();
    cfg.inherited_args = vec!["--effort".into(), "low".into()];
    let cmd = ClaudeSpawner::new().build_command(&cfg);
    assert_eq!(cmd.matches("--effort").count(), 1);
    assert!(cmd.contains("--effort low"));
}

#[test]
fn ready_requires_prompt_and_signature() {
    let spawner = ClaudeSpawner::new();
    let ready = "response text\n? for shortcuts\n│ > \n";
    assert!(spawner.is_ready(ready));
    assert!(!spawner.is_ready("│ > \n"));
    assert!(!spawner.is_ready("? for shortcuts\nstill thinking"));
}

#[test]
fn startup_words_block_readiness() {
    let spawner = ClaudeSpawner::new();
    let booting = "Connecting to api\n? for shortcuts\n❯ \n";
    assert!(!spawner.is_ready(booting));
}
