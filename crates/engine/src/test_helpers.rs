// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests.

use crate::config::RuntimeConfig;
use crate::runtime::TeamRuntime;
use crate::start::{StartSpec, WorkerSpec};
use omx_adapters::{FakeSpawner, FakeTransport};
use omx_core::{FakeClock, LeaderIdentity, PermissionsSnapshot, SequentialIdGen};
use omx_storage::NewTask;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

pub type TestRuntime = TeamRuntime<FakeTransport, FakeSpawner, FakeClock, SequentialIdGen>;

pub struct TestTeam {
    pub dir: tempfile::TempDir,
    pub runtime: TestRuntime,
    pub transport: FakeTransport,
    pub clock: FakeClock,
    pub cancel: CancellationToken,
}

pub fn leader() -> LeaderIdentity {
    LeaderIdentity {
        session_id: "sess-1".into(),
        worker_id: "leader".into(),
        role: "lead".into(),
    }
}

pub fn test_config() -> RuntimeConfig {
    RuntimeConfig {
        ready_timeout: Duration::from_millis(300),
        ready_poll: Duration::from_millis(10),
        claim_lease: Duration::from_secs(900),
        shutdown_grace: Duration::from_millis(400),
        kill_grace: Duration::from_millis(50),
        leader_nudge: Duration::from_secs(120),
        nudge_cooldown: Duration::from_secs(120),
        drain_timeout: Duration::from_secs(300),
        min_tick_interval: Duration::from_millis(10),
        tick_budget: Duration::from_secs(5),
        inactivity_ceiling: Duration::from_secs(600),
        auto_scale: false,
        inherited_args: Vec::new(),
        model_override: None,
        shell_rc: None,
    }
}

pub fn team(name: &str) -> TestTeam {
    team_with(name, FakeSpawner::new(), test_config())
}

pub fn team_with(name: &str, spawner: FakeSpawner, config: RuntimeConfig) -> TestTeam {
    let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {}", e));
    let transport = FakeTransport::new();
    let clock = FakeClock::new();
    let runtime = TeamRuntime::with_parts(
        dir.path().to_path_buf(),
        name,
        transport.clone(),
        spawner,
        clock.clone(),
        SequentialIdGen::new("id"),
        config,
    );
    TestTeam {
        dir,
        runtime,
        transport,
        clock,
        cancel: CancellationToken::new(),
    }
}

pub fn start_spec(agent_types: &[&str], tasks: &[(&str, &str)]) -> StartSpec {
    StartSpec {
        task_description: "test work".into(),
        workers: agent_types
            .iter()
            .map(|t| WorkerSpec {
                agent_type: t.to_string(),
            })
            .collect(),
        tasks: tasks
            .iter()
            .map(|(subject, description)| NewTask {
                subject: subject.to_string(),
                description: description.to_string(),
                depends_on: Vec::new(),
                requires_code_change: false,
            })
            .collect(),
        leader: leader(),
        permissions: PermissionsSnapshot::default(),
        leader_pane: Some("%100".into()),
        hud_pane: None,
    }
}

/// Start a team with the given agent types and tasks.
pub async fn started_team(name: &str, agent_types: &[&str], tasks: &[(&str, &str)]) -> TestTeam {
    let fixture = team(name);
    fixture
        .runtime
        .start_team(start_spec(agent_types, tasks), &fixture.cancel)
        .await
        .unwrap_or_else(|e| panic!("start_team: {}", e));
    fixture
}
