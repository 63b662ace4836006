// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `omx team run`: drive a whole team run from a JSON request on stdin.
//!
//! Input: `{teamName, workerCount?, agentTypes[], tasks[{subject,
//! description}], cwd, pollIntervalMs?}`. Output on completion:
//! `{status, teamName, taskResults[], duration, workerCount}` on stdout;
//! progress lines go to stderr.

use super::team::{build_runtime, expected_failure, leader_identity, RunCliArgs};
use crate::exit_error::ExitError;
use anyhow::Result;
use omx_core::{PermissionsSnapshot, TaskStatus};
use omx_engine::{StartSpec, WorkerSpec};
use omx_storage::NewTask;
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RunRequest {
    team_name: String,
    #[serde(default)]
    worker_count: Option<u32>,
    #[serde(default)]
    agent_types: Vec<String>,
    tasks: Vec<TaskRequest>,
    cwd: PathBuf,
    #[serde(default)]
    poll_interval_ms: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TaskRequest {
    subject: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RunResult {
    status: String,
    team_name: String,
    task_results: Vec<TaskResult>,
    /// Milliseconds of wall time
    duration: u64,
    worker_count: u32,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct TaskResult {
    task_id: String,
    status: String,
    summary: String,
}

pub async fn run_from_stdin(args: RunCliArgs, _project_root: &Path) -> Result<()> {
    let mut input = String::new();
    std::io::stdin().read_to_string(&mut input)?;
    let request: RunRequest = serde_json::from_str(&input)
        .map_err(|e| ExitError::expected(format!("invalid run request: {}", e)))?;

    if request.tasks.is_empty() {
        return Err(ExitError::expected("run request has no tasks"));
    }

    let started = std::time::Instant::now();
    let worker_count = request
        .worker_count
        .unwrap_or_else(|| request.agent_types.len().max(1) as u32)
        .max(1);
    let poll = args
        .poll
        .or(request.poll_interval_ms)
        .unwrap_or(1000);

    let first_type = request
        .agent_types
        .first()
        .cloned()
        .unwrap_or_else(|| "executor".to_string());
    let runtime = build_runtime(&request.cwd, &request.team_name, Some(&first_type)).await;

    let workers: Vec<WorkerSpec> = (0..worker_count)
        .map(|i| WorkerSpec {
            agent_type: request
                .agent_types
                .get(i as usize % request.agent_types.len().max(1))
                .cloned()
                .unwrap_or_else(|| first_type.clone()),
        })
        .collect();
    let spec = StartSpec {
        task_description: request
            .tasks
            .iter()
            .map(|t| t.subject.as_str())
            .collect::<Vec<_>>()
            .join("; "),
        workers,
        tasks: request
            .tasks
            .iter()
            .map(|t| NewTask {
                subject: t.subject.clone(),
                description: t.description.clone(),
                depends_on: Vec::new(),
                requires_code_change: false,
            })
            .collect(),
        leader: leader_identity(),
        permissions: PermissionsSnapshot::default(),
        leader_pane: std::env::var("TMUX_PANE").ok(),
        hud_pane: None,
    };

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_cancel.cancel();
        }
    });

    eprintln!("starting team {} with {} workers", request.team_name, worker_count);
    runtime.start_team(spec, &cancel).await.map_err(expected_failure)?;
    let watchers = runtime.spawn_watchers(&cancel);

    // Monitor until every task is terminal or the whole team is dead
    let mut team_dead = false;
    runtime
        .monitor_loop(Duration::from_millis(poll), &cancel, |report| {
            eprintln!("{}", crate::output::render_tick(report));
            let counts = &report.snapshot.task_counts;
            if counts.all_terminal() {
                return false;
            }
            let worker_total = report.snapshot.workers.len();
            if worker_total > 0 && report.snapshot.dead_workers.len() == worker_total {
                team_dead = true;
                return false;
            }
            true
        })
        .await
        .map_err(expected_failure)?;

    // Collect results before teardown removes the state root
    let tasks = runtime.tasks().list();
    let task_results: Vec<TaskResult> = tasks
        .iter()
        .map(|t| TaskResult {
            task_id: t.id.to_string(),
            status: t.status.to_string(),
            summary: t
                .result
                .clone()
                .or_else(|| t.error.clone())
                .unwrap_or_default(),
        })
        .collect();
    let failed = team_dead
        || tasks.iter().any(|t| t.status == TaskStatus::Failed)
        || !tasks.iter().all(|t| t.status.is_terminal());

    cancel.cancel();
    watchers.shutdown().await;
    if let Err(e) = runtime.shutdown_team(true, false).await {
        tracing::warn!(error = %e, "teardown after run failed");
    }

    let result = RunResult {
        status: if failed { "failed" } else { "completed" }.to_string(),
        team_name: request.team_name,
        task_results,
        duration: started.elapsed().as_millis() as u64,
        worker_count,
    };
    println!("{}", serde_json::to_string(&result)?);
    if failed {
        return Err(ExitError::expected("team run failed"));
    }
    Ok(())
}
