// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `omx team` verb set.

use crate::exit_error::ExitError;
use crate::output::{render_status, render_tick, OutputFormat};
use anyhow::Result;
use clap::{Args, Subcommand};
use omx_adapters::{AnySpawner, AnyTransport, SpawnerKind};
use omx_core::{
    LeaderIdentity, MonitorSnapshot, PermissionsSnapshot, ScalingTrigger, TaskCounts, WorkerName,
    WorkerState,
};
use omx_engine::{
    ScaleDownOutcome, ScaleDownSelection, ScaleUpOutcome, ShutdownOutcome, StartSpec, TeamRuntime,
    WorkerSpec,
};
use omx_storage::{ManifestStore, NewTask, TeamPaths};
use std::collections::BTreeMap;
use std::path::Path;
use tokio_util::sync::CancellationToken;

#[derive(Subcommand)]
pub enum TeamCommand {
    /// Start a team: N workers against a derived task list
    Start(StartArgs),
    /// Print task counts, worker states, phase, and recommendations
    Status { team: String },
    /// Run monitor ticks, one structured line per tick
    Monitor {
        team: String,
        /// Tick interval in milliseconds
        #[arg(long, default_value_t = 1000)]
        poll: u64,
    },
    /// Graceful shutdown (--force to skip the gate)
    Shutdown {
        team: String,
        #[arg(long)]
        force: bool,
    },
    /// Add workers
    ScaleUp {
        team: String,
        /// `k` or `k:agent-type`
        #[arg(default_value = "1")]
        spec: String,
    },
    /// Drain and remove workers
    ScaleDown {
        team: String,
        /// `k` or a worker name
        #[arg(default_value = "1")]
        spec: String,
    },
    /// Toggle auto-apply of scaling recommendations
    ScaleAuto {
        team: String,
        #[arg(value_parser = ["on", "off"])]
        mode: String,
    },
    /// Forced cleanup; safe after a crash
    Cleanup { team: String },
    /// Print recent team events
    Events {
        team: String,
        /// Number of recent events to show
        #[arg(short = 'n', long, default_value_t = 50)]
        limit: usize,
    },
    /// Drive a whole team run from a JSON request on stdin
    Run(RunCliArgs),
}

#[derive(Args)]
pub struct StartArgs {
    pub team: String,
    /// Worker spec: `N` or `N:agent-type`
    pub workers: String,
    /// Task descriptors; each becomes one task (first line is the
    /// subject)
    #[arg(required = true)]
    pub tasks: Vec<String>,
}

#[derive(Args)]
pub struct RunCliArgs {
    /// Tick interval override in milliseconds
    #[arg(long)]
    pub poll: Option<u64>,
}

type CliRuntime = TeamRuntime<AnyTransport, AnySpawner>;

pub async fn run(command: TeamCommand, project_root: &Path, output: OutputFormat) -> Result<()> {
    match command {
        TeamCommand::Start(args) => start(args, project_root).await,
        TeamCommand::Status { team } => status(&team, project_root, output).await,
        TeamCommand::Monitor { team, poll } => monitor(&team, poll, project_root).await,
        TeamCommand::Shutdown { team, force } => shutdown(&team, force, project_root).await,
        TeamCommand::ScaleUp { team, spec } => scale_up(&team, &spec, project_root).await,
        TeamCommand::ScaleDown { team, spec } => scale_down(&team, &spec, project_root).await,
        TeamCommand::ScaleAuto { team, mode } => scale_auto(&team, &mode, project_root),
        TeamCommand::Cleanup { team } => cleanup(&team, project_root).await,
        TeamCommand::Events { team, limit } => events(&team, limit, project_root),
        TeamCommand::Run(args) => super::run::run_from_stdin(args, project_root).await,
    }
}

/// Build the runtime for an existing or new team. The spawner kind
/// follows the agent type (start/scale-up) or the team's original role.
pub(crate) async fn build_runtime(
    project_root: &Path,
    team: &str,
    agent_type_hint: Option<&str>,
) -> CliRuntime {
    let transport = AnyTransport::detect().await;
    let role = agent_type_hint.map(str::to_string).or_else(|| {
        ManifestStore::new(TeamPaths::new(project_root, team))
            .load()
            .and_then(|m| m.original_role().map(str::to_string))
    });
    let kind = role
        .as_deref()
        .map(SpawnerKind::for_agent_type)
        .unwrap_or(SpawnerKind::Codex);
    TeamRuntime::new(
        project_root.to_path_buf(),
        team,
        transport,
        AnySpawner::for_kind(kind),
    )
}

pub(crate) fn leader_identity() -> LeaderIdentity {
    LeaderIdentity {
        session_id: format!("omx-{}", std::process::id()),
        worker_id: "leader".into(),
        role: "leader".into(),
    }
}

/// Parse `N` / `N:agent-type` worker specs.
pub(crate) fn parse_worker_spec(spec: &str) -> Result<(u32, String)> {
    let (count, agent_type) = match spec.split_once(':') {
        Some((n, t)) if !t.is_empty() => (n, t.to_string()),
        Some((n, _)) => (n, "executor".to_string()),
        None => (spec, "executor".to_string()),
    };
    let count: u32 = count
        .parse()
        .map_err(|_| ExitError::expected(format!("invalid worker spec: {}", spec)))?;
    if count == 0 {
        return Err(ExitError::expected("worker count must be at least 1"));
    }
    Ok((count, agent_type))
}

/// A task descriptor's first line is its subject; the rest (if any) is
/// the description.
pub(crate) fn parse_task(descriptor: &str) -> NewTask {
    let mut lines = descriptor.splitn(2, '\n');
    let subject = lines.next().unwrap_or_default().trim().to_string();
    let description = lines.next().unwrap_or_default().trim().to_string();
    NewTask {
        subject,
        description,
        depends_on: Vec::new(),
        requires_code_change: false,
    }
}

async fn start(args: StartArgs, project_root: &Path) -> Result<()> {
    let (count, agent_type) = parse_worker_spec(&args.workers)?;
    let runtime = build_runtime(project_root, &args.team, Some(&agent_type)).await;

    let spec = StartSpec {
        task_description: args.tasks.join("; "),
        workers: (0..count)
            .map(|_| WorkerSpec {
                agent_type: agent_type.clone(),
            })
            .collect(),
        tasks: args.tasks.iter().map(|t| parse_task(t)).collect(),
        leader: leader_identity(),
        permissions: PermissionsSnapshot::default(),
        leader_pane: std::env::var("TMUX_PANE").ok(),
        hud_pane: None,
    };

    let cancel = CancellationToken::new();
    let manifest = runtime
        .start_team(spec, &cancel)
        .await
        .map_err(expected_failure)?;

    println!(
        "team {} started: {} workers, {} tasks",
        manifest.team,
        manifest.active_worker_count,
        manifest.next_task_id - 1
    );
    Ok(())
}

async fn status(team: &str, project_root: &Path, output: OutputFormat) -> Result<()> {
    let runtime = build_runtime(project_root, team, None).await;
    let manifest = runtime.require_manifest().map_err(expected_failure)?;

    // Fresh counts and worker states; phase and recommendations come
    // from the last persisted tick
    let snapshot = runtime
        .snapshots()
        .read()
        .unwrap_or_else(|| MonitorSnapshot::initial(team, chrono::Utc::now()));
    let counts = TaskCounts::tally(&runtime.tasks().list());
    let workers: BTreeMap<WorkerName, WorkerState> = manifest
        .workers
        .iter()
        .map(|w| {
            let state = runtime
                .worker_store()
                .read_status(&w.name)
                .map(|s| s.state)
                .unwrap_or(WorkerState::Unknown);
            (w.name.clone(), state)
        })
        .collect();
    let view = MonitorSnapshot {
        task_counts: counts,
        workers,
        ..snapshot
    };

    let uptime_secs = chrono::Utc::now()
        .signed_duration_since(manifest.created_at)
        .num_seconds()
        .max(0) as u64;
    let rendered = render_status(&view, manifest.active_worker_count, uptime_secs);
    let json = serde_json::json!({
        "team": view.team,
        "phase": view.phase,
        "tasks": view.task_counts,
        "workers": view.workers,
        "dead_workers": view.dead_workers,
        "recommendations": view.recommendations,
        "scaling_history": runtime.history().read().last(),
    });

    match output {
        OutputFormat::Text => {
            println!("{}", rendered);
            println!("{}", json);
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&json)?),
    }
    Ok(())
}

async fn monitor(team: &str, poll: u64, project_root: &Path) -> Result<()> {
    let runtime = build_runtime(project_root, team, None).await;
    runtime.require_manifest().map_err(expected_failure)?;

    let cancel = CancellationToken::new();
    let watchers = runtime.spawn_watchers(&cancel);

    let loop_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            loop_cancel.cancel();
        }
    });

    let result = runtime
        .monitor_loop(
            std::time::Duration::from_millis(poll),
            &cancel,
            |report| {
                println!("{}", render_tick(report));
                true
            },
        )
        .await;
    cancel.cancel();
    watchers.shutdown().await;
    result.map_err(expected_failure)?;
    Ok(())
}

async fn shutdown(team: &str, force: bool, project_root: &Path) -> Result<()> {
    let runtime = build_runtime(project_root, team, None).await;
    let outcome = runtime
        .shutdown_team(force, false)
        .await
        .map_err(expected_failure)?;
    match outcome {
        ShutdownOutcome::Done(summary) => {
            println!(
                "team {} shut down: {} slots killed, session {}",
                team,
                summary.targets.deduped_total,
                if summary.session_destroyed {
                    "destroyed"
                } else {
                    "left"
                }
            );
            println!("{}", serde_json::to_string(&summary)?);
            Ok(())
        }
        ShutdownOutcome::GateBlocked {
            busy_workers,
            non_terminal_tasks,
        } => Err(ExitError::expected(format!(
            "shutdown gate blocked: {} workers busy ({}), {} non-terminal tasks (use --force)",
            busy_workers.len(),
            busy_workers
                .iter()
                .map(|w| w.as_str())
                .collect::<Vec<_>>()
                .join(", "),
            non_terminal_tasks
        ))),
        ShutdownOutcome::Rejected { workers } => Err(ExitError::expected(format!(
            "shutdown rejected by {} (use --force)",
            workers
                .iter()
                .map(|(w, _)| w.as_str())
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    }
}

async fn scale_up(team: &str, spec: &str, project_root: &Path) -> Result<()> {
    let (count, agent_type) = match spec.split_once(':') {
        Some((n, t)) => (
            n.parse::<u32>()
                .map_err(|_| ExitError::expected(format!("invalid scale spec: {}", spec)))?,
            Some(t.to_string()),
        ),
        None => (
            spec.parse::<u32>()
                .map_err(|_| ExitError::expected(format!("invalid scale spec: {}", spec)))?,
            None,
        ),
    };
    let runtime = build_runtime(project_root, team, agent_type.as_deref()).await;
    let outcome = runtime
        .scale_up(count, agent_type, ScalingTrigger::Manual)
        .await
        .map_err(expected_failure)?;
    match outcome {
        ScaleUpOutcome::Applied { added } => {
            println!(
                "scaled up: added {}",
                added
                    .iter()
                    .map(|w| w.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            );
            Ok(())
        }
        ScaleUpOutcome::CeilingReached { max_workers } => Err(ExitError::expected(format!(
            "scale-up denied: worker ceiling {} reached",
            max_workers
        ))),
        ScaleUpOutcome::CooldownActive => {
            Err(ExitError::expected("scale-up denied: cooldown active"))
        }
        ScaleUpOutcome::ResourceDenied { reason } => Err(ExitError::expected(format!(
            "scale-up denied: {}",
            reason
        ))),
        ScaleUpOutcome::LockBusy => Err(ExitError::expected(
            "scale-up denied: another scaling operation holds the lock",
        )),
    }
}

async fn scale_down(team: &str, spec: &str, project_root: &Path) -> Result<()> {
    let runtime = build_runtime(project_root, team, None).await;
    let selection = match spec.parse::<u32>() {
        Ok(k) if k > 0 => ScaleDownSelection::Count(k),
        Ok(_) => return Err(ExitError::expected("scale-down count must be at least 1")),
        Err(_) => ScaleDownSelection::Named(WorkerName::new(spec)),
    };
    let (outcome, removed) = runtime
        .scale_down_and_wait(
            selection,
            ScalingTrigger::Manual,
            runtime.config().drain_timeout,
        )
        .await
        .map_err(expected_failure)?;
    match outcome {
        ScaleDownOutcome::Draining { workers } => {
            let drained: Vec<&str> = removed.iter().map(|w| w.as_str()).collect();
            let still: Vec<&str> = workers
                .iter()
                .filter(|w| !removed.contains(w))
                .map(|w| w.as_str())
                .collect();
            if still.is_empty() {
                println!("scaled down: removed {}", drained.join(", "));
            } else {
                println!(
                    "scale-down in progress: removed [{}], still draining [{}]",
                    drained.join(", "),
                    still.join(", ")
                );
            }
            Ok(())
        }
        ScaleDownOutcome::FloorReached { min_workers } => Err(ExitError::expected(format!(
            "scale-down denied: already at the {}-worker floor",
            min_workers
        ))),
        ScaleDownOutcome::NoCandidates => Err(ExitError::expected(
            "scale-down denied: no drainable workers",
        )),
        ScaleDownOutcome::LockBusy => Err(ExitError::expected(
            "scale-down denied: another scaling operation holds the lock",
        )),
    }
}

fn scale_auto(team: &str, mode: &str, project_root: &Path) -> Result<()> {
    let manifests = ManifestStore::new(TeamPaths::new(project_root, team));
    let enable = mode == "on";
    manifests
        .mutate(|m| m.scaling.auto_apply = enable)
        .map_err(|e| ExitError::expected(e.to_string()))?;
    println!("auto-scale {} for team {}", mode, team);
    Ok(())
}

async fn cleanup(team: &str, project_root: &Path) -> Result<()> {
    let runtime = build_runtime(project_root, team, None).await;
    let summary = runtime.cleanup().await.map_err(expected_failure)?;
    println!(
        "team {} cleaned up: {} slots killed, state {}",
        team,
        summary.targets.deduped_total,
        if summary.state_removed {
            "removed"
        } else {
            "preserved"
        }
    );
    println!("{}", serde_json::to_string(&summary)?);
    Ok(())
}

fn events(team: &str, limit: usize, project_root: &Path) -> Result<()> {
    let paths = TeamPaths::new(project_root, team);
    if ManifestStore::new(paths.clone()).load().is_none() {
        return Err(ExitError::expected(format!("team not found: {}", team)));
    }
    let log = omx_storage::EventLog::new(paths, team);
    for event in log.tail(limit) {
        println!("{}", serde_json::to_string(&event)?);
    }
    Ok(())
}

/// Runtime errors at the CLI boundary are expected failures (exit 1).
pub(crate) fn expected_failure(e: omx_engine::RuntimeError) -> anyhow::Error {
    ExitError::expected(e.to_string())
}

#[cfg(test)]
#[path = "team_tests.rs"]
mod tests;
