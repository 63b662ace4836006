// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{recommend, RecommendInput, ScaleDownOutcome, ScaleDownSelection, ScaleUpOutcome};
use crate::error::RuntimeError;
use crate::test_helpers::{started_team, TestTeam};
use chrono::Duration as ChronoDuration;
use omx_adapters::Transport;
use omx_core::{
    AckStatus, Clock, ScaleDirection, ScalingPolicy, ScalingTrigger, SequentialIdGen, TaskCounts,
    TaskId, WorkerName, WorkerState, WorkerStatus,
};
use omx_storage::ClaimOutcome;
use std::time::Duration;

fn counts(pending: u32) -> TaskCounts {
    TaskCounts {
        pending,
        ..Default::default()
    }
}

fn policy() -> ScalingPolicy {
    ScalingPolicy::default()
}

#[test]
fn recommend_scale_up_on_backlog() {
    let policy = policy();
    let rec = recommend(&RecommendInput {
        counts: &counts(10),
        active_workers: 2,
        idle_ages: &[],
        policy: &policy,
    })
    .unwrap();
    assert_eq!(rec.direction, ScaleDirection::Up);
    // ceil(10/3) - 2 = 2
    assert_eq!(rec.count, 2);
    assert!(!rec.high_confidence);
}

#[test]
fn recommend_none_when_backlog_is_manageable() {
    let policy = policy();
    assert!(recommend(&RecommendInput {
        counts: &counts(5),
        active_workers: 2,
        idle_ages: &[],
        policy: &policy,
    })
    .is_none());
}

#[test]
fn recommend_scale_down_requires_idle_timeout() {
    let policy = policy();
    let fresh = [Duration::from_secs(10), Duration::from_secs(10)];
    assert!(recommend(&RecommendInput {
        counts: &counts(0),
        active_workers: 2,
        idle_ages: &fresh,
        policy: &policy,
    })
    .is_none());

    let old = [Duration::from_secs(200), Duration::from_secs(200)];
    let rec = recommend(&RecommendInput {
        counts: &counts(0),
        active_workers: 2,
        idle_ages: &old,
        policy: &policy,
    })
    .unwrap();
    assert_eq!(rec.direction, ScaleDirection::Down);
    // idle(2) - ceil(2 * 0.5) = 1
    assert_eq!(rec.count, 1);
}

#[test]
fn recommend_with_no_workers_is_none() {
    let policy = policy();
    assert!(recommend(&RecommendInput {
        counts: &counts(100),
        active_workers: 0,
        idle_ages: &[],
        policy: &policy,
    })
    .is_none());
}

fn relax_resource_limits(fx: &TestTeam) {
    fx.runtime
        .manifests
        .mutate(|m| {
            m.resource_limits.max_cpu_percent = 100_000.0;
            m.resource_limits.min_free_mem_mb = 0;
            m.scaling.per_worker_mem_mb = 0;
        })
        .unwrap_or_else(|e| panic!("mutate: {}", e));
}

#[tokio::test]
async fn scale_up_adds_workers_and_records_history() {
    let fx = started_team("t1", &["executor"], &[]).await;
    relax_resource_limits(&fx);

    let outcome = fx
        .runtime
        .scale_up(2, None, ScalingTrigger::Manual)
        .await
        .unwrap();

    let ScaleUpOutcome::Applied { added } = outcome else {
        panic!("expected Applied, got {:?}", outcome);
    };
    assert_eq!(added, vec![WorkerName::for_index(2), WorkerName::for_index(3)]);

    let manifest = fx.runtime.require_manifest().unwrap();
    assert_eq!(manifest.active_worker_count, 3);
    // New workers inherit the team's original agent type
    assert!(manifest.workers.iter().all(|w| w.role == "executor"));

    let history = fx.runtime.history().read();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].workers_added, Some(2));
}

#[tokio::test]
async fn scale_up_respects_ceiling() {
    let fx = started_team("t1", &["executor", "executor"], &[]).await;
    fx.runtime
        .manifests
        .mutate(|m| m.scaling.max_workers = 2)
        .unwrap();

    let outcome = fx
        .runtime
        .scale_up(1, None, ScalingTrigger::Manual)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        ScaleUpOutcome::CeilingReached { max_workers: 2 }
    ));
}

#[tokio::test]
async fn scale_up_respects_cooldown() {
    let fx = started_team("t1", &["executor"], &[]).await;
    relax_resource_limits(&fx);

    let first = fx
        .runtime
        .scale_up(1, None, ScalingTrigger::Manual)
        .await
        .unwrap();
    assert!(matches!(first, ScaleUpOutcome::Applied { .. }));

    // Cooldown (60s) has not elapsed on the frozen clock
    let second = fx
        .runtime
        .scale_up(1, None, ScalingTrigger::Manual)
        .await
        .unwrap();
    assert!(matches!(second, ScaleUpOutcome::CooldownActive));

    fx.clock.advance(Duration::from_secs(61));
    let third = fx
        .runtime
        .scale_up(1, None, ScalingTrigger::Manual)
        .await
        .unwrap();
    assert!(matches!(third, ScaleUpOutcome::Applied { .. }));
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn scale_up_denied_without_memory_headroom() {
    let fx = started_team("t1", &["executor"], &[]).await;
    fx.runtime
        .manifests
        .mutate(|m| {
            m.resource_limits.max_cpu_percent = 100_000.0;
            m.resource_limits.min_free_mem_mb = u64::MAX;
        })
        .unwrap();

    let outcome = fx
        .runtime
        .scale_up(1, None, ScalingTrigger::Manual)
        .await
        .unwrap();
    let ScaleUpOutcome::ResourceDenied { reason } = outcome else {
        panic!("expected ResourceDenied, got {:?}", outcome);
    };
    assert!(reason.contains("free memory"));
}

#[tokio::test]
async fn scale_up_explicit_agent_type_wins() {
    let fx = started_team("t1", &["executor"], &[]).await;
    relax_resource_limits(&fx);

    fx.runtime
        .scale_up(1, Some("reviewer".into()), ScalingTrigger::Manual)
        .await
        .unwrap();

    let manifest = fx.runtime.require_manifest().unwrap();
    let added = manifest.worker(&WorkerName::for_index(2)).unwrap();
    assert_eq!(added.role, "reviewer");
}

// S5: scale-down drains the highest-index idle worker, leaves the
// working one alone.
#[tokio::test]
async fn scale_down_selects_lifo_idle_and_drains() {
    let fx = started_team("t1", &["executor", "executor", "executor"], &[("T1", "")]).await;
    let now = fx.clock.now_utc();

    // worker-2 is mid-task
    let outcome = fx
        .runtime
        .tasks()
        .claim(
            &TaskId::new("1"),
            &WorkerName::for_index(2),
            &[],
            &SequentialIdGen::new("tok"),
            now,
            900_000,
        )
        .unwrap();
    assert!(matches!(outcome, ClaimOutcome::Claimed { .. }));
    fx.runtime
        .workers
        .write_status(
            &WorkerName::for_index(2),
            &WorkerStatus {
                state: WorkerState::Working,
                current_task_id: Some(TaskId::new("1")),
                reason: None,
                updated_at: now,
            },
        )
        .unwrap();

    // worker-3 will accept the shutdown request as soon as it lands
    fx.runtime
        .signals
        .write_ack(
            &WorkerName::for_index(3),
            AckStatus::Accept,
            None,
            now + ChronoDuration::seconds(1),
        )
        .unwrap();

    let (outcome, removed) = fx
        .runtime
        .scale_down_and_wait(
            ScaleDownSelection::Count(1),
            ScalingTrigger::Manual,
            Duration::from_secs(5),
        )
        .await
        .unwrap();

    let ScaleDownOutcome::Draining { workers } = outcome else {
        panic!("expected Draining, got {:?}", outcome);
    };
    assert_eq!(workers, vec![WorkerName::for_index(3)]);
    assert_eq!(removed, vec![WorkerName::for_index(3)]);

    let manifest = fx.runtime.require_manifest().unwrap();
    assert_eq!(manifest.active_worker_count, 2);
    assert!(manifest.worker(&WorkerName::for_index(3)).is_none());
    assert!(manifest.draining_workers.is_empty());

    // worker-3's slot was killed; worker-2 and its task are untouched
    assert_eq!(fx.transport.killed().len(), 1);
    let task = fx.runtime.tasks().get(&TaskId::new("1")).unwrap();
    assert_eq!(task.status, omx_core::TaskStatus::InProgress);
}

#[tokio::test]
async fn scale_down_stops_at_floor() {
    let fx = started_team("t1", &["executor"], &[]).await;
    let outcome = fx
        .runtime
        .begin_scale_down(1, ScalingTrigger::Manual)
        .await
        .unwrap();
    assert!(matches!(
        outcome,
        ScaleDownOutcome::FloorReached { min_workers: 1 }
    ));
}

#[tokio::test]
async fn draining_worker_cannot_claim_new_work() {
    let fx = started_team("t1", &["executor", "executor"], &[("T1", "")]).await;
    fx.runtime
        .begin_scale_down_named(&WorkerName::for_index(2), ScalingTrigger::Manual)
        .await
        .unwrap();

    let manifest = fx.runtime.require_manifest().unwrap();
    let outcome = fx
        .runtime
        .tasks()
        .claim(
            &TaskId::new("1"),
            &WorkerName::for_index(2),
            &manifest.draining_workers,
            &SequentialIdGen::new("tok"),
            fx.clock.now_utc(),
            900_000,
        )
        .unwrap();
    assert!(matches!(outcome, ClaimOutcome::DrainingWorker));
}

#[tokio::test]
async fn scale_down_unknown_worker_errors() {
    let fx = started_team("t1", &["executor"], &[]).await;
    let result = fx
        .runtime
        .begin_scale_down_named(&WorkerName::for_index(42), ScalingTrigger::Manual)
        .await;
    assert!(matches!(result, Err(RuntimeError::WorkerNotFound(_))));
}

#[tokio::test]
async fn drain_with_open_claim_waits_for_terminal_state() {
    let fx = started_team("t1", &["executor", "executor"], &[("T1", "")]).await;
    let now = fx.clock.now_utc();
    let ClaimOutcome::Claimed { token, .. } = fx
        .runtime
        .tasks()
        .claim(
            &TaskId::new("1"),
            &WorkerName::for_index(2),
            &[],
            &SequentialIdGen::new("tok"),
            now,
            900_000,
        )
        .unwrap()
    else {
        panic!("claim failed");
    };

    fx.runtime
        .begin_scale_down_named(&WorkerName::for_index(2), ScalingTrigger::Manual)
        .await
        .unwrap();

    // One drain step: still holding the claim, nothing requested
    let manifest = fx.runtime.require_manifest().unwrap();
    let live = fx
        .transport
        .list_slots(&manifest.session)
        .await
        .unwrap()
        .into_iter()
        .collect();
    let removed = fx.runtime.advance_drains(&manifest, &live).await.unwrap();
    assert!(removed.is_empty());
    assert!(fx
        .runtime
        .signals
        .read_request(&WorkerName::for_index(2))
        .is_none());

    // Finish the task; the next drain step sends the request
    fx.runtime
        .tasks()
        .transition(
            &TaskId::new("1"),
            &token,
            omx_core::TaskStatus::Completed,
            None,
            None,
            now,
        )
        .unwrap();
    let removed = fx.runtime.advance_drains(&manifest, &live).await.unwrap();
    assert!(removed.is_empty());
    assert!(fx
        .runtime
        .signals
        .read_request(&WorkerName::for_index(2))
        .is_some());
}
