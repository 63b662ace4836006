// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The monitor: one reconciliation tick, callable repeatedly.

use crate::error::RuntimeError;
use crate::liveness::observed_dead;
use crate::runtime::TeamRuntime;
use crate::scaling::{recommend, RecommendInput};
use omx_adapters::{Spawner, Transport};
use omx_core::{
    Clock, EventId, EventKind, IdGen, MonitorSnapshot, PhaseTransition, RecommendationStreak,
    ScaleDirection, TaskCounts, TaskId, TeamEvent, TeamPhase, WorkerName, WorkerState,
    WorkerStatus,
};
use std::collections::{BTreeMap, HashSet};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Consecutive identical recommendations needed for high confidence.
const HIGH_CONFIDENCE_STREAK: u32 = 3;

/// What one tick did.
#[derive(Debug, Clone)]
pub struct TickReport {
    pub snapshot: MonitorSnapshot,
    /// Tasks rewritten to pending by the lease sweep
    pub swept: Vec<TaskId>,
    /// Messages whose recipients were triggered this tick
    pub notified: usize,
    pub nudged: bool,
    /// Workers removed by drain progress this tick
    pub drained: Vec<WorkerName>,
    pub auto_scaled: bool,
}

impl<T: Transport, S: Spawner, C: Clock, G: IdGen> TeamRuntime<T, S, C, G> {
    /// One monitor tick: observe, sweep leases, derive the phase, notify
    /// mailboxes, nudge the leader, recommend scaling, persist the
    /// snapshot.
    pub async fn monitor_tick(&self) -> Result<TickReport, RuntimeError> {
        let tick_started = std::time::Instant::now();
        let now = self.clock.now_utc();
        let manifest = self.require_manifest()?;

        let live_slots: HashSet<String> = self
            .transport
            .list_slots(&manifest.session)
            .await
            .unwrap_or_default()
            .into_iter()
            .collect();

        let prev = self
            .snapshots
            .read()
            .unwrap_or_else(|| MonitorSnapshot::initial(&self.team, now));

        // Observe workers, mark the observed-dead
        let mut workers_view: BTreeMap<WorkerName, WorkerState> = BTreeMap::new();
        let mut dead: Vec<WorkerName> = Vec::new();
        for entry in &manifest.workers {
            let heartbeat = self.heartbeats.read(&entry.name);
            let status = self.workers.read_status(&entry.name);
            let mut state = status.map(|s| s.state).unwrap_or(WorkerState::Unknown);

            let is_dead = observed_dead(
                heartbeat.as_ref(),
                entry.slot.as_deref(),
                &live_slots,
                now,
                self.config.inactivity_ceiling,
            );
            if is_dead {
                dead.push(entry.name.clone());
                self.heartbeats.mark_dead(&entry.name)?;
                if !matches!(state, WorkerState::Failed | WorkerState::Done) {
                    self.workers
                        .write_status(&entry.name, &WorkerStatus::failed("crashed", now))?;
                    self.append_event(
                        EventKind::WorkerStopped,
                        |e| e.with_worker(entry.name.as_str()).with_reason("crashed"),
                        now,
                    )?;
                    state = WorkerState::Failed;
                }
            }

            if state == WorkerState::Idle && prev.workers.get(&entry.name) != Some(&WorkerState::Idle)
            {
                self.append_event(
                    EventKind::WorkerIdle,
                    |e| e.with_worker(entry.name.as_str()),
                    now,
                )?;
            }
            workers_view.insert(entry.name.clone(), state);
        }

        // Lease sweep: expired claims of dead workers return to pending
        let dead_set: HashSet<WorkerName> = dead.iter().cloned().collect();
        let swept = self.tasks.sweep_expired(now, &dead_set)?;
        for id in &swept {
            tracing::info!(team = %self.team, task = %id, "expired claim swept back to pending");
        }

        // Announce newly terminal tasks
        let tasks = self.tasks.list();
        for task in &tasks {
            if task.status == omx_core::TaskStatus::Completed {
                if let Some(completed_at) = task.completed_at {
                    if completed_at > prev.updated_at {
                        self.append_event(
                            EventKind::TaskCompleted,
                            |e| e.with_task(task.id.clone()),
                            now,
                        )?;
                    }
                }
            }
        }

        // Phase reconciliation
        let counts = TaskCounts::tally(&tasks);
        let phase = TeamPhase::derive(prev.phase, &counts);
        let mut phase_log = prev.phase_log.clone();
        if phase != prev.phase {
            tracing::info!(team = %self.team, from = %prev.phase, to = %phase, "phase transition");
            phase_log.push(PhaseTransition {
                from: prev.phase,
                to: phase,
                at: now,
            });
        }

        // Trigger recipients of unnotified mail (one trigger per message
        // per tick)
        let mut notified = 0;
        for entry in &manifest.workers {
            if dead_set.contains(&entry.name) {
                continue;
            }
            let Some(slot) = entry.slot.as_deref() else {
                continue;
            };
            for message in self.mailbox.needing_notification(entry.name.as_str()) {
                if self.transport.send_trigger(slot).await.is_ok()
                    && self
                        .mailbox
                        .mark_notified(entry.name.as_str(), &message.message_id, now)?
                {
                    notified += 1;
                }
            }
        }

        // Surface fresh approval decisions
        for record in self.approvals.unannounced() {
            let decision = match record.decision {
                omx_storage::ApprovalDecision::Approve => "approve",
                omx_storage::ApprovalDecision::Reject => "reject",
            };
            self.append_event(
                EventKind::ApprovalDecision,
                |e| e.with_task(record.task_id.clone()).with_reason(decision),
                now,
            )?;
            self.approvals.mark_announced(&record.task_id)?;
        }

        // Progress scale-down drains
        let drained = self.advance_drains(&manifest, &live_slots).await?;

        // Leader nudge on team-wide inactivity
        let last_activity = manifest
            .workers
            .iter()
            .filter_map(|w| self.heartbeats.read(&w.name))
            .map(|hb| hb.last_turn_at)
            .max();
        let mut nudged = false;
        if let Some(last) = last_activity {
            let idle_ms = now.signed_duration_since(last).num_milliseconds();
            let cooled = prev
                .last_nudge_at
                .map(|t| {
                    now.signed_duration_since(t).num_milliseconds()
                        >= self.config.nudge_cooldown.as_millis() as i64
                })
                .unwrap_or(true);
            if idle_ms >= self.config.leader_nudge.as_millis() as i64 && cooled {
                self.append_event(EventKind::TeamLeaderNudge, |e| e, now)?;
                nudged = true;
            }
        }

        // Scaling recommendation + streak
        let idle_ages: Vec<Duration> = manifest
            .workers
            .iter()
            .filter(|w| workers_view.get(&w.name) == Some(&WorkerState::Idle))
            .filter_map(|w| self.heartbeats.read(&w.name))
            .map(|hb| {
                Duration::from_millis(
                    now.signed_duration_since(hb.last_turn_at)
                        .num_milliseconds()
                        .max(0) as u64,
                )
            })
            .collect();
        let input = RecommendInput {
            counts: &counts,
            active_workers: manifest.active_worker_count,
            idle_ages: &idle_ages,
            policy: &manifest.scaling,
        };
        let mut recommendations = Vec::new();
        let streak = match recommend(&input) {
            Some(mut rec) => {
                let key = rec.streak_key();
                let count = if prev.recommendation_streak.key == key {
                    prev.recommendation_streak.count + 1
                } else {
                    1
                };
                rec.high_confidence = count >= HIGH_CONFIDENCE_STREAK;
                recommendations.push(rec);
                RecommendationStreak { key, count }
            }
            None => RecommendationStreak::default(),
        };

        // Auto-apply acts only on high-confidence recommendations
        let mut auto_scaled = false;
        if manifest.scaling.auto_apply {
            if let Some(rec) = recommendations.iter().find(|r| r.high_confidence) {
                auto_scaled = self.auto_apply(rec, &manifest).await;
            }
        }

        let tick_ms = tick_started.elapsed().as_millis() as u64;
        if tick_started.elapsed() > self.config.tick_budget {
            tracing::warn!(team = %self.team, tick_ms, "monitor tick exceeded soft budget");
        }

        let snapshot = MonitorSnapshot {
            team: self.team.clone(),
            phase,
            task_counts: counts,
            workers: workers_view,
            dead_workers: dead,
            recommendations,
            phase_log,
            recommendation_streak: streak,
            last_nudge_at: if nudged { Some(now) } else { prev.last_nudge_at },
            tick_ms,
            updated_at: now,
        };
        self.snapshots.write(&snapshot)?;

        Ok(TickReport {
            snapshot,
            swept,
            notified,
            nudged,
            drained,
            auto_scaled,
        })
    }

    /// Run ticks until cancelled or `on_tick` returns false. The interval
    /// is clamped to the configured minimum.
    pub async fn monitor_loop(
        &self,
        poll: Duration,
        cancel: &CancellationToken,
        mut on_tick: impl FnMut(&TickReport) -> bool,
    ) -> Result<(), RuntimeError> {
        let interval = poll.max(self.config.min_tick_interval);
        loop {
            if cancel.is_cancelled() {
                return Ok(());
            }
            let report = self.monitor_tick().await?;
            if !on_tick(&report) {
                return Ok(());
            }
            tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }

    async fn auto_apply(&self, rec: &omx_core::Recommendation, manifest: &omx_core::TeamManifest) -> bool {
        let cooldown = Duration::from_millis(manifest.scaling.cooldown_ms);
        if !self.cooldown_elapsed(cooldown) {
            return false;
        }
        match rec.direction {
            ScaleDirection::Up => {
                match self
                    .scale_up(rec.count, None, omx_core::ScalingTrigger::Auto)
                    .await
                {
                    Ok(crate::scaling::ScaleUpOutcome::Applied { .. }) => true,
                    Ok(outcome) => {
                        tracing::debug!(team = %self.team, ?outcome, "auto scale-up not applied");
                        false
                    }
                    Err(e) => {
                        tracing::warn!(team = %self.team, error = %e, "auto scale-up failed");
                        false
                    }
                }
            }
            ScaleDirection::Down => {
                match self
                    .begin_scale_down(rec.count, omx_core::ScalingTrigger::Auto)
                    .await
                {
                    Ok(crate::scaling::ScaleDownOutcome::Draining { .. }) => true,
                    Ok(outcome) => {
                        tracing::debug!(team = %self.team, ?outcome, "auto scale-down not applied");
                        false
                    }
                    Err(e) => {
                        tracing::warn!(team = %self.team, error = %e, "auto scale-down failed");
                        false
                    }
                }
            }
        }
    }

    pub(crate) fn append_event(
        &self,
        kind: EventKind,
        build: impl FnOnce(TeamEvent) -> TeamEvent,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<(), RuntimeError> {
        let event = build(TeamEvent::new(
            EventId::new(self.idgen.next()),
            &self.team,
            kind,
            now,
        ));
        self.events.append(&event)?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "monitor_tests.rs"]
mod tests;
