// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Runtime tuning knobs, resolved from the environment once at startup.

use omx_adapters::env;
use std::time::Duration;

/// Per-process runtime configuration. Scaling thresholds live on the
/// manifest (persisted per team); these are the process-local knobs.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Budget for one worker's readiness wait
    pub ready_timeout: Duration,
    /// Re-capture cadence inside the readiness wait
    pub ready_poll: Duration,
    /// Task claim lease
    pub claim_lease: Duration,
    /// Ack wait budget during shutdown
    pub shutdown_grace: Duration,
    /// Grace passed to kill_slot
    pub kill_grace: Duration,
    /// Team-wide inactivity before a leader nudge
    pub leader_nudge: Duration,
    /// Minimum spacing between leader nudges
    pub nudge_cooldown: Duration,
    /// Scale-down drain budget before a warning
    pub drain_timeout: Duration,
    /// Floor for the monitor loop interval
    pub min_tick_interval: Duration,
    /// Soft budget for one tick; slower ticks log a warning
    pub tick_budget: Duration,
    /// Heartbeat silence beyond this marks a worker suspect
    pub inactivity_ceiling: Duration,
    /// Whether auto-apply of scaling recommendations starts enabled
    pub auto_scale: bool,
    /// Flag tokens inherited from the leader's own invocation, passed
    /// through (sanitized) to each worker CLI
    pub inherited_args: Vec<String>,
    /// Explicit model override for every worker
    pub model_override: Option<String>,
    /// Shell rc file sourced before each worker CLI is exec'd
    pub shell_rc: Option<std::path::PathBuf>,
}

impl RuntimeConfig {
    pub fn from_env() -> Self {
        Self {
            ready_timeout: env::ready_timeout(),
            ready_poll: Duration::from_millis(250),
            claim_lease: env::claim_lease(),
            shutdown_grace: env::shutdown_grace(),
            kill_grace: Duration::from_secs(5),
            leader_nudge: env::leader_nudge(),
            nudge_cooldown: env::leader_nudge(),
            drain_timeout: env::drain_timeout(),
            min_tick_interval: Duration::from_secs(1),
            tick_budget: Duration::from_secs(5),
            inactivity_ceiling: Duration::from_secs(600),
            auto_scale: env::auto_scale(),
            inherited_args: Vec::new(),
            model_override: env::model_override(),
            shell_rc: env::shell_rc(),
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::from_env()
    }
}
