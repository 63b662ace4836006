// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Observed-dead determination.
//!
//! "Observed dead" feeds lease expiry, scale-in safety, and failure
//! reporting; it never mutates task state by itself.

use chrono::{DateTime, Utc};
use omx_core::Heartbeat;
use std::collections::HashSet;
use std::time::Duration;

/// Outcome of the signal-0 pid probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PidProbe {
    Alive,
    Dead,
    /// The probe cannot settle the question: no pid was recorded for
    /// the worker, the process belongs to someone else (EPERM), or the
    /// kernel answered with something other than ESRCH.
    Unknown,
}

/// Signal-0 probe. Only ESRCH reads as dead; everything the probe
/// cannot settle is [`PidProbe::Unknown`] and left to the staleness
/// check.
pub fn probe_pid(pid: i32) -> PidProbe {
    if pid <= 0 {
        return PidProbe::Unknown;
    }
    use nix::errno::Errno;
    match nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None) {
        Ok(()) => PidProbe::Alive,
        Err(Errno::ESRCH) => PidProbe::Dead,
        Err(_) => PidProbe::Unknown,
    }
}

/// A worker is observed dead when any of:
/// (a) its recorded pid probes dead (ESRCH);
/// (b) its heartbeat went silent past the inactivity ceiling AND the
///     probe cannot settle the pid — the independent trigger for pids
///     the probe has no answer for;
/// (c) its transport slot no longer appears in the live slot listing.
///
/// A worker whose probe settles `Alive` is never declared dead on
/// staleness alone.
pub fn observed_dead(
    heartbeat: Option<&Heartbeat>,
    slot: Option<&str>,
    live_slots: &HashSet<String>,
    now: DateTime<Utc>,
    inactivity_ceiling: Duration,
) -> bool {
    if let Some(address) = slot {
        if !live_slots.contains(address) {
            return true;
        }
    }
    let Some(hb) = heartbeat else {
        // Never bootstrapped far enough to have a heartbeat; judged by
        // slot presence above
        return slot.is_none();
    };
    match probe_pid(hb.pid) {
        PidProbe::Dead => true,
        PidProbe::Alive => false,
        PidProbe::Unknown => hb.is_stale(now, inactivity_ceiling.as_millis() as u64),
    }
}

#[cfg(test)]
#[path = "liveness_tests.rs"]
mod tests;
