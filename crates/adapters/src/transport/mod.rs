// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker slot transports.
//!
//! A transport hosts worker processes in addressable "slots": panes of a
//! shared terminal-multiplexer session, or plain child processes. The
//! runtime never talks to tmux or to `std::process` directly.

mod process;
mod tmux;

pub use process::ProcessTransport;
pub use tmux::TmuxTransport;

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeTransport, TransportCall};

use crate::subprocess::{run_with_timeout, PROBE_TIMEOUT};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Errors from transport operations
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("slot not found: {0}")]
    SlotNotFound(String),
    #[error("invalid slot address: {0}")]
    InvalidAddress(String),
    #[error("spawn failed: {0}")]
    SpawnFailed(String),
    #[error("command failed: {0}")]
    CommandFailed(String),
    #[error("terminal multiplexer unavailable: {0}")]
    Unavailable(String),
}

/// What to run in a new slot.
#[derive(Debug, Clone)]
pub struct SlotSpec {
    /// Human label (worker name); used for pane titles
    pub title: String,
    pub cwd: PathBuf,
    /// Shell command line, executed under the login shell
    pub command: String,
    pub env: Vec<(String, String)>,
}

/// Adapter for hosting worker slots.
#[async_trait]
pub trait Transport: Clone + Send + Sync + 'static {
    /// Create the shared session for a team. Returns an opaque handle.
    async fn create_session(&self, name: &str, cwd: &Path) -> Result<String, TransportError>;

    /// Add one worker slot to the session. Returns an opaque address.
    async fn add_slot(&self, handle: &str, spec: &SlotSpec) -> Result<String, TransportError>;

    /// Send literal text to a slot (no key interpretation).
    async fn send_text(&self, address: &str, text: &str) -> Result<(), TransportError>;

    /// Send the submit control sequence: both a carriage return and an
    /// Enter keypress, to cover dual submit bindings.
    async fn send_trigger(&self, address: &str) -> Result<(), TransportError>;

    /// A bounded tail of the slot's visible output.
    async fn capture(&self, address: &str, lines: u32) -> Result<String, TransportError>;

    /// Terminate a slot: SIGTERM-equivalent, wait up to `grace`, then
    /// force.
    async fn kill_slot(&self, address: &str, grace: Duration) -> Result<(), TransportError>;

    /// Pid of the process hosted in a slot, when the transport knows it.
    async fn slot_pid(&self, address: &str) -> Result<Option<i32>, TransportError>;

    /// Addresses of every live slot in the session.
    async fn list_slots(&self, handle: &str) -> Result<Vec<String>, TransportError>;

    /// Tear the whole session down.
    async fn destroy_session(&self, handle: &str) -> Result<(), TransportError>;
}

/// Which transport variant to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    Tmux,
    Process,
}

impl std::fmt::Display for TransportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportKind::Tmux => write!(f, "tmux"),
            TransportKind::Process => write!(f, "process"),
        }
    }
}

/// Capability probe, run once at startup.
///
/// `OMX_FORCE_TRANSPORT` overrides; otherwise `tmux -V` decides. A
/// missing or failing multiplexer downgrades to the process transport.
pub async fn detect_transport() -> TransportKind {
    match crate::env::force_transport() {
        Some("tmux") => return TransportKind::Tmux,
        Some("process") => return TransportKind::Process,
        _ => {}
    }
    let mut cmd = Command::new("tmux");
    cmd.arg("-V");
    match run_with_timeout(cmd, PROBE_TIMEOUT, "tmux version probe").await {
        Ok(output) if output.status.success() => TransportKind::Tmux,
        Ok(_) | Err(_) => {
            tracing::info!("terminal multiplexer unavailable, using process transport");
            TransportKind::Process
        }
    }
}

/// Runtime-selected transport variant.
#[derive(Clone)]
pub enum AnyTransport {
    Tmux(TmuxTransport),
    Process(ProcessTransport),
}

impl AnyTransport {
    /// Probe capabilities and build the matching variant.
    pub async fn detect() -> Self {
        match detect_transport().await {
            TransportKind::Tmux => AnyTransport::Tmux(TmuxTransport::new()),
            TransportKind::Process => AnyTransport::Process(ProcessTransport::new()),
        }
    }

    pub fn kind(&self) -> TransportKind {
        match self {
            AnyTransport::Tmux(_) => TransportKind::Tmux,
            AnyTransport::Process(_) => TransportKind::Process,
        }
    }
}

#[async_trait]
impl Transport for AnyTransport {
    async fn create_session(&self, name: &str, cwd: &Path) -> Result<String, TransportError> {
        match self {
            AnyTransport::Tmux(t) => t.create_session(name, cwd).await,
            AnyTransport::Process(t) => t.create_session(name, cwd).await,
        }
    }

    async fn add_slot(&self, handle: &str, spec: &SlotSpec) -> Result<String, TransportError> {
        match self {
            AnyTransport::Tmux(t) => t.add_slot(handle, spec).await,
            AnyTransport::Process(t) => t.add_slot(handle, spec).await,
        }
    }

    async fn send_text(&self, address: &str, text: &str) -> Result<(), TransportError> {
        match self {
            AnyTransport::Tmux(t) => t.send_text(address, text).await,
            AnyTransport::Process(t) => t.send_text(address, text).await,
        }
    }

    async fn send_trigger(&self, address: &str) -> Result<(), TransportError> {
        match self {
            AnyTransport::Tmux(t) => t.send_trigger(address).await,
            AnyTransport::Process(t) => t.send_trigger(address).await,
        }
    }

    async fn capture(&self, address: &str, lines: u32) -> Result<String, TransportError> {
        match self {
            AnyTransport::Tmux(t) => t.capture(address, lines).await,
            AnyTransport::Process(t) => t.capture(address, lines).await,
        }
    }

    async fn kill_slot(&self, address: &str, grace: Duration) -> Result<(), TransportError> {
        match self {
            AnyTransport::Tmux(t) => t.kill_slot(address, grace).await,
            AnyTransport::Process(t) => t.kill_slot(address, grace).await,
        }
    }

    async fn slot_pid(&self, address: &str) -> Result<Option<i32>, TransportError> {
        match self {
            AnyTransport::Tmux(t) => t.slot_pid(address).await,
            AnyTransport::Process(t) => t.slot_pid(address).await,
        }
    }

    async fn list_slots(&self, handle: &str) -> Result<Vec<String>, TransportError> {
        match self {
            AnyTransport::Tmux(t) => t.list_slots(handle).await,
            AnyTransport::Process(t) => t.list_slots(handle).await,
        }
    }

    async fn destroy_session(&self, handle: &str) -> Result<(), TransportError> {
        match self {
            AnyTransport::Tmux(t) => t.destroy_session(handle).await,
            AnyTransport::Process(t) => t.destroy_session(handle).await,
        }
    }
}

/// Signal-0 probe: is the pid still live?
pub fn pid_alive(pid: i32) -> bool {
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid), None).is_ok()
}

/// SIGTERM, wait up to `grace` for exit, then SIGKILL.
pub(crate) async fn terminate_pid(pid: i32, grace: Duration) {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    let target = Pid::from_raw(pid);
    if kill(target, Signal::SIGTERM).is_err() {
        return; // already gone
    }
    let deadline = tokio::time::Instant::now() + grace;
    while tokio::time::Instant::now() < deadline {
        if !pid_alive(pid) {
            return;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    let _ = kill(target, Signal::SIGKILL);
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
