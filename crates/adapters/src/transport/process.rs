// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process transport: workers as direct child processes.
//!
//! The fallback when no terminal multiplexer is available. Slot
//! addresses are `pid:<n>`. Child stdout/stderr are buffered into a
//! bounded tail so the spawners' capture-based readiness heuristics work
//! without a terminal.

use super::{pid_alive, terminate_pid, SlotSpec, Transport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{ChildStdin, Command};

/// Lines of output retained per slot.
const CAPTURE_CAP: usize = 400;

struct Slot {
    session: String,
    pid: i32,
    output: Arc<Mutex<VecDeque<String>>>,
    stdin: Arc<tokio::sync::Mutex<Option<ChildStdin>>>,
    alive: Arc<Mutex<bool>>,
}

#[derive(Default)]
struct State {
    /// Session handle → registered (it holds no OS resource itself)
    sessions: HashMap<String, ()>,
    /// Address → slot
    slots: HashMap<String, Slot>,
}

/// Child-process transport.
#[derive(Clone, Default)]
pub struct ProcessTransport {
    state: Arc<Mutex<State>>,
}

impl ProcessTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn login_shell() -> String {
        std::env::var("SHELL").unwrap_or_else(|_| "/bin/sh".to_string())
    }

    fn slot_session(&self, address: &str) -> Option<String> {
        self.state
            .lock()
            .slots
            .get(address)
            .map(|s| s.session.clone())
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    async fn create_session(&self, name: &str, cwd: &Path) -> Result<String, TransportError> {
        if !cwd.exists() {
            return Err(TransportError::SpawnFailed(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }
        let handle = format!("omx-{}", name);
        self.state.lock().sessions.insert(handle.clone(), ());
        Ok(handle)
    }

    async fn add_slot(&self, handle: &str, spec: &SlotSpec) -> Result<String, TransportError> {
        if !self.state.lock().sessions.contains_key(handle) {
            return Err(TransportError::SessionNotFound(handle.to_string()));
        }

        let mut cmd = Command::new(Self::login_shell());
        cmd.arg("-lc")
            .arg(&spec.command)
            .current_dir(&spec.cwd)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(false);
        for (key, value) in &spec.env {
            cmd.env(key, value);
        }

        let mut child = cmd
            .spawn()
            .map_err(|e| TransportError::SpawnFailed(e.to_string()))?;
        let pid = child
            .id()
            .ok_or_else(|| TransportError::SpawnFailed("child exited at spawn".to_string()))?
            as i32;
        let address = format!("pid:{}", pid);

        let output = Arc::new(Mutex::new(VecDeque::with_capacity(CAPTURE_CAP)));
        let alive = Arc::new(Mutex::new(true));

        // One reader task per stream feeds the bounded tail
        if let Some(stdout) = child.stdout.take() {
            let buf = Arc::clone(&output);
            tokio::spawn(async move {
                let mut lines = BufReader::new(stdout).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    push_line(&buf, line);
                }
            });
        }
        if let Some(stderr) = child.stderr.take() {
            let buf = Arc::clone(&output);
            tokio::spawn(async move {
                let mut lines = BufReader::new(stderr).lines();
                while let Ok(Some(line)) = lines.next_line().await {
                    push_line(&buf, line);
                }
            });
        }

        let stdin = Arc::new(tokio::sync::Mutex::new(child.stdin.take()));

        // Reap the child and flip the alive flag on exit
        {
            let alive = Arc::clone(&alive);
            tokio::spawn(async move {
                let _ = child.wait().await;
                *alive.lock() = false;
            });
        }

        self.state.lock().slots.insert(
            address.clone(),
            Slot {
                session: handle.to_string(),
                pid,
                output,
                stdin,
                alive,
            },
        );

        tracing::debug!(address, title = %spec.title, "process slot spawned");
        Ok(address)
    }

    async fn send_text(&self, address: &str, text: &str) -> Result<(), TransportError> {
        let stdin = {
            let state = self.state.lock();
            let slot = state
                .slots
                .get(address)
                .ok_or_else(|| TransportError::SlotNotFound(address.to_string()))?;
            Arc::clone(&slot.stdin)
        };
        let mut guard = stdin.lock().await;
        let Some(handle) = guard.as_mut() else {
            return Err(TransportError::SlotNotFound(address.to_string()));
        };
        handle
            .write_all(text.as_bytes())
            .await
            .map_err(|e| TransportError::CommandFailed(e.to_string()))?;
        Ok(())
    }

    async fn send_trigger(&self, address: &str) -> Result<(), TransportError> {
        // CR plus LF mirrors the dual submit keys of the tmux variant
        self.send_text(address, "\r\n").await
    }

    async fn capture(&self, address: &str, lines: u32) -> Result<String, TransportError> {
        let state = self.state.lock();
        let slot = state
            .slots
            .get(address)
            .ok_or_else(|| TransportError::SlotNotFound(address.to_string()))?;
        let buf = slot.output.lock();
        let skip = buf.len().saturating_sub(lines as usize);
        Ok(buf
            .iter()
            .skip(skip)
            .cloned()
            .collect::<Vec<_>>()
            .join("\n"))
    }

    async fn kill_slot(&self, address: &str, grace: Duration) -> Result<(), TransportError> {
        let pid = {
            let state = self.state.lock();
            let slot = state
                .slots
                .get(address)
                .ok_or_else(|| TransportError::SlotNotFound(address.to_string()))?;
            slot.pid
        };
        terminate_pid(pid, grace).await;
        self.state.lock().slots.remove(address);
        Ok(())
    }

    async fn slot_pid(&self, address: &str) -> Result<Option<i32>, TransportError> {
        let state = self.state.lock();
        let slot = state
            .slots
            .get(address)
            .ok_or_else(|| TransportError::SlotNotFound(address.to_string()))?;
        Ok(Some(slot.pid))
    }

    async fn list_slots(&self, handle: &str) -> Result<Vec<String>, TransportError> {
        let state = self.state.lock();
        if !state.sessions.contains_key(handle) {
            return Err(TransportError::SessionNotFound(handle.to_string()));
        }
        let mut addresses: Vec<String> = state
            .slots
            .iter()
            .filter(|(_, slot)| slot.session == handle)
            .filter(|(_, slot)| *slot.alive.lock() && pid_alive(slot.pid))
            .map(|(address, _)| address.clone())
            .collect();
        addresses.sort();
        Ok(addresses)
    }

    async fn destroy_session(&self, handle: &str) -> Result<(), TransportError> {
        let addresses: Vec<String> = {
            let state = self.state.lock();
            state
                .slots
                .iter()
                .filter(|(_, slot)| slot.session == handle)
                .map(|(address, _)| address.clone())
                .collect()
        };
        for address in addresses {
            let _ = self.kill_slot(&address, Duration::from_secs(2)).await;
        }
        self.state.lock().sessions.remove(handle);
        Ok(())
    }
}

fn push_line(buf: &Arc<Mutex<VecDeque<String>>>, line: String) {
    let mut buf = buf.lock();
    if buf.len() == CAPTURE_CAP {
        buf.pop_front();
    }
    buf.push_back(line);
}

#[cfg(test)]
#[path = "process_tests.rs"]
mod tests;
