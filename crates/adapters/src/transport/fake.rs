// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake transport for testing
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{SlotSpec, Transport, TransportError};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Recorded transport call
#[derive(Debug, Clone)]
pub enum TransportCall {
    CreateSession { name: String },
    AddSlot { handle: String, title: String, command: String },
    SendText { address: String, text: String },
    SendTrigger { address: String },
    Capture { address: String },
    KillSlot { address: String },
    ListSlots { handle: String },
    DestroySession { handle: String },
}

#[derive(Debug, Clone)]
struct FakeSlot {
    session: String,
    output: Vec<String>,
    alive: bool,
    pid: Option<i32>,
}

#[derive(Default)]
struct FakeState {
    sessions: Vec<String>,
    slots: HashMap<String, FakeSlot>,
    calls: Vec<TransportCall>,
    next_id: u64,
    /// Addresses injected into list_slots without a backing slot
    foreign: HashMap<String, Vec<String>>,
}

/// Call-recording fake transport.
///
/// Slots get `%<n>` addresses like the tmux variant so address-shape
/// assertions hold in engine tests.
#[derive(Clone, Default)]
pub struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded calls
    pub fn calls(&self) -> Vec<TransportCall> {
        self.state.lock().calls.clone()
    }

    /// Addresses kill_slot was invoked for, in order
    pub fn killed(&self) -> Vec<String> {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                TransportCall::KillSlot { address } => Some(address.clone()),
                _ => None,
            })
            .collect()
    }

    /// Replace a slot's visible output (what capture returns)
    pub fn set_output(&self, address: &str, output: Vec<String>) {
        if let Some(slot) = self.state.lock().slots.get_mut(address) {
            slot.output = output;
        }
    }

    /// Mark a slot dead: it disappears from list_slots
    pub fn set_dead(&self, address: &str) {
        if let Some(slot) = self.state.lock().slots.get_mut(address) {
            slot.alive = false;
        }
    }

    /// Script the pid slot_pid reports for an address
    pub fn set_slot_pid(&self, address: &str, pid: i32) {
        if let Some(slot) = self.state.lock().slots.get_mut(address) {
            slot.pid = Some(pid);
        }
    }

    /// Inject an address into a session's list_slots that no slot backs
    /// (a foreign pane)
    pub fn add_foreign_slot(&self, handle: &str, address: &str) {
        self.state
            .lock()
            .foreign
            .entry(handle.to_string())
            .or_default()
            .push(address.to_string());
    }

    /// Whether the session is still registered
    pub fn session_exists(&self, handle: &str) -> bool {
        self.state.lock().sessions.iter().any(|s| s == handle)
    }

    /// Text sent to an address, concatenated
    pub fn sent_text(&self, address: &str) -> String {
        self.state
            .lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                TransportCall::SendText { address: a, text } if a == address => {
                    Some(text.clone())
                }
                _ => None,
            })
            .collect()
    }

    /// Number of triggers sent to an address
    pub fn trigger_count(&self, address: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| matches!(c, TransportCall::SendTrigger { address: a } if a == address))
            .count()
    }
}

#[async_trait]
impl Transport for FakeTransport {
    async fn create_session(&self, name: &str, _cwd: &Path) -> Result<String, TransportError> {
        let mut state = self.state.lock();
        let handle = format!("omx-{}", name);
        state.calls.push(TransportCall::CreateSession {
            name: name.to_string(),
        });
        if !state.sessions.contains(&handle) {
            state.sessions.push(handle.clone());
        }
        Ok(handle)
    }

    async fn add_slot(&self, handle: &str, spec: &SlotSpec) -> Result<String, TransportError> {
        let mut state = self.state.lock();
        if !state.sessions.iter().any(|s| s == handle) {
            return Err(TransportError::SessionNotFound(handle.to_string()));
        }
        state.next_id += 1;
        let address = format!("%{}", state.next_id);
        state.calls.push(TransportCall::AddSlot {
            handle: handle.to_string(),
            title: spec.title.clone(),
            command: spec.command.clone(),
        });
        state.slots.insert(
            address.clone(),
            FakeSlot {
                session: handle.to_string(),
                output: Vec::new(),
                alive: true,
                pid: None,
            },
        );
        Ok(address)
    }

    async fn send_text(&self, address: &str, text: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::SendText {
            address: address.to_string(),
            text: text.to_string(),
        });
        if !state.slots.contains_key(address) {
            return Err(TransportError::SlotNotFound(address.to_string()));
        }
        Ok(())
    }

    async fn send_trigger(&self, address: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::SendTrigger {
            address: address.to_string(),
        });
        if !state.slots.contains_key(address) {
            return Err(TransportError::SlotNotFound(address.to_string()));
        }
        Ok(())
    }

    async fn capture(&self, address: &str, lines: u32) -> Result<String, TransportError> {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::Capture {
            address: address.to_string(),
        });
        match state.slots.get(address) {
            Some(slot) => {
                let skip = slot.output.len().saturating_sub(lines as usize);
                Ok(slot.output[skip..].join("\n"))
            }
            None => Err(TransportError::SlotNotFound(address.to_string())),
        }
    }

    async fn kill_slot(&self, address: &str, _grace: Duration) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::KillSlot {
            address: address.to_string(),
        });
        if let Some(slot) = state.slots.get_mut(address) {
            slot.alive = false;
        }
        Ok(())
    }

    async fn slot_pid(&self, address: &str) -> Result<Option<i32>, TransportError> {
        let state = self.state.lock();
        match state.slots.get(address) {
            Some(slot) => Ok(slot.pid),
            None => Err(TransportError::SlotNotFound(address.to_string())),
        }
    }

    async fn list_slots(&self, handle: &str) -> Result<Vec<String>, TransportError> {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::ListSlots {
            handle: handle.to_string(),
        });
        if !state.sessions.iter().any(|s| s == handle) {
            return Err(TransportError::SessionNotFound(handle.to_string()));
        }
        let mut addresses: Vec<String> = state
            .slots
            .iter()
            .filter(|(_, slot)| slot.session == handle && slot.alive)
            .map(|(address, _)| address.clone())
            .collect();
        if let Some(foreign) = state.foreign.get(handle) {
            addresses.extend(foreign.iter().cloned());
        }
        addresses.sort();
        Ok(addresses)
    }

    async fn destroy_session(&self, handle: &str) -> Result<(), TransportError> {
        let mut state = self.state.lock();
        state.calls.push(TransportCall::DestroySession {
            handle: handle.to_string(),
        });
        state.sessions.retain(|s| s != handle);
        state.slots.retain(|_, slot| slot.session != handle);
        state.foreign.remove(handle);
        Ok(())
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
