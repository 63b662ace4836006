// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tmux transport: one session per team, one pane per worker.

use super::{terminate_pid, SlotSpec, Transport, TransportError};
use crate::subprocess::{run_with_timeout, TMUX_TIMEOUT};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;
use tokio::process::Command;

/// Tmux-based transport. Slot addresses are pane ids with the leading
/// `%` tmux assigns; every accepting path validates that prefix.
#[derive(Clone, Default)]
pub struct TmuxTransport;

impl TmuxTransport {
    pub fn new() -> Self {
        Self
    }

    async fn tmux(args: &[&str], description: &str) -> Result<std::process::Output, TransportError> {
        let mut cmd = Command::new("tmux");
        cmd.args(args);
        run_with_timeout(cmd, TMUX_TIMEOUT, description)
            .await
            .map_err(TransportError::CommandFailed)
    }

    /// Reject anything that is not a normalized `%<n>` pane id before it
    /// can reach a tmux `-t` flag.
    fn validate_address(address: &str) -> Result<(), TransportError> {
        let valid = address.starts_with('%')
            && address.len() > 1
            && address[1..].chars().all(|c| c.is_ascii_digit());
        if valid {
            Ok(())
        } else {
            Err(TransportError::InvalidAddress(address.to_string()))
        }
    }

    async fn pane_pid(address: &str) -> Result<Option<i32>, TransportError> {
        let output = Self::tmux(
            &["display-message", "-t", address, "-p", "#{pane_pid}"],
            "tmux pane pid",
        )
        .await?;
        if !output.status.success() {
            return Ok(None);
        }
        let pid = String::from_utf8_lossy(&output.stdout).trim().parse().ok();
        Ok(pid)
    }
}

#[async_trait]
impl Transport for TmuxTransport {
    async fn create_session(&self, name: &str, cwd: &Path) -> Result<String, TransportError> {
        if !cwd.exists() {
            return Err(TransportError::SpawnFailed(format!(
                "working directory does not exist: {}",
                cwd.display()
            )));
        }

        let session_id = format!("omx-{}", name);

        // A stale session with the same name is from a dead run; replace it
        let existing = Self::tmux(&["has-session", "-t", &session_id], "tmux has-session").await;
        if existing.map(|o| o.status.success()).unwrap_or(false) {
            tracing::warn!(session_id, "session already exists, killing first");
            let _ = Self::tmux(&["kill-session", "-t", &session_id], "tmux kill-session").await;
        }

        let cwd_str = cwd.to_string_lossy().into_owned();
        let output = Self::tmux(
            &["new-session", "-d", "-s", &session_id, "-c", cwd_str.as_str()],
            "tmux new-session",
        )
        .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::error!(session_id, stderr = %stderr, "tmux session create failed");
            return Err(TransportError::SpawnFailed(stderr.to_string()));
        }

        Ok(session_id)
    }

    async fn add_slot(&self, handle: &str, spec: &SlotSpec) -> Result<String, TransportError> {
        let cwd_str = spec.cwd.to_string_lossy();
        let mut args: Vec<String> = vec![
            "split-window".into(),
            "-d".into(),
            "-P".into(),
            "-F".into(),
            "#{pane_id}".into(),
            "-t".into(),
            handle.to_string(),
            "-c".into(),
            cwd_str.into_owned(),
        ];
        for (key, value) in &spec.env {
            args.push("-e".into());
            args.push(format!("{}={}", key, value));
        }
        args.push(spec.command.clone());

        let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
        let output = Self::tmux(&arg_refs, "tmux split-window").await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TransportError::SpawnFailed(stderr.to_string()));
        }

        let address = String::from_utf8_lossy(&output.stdout).trim().to_string();
        Self::validate_address(&address)?;

        // Even out the layout and label the pane; both are cosmetic
        let _ = Self::tmux(&["select-layout", "-t", handle, "tiled"], "tmux layout").await;
        let _ = Self::tmux(
            &["select-pane", "-t", &address, "-T", &spec.title],
            "tmux pane title",
        )
        .await;

        Ok(address)
    }

    async fn send_text(&self, address: &str, text: &str) -> Result<(), TransportError> {
        Self::validate_address(address)?;
        // -l = literal mode (no key name interpretation)
        // -- = end of options (handles text starting with -)
        let output = Self::tmux(
            &["send-keys", "-t", address, "-l", "--", text],
            "tmux send-keys",
        )
        .await?;
        if !output.status.success() {
            return Err(TransportError::SlotNotFound(address.to_string()));
        }
        Ok(())
    }

    async fn send_trigger(&self, address: &str) -> Result<(), TransportError> {
        Self::validate_address(address)?;
        // Both a carriage return and an Enter keypress: CLIs differ in
        // which binding submits
        for key in ["C-m", "Enter"] {
            let output =
                Self::tmux(&["send-keys", "-t", address, key], "tmux send-keys").await?;
            if !output.status.success() {
                return Err(TransportError::SlotNotFound(address.to_string()));
            }
        }
        Ok(())
    }

    async fn capture(&self, address: &str, lines: u32) -> Result<String, TransportError> {
        Self::validate_address(address)?;
        let start = format!("-{}", lines);
        let output = Self::tmux(
            &["capture-pane", "-p", "-t", address, "-S", &start],
            "tmux capture-pane",
        )
        .await?;
        if !output.status.success() {
            return Err(TransportError::SlotNotFound(address.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }

    async fn kill_slot(&self, address: &str, grace: Duration) -> Result<(), TransportError> {
        Self::validate_address(address)?;
        if let Some(pid) = Self::pane_pid(address).await? {
            terminate_pid(pid, grace).await;
        }
        // Remove the pane itself; failure means it is already gone
        let _ = Self::tmux(&["kill-pane", "-t", address], "tmux kill-pane").await;
        Ok(())
    }

    async fn slot_pid(&self, address: &str) -> Result<Option<i32>, TransportError> {
        Self::validate_address(address)?;
        Self::pane_pid(address).await
    }

    async fn list_slots(&self, handle: &str) -> Result<Vec<String>, TransportError> {
        let output = Self::tmux(
            &["list-panes", "-s", "-t", handle, "-F", "#{pane_id}"],
            "tmux list-panes",
        )
        .await?;
        if !output.status.success() {
            return Err(TransportError::SessionNotFound(handle.to_string()));
        }
        Ok(String::from_utf8_lossy(&output.stdout)
            .lines()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect())
    }

    async fn destroy_session(&self, handle: &str) -> Result<(), TransportError> {
        let output = Self::tmux(&["kill-session", "-t", handle], "tmux kill-session").await?;
        if !output.status.success() {
            // Session may already be gone, which is fine
            tracing::debug!(handle, "kill-session reported failure (already gone?)");
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "tmux_tests.rs"]
mod tests;
