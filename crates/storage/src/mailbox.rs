// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-worker mailboxes: append-with-compaction JSON arrays.

use crate::atomic::{read_json, write_json_atomic, StoreError};
use crate::events::EventLog;
use crate::paths::TeamPaths;
use chrono::{DateTime, Utc};
use omx_core::{EventId, EventKind, IdGen, MailboxMessage, MessageId, TeamEvent, TeamManifest};

/// Mailbox operations over `mailbox/<worker>.json`.
#[derive(Clone)]
pub struct Mailbox {
    paths: TeamPaths,
}

impl Mailbox {
    pub fn new(paths: TeamPaths) -> Self {
        Self { paths }
    }

    /// Append a direct message and record a `message_received` event.
    pub fn send<G: IdGen>(
        &self,
        events: &EventLog,
        idgen: &G,
        from: &str,
        to: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<MailboxMessage, StoreError> {
        let message = MailboxMessage::new(
            MessageId::new(idgen.next()),
            from,
            to,
            body,
            now,
        );
        let mut messages = self.list(to);
        messages.push(message.clone());
        write_json_atomic(&self.paths.mailbox(to), &messages)?;

        let event = TeamEvent::new(
            EventId::new(idgen.next()),
            events.team(),
            EventKind::MessageReceived,
            now,
        )
        .with_worker(to)
        .with_message(message.message_id.clone());
        events.append(&event)?;
        Ok(message)
    }

    /// Fan a message out to every worker on the manifest except the
    /// sender. Each recipient gets a distinct message id.
    pub fn broadcast<G: IdGen>(
        &self,
        events: &EventLog,
        idgen: &G,
        manifest: &TeamManifest,
        from: &str,
        body: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<MailboxMessage>, StoreError> {
        let mut sent = Vec::new();
        for entry in &manifest.workers {
            if entry.name.as_str() == from {
                continue;
            }
            sent.push(self.send(events, idgen, from, entry.name.as_str(), body, now)?);
        }
        Ok(sent)
    }

    /// The full message array for a worker. Empty when the file is
    /// missing or malformed.
    pub fn list(&self, worker: &str) -> Vec<MailboxMessage> {
        read_json(&self.paths.mailbox(worker)).unwrap_or_default()
    }

    /// Messages still awaiting a transport trigger.
    pub fn needing_notification(&self, worker: &str) -> Vec<MailboxMessage> {
        self.list(worker)
            .into_iter()
            .filter(|m| m.needs_notification())
            .collect()
    }

    /// Set `delivered_at`. Idempotent; reports whether a change occurred.
    pub fn mark_delivered(
        &self,
        worker: &str,
        message_id: &MessageId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.mark(worker, message_id, |m| {
            if m.delivered_at.is_none() {
                m.delivered_at = Some(now);
                true
            } else {
                false
            }
        })
    }

    /// Set `notified_at` — the runtime poked the recipient's slot.
    /// Idempotent; reports whether a change occurred.
    pub fn mark_notified(
        &self,
        worker: &str,
        message_id: &MessageId,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.mark(worker, message_id, |m| {
            if m.notified_at.is_none() {
                m.notified_at = Some(now);
                true
            } else {
                false
            }
        })
    }

    fn mark(
        &self,
        worker: &str,
        message_id: &MessageId,
        apply: impl Fn(&mut MailboxMessage) -> bool,
    ) -> Result<bool, StoreError> {
        let mut messages = self.list(worker);
        let mut changed = false;
        for message in messages.iter_mut() {
            if &message.message_id == message_id {
                changed = apply(message);
                break;
            }
        }
        if changed {
            write_json_atomic(&self.paths.mailbox(worker), &messages)?;
        }
        Ok(changed)
    }
}

#[cfg(test)]
#[path = "mailbox_tests.rs"]
mod tests;
