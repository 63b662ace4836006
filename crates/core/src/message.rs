// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Mailbox messages between the leader and workers.

use crate::id::MessageId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recipient sentinel for messages addressed to every worker.
pub const BROADCAST: &str = "*";

/// One inbound message in a worker's mailbox (`mailbox/<name>.json`).
///
/// `delivered_at` marks that the recipient has consumed the message;
/// `notified_at` marks that the runtime has poked the recipient's slot to
/// look at it. A delivered message stays readable but leaves the
/// to-notify set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MailboxMessage {
    pub message_id: MessageId,
    pub from_worker: String,
    pub to_worker: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notified_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivered_at: Option<DateTime<Utc>>,
}

impl MailboxMessage {
    pub fn new(
        message_id: MessageId,
        from_worker: impl Into<String>,
        to_worker: impl Into<String>,
        body: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            message_id,
            from_worker: from_worker.into(),
            to_worker: to_worker.into(),
            body: body.into(),
            created_at,
            notified_at: None,
            delivered_at: None,
        }
    }

    pub fn is_broadcast(&self) -> bool {
        self.to_worker == BROADCAST
    }

    /// Messages that still need a transport trigger toward the recipient.
    pub fn needs_notification(&self) -> bool {
        self.delivered_at.is_none() && self.notified_at.is_none()
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
