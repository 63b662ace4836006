// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{MailboxMessage, BROADCAST};
use crate::id::MessageId;
use chrono::Utc;

fn msg(to: &str) -> MailboxMessage {
    MailboxMessage::new(MessageId::new("m-1"), "leader", to, "hello", Utc::now())
}

#[test]
fn fresh_message_needs_notification() {
    let m = msg("worker-1");
    assert!(m.needs_notification());
    assert!(!m.is_broadcast());
}

#[test]
fn notified_message_leaves_notify_set() {
    let mut m = msg("worker-1");
    m.notified_at = Some(Utc::now());
    assert!(!m.needs_notification());
}

#[test]
fn delivered_message_leaves_notify_set() {
    let mut m = msg("worker-1");
    m.delivered_at = Some(Utc::now());
    assert!(!m.needs_notification());
}

#[test]
fn broadcast_sentinel_is_recognized() {
    assert!(msg(BROADCAST).is_broadcast());
}

#[test]
fn pending_marks_are_omitted_from_json() {
    let json = serde_json::to_string(&msg("worker-2")).unwrap();
    assert!(!json.contains("notified_at"));
    assert!(!json.contains("delivered_at"));
}
