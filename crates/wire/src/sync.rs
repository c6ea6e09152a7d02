// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State-sync framing between the control plane and a worker.
//!
//! One WebSocket per worker carries these frames as JSON text messages.
//! The control plane opens the stream with an empty [`SyncRequest`] and
//! acknowledges every received event; the worker replays unacknowledged
//! events on reconnect.

use serde::{Deserialize, Serialize};
use swb_core::WorkerEvent;

/// A frame sent by the worker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SyncFrame {
    /// Current set of live sessions, sent once after the stream opens.
    #[serde(rename = "snapshot")]
    Snapshot { sessions: Vec<SessionState> },

    /// Session metadata changed (topic, agent-side status).
    #[serde(rename = "session_update")]
    SessionUpdate {
        session_id: String,
        #[serde(default)]
        topic: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<String>,
    },

    #[serde(rename = "session_removed")]
    SessionRemoved { session_id: String },

    /// One ordered narration event for a session.
    #[serde(rename = "session_event")]
    SessionEvent {
        session_id: String,
        seq: i64,
        /// RFC3339-nano emission timestamp; receipt time is used when absent.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ts: Option<String>,
        event: WorkerEvent,
    },

    /// Catch-all for frame types this version does not know.
    #[serde(other, skip_serializing)]
    Unknown,
}

/// Agent-side view of one session, carried in snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionState {
    pub session_id: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub mode_id: String,
}

/// A frame sent by the control plane.
///
/// The empty request (`{}`) opens the stream; subsequent requests carry
/// per-event acknowledgements.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SyncRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ack_sequence: Option<i64>,
}

impl SyncRequest {
    /// The initial empty frame every connection must send first.
    pub fn open() -> Self {
        Self::default()
    }

    /// Acknowledge a received event.
    pub fn ack(session_id: impl Into<String>, sequence: i64) -> Self {
        Self { ack_session_id: Some(session_id.into()), ack_sequence: Some(sequence) }
    }
}

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;
