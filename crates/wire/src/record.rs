// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The versioned session-event record.
//!
//! `SessionEventRecord` is both the on-disk journal payload and the JSON
//! shape replayed to UI clients. It is deliberately schema-tolerant: the
//! event type is a plain string, and fields this version does not know are
//! captured in a flattened map so they survive a read/write cycle
//! byte-for-byte. The worker protocol and the UI protocol can therefore
//! evolve independently of whatever sits in the journal.

use serde::{Deserialize, Serialize};
use swb_core::{ContentBlock, Location, SessionId, ToolKind, WorkerEvent};
use thiserror::Error;

/// Current record schema version.
pub const RECORD_VERSION: u32 = 1;

/// Canonical event-type strings.
pub mod kind {
    pub const AGENT_MESSAGE_CHUNK: &str = "agent_message_chunk";
    pub const AGENT_THOUGHT_CHUNK: &str = "agent_thought_chunk";
    pub const TOOL_CALL: &str = "tool_call";
    pub const TOOL_CALL_UPDATE: &str = "tool_call_update";
    pub const STATUS_CHANGE: &str = "status_change";
    pub const CURRENT_MODE_UPDATE: &str = "current_mode_update";
    pub const USER_MESSAGE: &str = "user_message";
    pub const UNKNOWN: &str = "unknown";
}

/// True for the two event types the chunk merger coalesces.
pub fn is_chunk_kind(event_type: &str) -> bool {
    event_type == kind::AGENT_MESSAGE_CHUNK || event_type == kind::AGENT_THOUGHT_CHUNK
}

/// Codec errors
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A single journaled session event, schema version 1.
///
/// Every field beyond the envelope (`v`, `session_id`, `seq`, `ts`,
/// `type`) is optional; which ones are set depends on the event type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionEventRecord {
    pub v: u32,
    pub session_id: String,
    pub seq: i64,
    /// RFC3339-nano timestamp.
    pub ts: String,
    #[serde(rename = "type")]
    pub event_type: String,

    /// Text payload for chunk and `user_message` events.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Tool classification (`kind` on the wire).
    #[serde(rename = "kind", default, skip_serializing_if = "Option::is_none")]
    pub tool_kind: Option<ToolKind>,
    /// Opaque tool input, never interpreted by the control plane.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
    /// Tool-call status or agent status, depending on the event type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ContentBlock>,

    /// Fields this schema version does not know, preserved byte-for-byte.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl SessionEventRecord {
    /// Bare envelope with no payload fields set.
    pub fn envelope(
        session_id: &SessionId,
        seq: i64,
        ts: impl Into<String>,
        event_type: impl Into<String>,
    ) -> Self {
        Self {
            v: RECORD_VERSION,
            session_id: session_id.as_str().to_string(),
            seq,
            ts: ts.into(),
            event_type: event_type.into(),
            text: None,
            tool_call_id: None,
            title: None,
            tool_kind: None,
            raw_input: None,
            raw_output: None,
            status: None,
            mode_id: None,
            locations: Vec::new(),
            content: Vec::new(),
            extra: serde_json::Map::new(),
        }
    }

    pub fn is_chunk(&self) -> bool {
        is_chunk_kind(&self.event_type)
    }
}

/// Translate a worker event into a record.
///
/// Total on every event type: anything the worker sends that this version
/// does not recognize becomes `type = "unknown"` with the payload fields
/// omitted. Content blocks with unrecognized tags are dropped without
/// error.
pub fn to_record(
    session_id: &SessionId,
    seq: i64,
    ts: impl Into<String>,
    event: &WorkerEvent,
) -> SessionEventRecord {
    let mut record = SessionEventRecord::envelope(session_id, seq, ts, event.type_str());

    match event {
        WorkerEvent::AgentMessageChunk { text }
        | WorkerEvent::AgentThoughtChunk { text }
        | WorkerEvent::UserMessage { text } => {
            record.text = Some(text.clone());
        }
        WorkerEvent::ToolCall { tool_call_id, title, kind, status, raw_input, locations, content } => {
            record.tool_call_id = Some(tool_call_id.clone());
            record.title = Some(title.clone());
            record.tool_kind = Some(*kind);
            record.status = Some(status.as_str().to_string());
            record.raw_input = raw_input.clone();
            record.locations = locations.clone();
            record.content = known_blocks(content);
        }
        WorkerEvent::ToolCallUpdate { tool_call_id, status, raw_output, content } => {
            record.tool_call_id = Some(tool_call_id.clone());
            record.status = status.map(|s| s.as_str().to_string());
            record.raw_output = raw_output.clone();
            record.content = known_blocks(content);
        }
        WorkerEvent::StatusChange { status } => {
            record.status = Some(status.clone());
        }
        WorkerEvent::CurrentModeUpdate { mode_id } => {
            record.mode_id = Some(mode_id.clone());
        }
        WorkerEvent::Unknown => {}
    }

    record
}

/// Build the merged row the chunk merger flushes: last absorbed sequence,
/// first absorbed timestamp, concatenated text.
pub fn chunk_record(
    session_id: &SessionId,
    seq: i64,
    first_ts: impl Into<String>,
    event_type: impl Into<String>,
    text: String,
) -> SessionEventRecord {
    let mut record = SessionEventRecord::envelope(session_id, seq, first_ts, event_type);
    record.text = Some(text);
    record
}

/// Serialize a record to its journal/replay bytes.
pub fn marshal(record: &SessionEventRecord) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec(record)?)
}

/// Deserialize a record from journal/replay bytes.
pub fn unmarshal(bytes: &[u8]) -> Result<SessionEventRecord, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

fn known_blocks(blocks: &[ContentBlock]) -> Vec<ContentBlock> {
    blocks.iter().filter(|b| !matches!(b, ContentBlock::Unknown)).cloned().collect()
}

#[cfg(test)]
#[path = "record_tests.rs"]
mod tests;
