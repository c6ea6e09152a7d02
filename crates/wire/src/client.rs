// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound event schema toward UI clients.

use serde::{Deserialize, Serialize};
use swb_core::{ContentBlock, Location, ToolKind};

use crate::record::{kind, SessionEventRecord};

/// A session event as streamed to a watching UI client.
///
/// Identical envelope to the journal record; payload fields are populated
/// only for event types this version recognizes. An unrecognized type
/// yields the envelope alone, so old clients degrade gracefully.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientEvent {
    pub session_id: String,
    pub seq: i64,
    pub ts: String,
    #[serde(rename = "type")]
    pub event_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "kind", default, skip_serializing_if = "Option::is_none")]
    pub tool_kind: Option<ToolKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_input: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_output: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_id: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub locations: Vec<Location>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<ContentBlock>,
}

/// One frame of a watch stream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchFrame {
    pub event: ClientEvent,
    pub is_history: bool,
}

/// Translate a journal record into the client schema.
///
/// Total: unrecognized event types keep their tag but carry no payload
/// fields. Content blocks with unknown tags are omitted.
pub fn to_client_event(record: &SessionEventRecord) -> ClientEvent {
    let mut event = ClientEvent {
        session_id: record.session_id.clone(),
        seq: record.seq,
        ts: record.ts.clone(),
        event_type: record.event_type.clone(),
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
    };

    match record.event_type.as_str() {
        kind::AGENT_MESSAGE_CHUNK | kind::AGENT_THOUGHT_CHUNK | kind::USER_MESSAGE => {
            event.text = record.text.clone();
        }
        kind::TOOL_CALL => {
            event.tool_call_id = record.tool_call_id.clone();
            event.title = record.title.clone();
            event.tool_kind = record.tool_kind;
            event.status = record.status.clone();
            event.raw_input = record.raw_input.clone();
            event.locations = record.locations.clone();
            event.content = known_blocks(&record.content);
        }
        kind::TOOL_CALL_UPDATE => {
            event.tool_call_id = record.tool_call_id.clone();
            event.status = record.status.clone();
            event.raw_output = record.raw_output.clone();
            event.content = known_blocks(&record.content);
        }
        kind::STATUS_CHANGE => {
            event.status = record.status.clone();
        }
        kind::CURRENT_MODE_UPDATE => {
            event.mode_id = record.mode_id.clone();
        }
        _ => {}
    }

    event
}

fn known_blocks(blocks: &[ContentBlock]) -> Vec<ContentBlock> {
    blocks.iter().filter(|b| !matches!(b, ContentBlock::Unknown)).cloned().collect()
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
