// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker event model.
//!
//! `WorkerEvent` is the typed form of a single narration frame as decoded
//! off a worker's state-sync stream. The enum strings here are canonical
//! wire values and must stay stable; unknown future event types
//! deserialize to `Unknown` instead of failing the stream.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Classification of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolKind {
    Read,
    Edit,
    Delete,
    Move,
    Search,
    Execute,
    Think,
    Fetch,
    #[default]
    Other,
}

impl ToolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::Read => "read",
            ToolKind::Edit => "edit",
            ToolKind::Delete => "delete",
            ToolKind::Move => "move",
            ToolKind::Search => "search",
            ToolKind::Execute => "execute",
            ToolKind::Think => "think",
            ToolKind::Fetch => "fetch",
            ToolKind::Other => "other",
        }
    }

    /// Parse a wire string; anything unrecognized maps to `Other`.
    pub fn parse(s: &str) -> Self {
        match s {
            "read" => ToolKind::Read,
            "edit" => ToolKind::Edit,
            "delete" => ToolKind::Delete,
            "move" => ToolKind::Move,
            "search" => ToolKind::Search,
            "execute" => ToolKind::Execute,
            "think" => ToolKind::Think,
            "fetch" => ToolKind::Fetch,
            _ => ToolKind::Other,
        }
    }
}

impl Serialize for ToolKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ToolKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ToolKind::parse(&s))
    }
}

/// Lifecycle status of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ToolStatus {
    #[default]
    InProgress,
    Completed,
    Failed,
}

impl ToolStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolStatus::InProgress => "in_progress",
            ToolStatus::Completed => "completed",
            ToolStatus::Failed => "failed",
        }
    }

    /// Parse a wire string; anything unrecognized maps to `InProgress`.
    pub fn parse(s: &str) -> Self {
        match s {
            "completed" => ToolStatus::Completed,
            "failed" => ToolStatus::Failed,
            _ => ToolStatus::InProgress,
        }
    }
}

impl Serialize for ToolStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for ToolStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(ToolStatus::parse(&s))
    }
}

/// A file location referenced by a tool call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
    /// 1-based line number; omitted on the wire when zero.
    #[serde(default, skip_serializing_if = "is_zero")]
    pub line: u32,
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// A piece of tool-call content.
///
/// Blocks with tags this version does not know are deserialized to
/// `Unknown` and silently omitted by the codecs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },

    #[serde(rename = "diff")]
    Diff {
        path: String,
        new_text: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        old_text: Option<String>,
    },

    #[serde(other, skip_serializing)]
    Unknown,
}

/// One narration frame emitted by an agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum WorkerEvent {
    /// One delta of streaming assistant text.
    #[serde(rename = "agent_message_chunk")]
    AgentMessageChunk { text: String },

    /// One delta of streaming reasoning text.
    #[serde(rename = "agent_thought_chunk")]
    AgentThoughtChunk { text: String },

    #[serde(rename = "tool_call")]
    ToolCall {
        tool_call_id: String,
        title: String,
        #[serde(default)]
        kind: ToolKind,
        #[serde(default)]
        status: ToolStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw_input: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        locations: Vec<Location>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<ContentBlock>,
    },

    #[serde(rename = "tool_call_update")]
    ToolCallUpdate {
        tool_call_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        status: Option<ToolStatus>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        raw_output: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        content: Vec<ContentBlock>,
    },

    /// Agent status transition (working, idle, done, ...). Opaque here.
    #[serde(rename = "status_change")]
    StatusChange { status: String },

    #[serde(rename = "current_mode_update")]
    CurrentModeUpdate { mode_id: String },

    /// A user turn echoed into the session transcript.
    #[serde(rename = "user_message")]
    UserMessage { text: String },

    /// Catch-all for event types this version does not know.
    #[serde(other, skip_serializing)]
    Unknown,
}

impl WorkerEvent {
    /// True for the two chunkable event types the merger coalesces.
    pub fn is_chunk(&self) -> bool {
        matches!(
            self,
            WorkerEvent::AgentMessageChunk { .. } | WorkerEvent::AgentThoughtChunk { .. }
        )
    }

    /// Text payload of a chunk event, `None` for everything else.
    pub fn chunk_text(&self) -> Option<&str> {
        match self {
            WorkerEvent::AgentMessageChunk { text } | WorkerEvent::AgentThoughtChunk { text } => {
                Some(text)
            }
            _ => None,
        }
    }

    /// Canonical wire tag for this event.
    pub fn type_str(&self) -> &'static str {
        match self {
            WorkerEvent::AgentMessageChunk { .. } => "agent_message_chunk",
            WorkerEvent::AgentThoughtChunk { .. } => "agent_thought_chunk",
            WorkerEvent::ToolCall { .. } => "tool_call",
            WorkerEvent::ToolCallUpdate { .. } => "tool_call_update",
            WorkerEvent::StatusChange { .. } => "status_change",
            WorkerEvent::CurrentModeUpdate { .. } => "current_mode_update",
            WorkerEvent::UserMessage { .. } => "user_message",
            WorkerEvent::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
