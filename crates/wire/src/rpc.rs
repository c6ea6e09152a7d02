// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! UI-facing IPC protocol.
//!
//! Requests arrive over the daemon socket as length-prefixed JSON (see
//! [`crate::wire`]). Every request yields exactly one response, except
//! `WatchSessionEvents` which turns the connection into a stream of
//! `Response::Event` frames.

use serde::{Deserialize, Serialize};
use swb_core::{Session, SessionStatus};

use crate::client::ClientEvent;

/// Request from a UI client to the daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Create a session and queue it for dispatch
    CreateSession {
        thread_id: String,
        worker_id: String,
        prompt: String,
        agent: String,
        #[serde(default)]
        model: String,
        #[serde(default)]
        mode: String,
        #[serde(default)]
        session_mode: String,
    },

    /// Fetch a single session by id
    GetSession { id: String },

    /// List sessions for a thread
    ListSessions { thread_id: String },

    /// Change the active mode of a running session
    SetSessionMode { session_id: String, mode_id: String },

    /// Send a user message to the thread's active session
    SendUserMessage { thread_id: String, text: String },

    /// Replay history then follow live events for one scope.
    ///
    /// Exactly one of `session_id`, `thread_id`, `task_id` must be set.
    WatchSessionEvents {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        thread_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_id: Option<String>,
        /// Only events with a sequence strictly greater than this are
        /// replayed. Defaults to -1 (full history).
        #[serde(default = "default_after_sequence")]
        after_sequence: i64,
    },
}

fn default_after_sequence() -> i64 {
    -1
}

/// Error category surfaced to UI callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Missing or conflicting request fields
    InvalidArgument,
    /// The request is well-formed but the world is not in the right state
    FailedPrecondition,
    NotFound,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::FailedPrecondition => "failed_precondition",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Internal => "internal",
        }
    }
}

/// Response from the daemon to a UI client
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    Ok,
    Pong,

    Error {
        kind: ErrorKind,
        message: String,
    },

    Session {
        session: SessionDetail,
    },

    Sessions {
        sessions: Vec<SessionDetail>,
    },

    /// One frame of a watch stream
    Event {
        event: ClientEvent,
        is_history: bool,
    },
}

impl Response {
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        Response::Error { kind, message: message.into() }
    }

    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::error(ErrorKind::InvalidArgument, message)
    }

    pub fn failed_precondition(message: impl Into<String>) -> Self {
        Self::error(ErrorKind::FailedPrecondition, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::error(ErrorKind::NotFound, message)
    }
}

/// Session row as surfaced to UI clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionDetail {
    pub id: String,
    pub thread_id: String,
    pub worker_id: String,
    pub prompt: String,
    pub status: SessionStatus,
    pub agent: String,
    pub model: String,
    pub mode: String,
    pub session_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl From<&Session> for SessionDetail {
    fn from(s: &Session) -> Self {
        SessionDetail {
            id: s.id.as_str().to_string(),
            thread_id: s.thread_id.as_str().to_string(),
            worker_id: s.worker_id.as_str().to_string(),
            prompt: s.prompt.clone(),
            status: s.status,
            agent: s.agent.clone(),
            model: s.model.clone(),
            mode: s.mode.clone(),
            session_mode: s.session_mode.clone(),
            agent_session_id: s.agent_session_id.clone(),
            task_id: s.task_id.as_ref().map(|t| t.as_str().to_string()),
            created_at_ms: s.created_at.timestamp_millis().max(0) as u64,
            updated_at_ms: s.updated_at.timestamp_millis().max(0) as u64,
        }
    }
}

#[cfg(test)]
#[path = "rpc_tests.rs"]
mod tests;
