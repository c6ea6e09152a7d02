// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session rows and the session status machine.
//!
//! A session is one agent-driven turn-taking episode bound to a single
//! worker. The reconciler owns all status transitions; once a session is
//! `running` (agent session id assigned) or `failed` the reconciler never
//! touches it again.

use crate::id::{SessionId, TaskId, ThreadId, WorkerId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Dispatch status of a session.
///
/// `pending → scheduling → running`, with any state able to fall to
/// `failed`. `failed` is sticky: there is no retry path, a user starts a
/// new session instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Pending,
    Scheduling,
    Running,
    Failed,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "pending",
            SessionStatus::Scheduling => "scheduling",
            SessionStatus::Running => "running",
            SessionStatus::Failed => "failed",
        }
    }

    /// True for states the reconciler never revisits.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Running | SessionStatus::Failed)
    }
}

impl std::fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A session row as persisted by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub thread_id: ThreadId,
    pub worker_id: WorkerId,
    /// The prompt that started the session; journaled at sequence 0 on
    /// successful dispatch.
    pub prompt: String,
    pub status: SessionStatus,
    /// Requested agent kind (opaque to the control plane).
    pub agent: String,
    pub model: String,
    pub mode: String,
    pub session_mode: String,
    /// Session id assigned by the agent adapter, learned from the
    /// `NewSession` response. Immutable once set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<TaskId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Build a fresh `pending` session.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        thread_id: ThreadId,
        worker_id: WorkerId,
        prompt: impl Into<String>,
        agent: impl Into<String>,
        model: impl Into<String>,
        mode: impl Into<String>,
        session_mode: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: SessionId::generate(),
            thread_id,
            worker_id,
            prompt: prompt.into(),
            status: SessionStatus::Pending,
            agent: agent.into(),
            model: model.into(),
            mode: mode.into(),
            session_mode: session_mode.into(),
            agent_session_id: None,
            task_id: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
