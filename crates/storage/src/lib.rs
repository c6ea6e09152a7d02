// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Storage layer for the Switchboard control plane.
//!
//! The [`Store`] trait is the seam between the control plane and whatever
//! durable row store a deployment provides: session rows plus the
//! append-only per-session event journal. Two implementations ship here —
//! [`MemoryStore`] for tests and embedded use, and [`FileStore`], a JSONL
//! journal with replay-on-open.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod file;
mod journal;
mod memory;
mod state;

pub use file::FileStore;
pub use journal::Journal;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use swb_core::{Session, SessionId, SessionStatus, TaskId, ThreadId};
use thiserror::Error;

/// Errors that can occur in store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session already exists: {0}")]
    Conflict(SessionId),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt entry at line {line}: {message}")]
    Corrupt { line: usize, message: String },
}

/// One append-only journal row.
///
/// `payload` is the raw [`SessionEventRecord`] JSON, stored opaquely so
/// rows written by future schema versions survive a read/write cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalRow {
    pub session_id: SessionId,
    /// Strictly increasing per session, starting at 0.
    pub seq: i64,
    /// Event type tag, duplicated out of the payload for cheap filtering.
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: String,
    pub created_at: DateTime<Utc>,
}

/// Session rows + event journal.
///
/// Any transactional store with per-session ordered reads can implement
/// this. `transition` must be atomic on the session's current status — it
/// is the serialization point that makes dispatch happen at most once.
#[async_trait]
pub trait Store: Send + Sync {
    async fn create_session(&self, session: &Session) -> Result<(), StoreError>;

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError>;

    /// Sessions of a thread, oldest first.
    async fn list_sessions(&self, thread_id: &ThreadId) -> Result<Vec<Session>, StoreError>;

    /// Pending sessions in insertion order, up to `limit`.
    async fn list_pending(&self, limit: usize) -> Result<Vec<Session>, StoreError>;

    /// Conditionally move a session from `from` to `to`.
    ///
    /// Returns `false` without mutating when the current status is not
    /// `from` or the session does not exist.
    async fn transition(
        &self,
        id: &SessionId,
        from: SessionStatus,
        to: SessionStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Record the agent-assigned session id and move `scheduling → running`.
    async fn mark_running(
        &self,
        id: &SessionId,
        agent_session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError>;

    /// Working directory for a session, resolved through its thread.
    /// Absence is not an error.
    async fn session_cwd(&self, id: &SessionId) -> Result<Option<PathBuf>, StoreError>;

    /// Record a thread's working directory (owned by thread CRUD outside
    /// the core; exposed here so deployments can seed it).
    async fn set_thread_cwd(&self, thread_id: &ThreadId, cwd: PathBuf) -> Result<(), StoreError>;

    /// Append one journal row. Idempotent on `(session_id, seq)`: returns
    /// `false` and leaves the journal untouched when the row exists.
    async fn insert_event(&self, row: &JournalRow) -> Result<bool, StoreError>;

    /// All rows for one session, in sequence order.
    async fn events_for_session(&self, id: &SessionId) -> Result<Vec<JournalRow>, StoreError>;

    /// All rows across a thread's sessions, ordered by `(session_id, seq)`.
    async fn events_for_thread(&self, thread_id: &ThreadId) -> Result<Vec<JournalRow>, StoreError>;

    /// All rows across a task's sessions, ordered by `(session_id, seq)`.
    async fn events_for_task(&self, task_id: &TaskId) -> Result<Vec<JournalRow>, StoreError>;
}
