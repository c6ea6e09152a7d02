// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized store state.
//!
//! Pure in-memory session table + event journal shared by both store
//! implementations. `FileStore` replays its JSONL logs into one of these
//! on open; `MemoryStore` is one of these behind a mutex.

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use swb_core::{Session, SessionId, SessionStatus, TaskId, ThreadId};

use crate::JournalRow;

/// In-memory session table and event journal.
///
/// Sessions keep insertion order (the reconciler dispatches pending
/// sessions oldest-first); events are kept per session ordered by
/// sequence.
#[derive(Default)]
pub(crate) struct State {
    sessions: IndexMap<SessionId, Session>,
    events: HashMap<SessionId, BTreeMap<i64, JournalRow>>,
    cwds: HashMap<ThreadId, PathBuf>,
}

impl State {
    /// Insert a new session. Returns `false` when the id already exists.
    pub fn create_session(&mut self, session: &Session) -> bool {
        if self.sessions.contains_key(&session.id) {
            return false;
        }
        self.sessions.insert(session.id.clone(), session.clone());
        true
    }

    /// Re-apply a session row during replay (last write wins).
    pub fn apply_session(&mut self, session: Session) {
        self.sessions.insert(session.id.clone(), session);
    }

    pub fn get_session(&self, id: &SessionId) -> Option<Session> {
        self.sessions.get(id).cloned()
    }

    pub fn list_sessions(&self, thread_id: &ThreadId) -> Vec<Session> {
        self.sessions.values().filter(|s| &s.thread_id == thread_id).cloned().collect()
    }

    pub fn list_pending(&self, limit: usize) -> Vec<Session> {
        self.sessions
            .values()
            .filter(|s| s.status == SessionStatus::Pending)
            .take(limit)
            .cloned()
            .collect()
    }

    /// Conditional status transition; the caller's serialization point.
    /// Returns the updated row so `FileStore` can journal it.
    pub fn transition(
        &mut self,
        id: &SessionId,
        from: SessionStatus,
        to: SessionStatus,
        now: DateTime<Utc>,
    ) -> Option<Session> {
        let session = self.sessions.get_mut(id)?;
        if session.status != from {
            return None;
        }
        session.status = to;
        session.updated_at = now;
        Some(session.clone())
    }

    pub fn mark_running(
        &mut self,
        id: &SessionId,
        agent_session_id: &str,
        now: DateTime<Utc>,
    ) -> Option<Session> {
        let session = self.sessions.get_mut(id)?;
        if session.status != SessionStatus::Scheduling {
            return None;
        }
        session.status = SessionStatus::Running;
        if !agent_session_id.is_empty() {
            session.agent_session_id = Some(agent_session_id.to_string());
        }
        session.updated_at = now;
        Some(session.clone())
    }

    pub fn session_cwd(&self, id: &SessionId) -> Option<PathBuf> {
        let session = self.sessions.get(id)?;
        self.cwds.get(&session.thread_id).cloned()
    }

    pub fn set_thread_cwd(&mut self, thread_id: ThreadId, cwd: PathBuf) {
        self.cwds.insert(thread_id, cwd);
    }

    /// Insert a journal row. Returns `false` on a duplicate sequence.
    pub fn insert_event(&mut self, row: &JournalRow) -> bool {
        let events = self.events.entry(row.session_id.clone()).or_default();
        if events.contains_key(&row.seq) {
            return false;
        }
        events.insert(row.seq, row.clone());
        true
    }

    pub fn events_for_session(&self, id: &SessionId) -> Vec<JournalRow> {
        self.events
            .get(id)
            .map(|events| events.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn events_for_thread(&self, thread_id: &ThreadId) -> Vec<JournalRow> {
        let ids = self
            .sessions
            .values()
            .filter(|s| &s.thread_id == thread_id)
            .map(|s| s.id.clone());
        self.events_for_ids(ids)
    }

    pub fn events_for_task(&self, task_id: &TaskId) -> Vec<JournalRow> {
        let ids = self
            .sessions
            .values()
            .filter(|s| s.task_id.as_ref() == Some(task_id))
            .map(|s| s.id.clone());
        self.events_for_ids(ids)
    }

    /// Rows for a set of sessions ordered by `(session_id, seq)`.
    /// Session ids are UUIDv7, so id order is creation order.
    fn events_for_ids(&self, ids: impl Iterator<Item = SessionId>) -> Vec<JournalRow> {
        let mut ids: Vec<SessionId> = ids.collect();
        ids.sort();
        let mut rows = Vec::new();
        for id in ids {
            if let Some(events) = self.events.get(&id) {
                rows.extend(events.values().cloned());
            }
        }
        rows
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
