// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSONL-backed durable store.
//!
//! Two append-only logs in the data directory: `sessions.jsonl` (full
//! session rows, replayed last-write-wins) and `events.jsonl` (journal
//! rows). All reads are served from the materialized in-memory state;
//! the files are write-only after open.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use swb_core::{Session, SessionId, SessionStatus, TaskId, ThreadId};
use tracing::info;

use crate::journal::Journal;
use crate::state::State;
use crate::{JournalRow, Store, StoreError};

/// Cwd assignments are journaled alongside nothing else, so they get a
/// tiny log of their own.
#[derive(serde::Serialize, serde::Deserialize)]
struct CwdEntry {
    thread_id: ThreadId,
    cwd: PathBuf,
}

struct Inner {
    state: State,
    sessions_log: Journal,
    events_log: Journal,
    cwds_log: Journal,
}

/// Durable store backed by JSONL logs with replay-on-open.
pub struct FileStore {
    inner: Mutex<Inner>,
}

impl FileStore {
    /// Open or create a store in `dir`, replaying any existing logs.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        let mut state = State::default();

        let mut session_count = 0usize;
        let sessions_log = Journal::open_with(&dir.join("sessions.jsonl"), |s: Session| {
            session_count += 1;
            state.apply_session(s);
        })?;

        let mut event_count = 0usize;
        let events_log = Journal::open_with(&dir.join("events.jsonl"), |row: JournalRow| {
            event_count += 1;
            state.insert_event(&row);
        })?;

        let cwds_log = Journal::open_with(&dir.join("cwds.jsonl"), |e: CwdEntry| {
            state.set_thread_cwd(e.thread_id, e.cwd);
        })?;

        if session_count > 0 || event_count > 0 {
            info!(
                dir = %dir.display(),
                sessions = session_count,
                events = event_count,
                "replayed store logs"
            );
        }

        Ok(Self { inner: Mutex::new(Inner { state, sessions_log, events_log, cwds_log }) })
    }
}

#[async_trait]
impl Store for FileStore {
    async fn create_session(&self, session: &Session) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.create_session(session) {
            return Err(StoreError::Conflict(session.id.clone()));
        }
        inner.sessions_log.append(session)
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.inner.lock().state.get_session(id))
    }

    async fn list_sessions(&self, thread_id: &ThreadId) -> Result<Vec<Session>, StoreError> {
        Ok(self.inner.lock().state.list_sessions(thread_id))
    }

    async fn list_pending(&self, limit: usize) -> Result<Vec<Session>, StoreError> {
        Ok(self.inner.lock().state.list_pending(limit))
    }

    async fn transition(
        &self,
        id: &SessionId,
        from: SessionStatus,
        to: SessionStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        match inner.state.transition(id, from, to, now) {
            Some(updated) => {
                inner.sessions_log.append(&updated)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn mark_running(
        &self,
        id: &SessionId,
        agent_session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        match inner.state.mark_running(id, agent_session_id, now) {
            Some(updated) => {
                inner.sessions_log.append(&updated)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn session_cwd(&self, id: &SessionId) -> Result<Option<PathBuf>, StoreError> {
        Ok(self.inner.lock().state.session_cwd(id))
    }

    async fn set_thread_cwd(&self, thread_id: &ThreadId, cwd: PathBuf) -> Result<(), StoreError> {
        let mut inner = self.inner.lock();
        inner.state.set_thread_cwd(thread_id.clone(), cwd.clone());
        inner.cwds_log.append(&CwdEntry { thread_id: thread_id.clone(), cwd })
    }

    async fn insert_event(&self, row: &JournalRow) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock();
        if !inner.state.insert_event(row) {
            return Ok(false);
        }
        inner.events_log.append(row)?;
        Ok(true)
    }

    async fn events_for_session(&self, id: &SessionId) -> Result<Vec<JournalRow>, StoreError> {
        Ok(self.inner.lock().state.events_for_session(id))
    }

    async fn events_for_thread(&self, thread_id: &ThreadId) -> Result<Vec<JournalRow>, StoreError> {
        Ok(self.inner.lock().state.events_for_thread(thread_id))
    }

    async fn events_for_task(&self, task_id: &TaskId) -> Result<Vec<JournalRow>, StoreError> {
        Ok(self.inner.lock().state.events_for_task(task_id))
    }
}

#[cfg(test)]
#[path = "file_tests.rs"]
mod tests;
