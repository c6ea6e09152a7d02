// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::path::PathBuf;
use swb_core::{Session, SessionId, SessionStatus, TaskId, ThreadId};

use crate::state::State;
use crate::{JournalRow, Store, StoreError};

/// Volatile store for tests and embedded use.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_session(&self, session: &Session) -> Result<(), StoreError> {
        if self.state.lock().create_session(session) {
            Ok(())
        } else {
            Err(StoreError::Conflict(session.id.clone()))
        }
    }

    async fn get_session(&self, id: &SessionId) -> Result<Option<Session>, StoreError> {
        Ok(self.state.lock().get_session(id))
    }

    async fn list_sessions(&self, thread_id: &ThreadId) -> Result<Vec<Session>, StoreError> {
        Ok(self.state.lock().list_sessions(thread_id))
    }

    async fn list_pending(&self, limit: usize) -> Result<Vec<Session>, StoreError> {
        Ok(self.state.lock().list_pending(limit))
    }

    async fn transition(
        &self,
        id: &SessionId,
        from: SessionStatus,
        to: SessionStatus,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self.state.lock().transition(id, from, to, now).is_some())
    }

    async fn mark_running(
        &self,
        id: &SessionId,
        agent_session_id: &str,
        now: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        Ok(self.state.lock().mark_running(id, agent_session_id, now).is_some())
    }

    async fn session_cwd(&self, id: &SessionId) -> Result<Option<PathBuf>, StoreError> {
        Ok(self.state.lock().session_cwd(id))
    }

    async fn set_thread_cwd(&self, thread_id: &ThreadId, cwd: PathBuf) -> Result<(), StoreError> {
        self.state.lock().set_thread_cwd(thread_id.clone(), cwd);
        Ok(())
    }

    async fn insert_event(&self, row: &JournalRow) -> Result<bool, StoreError> {
        Ok(self.state.lock().insert_event(row))
    }

    async fn events_for_session(&self, id: &SessionId) -> Result<Vec<JournalRow>, StoreError> {
        Ok(self.state.lock().events_for_session(id))
    }

    async fn events_for_thread(&self, thread_id: &ThreadId) -> Result<Vec<JournalRow>, StoreError> {
        Ok(self.state.lock().events_for_thread(thread_id))
    }

    async fn events_for_task(&self, task_id: &TaskId) -> Result<Vec<JournalRow>, StoreError> {
        Ok(self.state.lock().events_for_task(task_id))
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
