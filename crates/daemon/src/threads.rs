// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thread-topic collaborator seam.
//!
//! Thread CRUD lives outside the control plane; the only thing the core
//! ever does to a thread is suggest a topic. Updates are best-effort —
//! every caller logs failures and moves on.

use async_trait::async_trait;
use parking_lot::Mutex;
use swb_core::ThreadId;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("topic update failed: {0}")]
pub struct TopicError(pub String);

/// Best-effort topic updates on the owning thread.
#[async_trait]
pub trait ThreadTopics: Send + Sync {
    async fn update_topic(&self, thread_id: &ThreadId, topic: &str) -> Result<(), TopicError>;
}

/// Discards every update. Used when no thread service is wired up.
pub struct NoopThreadTopics;

#[async_trait]
impl ThreadTopics for NoopThreadTopics {
    async fn update_topic(&self, _thread_id: &ThreadId, _topic: &str) -> Result<(), TopicError> {
        Ok(())
    }
}

/// Records every update; optionally fails. Test double.
#[derive(Default)]
pub struct RecordingThreadTopics {
    pub updates: Mutex<Vec<(ThreadId, String)>>,
    pub fail: std::sync::atomic::AtomicBool,
}

impl RecordingThreadTopics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topics(&self) -> Vec<(ThreadId, String)> {
        self.updates.lock().clone()
    }
}

#[async_trait]
impl ThreadTopics for RecordingThreadTopics {
    async fn update_topic(&self, thread_id: &ThreadId, topic: &str) -> Result<(), TopicError> {
        if self.fail.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(TopicError("thread service unavailable".to_string()));
        }
        self.updates.lock().push((thread_id.clone(), topic.to_string()));
        Ok(())
    }
}
