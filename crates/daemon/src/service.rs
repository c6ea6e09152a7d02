// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session domain service.
//!
//! The unary RPC surface behind the listener: create/get/list sessions,
//! set-mode and send-user-message forwarding, plus the pieces the watch
//! handler needs (store + bus access). Background failures are logged;
//! only validation, precondition, and not-found conditions surface to
//! callers.

use std::sync::Arc;

use swb_core::{derive_topic, Clock, ContentBlock, Session, SessionId, SessionStatus, ThreadId, WorkerId};
use swb_storage::Store;
use swb_wire::worker::{SendUserMessageRequest, SetSessionModeRequest};
use thiserror::Error;
use tracing::{info, warn};

use crate::bus::EventBus;
use crate::reconcile::ReconcilerHandle;
use crate::registry::WorkerRegistry;
use crate::threads::ThreadTopics;
use crate::workers::WorkerApi;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    InvalidArgument(String),

    #[error("{0}")]
    FailedPrecondition(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Internal(String),
}

/// Parameters for [`SessionService::create_session`].
#[derive(Debug, Clone)]
pub struct CreateSessionParams {
    pub thread_id: String,
    pub worker_id: String,
    pub prompt: String,
    pub agent: String,
    pub model: String,
    pub mode: String,
    pub session_mode: String,
}

/// Domain service for sessions.
pub struct SessionService<S, W, C> {
    store: Arc<S>,
    workers: Arc<W>,
    registry: Arc<WorkerRegistry>,
    topics: Arc<dyn ThreadTopics>,
    reconciler: ReconcilerHandle,
    bus: EventBus,
    clock: C,
}

impl<S, W, C> SessionService<S, W, C>
where
    S: Store,
    W: WorkerApi,
    C: Clock,
{
    pub fn new(
        store: Arc<S>,
        workers: Arc<W>,
        registry: Arc<WorkerRegistry>,
        topics: Arc<dyn ThreadTopics>,
        reconciler: ReconcilerHandle,
        bus: EventBus,
        clock: C,
    ) -> Self {
        Self { store, workers, registry, topics, reconciler, bus, clock }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Create a `pending` session, wake the reconciler, and seed the
    /// thread topic from the prompt (best-effort).
    pub async fn create_session(
        &self,
        params: CreateSessionParams,
    ) -> Result<Session, ServiceError> {
        if params.thread_id.is_empty() {
            return Err(ServiceError::InvalidArgument("thread_id is required".to_string()));
        }
        if params.worker_id.is_empty() {
            return Err(ServiceError::InvalidArgument("worker_id is required".to_string()));
        }
        if params.prompt.is_empty() {
            return Err(ServiceError::InvalidArgument("prompt is required".to_string()));
        }
        if params.agent.is_empty() {
            return Err(ServiceError::InvalidArgument("agent is required".to_string()));
        }

        let session = Session::new(
            ThreadId::new(&params.thread_id),
            WorkerId::new(&params.worker_id),
            params.prompt.clone(),
            params.agent,
            params.model,
            params.mode,
            params.session_mode,
            self.clock.now_utc(),
        );
        self.store
            .create_session(&session)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;
        info!(session_id = %session.id, thread_id = %session.thread_id, "session created");

        self.reconciler.notify();

        let topic = derive_topic(&params.prompt);
        if !topic.is_empty() {
            if let Err(e) = self.topics.update_topic(&session.thread_id, &topic).await {
                warn!(thread_id = %session.thread_id, error = %e, "initial topic update failed");
            }
        }

        Ok(session)
    }

    pub async fn get_session(&self, id: &str) -> Result<Session, ServiceError> {
        self.store
            .get_session(&SessionId::new(id))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?
            .ok_or_else(|| ServiceError::NotFound(format!("session not found: {id}")))
    }

    pub async fn list_sessions(&self, thread_id: &str) -> Result<Vec<Session>, ServiceError> {
        if thread_id.is_empty() {
            return Err(ServiceError::InvalidArgument("thread_id is required".to_string()));
        }
        self.store
            .list_sessions(&ThreadId::new(thread_id))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }

    /// Forward a mode change to the session's worker.
    pub async fn set_session_mode(
        &self,
        session_id: &str,
        mode_id: &str,
    ) -> Result<(), ServiceError> {
        let session = self.get_session(session_id).await?;
        let worker = self.registry.lookup(&session.worker_id).ok_or_else(|| {
            ServiceError::FailedPrecondition(format!(
                "worker not registered: {}",
                session.worker_id
            ))
        })?;

        let request = SetSessionModeRequest {
            session_id: session.id.as_str().to_string(),
            mode_id: mode_id.to_string(),
        };
        self.workers
            .set_session_mode(&worker, &request)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }

    /// Deliver a user turn to the thread's newest running session.
    pub async fn send_user_message(&self, thread_id: &str, text: &str) -> Result<(), ServiceError> {
        if thread_id.is_empty() {
            return Err(ServiceError::InvalidArgument("thread_id is required".to_string()));
        }
        if text.is_empty() {
            return Err(ServiceError::InvalidArgument("text is required".to_string()));
        }

        let sessions = self
            .store
            .list_sessions(&ThreadId::new(thread_id))
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))?;

        // Session ids are time-ordered, so max-by-id is the newest
        let active = sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Running)
            .max_by(|a, b| a.id.cmp(&b.id))
            .ok_or_else(|| {
                ServiceError::FailedPrecondition(format!(
                    "no running session for thread: {thread_id}"
                ))
            })?;

        let worker = self.registry.lookup(&active.worker_id).ok_or_else(|| {
            ServiceError::FailedPrecondition(format!("worker not registered: {}", active.worker_id))
        })?;

        let request = SendUserMessageRequest {
            session_id: active.id.as_str().to_string(),
            content: vec![ContentBlock::Text { text: text.to_string() }],
        };
        self.workers
            .send_user_message(&worker, &request)
            .await
            .map_err(|e| ServiceError::Internal(e.to_string()))
    }
}

#[cfg(test)]
#[path = "service_tests.rs"]
mod tests;
