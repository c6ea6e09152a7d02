// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker RPC client.
//!
//! The three unary RPCs the control plane ever invokes on a worker, behind
//! a trait so the reconciler and session service can be exercised against
//! a fake. The HTTP implementation posts JSON bodies with the worker's
//! bearer secret, the same calls a UI could make through the relay.

pub(crate) mod http;

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use swb_wire::worker::{
    NewSessionRequest, NewSessionResponse, SendUserMessageRequest, SetSessionModeRequest,
    METHOD_NEW_SESSION, METHOD_SEND_USER_MESSAGE, METHOD_SET_SESSION_MODE,
};
use thiserror::Error;

use crate::registry::{host_port, WorkerEntry};

#[derive(Debug, Error)]
pub enum WorkerApiError {
    #[error("transport: {0}")]
    Transport(String),

    #[error("worker rejected request: {0}")]
    Remote(String),

    #[error("invalid worker response: {0}")]
    Decode(String),
}

impl From<http::HttpError> for WorkerApiError {
    fn from(e: http::HttpError) -> Self {
        match e {
            http::HttpError::Status { status, body } => {
                WorkerApiError::Remote(format!("HTTP {status}: {body}"))
            }
            other => WorkerApiError::Transport(other.to_string()),
        }
    }
}

/// Unary RPCs toward a worker.
#[async_trait]
pub trait WorkerApi: Send + Sync {
    async fn new_session(
        &self,
        worker: &WorkerEntry,
        request: &NewSessionRequest,
    ) -> Result<NewSessionResponse, WorkerApiError>;

    async fn set_session_mode(
        &self,
        worker: &WorkerEntry,
        request: &SetSessionModeRequest,
    ) -> Result<(), WorkerApiError>;

    async fn send_user_message(
        &self,
        worker: &WorkerEntry,
        request: &SendUserMessageRequest,
    ) -> Result<(), WorkerApiError>;
}

/// Production client: JSON over HTTP with bearer auth.
#[derive(Clone, Default)]
pub struct HttpWorkerClient;

impl HttpWorkerClient {
    pub fn new() -> Self {
        Self
    }

    async fn post<T: serde::Serialize>(
        &self,
        worker: &WorkerEntry,
        method: &str,
        request: &T,
    ) -> Result<String, WorkerApiError> {
        let body = serde_json::to_string(request)
            .map_err(|e| WorkerApiError::Decode(e.to_string()))?;
        let addr = host_port(&worker.base_url);
        Ok(http::post_authed(addr, method, &body, &worker.shared_secret).await?)
    }
}

#[async_trait]
impl WorkerApi for HttpWorkerClient {
    async fn new_session(
        &self,
        worker: &WorkerEntry,
        request: &NewSessionRequest,
    ) -> Result<NewSessionResponse, WorkerApiError> {
        let body = self.post(worker, METHOD_NEW_SESSION, request).await?;
        serde_json::from_str(&body).map_err(|e| WorkerApiError::Decode(e.to_string()))
    }

    async fn set_session_mode(
        &self,
        worker: &WorkerEntry,
        request: &SetSessionModeRequest,
    ) -> Result<(), WorkerApiError> {
        self.post(worker, METHOD_SET_SESSION_MODE, request).await?;
        Ok(())
    }

    async fn send_user_message(
        &self,
        worker: &WorkerEntry,
        request: &SendUserMessageRequest,
    ) -> Result<(), WorkerApiError> {
        self.post(worker, METHOD_SEND_USER_MESSAGE, request).await?;
        Ok(())
    }
}

/// Recorded call made against a [`FakeWorkerApi`].
#[derive(Debug, Clone, PartialEq)]
pub enum FakeWorkerCall {
    NewSession(NewSessionRequest),
    SetSessionMode(SetSessionModeRequest),
    SendUserMessage(SendUserMessageRequest),
}

/// Scriptable in-memory worker for tests.
///
/// `new_session` pops scripted responses in order; when the script runs
/// dry it accepts with an empty agent session id. `fail_transport` makes
/// every call error.
#[derive(Default)]
pub struct FakeWorkerApi {
    pub calls: Mutex<Vec<FakeWorkerCall>>,
    pub responses: Mutex<VecDeque<NewSessionResponse>>,
    pub fail_transport: std::sync::atomic::AtomicBool,
}

impl FakeWorkerApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(&self, response: NewSessionResponse) {
        self.responses.lock().push_back(response);
    }

    pub fn accepting(agent_session_id: &str) -> Self {
        let fake = Self::new();
        fake.script(NewSessionResponse {
            accepted: true,
            message: String::new(),
            agent_session_id: agent_session_id.to_string(),
        });
        fake
    }

    pub fn calls(&self) -> Vec<FakeWorkerCall> {
        self.calls.lock().clone()
    }

    fn check_transport(&self) -> Result<(), WorkerApiError> {
        if self.fail_transport.load(std::sync::atomic::Ordering::Relaxed) {
            return Err(WorkerApiError::Transport("connection refused".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl WorkerApi for FakeWorkerApi {
    async fn new_session(
        &self,
        _worker: &WorkerEntry,
        request: &NewSessionRequest,
    ) -> Result<NewSessionResponse, WorkerApiError> {
        self.check_transport()?;
        self.calls.lock().push(FakeWorkerCall::NewSession(request.clone()));
        Ok(self.responses.lock().pop_front().unwrap_or(NewSessionResponse {
            accepted: true,
            message: String::new(),
            agent_session_id: String::new(),
        }))
    }

    async fn set_session_mode(
        &self,
        _worker: &WorkerEntry,
        request: &SetSessionModeRequest,
    ) -> Result<(), WorkerApiError> {
        self.check_transport()?;
        self.calls.lock().push(FakeWorkerCall::SetSessionMode(request.clone()));
        Ok(())
    }

    async fn send_user_message(
        &self,
        _worker: &WorkerEntry,
        request: &SendUserMessageRequest,
    ) -> Result<(), WorkerApiError> {
        self.check_transport()?;
        self.calls.lock().push(FakeWorkerCall::SendUserMessage(request.clone()));
        Ok(())
    }
}
