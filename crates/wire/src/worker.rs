// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker-facing unary RPC payloads.
//!
//! Bodies are posted as JSON to `{base_url}{PATH_WORKER_SERVICE}<Method>`
//! with `Authorization: Bearer <shared_secret>`. The same two service
//! prefixes form the relay allow-list, so UIs can address these endpoints
//! through the control plane.

use serde::{Deserialize, Serialize};
use swb_core::ContentBlock;

/// Path prefix of the worker's session RPC service.
pub const PATH_WORKER_SERVICE: &str = "/worker.v1.WorkerService/";
/// Path prefix of the worker's system RPC service (health, capabilities).
pub const PATH_SYSTEM_SERVICE: &str = "/worker.v1.SystemService/";

pub const METHOD_NEW_SESSION: &str = "/worker.v1.WorkerService/NewSession";
pub const METHOD_SET_SESSION_MODE: &str = "/worker.v1.WorkerService/SetSessionMode";
pub const METHOD_SEND_USER_MESSAGE: &str = "/worker.v1.WorkerService/SendUserMessage";
/// WebSocket endpoint for the state-sync stream.
pub const PATH_STATE_SYNC: &str = "/worker.v1.WorkerService/StateSync";

/// Tool names a dispatched agent is permitted to use.
pub const ALLOWED_TOOLS: &[&str] = &["read", "write", "edit", "bash", "grep", "glob", "fetch"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSessionRequest {
    pub session_id: String,
    pub agent: String,
    pub mode: String,
    pub prompt: String,
    pub system_prompt: String,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<String>,
    pub session_mode: String,
    pub allowed_tools: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSessionResponse {
    #[serde(default)]
    pub accepted: bool,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub agent_session_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetSessionModeRequest {
    pub session_id: String,
    pub mode_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SendUserMessageRequest {
    pub session_id: String,
    pub content: Vec<ContentBlock>,
}

#[cfg(test)]
#[path = "worker_tests.rs"]
mod tests;
