// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! User-message forwarding scenarios.

use super::prelude::{Harness, WORKER_ID};
use swb_daemon::service::{CreateSessionParams, ServiceError};
use swb_daemon::workers::FakeWorkerCall;
use swb_core::ContentBlock;

#[tokio::test]
async fn send_user_message_with_only_a_failed_session_is_a_precondition_error() {
    let harness = Harness::new();

    // A session that fails at dispatch (unknown worker)
    harness
        .service
        .create_session(CreateSessionParams {
            thread_id: "thr-1".to_string(),
            worker_id: "ghost".to_string(),
            prompt: "p".to_string(),
            agent: "claude".to_string(),
            model: String::new(),
            mode: String::new(),
            session_mode: String::new(),
        })
        .await
        .unwrap();
    harness.reconcile_pass().await;

    match harness.service.send_user_message("thr-1", "hello?").await {
        Err(ServiceError::FailedPrecondition(message)) => {
            assert!(message.contains("thr-1"), "{message}");
        }
        other => panic!("expected FailedPrecondition, got {other:?}"),
    }
    // The worker was never contacted
    assert!(harness.workers.calls().is_empty());
}

#[tokio::test]
async fn send_user_message_reaches_the_running_session() {
    let harness = Harness::new();
    harness.accept_next_session("a-42");
    let session = harness.dispatched_session("start").await;

    harness.service.send_user_message("thr-1", "keep going").await.unwrap();

    let forwarded = harness
        .workers
        .calls()
        .into_iter()
        .find_map(|call| match call {
            FakeWorkerCall::SendUserMessage(request) => Some(request),
            _ => None,
        })
        .expect("SendUserMessage forwarded");
    assert_eq!(forwarded.session_id, session.id.as_str());
    assert_eq!(forwarded.content, vec![ContentBlock::Text { text: "keep going".to_string() }]);
}
