// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dispatch failure scenarios.

use super::prelude::Harness;
use swb_core::SessionStatus;
use swb_daemon::service::CreateSessionParams;
use swb_storage::Store;

fn params(worker_id: &str) -> CreateSessionParams {
    CreateSessionParams {
        thread_id: "thr-1".to_string(),
        worker_id: worker_id.to_string(),
        prompt: "do the thing".to_string(),
        agent: "claude".to_string(),
        model: "opus".to_string(),
        mode: "build".to_string(),
        session_mode: "default".to_string(),
    }
}

#[tokio::test]
async fn unknown_worker_fails_the_session_permanently() {
    let harness = Harness::new();
    let session = harness.service.create_session(params("ghost")).await.unwrap();

    harness.reconcile_pass().await;

    // Listed with status=failed
    let sessions = harness.service.list_sessions("thr-1").await.unwrap();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].status, SessionStatus::Failed);

    // No worker was contacted and no events beyond nothing exist
    assert!(harness.workers.calls().is_empty());
    assert!(harness.store.events_for_session(&session.id).await.unwrap().is_empty());

    // Still failed after more passes: sticky, no retry
    harness.reconcile_pass().await;
    harness.reconcile_pass().await;
    assert_eq!(
        harness.store.get_session(&session.id).await.unwrap().unwrap().status,
        SessionStatus::Failed
    );
    assert!(harness.workers.calls().is_empty());
}

#[tokio::test]
async fn worker_rejection_preserves_the_journal_free_failed_row() {
    let harness = Harness::new();
    harness.workers.script(swb_wire::worker::NewSessionResponse {
        accepted: false,
        message: "at capacity".to_string(),
        agent_session_id: String::new(),
    });

    let session = harness.service.create_session(params(super::prelude::WORKER_ID)).await.unwrap();
    harness.reconcile_pass().await;

    let row = harness.store.get_session(&session.id).await.unwrap().unwrap();
    assert_eq!(row.status, SessionStatus::Failed);
    assert_eq!(row.agent_session_id, None);
    assert!(harness.store.events_for_session(&session.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn mixed_batch_dispatches_good_sessions_and_fails_bad_ones() {
    let harness = Harness::new();
    harness.accept_next_session("a-1");

    let good = harness.service.create_session(params(super::prelude::WORKER_ID)).await.unwrap();
    let bad = harness.service.create_session(params("ghost")).await.unwrap();

    harness.reconcile_pass().await;

    assert_eq!(
        harness.store.get_session(&good.id).await.unwrap().unwrap().status,
        SessionStatus::Running
    );
    assert_eq!(
        harness.store.get_session(&bad.id).await.unwrap().unwrap().status,
        SessionStatus::Failed
    );
}
