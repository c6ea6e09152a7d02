// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use chrono::Utc;
use swb_core::WorkerId;

fn session() -> Session {
    Session::new(
        ThreadId::new("t1"),
        WorkerId::new("w1"),
        "prompt",
        "claude",
        "opus",
        "build",
        "default",
        Utc::now(),
    )
}

#[tokio::test]
async fn duplicate_create_is_a_conflict() {
    let store = MemoryStore::new();
    let s = session();
    store.create_session(&s).await.unwrap();
    match store.create_session(&s).await {
        Err(StoreError::Conflict(id)) => assert_eq!(id, s.id),
        other => panic!("expected Conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn transition_race_only_one_winner() {
    // Two "reconcilers" race the same pending→scheduling transition; the
    // store must admit exactly one.
    let store = std::sync::Arc::new(MemoryStore::new());
    let s = session();
    store.create_session(&s).await.unwrap();

    let mut wins = 0;
    for _ in 0..2 {
        if store
            .transition(&s.id, SessionStatus::Pending, SessionStatus::Scheduling, Utc::now())
            .await
            .unwrap()
        {
            wins += 1;
        }
    }
    assert_eq!(wins, 1);
}

#[tokio::test]
async fn get_and_list_reflect_creates() {
    let store = MemoryStore::new();
    let s = session();
    store.create_session(&s).await.unwrap();

    assert_eq!(store.get_session(&s.id).await.unwrap(), Some(s.clone()));
    assert_eq!(store.get_session(&SessionId::new("missing")).await.unwrap(), None);
    assert_eq!(store.list_sessions(&ThreadId::new("t1")).await.unwrap().len(), 1);
    assert_eq!(store.list_sessions(&ThreadId::new("t2")).await.unwrap().len(), 0);
}
