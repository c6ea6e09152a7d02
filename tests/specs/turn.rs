// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Full-turn scenarios: dispatch, streaming, merging, replay.

use std::sync::Arc;

use super::prelude::Harness;
use swb_core::SessionStatus;
use swb_daemon::listener::{watch_session_events, WatchScope};
use swb_storage::Store;
use swb_wire::{kind, unmarshal, WatchFrame};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

const CHUNKS: [(i64, &str); 4] = [(1, "Sure,"), (2, " "), (3, "here"), (4, " you go.")];

#[tokio::test]
async fn happy_path_turn() {
    let harness = Harness::new();
    harness.accept_next_session("a-42");

    // Create + dispatch
    let session = harness.dispatched_session("add a README").await;
    assert_eq!(session.status, SessionStatus::Running);
    assert_eq!(session.agent_session_id.as_deref(), Some("a-42"));

    // A watcher following live from sequence 0
    let (tx, mut rx) = mpsc::channel::<WatchFrame>(32);
    let cancel = CancellationToken::new();
    {
        let store = Arc::clone(&harness.store);
        let bus = harness.bus.clone();
        let scope = WatchScope::Session(session.id.clone());
        let cancel = cancel.clone();
        tokio::spawn(async move {
            watch_session_events(&store, &bus, scope, 0, tx, cancel).await;
        });
    }
    // Give the watch a beat to subscribe before events flow
    tokio::task::yield_now().await;

    // The worker streams four chunks and a status change
    for (seq, text) in CHUNKS {
        harness.worker_event(&session.id, seq, Harness::message_chunk(text)).await;
    }
    harness.worker_event(&session.id, 5, Harness::status_change("idle")).await;

    // Journal: row 0 (prompt), row 4 (merged), row 5 (status)
    let rows = harness.store.events_for_session(&session.id).await.unwrap();
    let seqs: Vec<i64> = rows.iter().map(|r| r.seq).collect();
    assert_eq!(seqs, vec![0, 4, 5]);
    assert_eq!(rows[0].kind, kind::USER_MESSAGE);
    assert_eq!(
        unmarshal(rows[0].payload.as_bytes()).unwrap().text.as_deref(),
        Some("add a README")
    );
    let merged = unmarshal(rows[1].payload.as_bytes()).unwrap();
    assert_eq!(merged.event_type, kind::AGENT_MESSAGE_CHUNK);
    assert_eq!(merged.text.as_deref(), Some("Sure, here you go."));
    assert_eq!(rows[2].kind, kind::STATUS_CHANGE);

    // The live watcher saw all five broadcasts, fine-grained, no history
    let mut frames = Vec::new();
    for _ in 0..5 {
        frames.push(rx.recv().await.unwrap());
    }
    assert!(frames.iter().all(|f| !f.is_history));
    let texts: Vec<Option<String>> = frames.iter().map(|f| f.event.text.clone()).collect();
    assert_eq!(
        texts,
        vec![
            Some("Sure,".to_string()),
            Some(" ".to_string()),
            Some("here".to_string()),
            Some(" you go.".to_string()),
            None,
        ]
    );
    cancel.cancel();
}

#[tokio::test]
async fn reconnect_catch_up_sees_merged_history() {
    let harness = Harness::new();
    harness.accept_next_session("a-42");
    let session = harness.dispatched_session("add a README").await;

    // First watcher drops after the chunk at seq 2
    let (tx, mut rx) = mpsc::channel::<WatchFrame>(32);
    let first_cancel = CancellationToken::new();
    {
        let store = Arc::clone(&harness.store);
        let bus = harness.bus.clone();
        let scope = WatchScope::Session(session.id.clone());
        let cancel = first_cancel.clone();
        tokio::spawn(async move {
            watch_session_events(&store, &bus, scope, 0, tx, cancel).await;
        });
    }
    tokio::task::yield_now().await;

    harness.worker_event(&session.id, 1, Harness::message_chunk("Sure,")).await;
    harness.worker_event(&session.id, 2, Harness::message_chunk(" ")).await;
    assert_eq!(rx.recv().await.unwrap().event.seq, 1);
    assert_eq!(rx.recv().await.unwrap().event.seq, 2);
    first_cancel.cancel();

    // The turn finishes while nobody is watching
    harness.worker_event(&session.id, 3, Harness::message_chunk("here")).await;
    harness.worker_event(&session.id, 4, Harness::message_chunk(" you go.")).await;
    harness.worker_event(&session.id, 5, Harness::status_change("idle")).await;

    // Reconnect with after_sequence=0: merged row 4 and row 5, as history
    let (tx, mut rx) = mpsc::channel::<WatchFrame>(32);
    let cancel = CancellationToken::new();
    {
        let store = Arc::clone(&harness.store);
        let bus = harness.bus.clone();
        let scope = WatchScope::Session(session.id.clone());
        let cancel = cancel.clone();
        tokio::spawn(async move {
            watch_session_events(&store, &bus, scope, 0, tx, cancel).await;
        });
    }

    let first = rx.recv().await.unwrap();
    assert!(first.is_history);
    assert_eq!(first.event.seq, 4);
    assert_eq!(first.event.text.as_deref(), Some("Sure, here you go."));
    let second = rx.recv().await.unwrap();
    assert!(second.is_history);
    assert_eq!(second.event.seq, 5);

    // Nothing pending after history
    assert!(rx.try_recv().is_err());
    cancel.cancel();
}

#[tokio::test]
async fn interleaved_chunk_types_keep_their_own_rows() {
    let harness = Harness::new();
    harness.accept_next_session("a-7");
    let session = harness.dispatched_session("think then answer").await;

    harness.worker_event(&session.id, 1, Harness::thought_chunk("plan:")).await;
    harness.worker_event(&session.id, 2, Harness::message_chunk("ok")).await;
    harness.worker_event(&session.id, 3, Harness::thought_chunk("done")).await;
    harness.handler.flush_all().await;

    let rows = harness.store.events_for_session(&session.id).await.unwrap();
    let kinds: Vec<(i64, String)> = rows.iter().map(|r| (r.seq, r.kind.clone())).collect();
    assert_eq!(
        kinds,
        vec![
            (0, kind::USER_MESSAGE.to_string()),
            (1, kind::AGENT_THOUGHT_CHUNK.to_string()),
            (2, kind::AGENT_MESSAGE_CHUNK.to_string()),
            (3, kind::AGENT_THOUGHT_CHUNK.to_string()),
        ]
    );
    assert_eq!(unmarshal(rows[1].payload.as_bytes()).unwrap().text.as_deref(), Some("plan:"));
    assert_eq!(unmarshal(rows[2].payload.as_bytes()).unwrap().text.as_deref(), Some("ok"));
    assert_eq!(unmarshal(rows[3].payload.as_bytes()).unwrap().text.as_deref(), Some("done"));
}

#[tokio::test]
async fn chunk_merge_preserves_concatenated_text() {
    let harness = Harness::new();
    harness.accept_next_session("a-1");
    let session = harness.dispatched_session("long answer").await;

    let mut expected = String::new();
    let mut seq = 0;
    for word in ["alpha ", "beta ", "gamma ", "delta"] {
        seq += 1;
        expected.push_str(word);
        harness.worker_event(&session.id, seq, Harness::message_chunk(word)).await;
        if seq == 2 {
            // Boundary in the middle: a tool call splits the run
            seq += 1;
            harness
                .worker_event(
                    &session.id,
                    seq,
                    swb_core::WorkerEvent::ToolCall {
                        tool_call_id: "tc".to_string(),
                        title: "check".to_string(),
                        kind: Default::default(),
                        status: Default::default(),
                        raw_input: None,
                        locations: vec![],
                        content: vec![],
                    },
                )
                .await;
        }
    }
    harness.handler.flush_all().await;

    // Concatenation of chunk-row text in seq order equals the original
    let rows = harness.store.events_for_session(&session.id).await.unwrap();
    let concatenated: String = rows
        .iter()
        .filter(|r| r.kind == kind::AGENT_MESSAGE_CHUNK)
        .filter_map(|r| unmarshal(r.payload.as_bytes()).ok())
        .filter_map(|record| record.text)
        .collect();
    assert_eq!(concatenated, expected);
}
