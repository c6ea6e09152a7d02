// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State-sync stream over a real WebSocket.
//!
//! A fake worker accepts the stream, requires the initial empty request,
//! pushes frames, and collects acknowledgements.

use std::sync::Arc;

use super::prelude::Harness;
use futures_util::{SinkExt, StreamExt};
use swb_daemon::registry::WorkerEntry;
use swb_daemon::statesync::StateSyncWatcher;
use swb_storage::Store;
use swb_wire::kind;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;

/// Frames the fake worker pushes after the handshake.
fn worker_frames(session_id: &str) -> Vec<String> {
    vec![
        format!(r#"{{"type":"snapshot","sessions":[{{"session_id":"{session_id}","status":"working"}}]}}"#),
        format!(r#"{{"type":"session_event","session_id":"{session_id}","seq":1,"event":{{"type":"agent_message_chunk","text":"Hi"}}}}"#),
        format!(r#"{{"type":"session_event","session_id":"{session_id}","seq":2,"event":{{"type":"agent_message_chunk","text":" there"}}}}"#),
        format!(r#"{{"type":"session_update","session_id":"{session_id}","topic":"Greeting"}}"#),
        format!(r#"{{"type":"session_event","session_id":"{session_id}","seq":3,"event":{{"type":"status_change","status":"idle"}}}}"#),
    ]
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn watcher_opens_streams_acks_and_flushes_on_close() {
    let harness = Harness::new();
    harness.accept_next_session("a-42");
    let session = harness.dispatched_session("greet me").await;
    let session_id = session.id.as_str().to_string();

    // Fake worker: one WebSocket connection, then the listener goes away
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let worker_addr = listener.local_addr().unwrap().to_string();
    let frames = worker_frames(&session_id);
    let worker = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();

        // The control plane must open with the empty request
        let open = ws.next().await.unwrap().unwrap();
        assert_eq!(open, Message::Text("{}".into()));

        for frame in frames {
            ws.send(Message::Text(frame.into())).await.unwrap();
        }

        // One ack per session_event, in order
        let mut acks = Vec::new();
        while acks.len() < 3 {
            match ws.next().await.unwrap().unwrap() {
                Message::Text(text) => acks.push(text.to_string()),
                Message::Close(_) => break,
                _ => {}
            }
        }
        let _ = ws.close(None).await;
        acks
    });

    let cancel = CancellationToken::new();
    let watcher = StateSyncWatcher::new(
        WorkerEntry::new("w1", format!("http://{worker_addr}"), "secret"),
        Arc::clone(&harness.handler),
    );
    let watcher_task = tokio::spawn(watcher.run(cancel.clone()));

    let acks = worker.await.unwrap();
    assert_eq!(
        acks,
        vec![
            format!(r#"{{"ack_session_id":"{session_id}","ack_sequence":1}}"#),
            format!(r#"{{"ack_session_id":"{session_id}","ack_sequence":2}}"#),
            format!(r#"{{"ack_session_id":"{session_id}","ack_sequence":3}}"#),
        ]
    );

    // Wait until the post-disconnect flush lands
    tokio::time::timeout(std::time::Duration::from_secs(2), async {
        loop {
            let rows = harness.store.events_for_session(&session.id).await.unwrap();
            if rows.len() >= 3 {
                break rows;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    let rows = harness.store.events_for_session(&session.id).await.unwrap();
    // Row 0: prompt. Row 2: merged "Hi there". Row 3: status change.
    let seqs: Vec<(i64, String)> = rows.iter().map(|r| (r.seq, r.kind.clone())).collect();
    assert_eq!(
        seqs,
        vec![
            (0, kind::USER_MESSAGE.to_string()),
            (2, kind::AGENT_MESSAGE_CHUNK.to_string()),
            (3, kind::STATUS_CHANGE.to_string()),
        ]
    );
    let merged = swb_wire::unmarshal(rows[1].payload.as_bytes()).unwrap();
    assert_eq!(merged.text.as_deref(), Some("Hi there"));

    // The session_update drove a topic change on the owning thread
    let topics = harness.topics.topics();
    assert!(topics
        .iter()
        .any(|(thread, topic)| thread.as_str() == "thr-1" && topic == "Greeting"));

    cancel.cancel();
    let _ = tokio::time::timeout(std::time::Duration::from_secs(2), watcher_task).await;
}
