// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Watch fan-out: replay history, then follow live.
//!
//! The ordering contract: subscribe to the bus *before* reading history,
//! so nothing written between the journal read and the subscription can
//! be lost. Events that land in both (journaled after subscribing, before
//! the replay query) are deduplicated by a per-session sequence floor —
//! the client sees every row exactly once, in order.

use std::collections::HashMap;
use std::sync::Arc;

use swb_core::{SessionId, TaskId, ThreadId};
use swb_storage::{JournalRow, Store};
use swb_wire::{to_client_event, unmarshal, WatchFrame};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::bus::EventBus;

/// Which sessions a watch delivers.
#[derive(Debug, Clone, PartialEq)]
pub enum WatchScope {
    Session(SessionId),
    Thread(ThreadId),
    Task(TaskId),
}

impl WatchScope {
    /// Validate the request fields: exactly one scope must be set.
    pub fn from_request(
        session_id: Option<String>,
        thread_id: Option<String>,
        task_id: Option<String>,
    ) -> Result<Self, &'static str> {
        match (session_id, thread_id, task_id) {
            (Some(id), None, None) if !id.is_empty() => Ok(WatchScope::Session(SessionId::new(id))),
            (None, Some(id), None) if !id.is_empty() => Ok(WatchScope::Thread(ThreadId::new(id))),
            (None, None, Some(id)) if !id.is_empty() => Ok(WatchScope::Task(TaskId::new(id))),
            _ => Err("exactly one of session_id, thread_id, task_id must be set"),
        }
    }
}

/// Serve one watch: replay journal rows with `seq > after_sequence` as
/// history, then follow the live bus until the client goes away or the
/// stream is cancelled. Frames are pushed into `tx`; the caller owns the
/// connection write side.
pub async fn watch_session_events<S: Store>(
    store: &Arc<S>,
    bus: &EventBus,
    scope: WatchScope,
    after_sequence: i64,
    tx: mpsc::Sender<WatchFrame>,
    cancel: CancellationToken,
) {
    // Subscribe before the history read; see module docs.
    let mut subscription = bus.subscribe();

    // ── Replay ──────────────────────────────────────────────────────────
    let rows = match &scope {
        WatchScope::Session(id) => store.events_for_session(id).await,
        WatchScope::Thread(id) => store.events_for_thread(id).await,
        WatchScope::Task(id) => store.events_for_task(id).await,
    };
    let rows = match rows {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "watch history read failed");
            return;
        }
    };

    // Highest sequence already delivered, per session. Live frames at or
    // below the floor are duplicates of history (or predate the cursor).
    let mut floor: HashMap<String, i64> = HashMap::new();

    for row in rows {
        if row.seq <= after_sequence {
            continue;
        }
        let Some(event) = decode_row(&row) else { continue };
        floor.insert(row.session_id.as_str().to_string(), row.seq);
        if tx.send(WatchFrame { event, is_history: true }).await.is_err() {
            return;
        }
    }

    // ── Follow ──────────────────────────────────────────────────────────
    // Scope decisions for thread/task watches are resolved through the
    // store once per session and cached for the life of this call.
    let mut scope_cache: HashMap<String, bool> = HashMap::new();

    loop {
        let record = tokio::select! {
            _ = cancel.cancelled() => return,
            record = subscription.recv() => match record {
                Some(record) => record,
                None => return,
            },
        };

        if !matches_scope(store, &scope, &record.session_id, &mut scope_cache).await {
            continue;
        }

        let seen = floor.get(record.session_id.as_str()).copied().unwrap_or(after_sequence);
        if record.seq <= seen {
            continue;
        }
        floor.insert(record.session_id.clone(), record.seq);

        let frame = WatchFrame { event: to_client_event(&record), is_history: false };
        if tx.send(frame).await.is_err() {
            return;
        }
    }
}

fn decode_row(row: &JournalRow) -> Option<swb_wire::ClientEvent> {
    match unmarshal(row.payload.as_bytes()) {
        Ok(record) => Some(to_client_event(&record)),
        Err(e) => {
            // Old or damaged rows are skipped, never fatal
            warn!(
                session_id = %row.session_id,
                seq = row.seq,
                error = %e,
                "skipping malformed journal row"
            );
            None
        }
    }
}

async fn matches_scope<S: Store>(
    store: &Arc<S>,
    scope: &WatchScope,
    session_id: &str,
    cache: &mut HashMap<String, bool>,
) -> bool {
    if let WatchScope::Session(id) = scope {
        return id.as_str() == session_id;
    }
    if let Some(decision) = cache.get(session_id) {
        return *decision;
    }

    let session = match store.get_session(&SessionId::new(session_id)).await {
        Ok(session) => session,
        Err(e) => {
            // Unresolvable: drop the event but leave the cache alone so a
            // recovered store can answer next time.
            debug!(session_id, error = %e, "scope lookup failed, dropping event");
            return false;
        }
    };

    let decision = match (&session, scope) {
        (Some(s), WatchScope::Thread(thread_id)) => &s.thread_id == thread_id,
        (Some(s), WatchScope::Task(task_id)) => s.task_id.as_ref() == Some(task_id),
        (None, _) => false,
        (_, WatchScope::Session(_)) => false,
    };
    cache.insert(session_id.to_string(), decision);
    decision
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
