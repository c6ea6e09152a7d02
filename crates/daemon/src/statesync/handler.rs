// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State-sync frame consumer: chunk merger + persister + broadcaster.
//!
//! A single agent utterance arrives as dozens to thousands of short text
//! chunks. Live subscribers want each one as it lands; the journal wants
//! one row per utterance. So every incoming event is broadcast raw, while
//! the journal write path runs through a per-session accumulator that
//! concatenates consecutive chunks of one type and flushes on any
//! boundary: a different chunk type, a non-chunk event, session removal,
//! or stream close.
//!
//! The flushed row keeps the *last* absorbed sequence (ordering stays
//! monotonic) and the *first* absorbed timestamp (the row dates from when
//! the utterance started).

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use swb_core::{rfc3339_nanos, Clock, SessionId, WorkerEvent};
use swb_storage::{JournalRow, Store};
use swb_wire::{chunk_record, marshal, to_record, SessionEventRecord, SyncFrame};
use tracing::{debug, warn};

use crate::bus::EventBus;
use crate::threads::ThreadTopics;

/// Per-session buffer of consecutive same-type chunks.
struct ChunkAccum {
    event_type: String,
    text: String,
    /// Sequence of the latest absorbed chunk.
    seq: i64,
    /// Timestamp of the first absorbed chunk.
    first_ts: String,
}

/// Consumer side of one worker's state-sync stream.
pub struct StateSyncHandler<S, C> {
    store: Arc<S>,
    bus: EventBus,
    topics: Arc<dyn ThreadTopics>,
    clock: C,
    accums: Mutex<HashMap<SessionId, ChunkAccum>>,
}

impl<S, C> StateSyncHandler<S, C>
where
    S: Store,
    C: Clock,
{
    pub fn new(store: Arc<S>, bus: EventBus, topics: Arc<dyn ThreadTopics>, clock: C) -> Self {
        Self { store, bus, topics, clock, accums: Mutex::new(HashMap::new()) }
    }

    /// Process one frame off the stream.
    pub async fn on_frame(&self, frame: SyncFrame) {
        match frame {
            SyncFrame::SessionEvent { session_id, seq, ts, event } => {
                self.on_event(SessionId::new(session_id), seq, ts, event).await;
            }
            SyncFrame::SessionUpdate { session_id, topic, status } => {
                self.on_update(SessionId::new(session_id), &topic, status.as_deref()).await;
            }
            SyncFrame::SessionRemoved { session_id } => {
                self.on_removed(SessionId::new(session_id)).await;
            }
            SyncFrame::Snapshot { sessions } => {
                debug!(sessions = sessions.len(), "state-sync snapshot");
            }
            SyncFrame::Unknown => {
                debug!("ignoring unknown state-sync frame");
            }
        }
    }

    /// Journal (with merging) and broadcast one session event.
    pub async fn on_event(
        &self,
        session_id: SessionId,
        seq: i64,
        ts: Option<String>,
        event: WorkerEvent,
    ) {
        let ts = ts.unwrap_or_else(|| rfc3339_nanos(&self.clock.now_utc()));
        let record = Arc::new(to_record(&session_id, seq, ts.clone(), &event));

        if let Some(text) = event.chunk_text() {
            // Accumulate; flush first when the buffered type differs.
            let to_flush = {
                let mut accums = self.accums.lock();
                let same_type = accums
                    .get(&session_id)
                    .is_some_and(|accum| accum.event_type == record.event_type);
                if same_type {
                    if let Some(accum) = accums.get_mut(&session_id) {
                        accum.text.push_str(text);
                        accum.seq = seq;
                    }
                    None
                } else {
                    // Returns the displaced accumulator of the other type
                    accums.insert(
                        session_id.clone(),
                        ChunkAccum {
                            event_type: record.event_type.clone(),
                            text: text.to_string(),
                            seq,
                            first_ts: ts,
                        },
                    )
                }
            };
            if let Some(accum) = to_flush {
                self.flush_accum(&session_id, accum).await;
            }
        } else {
            // Chunk run ends here: flush it, then journal this event as-is.
            let to_flush = self.accums.lock().remove(&session_id);
            if let Some(accum) = to_flush {
                self.flush_accum(&session_id, accum).await;
            }
            self.persist(&session_id, &record).await;
        }

        // Live subscribers always get the raw, unmerged event.
        self.bus.publish(record);
    }

    /// Thread-topic side effect for session updates.
    async fn on_update(&self, session_id: SessionId, topic: &str, status: Option<&str>) {
        debug!(session_id = %session_id, topic, ?status, "session update");
        if topic.is_empty() {
            return;
        }
        let thread_id = match self.store.get_session(&session_id).await {
            Ok(Some(session)) => session.thread_id,
            Ok(None) => {
                warn!(session_id = %session_id, "topic update for unknown session");
                return;
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "session lookup failed for topic update");
                return;
            }
        };
        if let Err(e) = self.topics.update_topic(&thread_id, topic).await {
            warn!(thread_id = %thread_id, error = %e, "topic update failed");
        }
    }

    /// A removed session can never send another chunk; flush its buffer.
    async fn on_removed(&self, session_id: SessionId) {
        debug!(session_id = %session_id, "session removed");
        let to_flush = self.accums.lock().remove(&session_id);
        if let Some(accum) = to_flush {
            self.flush_accum(&session_id, accum).await;
        }
    }

    /// Flush every pending accumulator. Called whenever the stream ends so
    /// no buffered text outlives its connection.
    pub async fn flush_all(&self) {
        let drained: Vec<(SessionId, ChunkAccum)> = self.accums.lock().drain().collect();
        for (session_id, accum) in drained {
            self.flush_accum(&session_id, accum).await;
        }
    }

    async fn flush_accum(&self, session_id: &SessionId, accum: ChunkAccum) {
        let record = chunk_record(session_id, accum.seq, accum.first_ts, accum.event_type, accum.text);
        self.persist(session_id, &record).await;
    }

    /// Idempotent journal write. A failure is logged and dropped: the
    /// event was never acknowledged, so the worker replays it after
    /// reconnecting.
    async fn persist(&self, session_id: &SessionId, record: &SessionEventRecord) {
        let payload = match marshal(record) {
            Ok(payload) => String::from_utf8_lossy(&payload).into_owned(),
            Err(e) => {
                warn!(session_id = %session_id, seq = record.seq, error = %e, "failed to encode record");
                return;
            }
        };
        let row = JournalRow {
            session_id: session_id.clone(),
            seq: record.seq,
            kind: record.event_type.clone(),
            payload,
            created_at: self.clock.now_utc(),
        };
        match self.store.insert_event(&row).await {
            Ok(true) => {}
            Ok(false) => {
                debug!(session_id = %session_id, seq = record.seq, "duplicate event, already journaled");
            }
            Err(e) => {
                warn!(session_id = %session_id, seq = record.seq, error = %e, "journal write failed, dropping");
            }
        }
    }
}

#[cfg(test)]
#[path = "handler_tests.rs"]
mod tests;
