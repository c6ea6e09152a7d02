// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Broadcast bus for raw session events.
//!
//! Every event received from a worker is published here exactly as it
//! arrived (unmerged), one buffered channel per subscriber. Publishing
//! never blocks: a subscriber that cannot keep up loses the frame, and
//! catches up later from the journal by reconnecting with a higher
//! `after_sequence`. The journal is authoritative; the bus is best-effort.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use swb_wire::SessionEventRecord;
use tokio::sync::mpsc;
use tracing::debug;

/// Per-subscriber channel capacity.
pub const SUBSCRIBER_BUFFER: usize = 64;

#[derive(Default)]
struct Inner {
    next_id: u64,
    subscribers: HashMap<u64, mpsc::Sender<Arc<SessionEventRecord>>>,
}

/// Fan-out bus for live session events.
#[derive(Clone, Default)]
pub struct EventBus {
    inner: Arc<Mutex<Inner>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a buffered subscription. Dropping it unsubscribes.
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(SUBSCRIBER_BUFFER);
        let id = {
            let mut inner = self.inner.lock();
            let id = inner.next_id;
            inner.next_id += 1;
            inner.subscribers.insert(id, tx);
            id
        };
        Subscription { id, rx, inner: Arc::clone(&self.inner) }
    }

    /// Deliver an event to every subscriber that has buffer room.
    ///
    /// Slow subscribers lose the frame (try-send); closed subscribers are
    /// pruned.
    pub fn publish(&self, record: Arc<SessionEventRecord>) {
        let mut inner = self.inner.lock();
        let mut closed = Vec::new();
        let mut dropped = 0usize;
        for (id, tx) in inner.subscribers.iter() {
            match tx.try_send(Arc::clone(&record)) {
                Ok(()) => {}
                Err(mpsc::error::TrySendError::Full(_)) => dropped += 1,
                Err(mpsc::error::TrySendError::Closed(_)) => closed.push(*id),
            }
        }
        for id in closed {
            inner.subscribers.remove(&id);
        }
        if dropped > 0 {
            debug!(
                session_id = %record.session_id,
                seq = record.seq,
                dropped,
                "dropped live event for slow subscribers"
            );
        }
    }

    /// Number of live subscribers (test hook).
    pub fn subscriber_count(&self) -> usize {
        self.inner.lock().subscribers.len()
    }
}

/// One subscriber's buffered view of the live event stream.
pub struct Subscription {
    id: u64,
    rx: mpsc::Receiver<Arc<SessionEventRecord>>,
    inner: Arc<Mutex<Inner>>,
}

impl Subscription {
    /// Receive the next event; `None` when the bus side closed.
    pub async fn recv(&mut self) -> Option<Arc<SessionEventRecord>> {
        self.rx.recv().await
    }

    /// Non-blocking receive (test hook).
    pub fn try_recv(&mut self) -> Option<Arc<SessionEventRecord>> {
        self.rx.try_recv().ok()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.inner.lock().subscribers.remove(&self.id);
    }
}

#[cfg(test)]
#[path = "bus_tests.rs"]
mod tests;
