// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State-sync stream watcher.
//!
//! Maintains one WebSocket per worker for the life of the process:
//! connect, send the initial empty request, feed every frame to the
//! handler, acknowledge each event, and reconnect forever with
//! exponential backoff. The worker replays unacknowledged events after a
//! reconnect; the handler's idempotent persist makes the replay harmless.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use swb_core::Clock;
use swb_storage::Store;
use swb_wire::worker::PATH_STATE_SYNC;
use swb_wire::{SyncFrame, SyncRequest};
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::registry::{host_port, WorkerEntry};
use crate::statesync::handler::StateSyncHandler;

/// Initial reconnect delay.
const BACKOFF_MIN: Duration = Duration::from_secs(1);
/// Reconnect delay cap.
const BACKOFF_MAX: Duration = Duration::from_secs(10);

/// Double a backoff delay, saturating at [`BACKOFF_MAX`].
fn next_backoff(current: Duration) -> Duration {
    (current * 2).min(BACKOFF_MAX)
}

/// One worker's long-lived state-sync connection.
pub struct StateSyncWatcher<S, C> {
    worker: WorkerEntry,
    handler: Arc<StateSyncHandler<S, C>>,
}

impl<S, C> StateSyncWatcher<S, C>
where
    S: Store,
    C: Clock,
{
    pub fn new(worker: WorkerEntry, handler: Arc<StateSyncHandler<S, C>>) -> Self {
        Self { worker, handler }
    }

    /// Run until cancelled, reconnecting forever.
    pub async fn run(self, cancel: CancellationToken) {
        let mut backoff = BACKOFF_MIN;
        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self.connect_and_stream(&cancel, &mut backoff).await {
                Ok(()) => {
                    debug!(worker_id = %self.worker.id, "state-sync stream closed");
                }
                Err(e) => {
                    warn!(worker_id = %self.worker.id, error = %e, "state-sync stream error");
                }
            }

            // Buffered chunks must not outlive the connection that
            // produced them; the worker resumes with higher sequences.
            self.handler.flush_all().await;

            if cancel.is_cancelled() {
                break;
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(backoff) => {}
            }
            backoff = next_backoff(backoff);
        }
        info!(worker_id = %self.worker.id, "state-sync watcher stopped");
    }

    /// One connection's lifetime: handshake, initial frame, event loop.
    async fn connect_and_stream(
        &self,
        cancel: &CancellationToken,
        backoff: &mut Duration,
    ) -> Result<(), String> {
        let addr = host_port(&self.worker.base_url).to_string();
        let stream = tokio::net::TcpStream::connect(&addr)
            .await
            .map_err(|e| format!("TCP connect failed: {e}"))?;

        let uri = format!(
            "ws://{}{}?token={}",
            addr, PATH_STATE_SYNC, self.worker.shared_secret
        );
        let (ws, _) = tokio_tungstenite::client_async(&uri, stream)
            .await
            .map_err(|e| format!("WebSocket handshake failed: {e}"))?;
        info!(worker_id = %self.worker.id, %addr, "state-sync connected");

        let (mut write, mut read) = ws.split();

        // Every connection opens with the empty request; no frames arrive
        // until the worker has seen it.
        let open = serde_json::to_string(&SyncRequest::open())
            .map_err(|e| format!("encode open frame: {e}"))?;
        write
            .send(Message::Text(open.into()))
            .await
            .map_err(|e| format!("send open frame: {e}"))?;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    let _ = write.send(Message::Close(None)).await;
                    return Ok(());
                }
                message = read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            let frame: SyncFrame = match serde_json::from_str(text.as_str()) {
                                Ok(frame) => frame,
                                Err(e) => {
                                    warn!(worker_id = %self.worker.id, error = %e, "malformed state-sync frame");
                                    continue;
                                }
                            };
                            // Any well-formed frame proves the link is healthy
                            *backoff = BACKOFF_MIN;

                            let ack = match &frame {
                                SyncFrame::SessionEvent { session_id, seq, .. } => {
                                    Some(SyncRequest::ack(session_id.clone(), *seq))
                                }
                                _ => None,
                            };

                            self.handler.on_frame(frame).await;

                            // Acknowledge only after the handler has run, so an
                            // unprocessed event is replayed on reconnect.
                            if let Some(ack) = ack {
                                let encoded = serde_json::to_string(&ack)
                                    .map_err(|e| format!("encode ack: {e}"))?;
                                write
                                    .send(Message::Text(encoded.into()))
                                    .await
                                    .map_err(|e| format!("send ack: {e}"))?;
                            }
                        }
                        Some(Ok(Message::Close(frame))) => {
                            debug!(worker_id = %self.worker.id, ?frame, "received close frame");
                            return Ok(());
                        }
                        Some(Ok(_)) => {} // Ping/Pong/Binary — ignore
                        Some(Err(e)) => return Err(format!("stream error: {e}")),
                        None => return Ok(()),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_to_the_cap() {
        let mut backoff = BACKOFF_MIN;
        let mut seen = Vec::new();
        for _ in 0..6 {
            seen.push(backoff.as_secs());
            backoff = next_backoff(backoff);
        }
        assert_eq!(seen, vec![1, 2, 4, 8, 10, 10]);
    }
}
