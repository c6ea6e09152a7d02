// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session reconciliation.
//!
//! The control loop that turns `pending` session rows into dispatched
//! sessions. Runs on a fixed tick plus a coalesced wake signal, reads the
//! store's current pending set in insertion order, and drives each
//! session through the status machine. The store's conditional status
//! update is the serialization point: a session is handed to a worker at
//! most once, across restarts included.

use std::sync::Arc;
use std::time::Duration;

use swb_core::{rfc3339_nanos, Clock, Session, SessionStatus};
use swb_storage::{JournalRow, Store};
use swb_wire::worker::{NewSessionRequest, ALLOWED_TOOLS};
use swb_wire::{kind, marshal, SessionEventRecord};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::registry::WorkerRegistry;
use crate::sysprompt::SystemPromptRenderer;
use crate::workers::WorkerApi;

/// Tunables for the reconcile loop.
#[derive(Debug, Clone)]
pub struct ReconcilerConfig {
    /// Interval between unsolicited passes.
    pub tick: Duration,
    /// Maximum pending sessions dispatched per pass.
    pub batch: usize,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self { tick: Duration::from_secs(5), batch: 10 }
    }
}

/// Wake handle for producers.
///
/// `notify()` is safe to call from anywhere at any time; concurrent calls
/// coalesce into at most one queued wake-up.
#[derive(Clone)]
pub struct ReconcilerHandle {
    wake_tx: mpsc::Sender<()>,
}

impl ReconcilerHandle {
    /// Standalone wake channel, for wiring a service without a loop.
    pub fn channel() -> (Self, mpsc::Receiver<()>) {
        let (wake_tx, wake_rx) = mpsc::channel(1);
        (Self { wake_tx }, wake_rx)
    }

    pub fn notify(&self) {
        // Non-blocking: if the channel already holds a wake-up, the loop
        // will run anyway.
        let _ = self.wake_tx.try_send(());
    }
}

/// The reconcile loop.
pub struct Reconciler<S, W, C> {
    store: Arc<S>,
    workers: Arc<W>,
    registry: Arc<WorkerRegistry>,
    renderer: SystemPromptRenderer,
    clock: C,
    config: ReconcilerConfig,
    wake_rx: mpsc::Receiver<()>,
}

impl<S, W, C> Reconciler<S, W, C>
where
    S: Store,
    W: WorkerApi,
    C: Clock,
{
    pub fn new(
        store: Arc<S>,
        workers: Arc<W>,
        registry: Arc<WorkerRegistry>,
        renderer: SystemPromptRenderer,
        clock: C,
        config: ReconcilerConfig,
    ) -> (Self, ReconcilerHandle) {
        let (wake_tx, wake_rx) = mpsc::channel(1);
        (
            Self { store, workers, registry, renderer, clock, config, wake_rx },
            ReconcilerHandle { wake_tx },
        )
    }

    /// Run until cancelled. An in-flight dispatch finishes before the
    /// loop exits.
    pub async fn run(mut self, cancel: CancellationToken) {
        let mut tick = tokio::time::interval(self.config.tick);
        // The first interval tick fires immediately, which doubles as the
        // startup pass over sessions left pending by a previous run.
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tick.tick() => {}
                _ = self.wake_rx.recv() => {}
            }
            self.pass().await;
        }
        info!("reconciler stopped");
    }

    /// One pass over the current pending set.
    pub async fn pass(&self) {
        let pending = match self.store.list_pending(self.config.batch).await {
            Ok(pending) => pending,
            Err(e) => {
                warn!(error = %e, "failed to list pending sessions");
                return;
            }
        };
        for session in pending {
            self.dispatch(session).await;
        }
    }

    /// Dispatch one pending session to its worker.
    async fn dispatch(&self, session: Session) {
        let session_id = session.id.clone();

        // 1. Resolve the worker. A session pointed at an unregistered
        //    worker can never dispatch; fail it outright.
        let Some(worker) = self.registry.lookup(&session.worker_id) else {
            warn!(
                session_id = %session_id,
                worker_id = %session.worker_id,
                "worker not registered, failing session"
            );
            self.set_status(&session_id, SessionStatus::Pending, SessionStatus::Failed).await;
            return;
        };

        // 2. Claim the session. Losing the claim means another pass (or a
        //    previous run) already owns it; the next tick re-reads the store.
        match self
            .store
            .transition(
                &session_id,
                SessionStatus::Pending,
                SessionStatus::Scheduling,
                self.clock.now_utc(),
            )
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                info!(session_id = %session_id, "session no longer pending, skipping");
                return;
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "claim failed, will retry next tick");
                return;
            }
        }

        // 3. Working directory is optional; a session without one runs in
        //    the worker's default directory.
        let cwd = match self.store.session_cwd(&session_id).await {
            Ok(cwd) => cwd,
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "cwd lookup failed, dispatching without");
                None
            }
        };

        // 4. Hand the session to the worker.
        let request = NewSessionRequest {
            session_id: session_id.as_str().to_string(),
            agent: session.agent.clone(),
            mode: session.mode.clone(),
            prompt: session.prompt.clone(),
            system_prompt: self.renderer.render(&session),
            model: session.model.clone(),
            cwd: cwd.map(|p| p.display().to_string()),
            session_mode: session.session_mode.clone(),
            allowed_tools: ALLOWED_TOOLS.iter().map(|t| t.to_string()).collect(),
        };

        let dispatched_at = self.clock.now_utc();
        let response = match self.workers.new_session(&worker, &request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(session_id = %session_id, worker_id = %worker.id, error = %e, "NewSession failed");
                self.set_status(&session_id, SessionStatus::Scheduling, SessionStatus::Failed)
                    .await;
                return;
            }
        };

        if !response.accepted {
            warn!(
                session_id = %session_id,
                worker_id = %worker.id,
                message = %response.message,
                "worker rejected session"
            );
            self.set_status(&session_id, SessionStatus::Scheduling, SessionStatus::Failed).await;
            return;
        }

        // 5. Record the agent binding and go running.
        match self
            .store
            .mark_running(&session_id, &response.agent_session_id, self.clock.now_utc())
            .await
        {
            Ok(true) => {
                info!(
                    session_id = %session_id,
                    worker_id = %worker.id,
                    agent_session_id = %response.agent_session_id,
                    "session dispatched"
                );
            }
            Ok(false) => {
                warn!(session_id = %session_id, "session left scheduling state during dispatch");
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "failed to mark session running");
            }
        }

        // 6. Journal the originating prompt at sequence 0 so replay shows
        //    the human turn even before any worker events arrive.
        //    Best-effort: a failed write is logged, never unwound.
        let mut record = SessionEventRecord::envelope(
            &session_id,
            0,
            rfc3339_nanos(&dispatched_at),
            kind::USER_MESSAGE,
        );
        record.text = Some(session.prompt.clone());
        match marshal(&record) {
            Ok(payload) => {
                let row = JournalRow {
                    session_id: session_id.clone(),
                    seq: 0,
                    kind: kind::USER_MESSAGE.to_string(),
                    payload: String::from_utf8_lossy(&payload).into_owned(),
                    created_at: dispatched_at,
                };
                if let Err(e) = self.store.insert_event(&row).await {
                    warn!(session_id = %session_id, error = %e, "failed to journal initial prompt");
                }
            }
            Err(e) => {
                warn!(session_id = %session_id, error = %e, "failed to encode initial prompt");
            }
        }
    }

    async fn set_status(&self, id: &swb_core::SessionId, from: SessionStatus, to: SessionStatus) {
        match self.store.transition(id, from, to, self.clock.now_utc()).await {
            Ok(true) => {}
            Ok(false) => {
                info!(session_id = %id, from = %from, to = %to, "status moved underneath us");
            }
            Err(e) => {
                warn!(session_id = %id, error = %e, "status update failed");
            }
        }
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
