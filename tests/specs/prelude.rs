// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared harness for scenario tests.

use std::sync::Arc;

use swb_core::{FakeClock, SessionId, WorkerEvent};
use swb_daemon::reconcile::{Reconciler, ReconcilerConfig};
use swb_daemon::registry::{WorkerEntry, WorkerRegistry};
use swb_daemon::statesync::StateSyncHandler;
use swb_daemon::threads::{RecordingThreadTopics, ThreadTopics};
use swb_daemon::workers::FakeWorkerApi;
use swb_daemon::{EventBus, SessionService, SystemPromptRenderer};
use swb_storage::{MemoryStore, Store};
use swb_wire::worker::NewSessionResponse;

pub const WORKER_ID: &str = "w1";

/// An in-process control plane against a scriptable fake worker.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub workers: Arc<FakeWorkerApi>,
    pub registry: Arc<WorkerRegistry>,
    pub bus: EventBus,
    pub clock: FakeClock,
    pub topics: Arc<RecordingThreadTopics>,
    pub handler: Arc<StateSyncHandler<MemoryStore, FakeClock>>,
    pub service: SessionService<MemoryStore, FakeWorkerApi, FakeClock>,
    reconciler: Reconciler<MemoryStore, FakeWorkerApi, FakeClock>,
}

impl Harness {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        let workers = Arc::new(FakeWorkerApi::new());
        let registry = Arc::new(WorkerRegistry::new());
        registry.insert(WorkerEntry::new(WORKER_ID, "http://127.0.0.1:9100", "secret"));
        let bus = EventBus::new();
        let clock = FakeClock::new();
        let topics = Arc::new(RecordingThreadTopics::new());

        let (reconciler, handle) = Reconciler::new(
            Arc::clone(&store),
            Arc::clone(&workers),
            Arc::clone(&registry),
            SystemPromptRenderer::new("/plans".into(), vec![]),
            clock.clone(),
            ReconcilerConfig::default(),
        );

        let handler = Arc::new(StateSyncHandler::new(
            Arc::clone(&store),
            bus.clone(),
            Arc::clone(&topics) as Arc<dyn ThreadTopics>,
            clock.clone(),
        ));

        let service = SessionService::new(
            Arc::clone(&store),
            Arc::clone(&workers),
            Arc::clone(&registry),
            Arc::clone(&topics) as Arc<dyn ThreadTopics>,
            handle,
            bus.clone(),
            clock.clone(),
        );

        Self { store, workers, registry, bus, clock, topics, handler, service, reconciler }
    }

    /// Script the next `NewSession` acceptance.
    pub fn accept_next_session(&self, agent_session_id: &str) {
        self.workers.script(NewSessionResponse {
            accepted: true,
            message: String::new(),
            agent_session_id: agent_session_id.to_string(),
        });
    }

    /// Create a session and run one reconcile pass over it.
    pub async fn dispatched_session(&self, prompt: &str) -> swb_core::Session {
        let session = self
            .service
            .create_session(swb_daemon::service::CreateSessionParams {
                thread_id: "thr-1".to_string(),
                worker_id: WORKER_ID.to_string(),
                prompt: prompt.to_string(),
                agent: "claude".to_string(),
                model: "opus".to_string(),
                mode: "build".to_string(),
                session_mode: "default".to_string(),
            })
            .await
            .unwrap();
        self.reconciler.pass().await;
        self.store.get_session(&session.id).await.unwrap().unwrap()
    }

    pub async fn reconcile_pass(&self) {
        self.reconciler.pass().await;
    }

    /// Feed one worker event through the state-sync handler.
    pub async fn worker_event(&self, session: &SessionId, seq: i64, event: WorkerEvent) {
        self.handler.on_event(session.clone(), seq, None, event).await;
    }

    pub fn message_chunk(text: &str) -> WorkerEvent {
        WorkerEvent::AgentMessageChunk { text: text.to_string() }
    }

    pub fn thought_chunk(text: &str) -> WorkerEvent {
        WorkerEvent::AgentThoughtChunk { text: text.to_string() }
    }

    pub fn status_change(status: &str) -> WorkerEvent {
        WorkerEvent::StatusChange { status: status.to_string() }
    }
}
