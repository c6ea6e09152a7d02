// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Switchboard control-plane daemon library.
//!
//! Everything the `swbd` binary wires together: worker registry, relay,
//! reconciler, state-sync watcher + handler, broadcast bus, watch fan-out,
//! session service, and the UI listener. The binary is a thin shell over
//! these modules; workspace specs tests drive them in-process.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod bus;
pub mod config;
pub mod env;
pub mod listener;
pub mod reconcile;
pub mod registry;
pub mod relay;
pub mod service;
pub mod statesync;
pub mod sysprompt;
pub mod threads;
pub mod workers;

pub use bus::{EventBus, Subscription};
pub use config::{Config, ConfigError};
pub use listener::{watch_session_events, ListenCtx, Listener, WatchScope};
pub use reconcile::{Reconciler, ReconcilerConfig, ReconcilerHandle};
pub use registry::{host_port, WorkerEntry, WorkerRegistry};
pub use service::{ServiceError, SessionService};
pub use statesync::{StateSyncHandler, StateSyncWatcher};
pub use sysprompt::SystemPromptRenderer;
pub use threads::{NoopThreadTopics, RecordingThreadTopics, ThreadTopics, TopicError};
pub use workers::{FakeWorkerApi, FakeWorkerCall, HttpWorkerClient, WorkerApi, WorkerApiError};
