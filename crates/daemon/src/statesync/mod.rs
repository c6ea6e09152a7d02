// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State-sync pipeline.
//!
//! One long-lived bidirectional stream per worker delivers session
//! events; the handler collapses token-level chunks into storage-sized
//! journal rows while broadcasting every raw frame to live subscribers.

mod handler;
mod watcher;

pub use handler::StateSyncHandler;
pub use watcher::StateSyncWatcher;
