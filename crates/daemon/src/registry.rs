// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-wide worker registry.
//!
//! Maps worker ids to their RPC endpoint and shared secret. The first
//! worker registered becomes the default until reassigned. Reads vastly
//! outnumber writes (every relay request and dispatch does a lookup), so
//! the map sits behind a read-write lock held only for the map operation.

use indexmap::IndexMap;
use parking_lot::RwLock;
use swb_core::WorkerId;

/// One registered worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerEntry {
    pub id: WorkerId,
    /// RPC endpoint, e.g. `http://10.0.1.5:9100`.
    pub base_url: String,
    /// Bearer secret injected into every call toward this worker.
    pub shared_secret: String,
}

impl WorkerEntry {
    pub fn new(
        id: impl Into<WorkerId>,
        base_url: impl Into<String>,
        shared_secret: impl Into<String>,
    ) -> Self {
        Self { id: id.into(), base_url: base_url.into(), shared_secret: shared_secret.into() }
    }
}

#[derive(Default)]
struct Inner {
    workers: IndexMap<WorkerId, WorkerEntry>,
    default_id: Option<WorkerId>,
}

/// Mutable mapping `worker_id → (base_url, shared_secret)` with a
/// designated default worker.
#[derive(Default)]
pub struct WorkerRegistry {
    inner: RwLock<Inner>,
}

impl WorkerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register or replace a worker. The first insert becomes the default.
    pub fn insert(&self, entry: WorkerEntry) {
        let mut inner = self.inner.write();
        if inner.default_id.is_none() {
            inner.default_id = Some(entry.id.clone());
        }
        inner.workers.insert(entry.id.clone(), entry);
    }

    /// Remove a worker. When the default is removed, the first remaining
    /// worker (insertion order) becomes the new default.
    pub fn remove(&self, id: &WorkerId) -> Option<WorkerEntry> {
        let mut inner = self.inner.write();
        let removed = inner.workers.shift_remove(id);
        if removed.is_some() && inner.default_id.as_ref() == Some(id) {
            inner.default_id = inner.workers.keys().next().cloned();
        }
        removed
    }

    /// Reassign the default worker. Returns `false` for unknown ids.
    pub fn set_default(&self, id: &WorkerId) -> bool {
        let mut inner = self.inner.write();
        if !inner.workers.contains_key(id) {
            return false;
        }
        inner.default_id = Some(id.clone());
        true
    }

    pub fn lookup(&self, id: &WorkerId) -> Option<WorkerEntry> {
        self.inner.read().workers.get(id).cloned()
    }

    pub fn default_entry(&self) -> Option<WorkerEntry> {
        let inner = self.inner.read();
        let id = inner.default_id.as_ref()?;
        inner.workers.get(id).cloned()
    }

    /// Resolve a routing header value: empty selects the default worker.
    pub fn resolve(&self, id: &str) -> Option<WorkerEntry> {
        if id.is_empty() {
            self.default_entry()
        } else {
            self.lookup(&WorkerId::new(id))
        }
    }

    pub fn entries(&self) -> Vec<WorkerEntry> {
        self.inner.read().workers.values().cloned().collect()
    }
}

/// Strip the URL scheme off a base URL, leaving `host:port` for raw TCP
/// dialing. Trailing slashes are dropped too.
pub fn host_port(base_url: &str) -> &str {
    let stripped = base_url
        .strip_prefix("http://")
        .or_else(|| base_url.strip_prefix("https://"))
        .or_else(|| base_url.strip_prefix("ws://"))
        .unwrap_or(base_url);
    stripped.trim_end_matches('/')
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
