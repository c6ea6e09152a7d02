// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration.
//!
//! Fixed paths under the state directory plus an optional `config.toml`
//! for deployment settings (workers, relay address, reconciler tuning).
//! Environment variables override the file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::reconcile::ReconcilerConfig;
use crate::registry::{WorkerEntry, WorkerRegistry};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file {path}: {message}")]
    Invalid { path: PathBuf, message: String },
}

/// `config.toml` shape. Everything is optional; defaults apply.
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    relay_addr: Option<String>,
    #[serde(default)]
    reconcile_tick_ms: Option<u64>,
    #[serde(default)]
    reconcile_batch: Option<usize>,
    #[serde(default)]
    plans_root: Option<PathBuf>,
    #[serde(default)]
    extra_plan_dirs: Vec<PathBuf>,
    #[serde(default)]
    system_prompt_template: Option<String>,
    #[serde(default)]
    default_worker: Option<String>,
    #[serde(default)]
    workers: Vec<WorkerConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    pub id: String,
    pub base_url: String,
    pub secret: String,
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Root state directory (e.g. ~/.local/state/switchboard)
    pub state_dir: PathBuf,
    /// Path to Unix socket
    pub socket_path: PathBuf,
    /// Path to lock/PID file
    pub lock_path: PathBuf,
    /// Path to daemon log file
    pub log_path: PathBuf,
    /// Directory for the JSONL store
    pub data_dir: PathBuf,
    /// TCP bind address for the worker RPC relay
    pub relay_addr: String,
    /// Reconciler tuning
    pub reconcile: ReconcilerConfig,
    /// Root of per-thread plan directories
    pub plans_root: PathBuf,
    /// Additional plan directories exposed to every session
    pub extra_plan_dirs: Vec<PathBuf>,
    /// Optional system prompt template override
    pub system_prompt_template: Option<String>,
    /// Workers known at startup
    pub workers: Vec<WorkerConfig>,
    /// Default worker override (first configured worker otherwise)
    pub default_worker: Option<String>,
}

impl Config {
    /// Load configuration from the state dir, file, and environment.
    pub fn load() -> Result<Self, ConfigError> {
        let state_dir = crate::env::state_dir().ok_or(ConfigError::NoStateDir)?;
        Self::load_from(&state_dir)
    }

    /// Load with an explicit state dir (tests, embedded use).
    pub fn load_from(state_dir: &Path) -> Result<Self, ConfigError> {
        let file_path = state_dir.join("config.toml");
        let file: ConfigFile = if file_path.exists() {
            let raw = std::fs::read_to_string(&file_path)?;
            toml::from_str(&raw).map_err(|e| ConfigError::Invalid {
                path: file_path.clone(),
                message: e.to_string(),
            })?
        } else {
            ConfigFile::default()
        };

        let mut reconcile = ReconcilerConfig::default();
        if let Some(ms) = file.reconcile_tick_ms {
            reconcile.tick = Duration::from_millis(ms);
        }
        if let Some(tick) = crate::env::reconcile_tick() {
            reconcile.tick = tick;
        }
        if let Some(batch) = file.reconcile_batch {
            reconcile.batch = batch;
        }
        if let Some(batch) = crate::env::reconcile_batch() {
            reconcile.batch = batch;
        }

        let relay_addr = crate::env::relay_addr()
            .or(file.relay_addr)
            .unwrap_or_else(|| "127.0.0.1:7810".to_string());

        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            data_dir: state_dir.join("data"),
            relay_addr,
            reconcile,
            plans_root: file.plans_root.unwrap_or_else(|| state_dir.join("plans")),
            extra_plan_dirs: file.extra_plan_dirs,
            system_prompt_template: file.system_prompt_template,
            workers: file.workers,
            default_worker: file.default_worker,
            state_dir: state_dir.to_path_buf(),
        })
    }

    /// Build the registry from the configured workers.
    pub fn build_registry(&self) -> WorkerRegistry {
        let registry = WorkerRegistry::new();
        for worker in &self.workers {
            registry.insert(WorkerEntry::new(
                worker.id.as_str(),
                worker.base_url.as_str(),
                worker.secret.as_str(),
            ));
        }
        if let Some(default) = &self.default_worker {
            if !registry.set_default(&swb_core::WorkerId::new(default.as_str())) {
                tracing::warn!(worker_id = %default, "default_worker not in workers list");
            }
        }
        registry
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
