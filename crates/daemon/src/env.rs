// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

/// Resolve state directory: SWB_STATE_DIR > XDG_STATE_HOME/switchboard >
/// ~/.local/state/switchboard
pub fn state_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var("SWB_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("switchboard"));
    }
    dirs::home_dir().map(|home| home.join(".local/state/switchboard"))
}

/// Reconciler tick override (`SWB_RECONCILE_TICK_MS`).
pub fn reconcile_tick() -> Option<Duration> {
    std::env::var("SWB_RECONCILE_TICK_MS")
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Reconciler batch-size override (`SWB_RECONCILE_BATCH`).
pub fn reconcile_batch() -> Option<usize> {
    std::env::var("SWB_RECONCILE_BATCH").ok().and_then(|s| s.parse::<usize>().ok())
}

/// Relay bind address override (`SWB_RELAY_ADDR`).
pub fn relay_addr() -> Option<String> {
    std::env::var("SWB_RELAY_ADDR").ok().filter(|s| !s.is_empty())
}
