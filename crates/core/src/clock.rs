// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Clock abstraction for testable time handling

use chrono::{DateTime, SecondsFormat, TimeZone, Utc};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// A clock that provides the current time
pub trait Clock: Clone + Send + Sync {
    fn now_utc(&self) -> DateTime<Utc>;
    fn epoch_ms(&self) -> u64;
}

/// Format a timestamp the way event records carry it: RFC3339 with
/// nanosecond precision, UTC offset rendered as `Z`.
pub fn rfc3339_nanos(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Nanos, true)
}

/// Real system clock
#[derive(Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn epoch_ms(&self) -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }
}

/// Fake clock for testing with controllable time
#[derive(Clone)]
pub struct FakeClock {
    current: Arc<Mutex<DateTime<Utc>>>,
}

impl FakeClock {
    pub fn new() -> Self {
        // Arbitrary fixed origin so tests are deterministic
        let origin = Utc.timestamp_millis_opt(1_000_000).single().unwrap_or_default();
        Self { current: Arc::new(Mutex::new(origin)) }
    }

    /// Advance the clock by the given duration
    pub fn advance(&self, duration: Duration) {
        let mut current = self.current.lock();
        *current += chrono::TimeDelta::from_std(duration).unwrap_or_default();
    }

    /// Set the clock to a specific instant
    pub fn set(&self, ts: DateTime<Utc>) {
        *self.current.lock() = ts;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn now_utc(&self) -> DateTime<Utc> {
        *self.current.lock()
    }

    fn epoch_ms(&self) -> u64 {
        self.current.lock().timestamp_millis().max(0) as u64
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
