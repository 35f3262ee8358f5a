//! Named timing spans around agent calls.

use chrono::{DateTime, Utc};
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::infrastructure::ports::{ClockPort, TelemetryPort};

/// Finished spans kept before the oldest are dropped
pub const MAX_PROFILE_ENTRIES: usize = 500;

/// One finished span
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileEntry {
    pub name: String,
    pub started_at: DateTime<Utc>,
    pub ended_at: DateTime<Utc>,
    pub duration_ms: i64,
    pub metadata: HashMap<String, String>,
}

struct OpenSpan {
    started_at: DateTime<Utc>,
    metadata: HashMap<String, String>,
}

#[derive(Default)]
struct ProfilerState {
    open: HashMap<String, OpenSpan>,
    entries: VecDeque<ProfileEntry>,
}

/// Records spans in memory, timed by the injected clock
pub struct Profiler {
    clock: Arc<dyn ClockPort>,
    capacity: usize,
    state: Mutex<ProfilerState>,
}

impl Profiler {
    pub fn new(clock: Arc<dyn ClockPort>) -> Self {
        Self::with_capacity(clock, MAX_PROFILE_ENTRIES)
    }

    /// Profiler retaining at most `capacity` finished spans
    pub fn with_capacity(clock: Arc<dyn ClockPort>, capacity: usize) -> Self {
        Self {
            clock,
            capacity: capacity.max(1),
            state: Mutex::new(ProfilerState::default()),
        }
    }

    /// Finished spans in completion order, oldest first
    pub fn entries(&self) -> Vec<ProfileEntry> {
        self.lock().entries.iter().cloned().collect()
    }

    /// Remove and return the finished spans
    pub fn drain(&self) -> Vec<ProfileEntry> {
        self.lock().entries.drain(..).collect()
    }

    pub fn clear(&self) {
        let mut state = self.lock();
        state.open.clear();
        state.entries.clear();
    }

    fn lock(&self) -> MutexGuard<'_, ProfilerState> {
        // A panic while holding the lock leaves plain data behind; keep using it.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl TelemetryPort for Profiler {
    fn start(&self, name: &str, metadata: HashMap<String, String>) {
        let started_at = self.clock.now();
        self.lock().open.insert(
            name.to_string(),
            OpenSpan {
                started_at,
                metadata,
            },
        );
    }

    fn annotate(&self, name: &str, key: &str, value: &str) {
        if let Some(span) = self.lock().open.get_mut(name) {
            span.metadata.insert(key.to_string(), value.to_string());
        }
    }

    fn stop(&self, name: &str) {
        let ended_at = self.clock.now();
        let mut state = self.lock();
        let Some(span) = state.open.remove(name) else {
            tracing::debug!(span = name, "Profiler stop without matching start");
            return;
        };
        let entry = ProfileEntry {
            name: name.to_string(),
            started_at: span.started_at,
            ended_at,
            duration_ms: (ended_at - span.started_at).num_milliseconds(),
            metadata: span.metadata,
        };
        tracing::debug!(span = name, duration_ms = entry.duration_ms, "Profiler span finished");
        while state.entries.len() >= self.capacity {
            state.entries.pop_front();
        }
        state.entries.push_back(entry);
    }
}

/// Telemetry that records nothing
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTelemetry;

impl TelemetryPort for NoopTelemetry {
    fn start(&self, _name: &str, _metadata: HashMap<String, String>) {}

    fn annotate(&self, _name: &str, _key: &str, _value: &str) {}

    fn stop(&self, _name: &str) {}
}
