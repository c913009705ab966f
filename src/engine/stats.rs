// Lifecycle statistics: tick count and per-transition counters across all sessions.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub ticks: u64,
    pub sessions_started: u64,
    pub sessions_completed: u64,
    pub sessions_stopped: u64,
    pub rejected_commands: u64,
    pub active_sessions: usize,
}

pub struct StatsCollector {
    ticks: AtomicU64,
    started: AtomicU64,
    completed: AtomicU64,
    stopped: AtomicU64,
    rejected: AtomicU64,
}

impl StatsCollector {
    pub fn new() -> Self {
        Self {
            ticks: AtomicU64::new(0),
            started: AtomicU64::new(0),
            completed: AtomicU64::new(0),
            stopped: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
        }
    }

    pub fn record_tick(&self, completed: usize) {
        self.ticks.fetch_add(1, Ordering::Relaxed);
        self.completed.fetch_add(completed as u64, Ordering::Relaxed);
    }

    pub fn record_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_stopped(&self) {
        self.stopped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, active_sessions: usize) -> StatsSnapshot {
        StatsSnapshot {
            ticks: self.ticks.load(Ordering::Relaxed),
            sessions_started: self.started.load(Ordering::Relaxed),
            sessions_completed: self.completed.load(Ordering::Relaxed),
            sessions_stopped: self.stopped.load(Ordering::Relaxed),
            rejected_commands: self.rejected.load(Ordering::Relaxed),
            active_sessions,
        }
    }
}

impl Default for StatsCollector {
    fn default() -> Self {
        Self::new()
    }
}
