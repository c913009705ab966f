// Session registry: owns the fixed session arena and is the single mutation authority.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::broadcast;
use tracing::{debug, info};

use super::error::{EngineError, EngineResult};
use super::session::{Session, SessionId, SessionStatus, SessionUpdate, TickOutcome};
use super::stats::{StatsCollector, StatsSnapshot};
use crate::config::EngineConfig;
use crate::source::identity_pool::IdentityPool;

/// Change notifications for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// One or more configuration fields changed.
    Updated { id: SessionId },
    StatusChanged {
        id: SessionId,
        from: SessionStatus,
        to: SessionStatus,
    },
    /// A clock pass finished.
    Tick { sequence: u64 },
}

/// Outcome of one clock pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub sequence: u64,
    /// Sessions that were watching when the pass began.
    pub advanced: usize,
    pub completed: Vec<SessionId>,
}

struct Arena {
    sessions: Vec<Session>,
    tick_seq: u64,
}

impl Arena {
    fn index_of(&self, id: SessionId) -> EngineResult<usize> {
        // Ids are assigned 1..=N in arena order.
        let idx = (id.0 as usize)
            .checked_sub(1)
            .ok_or(EngineError::NotFound(id))?;
        match self.sessions.get(idx) {
            Some(s) if s.id == id => Ok(idx),
            _ => Err(EngineError::NotFound(id)),
        }
    }

    fn for_each_active(&mut self, mut f: impl FnMut(&mut Session)) -> usize {
        let mut visited = 0;
        for session in self
            .sessions
            .iter_mut()
            .filter(|s| s.status == SessionStatus::Watching)
        {
            f(session);
            visited += 1;
        }
        visited
    }
}

pub struct SessionRegistry {
    arena: Mutex<Arena>,
    events: broadcast::Sender<SessionEvent>,
    stats: Arc<StatsCollector>,
}

impl SessionRegistry {
    /// Create `config.pool_size` idle sessions, each with a user agent drawn
    /// from `identities`. Fails if the config does not validate.
    pub fn new(config: &EngineConfig, identities: &IdentityPool) -> EngineResult<Self> {
        config.validate()?;
        let pool_size = u32::try_from(config.pool_size)
            .map_err(|_| EngineError::InvalidConfig("pool_size out of range".to_string()))?;
        let sessions = (1..=pool_size)
            .map(|n| {
                Session::new(
                    SessionId(n),
                    identities.pick_random(),
                    config.default_resolution,
                    config.default_duration,
                )
            })
            .collect::<Vec<_>>();
        info!("session registry created with {} sessions", sessions.len());

        let (events, _) = broadcast::channel(config.event_capacity);
        Ok(Self {
            arena: Mutex::new(Arena {
                sessions,
                tick_seq: 0,
            }),
            events,
            stats: Arc::new(StatsCollector::new()),
        })
    }

    /// Lifecycle counters shared with the command interface.
    pub fn stats(&self) -> &Arc<StatsCollector> {
        &self.stats
    }

    pub fn stats_snapshot(&self) -> StatsSnapshot {
        self.stats.snapshot(self.active_count())
    }

    pub fn len(&self) -> usize {
        self.arena.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.lock().sessions.is_empty()
    }

    pub fn ids(&self) -> Vec<SessionId> {
        self.arena.lock().sessions.iter().map(|s| s.id).collect()
    }

    pub fn get(&self, id: SessionId) -> EngineResult<Session> {
        let arena = self.arena.lock();
        let idx = arena.index_of(id)?;
        Ok(arena.sessions[idx].clone())
    }

    /// Copy of every session in id order.
    pub fn snapshot(&self) -> Vec<Session> {
        self.arena.lock().sessions.clone()
    }

    pub fn active_count(&self) -> usize {
        self.arena
            .lock()
            .sessions
            .iter()
            .filter(|s| s.status == SessionStatus::Watching)
            .count()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// Run `f` against a copy of the session and commit the copy only if `f`
    /// succeeds. A failed command leaves the stored session untouched.
    pub fn modify<T>(
        &self,
        id: SessionId,
        f: impl FnOnce(&mut Session) -> EngineResult<T>,
    ) -> EngineResult<T> {
        let mut arena = self.arena.lock();
        let idx = arena.index_of(id)?;

        let mut draft = arena.sessions[idx].clone();
        let out = f(&mut draft)?;

        let before = std::mem::replace(&mut arena.sessions[idx], draft);
        let after = &arena.sessions[idx];
        if before.status != after.status {
            self.emit(SessionEvent::StatusChanged {
                id,
                from: before.status,
                to: after.status,
            });
        } else if before != *after {
            self.emit(SessionEvent::Updated { id });
        }
        Ok(out)
    }

    /// Merge only the supplied fields into the named session.
    pub fn apply_update(&self, id: SessionId, update: &SessionUpdate) -> EngineResult<()> {
        if update.is_empty() {
            // Still surface NotFound for unknown ids.
            return self.get(id).map(|_| ());
        }
        self.modify(id, |s| s.apply(update))
    }

    /// Call `f` on every watching session while holding the registry lock.
    /// Mutations made here emit no events; callers outside the clock pass
    /// go through `modify`. Returns how many sessions were visited.
    pub(crate) fn for_each_active(&self, f: impl FnMut(&mut Session)) -> usize {
        self.arena.lock().for_each_active(f)
    }

    /// One clock pass: advance every watching session by exactly one second
    /// and count it. The whole pass runs under the lock, so no command
    /// observes it half done.
    pub fn tick_all(&self) -> TickReport {
        let mut arena = self.arena.lock();
        arena.tick_seq += 1;
        let mut report = TickReport {
            sequence: arena.tick_seq,
            ..TickReport::default()
        };

        let mut completed = Vec::new();
        report.advanced = arena.for_each_active(|session| {
            if session.tick() == TickOutcome::Completed {
                completed.push(session.id);
            }
        });
        report.completed = completed;
        self.stats.record_tick(report.completed.len());

        for &id in &report.completed {
            info!("session {} completed", id);
            self.emit(SessionEvent::StatusChanged {
                id,
                from: SessionStatus::Watching,
                to: SessionStatus::Done,
            });
        }
        self.emit(SessionEvent::Tick {
            sequence: report.sequence,
        });
        debug!(
            "tick {} advanced={} completed={}",
            report.sequence,
            report.advanced,
            report.completed.len()
        );
        report
    }

    fn emit(&self, event: SessionEvent) {
        // No subscribers is fine; the event is simply dropped.
        let _ = self.events.send(event);
    }
}
