// Command interface: validated entry points that mutate registry state.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::clock::ClockDriver;
use super::error::{EngineError, EngineResult};
use super::registry::{SessionEvent, SessionRegistry};
use super::session::{
    DurationMinutes, InputMode, Resolution, ResultRank, Session, SessionId, SessionUpdate,
};
use super::stats::StatsSnapshot;
use crate::config::EngineConfig;
use crate::source::identity_pool::IdentityPool;
use crate::source::suggestions::MockSuggestionProvider;
use crate::source::traits::{Suggestion, SuggestionProvider};

pub struct SessionController {
    registry: Arc<SessionRegistry>,
    identities: IdentityPool,
    suggestions: Arc<dyn SuggestionProvider>,
}

impl SessionController {
    pub fn new(
        registry: Arc<SessionRegistry>,
        identities: IdentityPool,
        suggestions: Arc<dyn SuggestionProvider>,
    ) -> Self {
        Self {
            registry,
            identities,
            suggestions,
        }
    }

    pub fn registry(&self) -> &Arc<SessionRegistry> {
        &self.registry
    }

    pub fn get(&self, id: SessionId) -> EngineResult<Session> {
        self.registry.get(id)
    }

    pub fn snapshot(&self) -> Vec<Session> {
        self.registry.snapshot()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.registry.subscribe()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.registry.stats_snapshot()
    }

    pub fn set_mode(&self, id: SessionId, mode: InputMode) -> EngineResult<()> {
        self.update(id, "set mode", SessionUpdate::default().mode(mode))
    }

    pub fn set_keyword(&self, id: SessionId, keyword: impl Into<String>) -> EngineResult<()> {
        self.update(id, "set keyword", SessionUpdate::default().keyword(keyword))
    }

    pub fn set_result_rank(&self, id: SessionId, rank: u8) -> EngineResult<()> {
        let rank = self.track(id, "set rank", ResultRank::new(rank))?;
        self.update(id, "set rank", SessionUpdate::default().result_rank(rank))
    }

    pub fn set_url(&self, id: SessionId, url: impl Into<String>) -> EngineResult<()> {
        self.update(id, "set url", SessionUpdate::default().target_url(url))
    }

    pub fn set_resolution(&self, id: SessionId, resolution: Resolution) -> EngineResult<()> {
        self.update(
            id,
            "set resolution",
            SessionUpdate::default().resolution(resolution),
        )
    }

    /// Takes effect on the next start; a running countdown is not rescaled.
    pub fn set_duration(&self, id: SessionId, duration: DurationMinutes) -> EngineResult<()> {
        self.update(id, "set duration", SessionUpdate::default().duration(duration))
    }

    /// Store a free-form proxy spec. Blank input clears it.
    pub fn set_proxy(&self, id: SessionId, proxy: &str) -> EngineResult<()> {
        let proxy = match proxy.trim() {
            "" => None,
            _ => Some(proxy.to_string()),
        };
        self.update(id, "set proxy", SessionUpdate::default().proxy(proxy))
    }

    /// Replace the user agent with a fresh pick from the identity pool.
    pub fn regenerate_identity(&self, id: SessionId) -> EngineResult<String> {
        let agent = self.identities.pick_random();
        self.update(
            id,
            "regenerate identity",
            SessionUpdate::default().user_agent(agent.clone()),
        )?;
        Ok(agent)
    }

    /// Look up display content for `keyword` at `rank` and attach it to the session.
    pub fn load_suggestion(
        &self,
        id: SessionId,
        keyword: &str,
        rank: u8,
    ) -> EngineResult<Suggestion> {
        let checked = self.registry.get(id).and_then(|_| {
            if keyword.trim().is_empty() {
                return Err(EngineError::Validation(
                    "a search keyword is required".to_string(),
                ));
            }
            ResultRank::new(rank)
        });
        let rank = self.track(id, "load suggestion", checked)?;

        // The provider runs outside the registry lock.
        let suggestion = self.suggestions.fetch_suggestion(keyword, rank);
        self.update(
            id,
            "load suggestion",
            SessionUpdate::default().suggestion(suggestion.clone()),
        )?;
        debug!("session {} suggestion loaded: {}", id, suggestion.title);
        Ok(suggestion)
    }

    pub fn start(&self, id: SessionId) -> EngineResult<()> {
        let seconds = self.track(
            id,
            "start",
            self.registry.modify(id, |s| {
                s.start()?;
                Ok(s.seconds_remaining())
            }),
        )?;
        self.registry.stats().record_started();
        info!("session {} started, {}s remaining", id, seconds);
        Ok(())
    }

    /// Stop a watching session immediately. Stopping an idle or done session
    /// is a no-op.
    pub fn stop(&self, id: SessionId) -> EngineResult<()> {
        let stopped = self.track(id, "stop", self.registry.modify(id, |s| Ok(s.stop())))?;
        if stopped {
            self.registry.stats().record_stopped();
            info!("session {} stopped", id);
        }
        Ok(())
    }

    /// Merge an arbitrary set of field changes in one step.
    pub fn apply_update(&self, id: SessionId, update: &SessionUpdate) -> EngineResult<()> {
        self.update(id, "update", update.clone())
    }

    fn update(&self, id: SessionId, action: &str, update: SessionUpdate) -> EngineResult<()> {
        self.track(id, action, self.registry.apply_update(id, &update))
    }

    fn track<T>(&self, id: SessionId, action: &str, result: EngineResult<T>) -> EngineResult<T> {
        if let Err(e) = &result {
            self.registry.stats().record_rejected();
            warn!("session {} {} rejected: {}", id, action, e);
        }
        result
    }
}

/// The registry, its command interface, and the clock that drives it.
pub struct ViewingEngine {
    controller: SessionController,
    clock: ClockDriver,
    config: EngineConfig,
}

impl ViewingEngine {
    /// Build the pool with the built-in identity list and mock suggestions,
    /// and start the clock. Must be called inside a Tokio runtime.
    pub fn start(config: EngineConfig) -> Result<Self> {
        Self::start_with(
            config,
            IdentityPool::default(),
            Arc::new(MockSuggestionProvider::default()),
        )
    }

    pub fn start_with(
        config: EngineConfig,
        identities: IdentityPool,
        suggestions: Arc<dyn SuggestionProvider>,
    ) -> Result<Self> {
        let registry = Arc::new(SessionRegistry::new(&config, &identities)?);
        let clock = ClockDriver::spawn(
            registry.clone(),
            Duration::from_millis(config.tick_interval_ms),
        )?;
        let controller = SessionController::new(registry, identities, suggestions);

        info!(
            "viewing engine started: {} sessions, tick={}ms",
            config.pool_size, config.tick_interval_ms
        );
        Ok(Self {
            controller,
            clock,
            config,
        })
    }

    pub fn commands(&self) -> &SessionController {
        &self.controller
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn snapshot(&self) -> Vec<Session> {
        self.controller.snapshot()
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.controller.stats()
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// Stop the clock and wait for the tick task to finish. Session state
    /// remains readable afterwards but no longer advances.
    pub async fn shutdown(self) -> SessionController {
        let Self {
            controller, clock, ..
        } = self;
        clock.join().await;
        info!("viewing engine stopped");
        controller
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::session::SessionStatus;
    use crate::source::random::SeededRandom;

    fn controller() -> SessionController {
        let rng = Arc::new(SeededRandom::new(5));
        let identities = IdentityPool::with_defaults(rng.clone());
        let registry =
            Arc::new(SessionRegistry::new(&EngineConfig::default(), &identities).unwrap());
        SessionController::new(registry, identities, Arc::new(MockSuggestionProvider::new(rng)))
    }

    #[test]
    fn test_start_with_empty_keyword_is_rejected() {
        let ctl = controller();
        let id = SessionId(1);
        assert!(matches!(ctl.start(id), Err(EngineError::Validation(_))));
        let s = ctl.get(id).unwrap();
        assert_eq!(s.status(), SessionStatus::Idle);
        assert_eq!(s.seconds_remaining(), 0);
        assert_eq!(ctl.stats().rejected_commands, 1);
        assert_eq!(ctl.stats().sessions_started, 0);
    }

    #[test]
    fn test_stop_idle_is_noop() {
        let ctl = controller();
        let before = ctl.get(SessionId(2)).unwrap();
        ctl.stop(SessionId(2)).unwrap();
        assert_eq!(ctl.get(SessionId(2)).unwrap(), before);
        assert_eq!(ctl.stats().sessions_stopped, 0);
    }

    #[test]
    fn test_set_result_rank_bounds() {
        let ctl = controller();
        let id = SessionId(1);
        ctl.set_result_rank(id, 10).unwrap();
        assert_eq!(ctl.get(id).unwrap().result_rank().get(), 10);
        assert!(ctl.set_result_rank(id, 11).is_err());
        assert!(ctl.set_result_rank(id, 0).is_err());
        assert_eq!(ctl.get(id).unwrap().result_rank().get(), 10);
    }

    #[test]
    fn test_set_proxy_blank_clears() {
        let ctl = controller();
        let id = SessionId(4);
        ctl.set_proxy(id, "10.0.0.1:8080:user:pass").unwrap();
        assert_eq!(ctl.get(id).unwrap().proxy(), Some("10.0.0.1:8080:user:pass"));
        ctl.set_proxy(id, "   ").unwrap();
        assert_eq!(ctl.get(id).unwrap().proxy(), None);
    }

    #[test]
    fn test_load_suggestion_requires_keyword() {
        let ctl = controller();
        let id = SessionId(3);
        assert!(matches!(
            ctl.load_suggestion(id, "  ", 1),
            Err(EngineError::Validation(_))
        ));
        assert!(ctl.get(id).unwrap().suggested_title().is_none());

        let s = ctl.load_suggestion(id, "lofi", 3).unwrap();
        let stored = ctl.get(id).unwrap();
        assert_eq!(stored.suggested_title(), Some(s.title.as_str()));
        assert_eq!(stored.suggested_thumbnail(), Some(s.thumbnail.as_str()));
        assert!(s.title.ends_with("(Rank 3)"));
    }

    #[test]
    fn test_commands_on_unknown_session_fail() {
        let ctl = controller();
        let ghost = SessionId(42);
        assert_eq!(ctl.start(ghost), Err(EngineError::NotFound(ghost)));
        assert_eq!(ctl.stop(ghost), Err(EngineError::NotFound(ghost)));
        assert!(ctl.regenerate_identity(ghost).is_err());
        assert!(ctl.load_suggestion(ghost, "lofi", 1).is_err());
        assert_eq!(ctl.snapshot().len(), 5);
    }

    #[test]
    fn test_start_outside_runtime_fails() {
        assert!(ViewingEngine::start(EngineConfig::default()).is_err());
    }
}
