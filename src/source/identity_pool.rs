// Identity pool: fixed list of browser user-agent strings with random selection.

use std::sync::Arc;

use super::random::ThreadRandom;
use super::traits::RandomSource;
use crate::engine::error::{EngineError, EngineResult};

const DEFAULT_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1",
    "Mozilla/5.0 (iPad; CPU OS 17_1 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.1 Mobile/15E148 Safari/604.1",
];

pub struct IdentityPool {
    agents: Vec<String>,
    rng: Arc<dyn RandomSource>,
}

impl IdentityPool {
    /// Build a pool over `agents`. Empty or blank entries are rejected so a
    /// pick can never yield an empty user agent.
    pub fn new(agents: Vec<String>, rng: Arc<dyn RandomSource>) -> EngineResult<Self> {
        if agents.is_empty() {
            return Err(EngineError::InvalidConfig(
                "identity pool must not be empty".to_string(),
            ));
        }
        if agents.iter().any(|a| a.trim().is_empty()) {
            return Err(EngineError::InvalidConfig(
                "identity pool entries must be non-empty".to_string(),
            ));
        }
        Ok(Self { agents, rng })
    }

    /// Built-in desktop and mobile agents with the given random source.
    pub fn with_defaults(rng: Arc<dyn RandomSource>) -> Self {
        Self {
            agents: DEFAULT_USER_AGENTS.iter().map(|s| s.to_string()).collect(),
            rng,
        }
    }

    pub fn pick_random(&self) -> String {
        let idx = self.rng.next_index(self.agents.len());
        self.agents[idx].clone()
    }

    pub fn contains(&self, agent: &str) -> bool {
        self.agents.iter().any(|a| a == agent)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }
}

impl Default for IdentityPool {
    fn default() -> Self {
        Self::with_defaults(Arc::new(ThreadRandom))
    }
}
