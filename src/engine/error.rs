// Error taxonomy for session commands: every failure is local and leaves state unchanged.

use thiserror::Error;

use super::session::{SessionId, SessionStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    /// A command was given input it cannot accept (missing keyword, rank out of range, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("session not found: {0}")]
    NotFound(SessionId),

    /// The command is not allowed from the session's current status.
    #[error("cannot {action} session {id} while {status}")]
    InvalidTransition {
        id: SessionId,
        status: SessionStatus,
        action: &'static str,
    },

    #[error("invalid engine config: {0}")]
    InvalidConfig(String),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
