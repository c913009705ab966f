pub mod api;
pub mod config;
pub mod engine;
pub mod source;

pub use config::EngineConfig;
pub use engine::controller::{SessionController, ViewingEngine};
pub use engine::error::{EngineError, EngineResult};
pub use engine::registry::{SessionEvent, SessionRegistry, TickReport};
pub use engine::session::{
    DurationMinutes, InputMode, Resolution, ResultRank, Session, SessionId, SessionStatus,
    SessionUpdate,
};
