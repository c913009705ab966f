// Engine orchestration: session state machines, their registry, and the shared clock.

pub mod clock;
pub mod controller;
pub mod error;
pub mod registry;
pub mod session;
pub mod stats;
