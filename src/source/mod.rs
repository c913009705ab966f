// Pluggable collaborators: identity and suggestion providers plus injectable randomness.

pub mod identity_pool;
pub mod random;
pub mod suggestions;
pub mod traits;
