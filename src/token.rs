//! Token models: the redacted secret wrapper and the cached record snapshot.

pub mod record;
pub mod secret;

pub use record::*;
pub use secret::*;
