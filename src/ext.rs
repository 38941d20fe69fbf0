//! Public extension contracts for consumers that stamp outgoing requests with the cached token.
//!
//! Request-sending components depend on [`BearerTokenProvider`] rather than on a concrete cache,
//! and on [`RequestSignerExt`] rather than on a concrete HTTP client. With the `reqwest` feature,
//! [`BearerSigner`] attaches `Authorization: Bearer <token>` to reqwest request builders.

pub mod bearer;
pub mod request_signer;

pub use bearer::*;
pub use request_signer::*;
