//! Infrastructure layer - External service integrations
//!
//! This layer contains:
//! - Contract bindings and the Alloy-backed connection context
//! - Session setup (signer resolution, gateway binding)
//! - Tokio runtime bridge for the terminal UI

pub mod ethereum;
pub mod runtime;
pub mod session;

pub use session::open_gateway;
