//! Stagedoc API Library
//!
//! HTTP surface of the document delivery service: the serve handler, the
//! delivery engine with its tier-fallback chain, session extraction, security
//! headers, and application setup.

mod delivery;
mod handlers;
mod middleware;
mod telemetry;

// Public modules
pub mod auth;
pub mod error;
pub mod setup;
pub mod state;

// Re-exports
pub use error::{ErrorBody, HttpAppError};
pub use state::AppState;
