//! Stagedoc Core Library
//!
//! Shared types for the document delivery service: configuration, the error
//! taxonomy, domain models (document records, callers, fetch plans), the
//! media gate, and filename sanitization.

pub mod config;
pub mod error;
pub mod media;
pub mod models;
pub mod validation;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, ErrorMetadata, LogLevel};
