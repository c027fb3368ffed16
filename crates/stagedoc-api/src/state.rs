//! Shared application state.

use sqlx::PgPool;
use stagedoc_core::Config;
use stagedoc_db::{AccessRepository, DocumentRepository};
use stagedoc_storage::DocumentStore;
use std::sync::Arc;

/// State threaded through every handler. Cheap to clone: pools, clients and
/// repositories are all handle types.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub access: AccessRepository,
    pub documents: DocumentRepository,
    /// Absent when no object storage backend is configured; documents behind
    /// a storage key then fall through to the local tier.
    pub store: Option<Arc<dyn DocumentStore>>,
    /// Alternate transport for object downloads when the native stream
    /// cannot be opened.
    pub http: reqwest::Client,
    pub config: Config,
}
