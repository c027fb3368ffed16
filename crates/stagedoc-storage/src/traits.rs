//! Storage abstraction trait

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Signing failed: {0}")]
    SigningFailed(String),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Chunked byte stream from a storage backend.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, StorageError>> + Send>>;

/// Response headers a signed URL should make the backend emit on GET.
#[derive(Debug, Clone)]
pub struct ResponseOverrides {
    pub content_type: String,
    pub content_disposition: String,
}

/// An opened object download: size when the backend reported one, plus the
/// body stream.
pub struct ObjectDownload {
    pub size: Option<u64>,
    pub stream: ByteStream,
}

/// Object-storage backend for document delivery.
///
/// Implementations must be cheap to share across requests (`Arc<dyn
/// DocumentStore>`); no per-request state is held.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Generate a time-bounded signed GET URL for a key, asking the backend
    /// to respond with the given content type and disposition.
    async fn signed_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
        response: &ResponseOverrides,
    ) -> StorageResult<String>;

    /// Longer-lived public URL for a key, when the backend is configured to
    /// expose one. Used as a fallback when signing fails.
    fn public_url(&self, storage_key: &str) -> Option<String>;

    /// Open a native download stream for a key (the primary proxy transport).
    async fn download_stream(&self, storage_key: &str) -> StorageResult<ObjectDownload>;
}
