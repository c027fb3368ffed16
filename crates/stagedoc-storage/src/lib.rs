//! Stagedoc Storage Library
//!
//! Object-storage abstraction for the delivery pipeline. The
//! [`DocumentStore`] trait covers exactly what delivery needs: time-bounded
//! signed GET URLs with response-header overrides, an optional longer-lived
//! public URL per key, and a native byte stream as the primary proxy
//! transport. The S3 implementation works against AWS and S3-compatible
//! providers (MinIO, DigitalOcean Spaces). Local-file streaming helpers live
//! in the `local` module; local documents are addressed by absolute path, not
//! by key.

pub mod local;
pub mod s3;
pub mod traits;

pub use local::{open_local_file, LocalFile};
pub use s3::S3DocumentStore;
pub use traits::{
    ByteStream, DocumentStore, ObjectDownload, ResponseOverrides, StorageError, StorageResult,
};
