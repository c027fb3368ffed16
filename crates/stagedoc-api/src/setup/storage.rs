//! Storage setup and initialization

use anyhow::{Context, Result};
use stagedoc_core::Config;
use stagedoc_storage::{DocumentStore, S3DocumentStore};
use std::sync::Arc;
use std::time::Duration;

/// Setup the object storage backend.
///
/// Returns `None` when no backend is configured; documents then serve from
/// external URLs or the local filesystem only.
pub async fn setup_storage(config: &Config) -> Result<Option<Arc<dyn DocumentStore>>> {
    let (Some(bucket), Some(region)) = (config.s3_bucket(), config.s3_region()) else {
        tracing::info!("Object storage not configured; object-storage tier disabled");
        return Ok(None);
    };

    let store = S3DocumentStore::new(
        bucket.to_string(),
        region.to_string(),
        config.s3_endpoint().map(String::from),
        config.s3_public_base_url().map(String::from),
        Duration::from_secs(config.upstream_connect_timeout_secs()),
        Duration::from_secs(config.upstream_transfer_timeout_secs()),
    )
    .await
    .context("Failed to initialize object storage")?;

    tracing::info!(bucket = %bucket, region = %region, "Object storage initialized");
    Ok(Some(Arc::new(store)))
}
