//! Application setup and initialization
//!
//! All startup logic lives here rather than in main.rs: validate config,
//! connect the database, probe the documents schema, initialize storage and
//! the HTTP client, and wire the router.

pub mod database;
pub mod routes;
pub mod server;
pub mod storage;
pub mod validation;

use crate::state::AppState;
use anyhow::{Context, Result};
use stagedoc_core::Config;
use stagedoc_db::{AccessRepository, DocumentRepository, DocumentSchema};
use std::sync::Arc;
use std::time::Duration;

/// Initialize the entire application
pub async fn initialize_app(config: Config) -> Result<(Arc<AppState>, axum::Router)> {
    // Validate configuration first - fail fast on misconfiguration
    validation::validate_config(&config).context("Configuration validation failed")?;

    crate::telemetry::init_tracing();
    tracing::info!("Configuration loaded and validated successfully");

    let pool = database::setup_database(&config).await?;

    // The documents table varies across deployments; probe once at startup
    // instead of per request.
    let schema = DocumentSchema::detect(&pool)
        .await
        .context("Failed to detect documents schema")?;

    let store = storage::setup_storage(&config).await?;

    let http = reqwest::Client::builder()
        .connect_timeout(Duration::from_secs(config.upstream_connect_timeout_secs()))
        .timeout(Duration::from_secs(config.upstream_transfer_timeout_secs()))
        .build()
        .context("Failed to build HTTP client")?;

    let state = Arc::new(AppState {
        access: AccessRepository::new(pool.clone(), schema),
        documents: DocumentRepository::new(pool.clone(), schema),
        pool,
        store,
        http,
        config: config.clone(),
    });

    let router = routes::setup_routes(&config, state.clone())?;

    Ok((state, router))
}
