//! Configuration module
//!
//! Environment-driven configuration for the delivery service. Loaded once at
//! startup via [`Config::from_env`] and validated before anything else runs.

use std::env;

// Defaults
const DEFAULT_SERVER_PORT: u16 = 3000;
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const SIGNED_URL_TTL_SECS: u64 = 600;
const UPSTREAM_CONNECT_TIMEOUT_SECS: u64 = 15;
const UPSTREAM_TRANSFER_TIMEOUT_SECS: u64 = 120;

/// Service configuration
#[derive(Clone, Debug)]
pub struct Config {
    server_port: u16,
    cors_origins: Vec<String>,
    environment: String,
    database_url: String,
    db_max_connections: u32,
    db_timeout_seconds: u64,
    // Object storage (optional; documents may also live behind external URLs
    // or on the local filesystem)
    s3_bucket: Option<String>,
    s3_region: Option<String>,
    s3_endpoint: Option<String>,
    s3_public_base_url: Option<String>,
    signed_url_ttl_secs: u64,
    // Streaming proxy bounds
    upstream_connect_timeout_secs: u64,
    upstream_transfer_timeout_secs: u64,
    // External origins allowed to serve viewer assets (CSP allow-list)
    allowed_asset_origins: Vec<String>,
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    env_opt(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_list(key: &str) -> Vec<String> {
    env_opt(key)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `DATABASE_URL` is required; everything else has a default or is
    /// optional. Cross-field checks (e.g. partially configured S3) are done
    /// in the api crate's startup validation, not here.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env_opt("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))?;

        Ok(Config {
            server_port: env_parse("SERVER_PORT", DEFAULT_SERVER_PORT),
            cors_origins: env_list("CORS_ORIGINS"),
            environment: env_opt("ENVIRONMENT").unwrap_or_else(|| "development".to_string()),
            database_url,
            db_max_connections: env_parse("DB_MAX_CONNECTIONS", MAX_CONNECTIONS),
            db_timeout_seconds: env_parse("DB_TIMEOUT_SECONDS", CONNECTION_TIMEOUT_SECS),
            s3_bucket: env_opt("S3_BUCKET"),
            s3_region: env_opt("S3_REGION").or_else(|| env_opt("AWS_REGION")),
            s3_endpoint: env_opt("S3_ENDPOINT"),
            s3_public_base_url: env_opt("S3_PUBLIC_BASE_URL"),
            signed_url_ttl_secs: env_parse("SIGNED_URL_TTL_SECS", SIGNED_URL_TTL_SECS),
            upstream_connect_timeout_secs: env_parse(
                "UPSTREAM_CONNECT_TIMEOUT_SECS",
                UPSTREAM_CONNECT_TIMEOUT_SECS,
            ),
            upstream_transfer_timeout_secs: env_parse(
                "UPSTREAM_TRANSFER_TIMEOUT_SECS",
                UPSTREAM_TRANSFER_TIMEOUT_SECS,
            ),
            allowed_asset_origins: env_list("ALLOWED_ASSET_ORIGINS"),
        })
    }

    pub fn server_port(&self) -> u16 {
        self.server_port
    }

    pub fn cors_origins(&self) -> &[String] {
        &self.cors_origins
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn is_production(&self) -> bool {
        matches!(self.environment.to_lowercase().as_str(), "production" | "prod")
    }

    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    pub fn db_max_connections(&self) -> u32 {
        self.db_max_connections
    }

    pub fn db_timeout_seconds(&self) -> u64 {
        self.db_timeout_seconds
    }

    pub fn s3_bucket(&self) -> Option<&str> {
        self.s3_bucket.as_deref()
    }

    pub fn s3_region(&self) -> Option<&str> {
        self.s3_region.as_deref()
    }

    pub fn s3_endpoint(&self) -> Option<&str> {
        self.s3_endpoint.as_deref()
    }

    pub fn s3_public_base_url(&self) -> Option<&str> {
        self.s3_public_base_url.as_deref()
    }

    pub fn signed_url_ttl_secs(&self) -> u64 {
        self.signed_url_ttl_secs
    }

    pub fn upstream_connect_timeout_secs(&self) -> u64 {
        self.upstream_connect_timeout_secs
    }

    pub fn upstream_transfer_timeout_secs(&self) -> u64 {
        self.upstream_transfer_timeout_secs
    }

    pub fn allowed_asset_origins(&self) -> &[String] {
        &self.allowed_asset_origins
    }

    /// Construct a configuration directly (used by tests and embedding code).
    pub fn for_tests(database_url: String) -> Self {
        Config {
            server_port: 0,
            cors_origins: Vec::new(),
            environment: "test".to_string(),
            database_url,
            db_max_connections: 2,
            db_timeout_seconds: 5,
            s3_bucket: None,
            s3_region: None,
            s3_endpoint: None,
            s3_public_base_url: None,
            signed_url_ttl_secs: SIGNED_URL_TTL_SECS,
            upstream_connect_timeout_secs: 1,
            upstream_transfer_timeout_secs: 5,
            allowed_asset_origins: Vec::new(),
        }
    }
}
