//! Configuration validation
//!
//! Validates critical configuration values at startup to catch
//! misconfigurations early, before the first request can hit them.

use anyhow::Result;
use stagedoc_core::Config;

/// Validate critical configuration values
pub fn validate_config(config: &Config) -> Result<()> {
    let is_production = config.is_production();

    // Validate CORS configuration in production
    if is_production && config.cors_origins().contains(&"*".to_string()) {
        return Err(anyhow::anyhow!(
            "CORS configured to allow all origins (*) in production - this is a security risk. \
            Please set specific allowed origins via CORS_ORIGINS environment variable."
        ));
    }

    // Validate database connection settings
    if config.db_max_connections() == 0 {
        return Err(anyhow::anyhow!("Database max connections cannot be 0"));
    }
    if config.db_timeout_seconds() == 0 {
        return Err(anyhow::anyhow!("Database timeout cannot be 0"));
    }

    validate_object_storage(config.s3_bucket(), config.s3_region())?;

    if config.signed_url_ttl_secs() == 0 {
        return Err(anyhow::anyhow!("Signed URL TTL cannot be 0"));
    }
    if config.upstream_connect_timeout_secs() == 0 || config.upstream_transfer_timeout_secs() == 0 {
        return Err(anyhow::anyhow!("Upstream timeouts cannot be 0"));
    }

    validate_asset_origins(config.allowed_asset_origins())?;

    tracing::info!("Configuration validation passed");
    Ok(())
}

/// Object storage is optional, but half a configuration is always a mistake.
fn validate_object_storage(bucket: Option<&str>, region: Option<&str>) -> Result<()> {
    match (bucket, region) {
        (Some(_), None) => Err(anyhow::anyhow!(
            "S3_BUCKET is set but S3_REGION/AWS_REGION is not - both are required for object storage"
        )),
        (None, Some(_)) => Err(anyhow::anyhow!(
            "S3_REGION is set but S3_BUCKET is not - both are required for object storage"
        )),
        _ => Ok(()),
    }
}

/// Asset origins end up inside the Content-Security-Policy header; require
/// explicit schemes so a bare hostname cannot silently widen the policy.
fn validate_asset_origins(origins: &[String]) -> Result<()> {
    for origin in origins {
        if !origin.starts_with("https://") && !origin.starts_with("http://") {
            return Err(anyhow::anyhow!(
                "Allowed asset origin {:?} must include an http:// or https:// scheme",
                origin
            ));
        }
    }
    Ok(())
}
