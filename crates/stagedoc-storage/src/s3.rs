use crate::traits::{DocumentStore, ObjectDownload, ResponseOverrides, StorageError, StorageResult};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::timeout::TimeoutConfig;
use aws_config::BehaviorVersion;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::Client;
use futures::StreamExt;
use std::time::Duration;
use tokio_util::io::ReaderStream;

/// S3 document store
///
/// Works against AWS and S3-compatible providers. Signed URLs carry
/// response-content-type / response-content-disposition overrides so a
/// redirected caller still receives the delivery headers the resolver
/// decided on.
#[derive(Clone)]
pub struct S3DocumentStore {
    client: Client,
    bucket: String,
    public_base_url: Option<String>,
}

impl S3DocumentStore {
    /// Create a new S3DocumentStore instance
    ///
    /// # Arguments
    /// * `bucket` - S3 bucket name
    /// * `region` - AWS region (or region identifier for S3-compatible providers)
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    /// * `public_base_url` - Optional base URL under which objects are publicly
    ///   readable; enables the public-URL fallback when signing fails
    /// * `connect_timeout` / `transfer_timeout` - bounds on backend calls
    pub async fn new(
        bucket: String,
        region: String,
        endpoint_url: Option<String>,
        public_base_url: Option<String>,
        connect_timeout: Duration,
        transfer_timeout: Duration,
    ) -> StorageResult<Self> {
        let region_provider = RegionProviderChain::first_try(aws_config::Region::new(region));

        let timeout_config = TimeoutConfig::builder()
            .connect_timeout(connect_timeout)
            .operation_timeout(transfer_timeout)
            .build();

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .timeout_config(timeout_config)
            .load()
            .await;

        // S3-compatible providers need a custom endpoint and path-style addressing
        let client = if let Some(ref endpoint) = endpoint_url {
            let s3_config = aws_sdk_s3::config::Builder::from(&config)
                .endpoint_url(endpoint)
                .force_path_style(true)
                .build();
            Client::from_conf(s3_config)
        } else {
            Client::new(&config)
        };

        Ok(S3DocumentStore {
            client,
            bucket,
            public_base_url,
        })
    }
}

#[async_trait]
impl DocumentStore for S3DocumentStore {
    async fn signed_url(
        &self,
        storage_key: &str,
        expires_in: Duration,
        response: &ResponseOverrides,
    ) -> StorageResult<String> {
        let presigning_config = aws_sdk_s3::presigning::PresigningConfig::builder()
            .expires_in(expires_in)
            .build()
            .map_err(|e| StorageError::SigningFailed(e.to_string()))?;

        let presigned_request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(storage_key)
            .response_content_type(&response.content_type)
            .response_content_disposition(&response.content_disposition)
            .presigned(presigning_config)
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %e,
                    bucket = %self.bucket,
                    key = %storage_key,
                    "S3 presigning failed"
                );
                StorageError::SigningFailed(e.to_string())
            })?;

        Ok(presigned_request.uri().to_string())
    }

    fn public_url(&self, storage_key: &str) -> Option<String> {
        self.public_base_url
            .as_deref()
            .map(|base| format!("{}/{}", base.trim_end_matches('/'), storage_key))
    }

    async fn download_stream(&self, storage_key: &str) -> StorageResult<ObjectDownload> {
        let start = std::time::Instant::now();

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(storage_key)
            .send()
            .await
            .map_err(|e| match &e {
                SdkError::ServiceError(service_err) => match service_err.err() {
                    GetObjectError::NoSuchKey(_) => StorageError::NotFound(storage_key.to_string()),
                    _ => StorageError::DownloadFailed(e.to_string()),
                },
                _ => StorageError::DownloadFailed(e.to_string()),
            })?;

        let size = response.content_length().and_then(|len| u64::try_from(len).ok());

        // ByteStream -> Stream<Item = Result<Bytes, StorageError>> via AsyncRead + ReaderStream
        let async_read = response.body.into_async_read();
        let stream = ReaderStream::new(async_read)
            .map(|result| result.map_err(|e| StorageError::DownloadFailed(e.to_string())));

        let bucket = self.bucket.clone();
        let key = storage_key.to_string();
        let logged_stream = stream.map(move |item| {
            if item.is_err() {
                tracing::error!(
                    bucket = %bucket,
                    key = %key,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 stream download error"
                );
            }
            item
        });

        Ok(ObjectDownload {
            size,
            stream: Box::pin(logged_stream),
        })
    }
}
