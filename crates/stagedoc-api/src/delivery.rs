//! Storage resolution and delivery execution.
//!
//! The resolver turns an authorized, gated document record into a
//! [`FetchPlan`] (tier precedence: external URL, then object storage, then
//! local file). The executor runs the plan as an explicit ordered fallback
//! chain: native backend stream, then an HTTP GET on the signed URL, then a
//! redirect to it. Open-failures degrade; a failure after the first body
//! byte terminates the connection (the client sees a truncated chunked
//! response) and is logged server-side.

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::Response;
use futures::StreamExt;
use std::path::Path;
use std::time::Duration;
use stagedoc_core::media;
use stagedoc_core::models::{
    Delivery, Disposition, DocumentRecord, FetchPlan, FetchSource, StorageTier,
};
use stagedoc_core::validation::sanitize_filename;
use stagedoc_core::AppError;
use stagedoc_storage::{open_local_file, DocumentStore, ResponseOverrides};

/// Caller-controlled delivery options, parsed from the query string.
#[derive(Debug, Clone, Default)]
pub struct ServeOptions {
    pub filename_override: Option<String>,
    /// `dl=1`: force attachment disposition and redirect-only delivery.
    pub force_download: bool,
    /// `redir=1`: force redirect instead of streaming, keeping inline view.
    pub force_redirect: bool,
}

fn build_delivery(record: &DocumentRecord, opts: &ServeOptions) -> Delivery {
    let name = opts
        .filename_override
        .as_deref()
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| record.display_name());

    Delivery {
        content_type: media::serve_media_type(record).to_string(),
        filename: sanitize_filename(name),
        disposition: if opts.force_download {
            Disposition::Attachment
        } else {
            Disposition::Inline
        },
    }
}

/// Resolve which backend serves this document and how.
///
/// First match wins: external URL, object storage, local file. Signing
/// failures degrade to the backend's public URL when configured, otherwise
/// to the local tier, otherwise `file_not_found`.
pub async fn resolve_plan(
    record: &DocumentRecord,
    opts: &ServeOptions,
    store: Option<&dyn DocumentStore>,
    signed_url_ttl: Duration,
) -> Result<FetchPlan, AppError> {
    let delivery = build_delivery(record, opts);

    match record.tier() {
        Some((StorageTier::DirectUrl, url)) => Ok(FetchPlan {
            source: FetchSource::Redirect {
                url: url.to_string(),
            },
            delivery,
        }),
        Some((StorageTier::ObjectStorage, key)) => {
            object_storage_plan(record, key, delivery, opts, store, signed_url_ttl).await
        }
        Some((StorageTier::LocalFile, _)) | None => local_tier_plan(record, delivery).await,
    }
}

async fn object_storage_plan(
    record: &DocumentRecord,
    key: &str,
    delivery: Delivery,
    opts: &ServeOptions,
    store: Option<&dyn DocumentStore>,
    signed_url_ttl: Duration,
) -> Result<FetchPlan, AppError> {
    let redirect_only = opts.force_download || opts.force_redirect;

    let Some(store) = store else {
        tracing::error!(
            document_id = record.id,
            key = %key,
            "Document has a storage key but no object storage is configured; trying local tier"
        );
        return local_tier_plan(record, delivery).await;
    };

    let overrides = ResponseOverrides {
        content_type: delivery.content_type.clone(),
        content_disposition: delivery.content_disposition(),
    };

    match store.signed_url(key, signed_url_ttl, &overrides).await {
        Ok(signed_url) => Ok(FetchPlan {
            source: FetchSource::ObjectStorage {
                key: key.to_string(),
                signed_url,
                redirect_only,
            },
            delivery,
        }),
        Err(e) => {
            tracing::warn!(
                document_id = record.id,
                key = %key,
                error = %e,
                "Signing failed; trying public URL fallback"
            );
            if let Some(public_url) = store.public_url(key) {
                Ok(FetchPlan {
                    source: FetchSource::ObjectStorage {
                        key: key.to_string(),
                        signed_url: public_url,
                        redirect_only,
                    },
                    delivery,
                })
            } else {
                tracing::error!(
                    document_id = record.id,
                    key = %key,
                    "No public URL configured; trying local tier"
                );
                local_tier_plan(record, delivery).await
            }
        }
    }
}

/// Lowest tier: a recorded local path whose file exists. Size comes from
/// stored metadata when present, otherwise from the file itself.
async fn local_tier_plan(record: &DocumentRecord, delivery: Delivery) -> Result<FetchPlan, AppError> {
    let Some(path) = record.local_path() else {
        return Err(AppError::NotFound("file_not_found".to_string()));
    };
    let path = Path::new(path);

    match tokio::fs::metadata(path).await {
        Ok(metadata) if metadata.is_file() => {
            let size = record
                .file_size
                .and_then(|s| u64::try_from(s).ok())
                .unwrap_or_else(|| metadata.len());
            Ok(FetchPlan {
                source: FetchSource::LocalFile {
                    path: path.to_path_buf(),
                    size,
                },
                delivery,
            })
        }
        _ => {
            tracing::warn!(
                document_id = record.id,
                path = %path.display(),
                "Recorded local path does not resolve to a file"
            );
            Err(AppError::NotFound("file_not_found".to_string()))
        }
    }
}

/// Execute a fetch plan, degrading through transports rather than aborting.
pub async fn execute_plan(
    plan: FetchPlan,
    http: &reqwest::Client,
    store: Option<&dyn DocumentStore>,
) -> Result<Response, AppError> {
    let FetchPlan { source, delivery } = plan;

    match source {
        FetchSource::Redirect { url } => redirect_response(&url),

        FetchSource::ObjectStorage {
            key,
            signed_url,
            redirect_only,
        } => {
            if redirect_only {
                return redirect_response(&signed_url);
            }
            stream_object(&key, &signed_url, &delivery, http, store).await
        }

        FetchSource::LocalFile { path, size } => {
            let local = open_local_file(&path)
                .await
                .map_err(|_| AppError::NotFound("file_not_found".to_string()))?;
            let body = Body::from_stream(into_io_stream(local.stream));
            streaming_response(&delivery, Some(size), body)
        }
    }
}

/// Object-storage streaming with per-transport fallback: native backend
/// stream, then HTTP GET on the signed URL, then a redirect to it. No bytes
/// have been written to the caller before a fallback fires; once a response
/// body is handed to the server, mid-flight errors just end the connection.
async fn stream_object(
    key: &str,
    signed_url: &str,
    delivery: &Delivery,
    http: &reqwest::Client,
    store: Option<&dyn DocumentStore>,
) -> Result<Response, AppError> {
    if let Some(store) = store {
        match store.download_stream(key).await {
            Ok(download) => {
                let body = Body::from_stream(into_io_stream(download.stream));
                return streaming_response(delivery, download.size, body);
            }
            Err(e) => {
                tracing::warn!(
                    key = %key,
                    error = %e,
                    "Primary storage stream failed to open; falling back to HTTP transport"
                );
            }
        }
    }

    match http.get(signed_url).send().await {
        Ok(response) if response.status().is_success() => {
            let size = response.content_length();
            let stream = response
                .bytes_stream()
                .map(|result| result.map_err(std::io::Error::other));
            streaming_response(delivery, size, Body::from_stream(stream))
        }
        Ok(response) => {
            tracing::warn!(
                key = %key,
                status = %response.status(),
                "HTTP transport returned an error status; falling back to redirect"
            );
            redirect_response(signed_url)
        }
        Err(e) => {
            tracing::warn!(
                key = %key,
                error = %e,
                "HTTP transport failed to open; falling back to redirect"
            );
            redirect_response(signed_url)
        }
    }
}

fn into_io_stream(
    stream: stagedoc_storage::ByteStream,
) -> impl futures::Stream<Item = Result<bytes::Bytes, std::io::Error>> {
    stream.map(|result| {
        result.map_err(|e| std::io::Error::other(format!("Storage stream error: {}", e)))
    })
}

fn redirect_response(url: &str) -> Result<Response, AppError> {
    Response::builder()
        .status(StatusCode::FOUND)
        .header(header::LOCATION, url)
        .body(Body::empty())
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}

/// Build a streaming response. All headers are set before the body stream is
/// first polled, including the no-sniff and private-cache directives.
fn streaming_response(
    delivery: &Delivery,
    size: Option<u64>,
    body: Body,
) -> Result<Response, AppError> {
    let mut builder = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, delivery.content_type.as_str())
        .header(header::CONTENT_DISPOSITION, delivery.content_disposition())
        .header(header::CACHE_CONTROL, "private, max-age=600")
        .header(header::X_CONTENT_TYPE_OPTIONS, "nosniff");

    if let Some(size) = size {
        builder = builder.header(header::CONTENT_LENGTH, size);
    }

    builder
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use stagedoc_storage::{ObjectDownload, StorageError, StorageResult};

    const SIGNED_URL: &str = "http://127.0.0.1:1/signed/k7";

    /// Store whose signing works but whose native stream never opens.
    struct BrokenStreamStore {
        public_base: Option<String>,
    }

    #[async_trait]
    impl DocumentStore for BrokenStreamStore {
        async fn signed_url(
            &self,
            _storage_key: &str,
            _expires_in: Duration,
            _response: &ResponseOverrides,
        ) -> StorageResult<String> {
            Ok(SIGNED_URL.to_string())
        }

        fn public_url(&self, storage_key: &str) -> Option<String> {
            self.public_base
                .as_deref()
                .map(|base| format!("{}/{}", base, storage_key))
        }

        async fn download_stream(&self, storage_key: &str) -> StorageResult<ObjectDownload> {
            Err(StorageError::DownloadFailed(format!(
                "refused: {}",
                storage_key
            )))
        }
    }

    /// Store that cannot sign at all (backend unreachable / misconfigured).
    struct SigningFailsStore {
        public_base: Option<String>,
    }

    #[async_trait]
    impl DocumentStore for SigningFailsStore {
        async fn signed_url(
            &self,
            _storage_key: &str,
            _expires_in: Duration,
            _response: &ResponseOverrides,
        ) -> StorageResult<String> {
            Err(StorageError::SigningFailed("no credentials".to_string()))
        }

        fn public_url(&self, storage_key: &str) -> Option<String> {
            self.public_base
                .as_deref()
                .map(|base| format!("{}/{}", base, storage_key))
        }

        async fn download_stream(&self, _storage_key: &str) -> StorageResult<ObjectDownload> {
            Err(StorageError::DownloadFailed("unreachable".to_string()))
        }
    }

    fn record() -> DocumentRecord {
        DocumentRecord {
            id: 42,
            title: "doc42.pdf".to_string(),
            original_name: None,
            media_type: Some("application/pdf".to_string()),
            file_size: None,
            owner_id: Some(10),
            external_url: None,
            storage_key: None,
            local_path: None,
        }
    }

    const TTL: Duration = Duration::from_secs(600);

    #[tokio::test]
    async fn test_external_url_wins_over_other_locators() {
        let mut r = record();
        r.external_url = Some("https://cdn.example/doc.pdf".to_string());
        r.storage_key = Some("k7".to_string());
        r.local_path = Some("/data/doc42.pdf".to_string());

        let store = BrokenStreamStore { public_base: None };
        let plan = resolve_plan(&r, &ServeOptions::default(), Some(&store), TTL)
            .await
            .unwrap();
        assert_eq!(
            plan.source,
            FetchSource::Redirect {
                url: "https://cdn.example/doc.pdf".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_download_flag_forces_attachment_and_redirect() {
        let mut r = record();
        r.storage_key = Some("k7".to_string());

        let store = BrokenStreamStore { public_base: None };
        let opts = ServeOptions {
            force_download: true,
            ..Default::default()
        };
        let plan = resolve_plan(&r, &opts, Some(&store), TTL).await.unwrap();

        assert_eq!(plan.delivery.disposition, Disposition::Attachment);
        match plan.source {
            FetchSource::ObjectStorage { redirect_only, .. } => assert!(redirect_only),
            other => panic!("expected object storage source, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_inline_streaming_is_the_default() {
        let mut r = record();
        r.storage_key = Some("k7".to_string());

        let store = BrokenStreamStore { public_base: None };
        let plan = resolve_plan(&r, &ServeOptions::default(), Some(&store), TTL)
            .await
            .unwrap();

        assert_eq!(plan.delivery.disposition, Disposition::Inline);
        match plan.source {
            FetchSource::ObjectStorage {
                redirect_only,
                signed_url,
                ..
            } => {
                assert!(!redirect_only);
                assert_eq!(signed_url, SIGNED_URL);
            }
            other => panic!("expected object storage source, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_signing_failure_falls_back_to_public_url() {
        let mut r = record();
        r.storage_key = Some("k7".to_string());

        let store = SigningFailsStore {
            public_base: Some("https://bucket.example".to_string()),
        };
        let plan = resolve_plan(&r, &ServeOptions::default(), Some(&store), TTL)
            .await
            .unwrap();

        match plan.source {
            FetchSource::ObjectStorage { signed_url, .. } => {
                assert_eq!(signed_url, "https://bucket.example/k7");
            }
            other => panic!("expected object storage source, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_signing_failure_without_public_url_uses_local_tier() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc42.pdf");
        tokio::fs::write(&path, b"%PDF-1.7").await.unwrap();

        let mut r = record();
        r.storage_key = Some("k7".to_string());
        r.local_path = Some(path.display().to_string());

        let store = SigningFailsStore { public_base: None };
        let plan = resolve_plan(&r, &ServeOptions::default(), Some(&store), TTL)
            .await
            .unwrap();

        match plan.source {
            FetchSource::LocalFile { size, .. } => assert_eq!(size, 8),
            other => panic!("expected local file source, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_no_locator_is_file_not_found() {
        let r = record();
        let err = resolve_plan(&r, &ServeOptions::default(), None, TTL)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_missing_local_file_is_file_not_found() {
        let mut r = record();
        r.local_path = Some("/nonexistent/doc42.pdf".to_string());
        let err = resolve_plan(&r, &ServeOptions::default(), None, TTL)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_stream_open_failure_degrades_to_redirect() {
        // Primary stream fails, alternate transport targets an unreachable
        // port, so delivery must degrade to a 302 to the signed URL with no
        // body bytes sent.
        let store = BrokenStreamStore { public_base: None };
        let plan = FetchPlan {
            source: FetchSource::ObjectStorage {
                key: "k5".to_string(),
                signed_url: SIGNED_URL.to_string(),
                redirect_only: false,
            },
            delivery: Delivery {
                content_type: "application/pdf".to_string(),
                filename: "doc5.pdf".to_string(),
                disposition: Disposition::Inline,
            },
        };

        let http = reqwest::Client::new();
        let response = execute_plan(plan, &http, Some(&store)).await.unwrap();

        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(
            response.headers().get(header::LOCATION).unwrap(),
            SIGNED_URL
        );
        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_http_transport_proxies_body_and_length() {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        // Primary stream fails, so delivery must proxy through the alternate
        // HTTP transport: a canned upstream serving the signed URL.
        let payload = b"%PDF-1.7 alternate transport bytes";
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = [0u8; 1024];
            let _ = socket.read(&mut request).await;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/pdf\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                payload.len()
            );
            socket.write_all(head.as_bytes()).await.unwrap();
            socket.write_all(payload).await.unwrap();
        });

        let store = BrokenStreamStore { public_base: None };
        let plan = FetchPlan {
            source: FetchSource::ObjectStorage {
                key: "k9".to_string(),
                signed_url: format!("http://{}/signed/k9", addr),
                redirect_only: false,
            },
            delivery: Delivery {
                content_type: "application/pdf".to_string(),
                filename: "doc9.pdf".to_string(),
                disposition: Disposition::Inline,
            },
        };

        let http = reqwest::Client::new();
        let response = execute_plan(plan, &http, Some(&store)).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers().clone();
        assert_eq!(
            headers.get(header::CONTENT_LENGTH).unwrap(),
            &payload.len().to_string()
        );
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/pdf");
        assert_eq!(
            headers.get(header::CACHE_CONTROL).unwrap(),
            "private, max-age=600"
        );

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(body.as_ref(), payload.as_slice());
    }

    #[tokio::test]
    async fn test_redirect_only_plan_never_streams() {
        let store = BrokenStreamStore { public_base: None };
        let plan = FetchPlan {
            source: FetchSource::ObjectStorage {
                key: "k7".to_string(),
                signed_url: SIGNED_URL.to_string(),
                redirect_only: true,
            },
            delivery: Delivery {
                content_type: "application/pdf".to_string(),
                filename: "doc7.pdf".to_string(),
                disposition: Disposition::Attachment,
            },
        };

        let http = reqwest::Client::new();
        let response = execute_plan(plan, &http, Some(&store)).await.unwrap();
        assert_eq!(response.status(), StatusCode::FOUND);
    }

    #[tokio::test]
    async fn test_local_file_delivery_headers_and_body() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc42.pdf");
        let data = b"%PDF-1.7 local bytes".to_vec();
        tokio::fs::write(&path, &data).await.unwrap();

        let plan = FetchPlan {
            source: FetchSource::LocalFile {
                path: path.clone(),
                size: data.len() as u64,
            },
            delivery: Delivery {
                content_type: "application/pdf".to_string(),
                filename: "doc42.pdf".to_string(),
                disposition: Disposition::Inline,
            },
        };

        let http = reqwest::Client::new();
        let response = execute_plan(plan, &http, None).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers().clone();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/pdf");
        assert_eq!(
            headers.get(header::CONTENT_DISPOSITION).unwrap(),
            "inline; filename=\"doc42.pdf\""
        );
        assert_eq!(
            headers.get(header::CACHE_CONTROL).unwrap(),
            "private, max-age=600"
        );
        assert_eq!(
            headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(),
            "nosniff"
        );
        assert_eq!(
            headers.get(header::CONTENT_LENGTH).unwrap(),
            &data.len().to_string()
        );

        let body = axum::body::to_bytes(response.into_body(), 1024).await.unwrap();
        assert_eq!(body.as_ref(), data.as_slice());
    }

    #[tokio::test]
    async fn test_filename_override_is_sanitized() {
        let r = record();
        let opts = ServeOptions {
            filename_override: Some("../evil\"name.pdf".to_string()),
            ..Default::default()
        };
        let delivery = build_delivery(&r, &opts);
        assert_eq!(delivery.filename, ".._evil_name.pdf");
    }
}
