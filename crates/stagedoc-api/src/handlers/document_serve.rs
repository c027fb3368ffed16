//! Document serve handler.
//!
//! Single GET endpoint running the full pipeline in order: identify the
//! caller, authorize against the resolved owner chain, locate the record,
//! gate on media type, resolve the storage tier, execute delivery. Each stage
//! short-circuits with its own status so that, for example, an unauthorized
//! caller never learns whether the backing file exists.

use axum::extract::{ConnectInfo, Query, State};
use axum::http::Uri;
use axum::response::Response;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use stagedoc_core::media;
use stagedoc_core::models::authorize;
use stagedoc_core::{AppError, ErrorMetadata};

use crate::auth::SessionCaller;
use crate::delivery::{self, ServeOptions};
use crate::error::HttpAppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ServeQuery {
    /// Document identifier; parsed manually so a bad value yields our own 400.
    pub id: Option<String>,
    /// Suggested download filename (sanitized before use).
    #[serde(rename = "fn")]
    pub filename: Option<String>,
    /// `dl=1` forces attachment disposition and redirect-only delivery.
    pub dl: Option<String>,
    /// Accepted for URL compatibility; inline viewing is already the default.
    pub view: Option<String>,
    /// `redir=1` redirects to the signed URL instead of streaming.
    pub redir: Option<String>,
}

fn flag(value: &Option<String>) -> bool {
    value.as_deref().map(str::trim) == Some("1")
}

#[tracing::instrument(
    skip_all,
    fields(document_id = tracing::field::Empty, caller_id = caller.0.user_id)
)]
pub async fn serve_document(
    State(state): State<Arc<AppState>>,
    caller: SessionCaller,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    uri: Uri,
    Query(query): Query<ServeQuery>,
) -> Result<Response, HttpAppError> {
    let SessionCaller(caller) = caller;

    let document_id = query
        .id
        .as_deref()
        .and_then(|v| v.trim().parse::<i64>().ok())
        .filter(|id| *id > 0)
        .ok_or_else(|| AppError::BadRequest("missing or invalid document id".to_string()))?;
    tracing::Span::current().record("document_id", document_id);

    // Authorization first, against the owner chain alone. The document row
    // itself is not consulted until access is granted.
    let owners = state.access.resolve_owners(document_id).await?;
    let basis = match authorize(&caller, owners.as_ref()) {
        Ok(basis) => basis,
        Err(denial) => {
            tracing::warn!(
                document_id,
                caller_id = caller.user_id,
                remote_addr = %remote,
                path = %uri,
                reason = denial.error_code(),
                "Document access denied"
            );
            return Err(denial.into());
        }
    };

    let record = state
        .documents
        .get(document_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("document {}", document_id)))?;

    media::ensure_pdf(&record)?;

    if query.view.is_some() {
        tracing::debug!(document_id, "view parameter present (inline is the default)");
    }

    let opts = ServeOptions {
        filename_override: query.filename.clone(),
        force_download: flag(&query.dl),
        force_redirect: flag(&query.redir),
    };

    let plan = delivery::resolve_plan(
        &record,
        &opts,
        state.store.as_deref(),
        Duration::from_secs(state.config.signed_url_ttl_secs()),
    )
    .await?;

    tracing::info!(
        document_id,
        caller_id = caller.user_id,
        basis = basis.as_str(),
        "Serving document"
    );

    Ok(delivery::execute_plan(plan, &state.http, state.store.as_deref()).await?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_only_accepts_one() {
        assert!(flag(&Some("1".to_string())));
        assert!(flag(&Some(" 1 ".to_string())));
        assert!(!flag(&Some("true".to_string())));
        assert!(!flag(&Some("0".to_string())));
        assert!(!flag(&None));
    }

    #[test]
    fn test_query_deserializes_fn_alias() {
        let query: ServeQuery =
            serde_urlencoded::from_str("id=42&fn=rider.pdf&dl=1").expect("parse");
        assert_eq!(query.id.as_deref(), Some("42"));
        assert_eq!(query.filename.as_deref(), Some("rider.pdf"));
        assert!(flag(&query.dl));
        assert!(!flag(&query.redir));
    }
}
