//! Session identity extraction.
//!
//! Session establishment lives in a fronting identity layer (external
//! collaborator); by the time a request reaches this service that layer has
//! attached the authenticated user id and role as trusted headers. The
//! middleware here parses them into a [`Caller`] in request extensions, and
//! the [`SessionCaller`] extractor rejects requests that arrive without one.

use axum::extract::FromRequestParts;
use axum::extract::Request;
use axum::http::{request::Parts, HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use axum::Json;
use stagedoc_core::models::Caller;

use crate::error::ErrorBody;

pub const SESSION_USER_HEADER: &str = "x-session-user";
pub const SESSION_ADMIN_HEADER: &str = "x-session-admin";

fn caller_from_headers(headers: &HeaderMap) -> Option<Caller> {
    let user_id = headers
        .get(SESSION_USER_HEADER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<i64>()
        .ok()?;
    if user_id <= 0 {
        return None;
    }

    let is_admin = headers
        .get(SESSION_ADMIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(|v| matches!(v.trim(), "1" | "true"))
        .unwrap_or(false);

    Some(Caller { user_id, is_admin })
}

/// Parse the session headers and stash the caller in request extensions.
/// Requests without a valid identity still pass through; handlers that need
/// one enforce it via [`SessionCaller`].
pub async fn session_middleware(mut request: Request, next: Next) -> Response {
    if let Some(caller) = caller_from_headers(request.headers()) {
        request.extensions_mut().insert(caller);
    }
    next.run(request).await
}

/// Extractor for the authenticated caller; rejects with 401 when the session
/// layer supplied no identity.
#[derive(Debug, Clone, Copy)]
pub struct SessionCaller(pub Caller);

impl<S> FromRequestParts<S> for SessionCaller
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorBody>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .copied()
            .map(SessionCaller)
            .ok_or_else(|| {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(ErrorBody {
                        error: "Missing session identity".to_string(),
                        code: "UNAUTHORIZED".to_string(),
                    }),
                )
            })
    }
}
