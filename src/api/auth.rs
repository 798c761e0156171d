//! Caller identity resolution.
//!
//! Access-control policy runs upstream of this service; the trusted proxy in
//! front of it injects the authenticated caller's id as a request header.
//! This middleware resolves that header and implicitly creates the
//! pre-registration user-settings row on a user's first authenticated visit.

use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::{ApiError, AppState};

/// Header carrying the authenticated caller id, set by the upstream
/// access-control layer.
pub const USER_ID_HEADER: &str = "X-User-Id";

/// Identity of the authenticated caller, available to protected handlers via
/// request extensions.
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub user_id: String,
}

pub async fn identity_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = headers
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    let Some(user_id) = user_id else {
        return Err(ApiError::Unauthorized(format!(
            "Missing or empty {USER_ID_HEADER} header"
        )));
    };

    // First authenticated visit creates the pre-registration row.
    state.store().ensure_exists(user_id).await?;

    tracing::Span::current().record("user_id", user_id);
    request.extensions_mut().insert(AuthedUser {
        user_id: user_id.to_string(),
    });

    Ok(next.run(request).await)
}
