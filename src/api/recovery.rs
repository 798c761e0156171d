//! Password recovery and email confirmation.
//!
//! Both flows hand out a single-use token by email and complete by resolving
//! that token back to a user. Recovery requests for unknown emails return the
//! same empty success as known ones so the endpoint cannot be used to probe
//! which addresses have accounts.

use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, EmptyAck, PasswordResetRequest, RecoveryRequest};

/// POST /account/password-recovery
pub async fn request_password_recovery(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RecoveryRequest>,
) -> Result<Json<ApiResponse<EmptyAck>>, ApiError> {
    let email = payload.email.unwrap_or_default();

    let Some(settings) = state.store().get_by_email(&email).await? else {
        // Indistinguishable from the success path.
        return Ok(Json(ApiResponse::success(EmptyAck {})));
    };

    let token = state.tokens().issue(&settings.id).await?;
    let site_url = state.config().read().await.mail.site_url.clone();
    let link = format!("{site_url}/password_recovery?token={token}");

    state
        .notifier()
        .send(
            &[email],
            "Password recovery",
            &link,
            &format!("<a href=\"{link}\">{link}</a>"),
        )
        .await;

    Ok(Json(ApiResponse::success(EmptyAck {})))
}

/// POST /account/password-recovery/{token}
pub async fn complete_password_recovery(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<Json<ApiResponse<EmptyAck>>, ApiError> {
    let password = payload
        .password
        .as_deref()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ApiError::validation("A password must be provided."))?;

    let settings = state
        .tokens()
        .resolve(&token)
        .await?
        .ok_or(ApiError::InvalidToken)?;

    let security = state.config().read().await.security.clone();
    state
        .store()
        .hash_and_store_password(&settings.id, password, &security)
        .await?;
    state.tokens().consume(&settings.id).await?;

    Ok(Json(ApiResponse::success(EmptyAck {})))
}

/// POST /account/email-confirm
pub async fn request_email_confirmation(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RecoveryRequest>,
) -> Result<Json<ApiResponse<EmptyAck>>, ApiError> {
    let email = payload.email.unwrap_or_default();

    let Some(settings) = state.store().get_by_email(&email).await? else {
        return Ok(Json(ApiResponse::success(EmptyAck {})));
    };

    if settings.email_confirmed {
        return Err(ApiError::validation("Email already confirmed"));
    }

    let token = state.tokens().issue(&settings.id).await?;
    let site_url = state.config().read().await.mail.site_url.clone();
    let link = format!("{site_url}/email_confirm?token={token}");

    state
        .notifier()
        .send(
            &[email],
            "Registration confirmation",
            &link,
            &format!("<a href=\"{link}\">{link}</a>"),
        )
        .await;

    Ok(Json(ApiResponse::success(EmptyAck {})))
}

/// POST /account/email-confirm/{token}
pub async fn complete_email_confirmation(
    State(state): State<Arc<AppState>>,
    Path(token): Path<String>,
) -> Result<Json<ApiResponse<EmptyAck>>, ApiError> {
    let settings = state
        .tokens()
        .resolve(&token)
        .await?
        .ok_or(ApiError::InvalidToken)?;

    state.store().confirm_email(&settings.id).await?;
    state.tokens().consume(&settings.id).await?;

    Ok(Json(ApiResponse::success(EmptyAck {})))
}
