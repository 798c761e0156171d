//! Signup completion and username availability.
//!
//! A user arrives here already authenticated but not yet registered. The
//! pre-registration row exists (created by the identity middleware);
//! registration completes once the username is set and the terms are agreed.

use axum::{Extension, Json, extract::State};
use std::sync::Arc;
use tracing::warn;

use super::auth::AuthedUser;
use super::validation::require_valid_username;
use super::{
    ApiError, ApiResponse, AppState, EmptyAck, SignupRequest, SignupStatusDto,
    UsernameCheckRequest, UsernameCheckResponse,
};

/// GET /signup
pub async fn signup_status(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthedUser>,
) -> Result<Json<ApiResponse<SignupStatusDto>>, ApiError> {
    let settings = state
        .store()
        .get_by_id(&user.user_id)
        .await?
        .ok_or_else(ApiError::page_not_found)?;

    let can_send_emails = state.config().read().await.mail.enabled;

    Ok(Json(ApiResponse::success(SignupStatusDto {
        can_send_emails,
        has_agreed_to_latest_terms: settings.last_agreed_to_terms.is_some(),
        has_ever_registered: settings.has_ever_registered(),
        username: settings.username,
    })))
}

/// POST /signup
///
/// Idempotent for a fully registered caller. Validation failures happen
/// before any state is written; a failed email send after that never rolls
/// the registration back.
pub async fn complete_signup(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthedUser>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<ApiResponse<EmptyAck>>, ApiError> {
    let store = state.store();
    let user_id = user.user_id.as_str();

    let settings = store
        .get_by_id(user_id)
        .await?
        .ok_or_else(ApiError::page_not_found)?;

    // Snapshot before any mutation; this is what guards the one-time welcome
    // email and the default-dashboard write against retried calls.
    let has_ever_registered = settings.has_ever_registered();

    if has_ever_registered {
        return Ok(Json(ApiResponse::success(EmptyAck {})));
    }

    if payload.agreed_to_terms != Some(true) {
        return Err(ApiError::validation(
            "In order to edit explorations on this site, you will need to \
             accept the license terms.",
        ));
    }
    store.record_terms_agreement(user_id).await?;

    if settings.username.is_none() {
        let username = payload
            .username
            .as_deref()
            .ok_or_else(|| ApiError::validation("Empty username supplied."))?;
        require_valid_username(username)?;

        if store.username_exists(username).await? {
            return Err(ApiError::validation(format!(
                "Sorry, the username \"{username}\" is already taken."
            )));
        }

        let password = payload
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| ApiError::validation("A password must be provided."))?;

        let security = state.config().read().await.security.clone();
        store
            .hash_and_store_password(user_id, password, &security)
            .await?;
        store
            .set_identity(user_id, username, payload.email.as_deref())
            .await?;

        send_confirmation_email(&state, user_id, payload.email.as_deref()).await?;
    }

    if let Some(can_receive_email_updates) = payload.can_receive_email_updates {
        store
            .update_email_preferences(
                user_id,
                can_receive_email_updates,
                crate::constants::email_defaults::EDITOR_ROLE,
                crate::constants::email_defaults::FEEDBACK_MESSAGE,
                crate::constants::email_defaults::SUBSCRIPTION,
            )
            .await?;
    }

    let mail = state.config().read().await.mail.clone();
    if mail.enabled {
        send_welcome_email(&state, user_id, payload.email.as_deref()).await?;
    }

    if let Some(default_dashboard) = payload.default_dashboard.as_deref() {
        store.set_default_dashboard(user_id, default_dashboard).await?;
    }

    Ok(Json(ApiResponse::success(EmptyAck {})))
}

/// POST /signup/username-check
pub async fn check_username(
    State(state): State<Arc<AppState>>,
    Extension(_user): Extension<AuthedUser>,
    Json(payload): Json<UsernameCheckRequest>,
) -> Result<Json<ApiResponse<UsernameCheckResponse>>, ApiError> {
    let username = payload.username.unwrap_or_default();
    require_valid_username(&username)?;

    let username_is_taken = state.store().username_exists(&username).await?;

    Ok(Json(ApiResponse::success(UsernameCheckResponse {
        username_is_taken,
    })))
}

/// Issues a confirmation token and emails the confirmation link. A send
/// failure is logged by the notifier and deliberately not surfaced.
async fn send_confirmation_email(
    state: &Arc<AppState>,
    user_id: &str,
    email: Option<&str>,
) -> Result<(), ApiError> {
    let Some(email) = email else {
        warn!("No email on record for user {user_id}; skipping confirmation email");
        return Ok(());
    };

    let token = state.tokens().issue(user_id).await?;
    let site_url = state.config().read().await.mail.site_url.clone();
    let link = format!("{site_url}/email_confirm?token={token}");

    state
        .notifier()
        .send(
            &[email.to_string()],
            "Registration confirmation",
            &link,
            &format!("<a href=\"{link}\">{link}</a>"),
        )
        .await;

    Ok(())
}

/// One-time welcome message, sent exactly on first-ever registration.
async fn send_welcome_email(
    state: &Arc<AppState>,
    user_id: &str,
    email: Option<&str>,
) -> Result<(), ApiError> {
    let Some(email) = email else {
        warn!("No email on record for user {user_id}; skipping welcome email");
        return Ok(());
    };

    let plaintext = "Welcome! Thanks for registering. You can update your \
                     profile and preferences at any time from your account page.";
    let html = "<p>Welcome! Thanks for registering. You can update your \
                profile and preferences at any time from your account page.</p>";

    state
        .notifier()
        .send(&[email.to_string()], "Welcome!", plaintext, html)
        .await;

    Ok(())
}
