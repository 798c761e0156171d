use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::Notifier;
use crate::state::SharedState;

mod account;
pub mod auth;
mod error;
mod preferences;
mod profile;
mod recovery;
mod signup;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Arc<RwLock<Config>> {
        &self.shared.config
    }

    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn notifier(&self) -> &Arc<dyn Notifier> {
        &self.shared.notifier
    }

    #[must_use]
    pub fn tokens(&self) -> &crate::services::TokenService {
        &self.shared.tokens
    }

    #[must_use]
    pub fn takeout(&self) -> &Arc<dyn crate::services::TakeoutService> {
        &self.shared.takeout
    }

    #[must_use]
    pub fn wipeout(&self) -> &Arc<dyn crate::services::WipeoutService> {
        &self.shared.wipeout
    }
}

pub async fn create_app_state(shared: Arc<SharedState>) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
    }))
}

pub async fn create_app_state_from_config(config: Config) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared).await
}

/// Like [`create_app_state_from_config`] but with an injected notifier, so
/// tests can observe outbound mail instead of talking to a relay.
pub async fn create_app_state_with_notifier(
    config: Config,
    notifier: Arc<dyn Notifier>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::with_notifier(config, notifier).await?);
    create_app_state(shared).await
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = {
        let config = state.config().read().await;
        config.server.cors_allowed_origins.clone()
    };

    let protected_routes = create_protected_router(state.clone());

    // Public surface: world-viewable profile data plus the token flows, which
    // authenticate by proof of email control rather than by session.
    let api_router = Router::new()
        .merge(protected_routes)
        .route("/profile/{username}", get(profile::get_profile))
        .route(
            "/profile/{username}/picture",
            get(profile::get_profile_picture_by_username),
        )
        .route(
            "/account/password-recovery",
            post(recovery::request_password_recovery),
        )
        .route(
            "/account/password-recovery/{token}",
            post(recovery::complete_password_recovery),
        )
        .route(
            "/account/email-confirm",
            post(recovery::request_email_confirmation),
        )
        .route(
            "/account/email-confirm/{token}",
            post(recovery::complete_email_confirmation),
        )
        .route("/system/status", get(system::get_status))
        .route("/system/health/live", get(system::health_live))
        .route("/system/health/ready", get(system::health_ready))
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    // The request span declares `user_id` empty so the identity middleware
    // can fill it in once the caller is resolved.
    let trace_layer = TraceLayer::new_for_http().make_span_with(
        |request: &axum::http::Request<axum::body::Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                user_id = tracing::field::Empty,
            )
        },
    );

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(trace_layer)
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/preferences", get(preferences::get_preferences))
        .route("/preferences", put(preferences::update_preferences))
        .route(
            "/preferences/picture",
            get(preferences::get_own_profile_picture),
        )
        .route("/signup", get(signup::signup_status))
        .route("/signup", post(signup::complete_signup))
        .route("/signup/username-check", post(signup::check_username))
        .route("/account", delete(account::delete_account))
        .route("/account/export", get(account::export_account))
        .route_layer(middleware::from_fn_with_state(
            state,
            auth::identity_middleware,
        ))
}
