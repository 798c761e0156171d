//! End-to-end lifecycle flows: signup, password recovery, email confirmation,
//! and the single-use token invariants behind them.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

use accountd::api::AppState;
use accountd::config::Config;
use accountd::services::Notifier;

const USER_ID_HEADER: &str = "X-User-Id";

#[derive(Debug, Clone)]
struct SentEmail {
    recipients: Vec<String>,
    subject: String,
    plaintext: String,
}

/// Records outbound mail instead of talking to a relay.
#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<SentEmail>>,
}

impl RecordingNotifier {
    fn sent(&self) -> Vec<SentEmail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Notifier for RecordingNotifier {
    async fn send(
        &self,
        recipients: &[String],
        subject: &str,
        plaintext_body: &str,
        _html_body: &str,
    ) -> bool {
        self.sent.lock().unwrap().push(SentEmail {
            recipients: recipients.to_vec(),
            subject: subject.to_string(),
            plaintext: plaintext_body.to_string(),
        });
        true
    }
}

async fn spawn_app() -> (Router, Arc<AppState>, Arc<RecordingNotifier>) {
    let mut config = Config::default();
    config.general.database_path = "sqlite::memory:".to_string();
    config.mail.enabled = true;
    config.mail.site_url = "https://example.org".to_string();

    let notifier = Arc::new(RecordingNotifier::default());
    let state = accountd::api::create_app_state_with_notifier(config, notifier.clone())
        .await
        .expect("Failed to create app state");
    let app = accountd::api::router(state.clone()).await;
    (app, state, notifier)
}

fn get(uri: &str, user_id: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(user_id) = user_id {
        builder = builder.header(USER_ID_HEADER, user_id);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, user_id: Option<&str>, body: &serde_json::Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json");
    if let Some(user_id) = user_id {
        builder = builder.header(USER_ID_HEADER, user_id);
    }
    builder
        .body(Body::from(serde_json::to_string(body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn signup_payload() -> serde_json::Value {
    serde_json::json!({
        "username": "alice",
        "agreed_to_terms": true,
        "password": "p@ssw0rd",
        "email": "alice@example.com",
        "default_dashboard": "learner",
        "can_receive_email_updates": true,
    })
}

#[tokio::test]
async fn signup_completion_registers_and_notifies() {
    let (app, state, notifier) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/signup", Some("uid_1"), &signup_payload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.oneshot(get("/api/signup", Some("uid_1"))).await.unwrap();
    let body = body_json(response).await;
    assert_eq!(body["data"]["has_ever_registered"], true);
    assert_eq!(body["data"]["has_agreed_to_latest_terms"], true);
    assert_eq!(body["data"]["username"], "alice");
    assert_eq!(body["data"]["can_send_emails"], true);

    let settings = state.store().get_by_id("uid_1").await.unwrap().unwrap();
    assert_eq!(settings.default_dashboard.as_deref(), Some("learner"));
    assert!(settings.can_receive_email_updates);
    assert!(settings.recovery_token.is_some());
    assert!(
        state
            .store()
            .verify_password("uid_1", "p@ssw0rd")
            .await
            .unwrap()
    );

    // Confirmation link plus the one-time welcome message.
    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[0].subject, "Registration confirmation");
    assert_eq!(sent[0].recipients, vec!["alice@example.com".to_string()]);
    assert!(
        sent[0]
            .plaintext
            .starts_with("https://example.org/email_confirm?token=")
    );
    assert_eq!(sent[1].subject, "Welcome!");
}

#[tokio::test]
async fn signup_requires_terms_agreement() {
    let (app, state, notifier) = spawn_app().await;

    let mut payload = signup_payload();
    payload["agreed_to_terms"] = serde_json::json!(false);

    let response = app
        .oneshot(post_json("/api/signup", Some("uid_1"), &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("license terms"));

    // Fails fast: nothing written, nothing sent.
    let settings = state.store().get_by_id("uid_1").await.unwrap().unwrap();
    assert!(settings.username.is_none());
    assert!(settings.last_agreed_to_terms.is_none());
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn signup_rejects_taken_username() {
    let (app, _state, _notifier) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/signup", Some("uid_1"), &signup_payload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let mut payload = signup_payload();
    payload["email"] = serde_json::json!("bob@example.com");
    let response = app
        .oneshot(post_json("/api/signup", Some("uid_2"), &payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("already taken"));
}

#[tokio::test]
async fn repeated_signup_is_idempotent_and_welcome_is_sent_once() {
    let (app, state, notifier) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/signup", Some("uid_1"), &signup_payload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let before = state.store().get_by_id("uid_1").await.unwrap().unwrap();
    let sent_before = notifier.sent().len();

    let response = app
        .oneshot(post_json("/api/signup", Some("uid_1"), &signup_payload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let after = state.store().get_by_id("uid_1").await.unwrap().unwrap();
    assert_eq!(after.updated_at, before.updated_at);
    assert_eq!(notifier.sent().len(), sent_before);
}

#[tokio::test]
async fn recovery_request_hides_account_existence() {
    let (app, _state, notifier) = spawn_app().await;

    let response = app
        .oneshot(post_json(
            "/api/account/password-recovery",
            None,
            &serde_json::json!({"email": "ghost@example.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
async fn password_recovery_end_to_end() {
    let (app, state, notifier) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/signup", Some("uid_1"), &signup_payload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .clone()
        .oneshot(post_json(
            "/api/account/password-recovery",
            None,
            &serde_json::json!({"email": "alice@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let recovery_mail = notifier.sent().into_iter().last().unwrap();
    assert_eq!(recovery_mail.subject, "Password recovery");
    assert!(
        recovery_mail
            .plaintext
            .starts_with("https://example.org/password_recovery?token=")
    );

    let token = state
        .store()
        .get_by_id("uid_1")
        .await
        .unwrap()
        .unwrap()
        .recovery_token
        .unwrap();
    assert!(recovery_mail.plaintext.ends_with(&token));

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/account/password-recovery/{token}"),
            None,
            &serde_json::json!({"password": "brand-new-pass"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    assert!(
        state
            .store()
            .verify_password("uid_1", "brand-new-pass")
            .await
            .unwrap()
    );
    assert!(
        !state
            .store()
            .verify_password("uid_1", "p@ssw0rd")
            .await
            .unwrap()
    );

    // Token was consumed; replaying the completion fails.
    let settings = state.store().get_by_id("uid_1").await.unwrap().unwrap();
    assert!(settings.recovery_token.is_none());

    let response = app
        .oneshot(post_json(
            &format!("/api/account/password-recovery/{token}"),
            None,
            &serde_json::json!({"password": "another-pass"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unresolved_recovery_token_mutates_nothing() {
    let (app, state, _notifier) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/signup", Some("uid_1"), &signup_payload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(post_json(
            "/api/account/password-recovery/00000000000000000000000000000000",
            None,
            &serde_json::json!({"password": "hijacked"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(
        state
            .store()
            .verify_password("uid_1", "p@ssw0rd")
            .await
            .unwrap()
    );
    assert!(
        !state
            .store()
            .verify_password("uid_1", "hijacked")
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn reissuing_a_token_invalidates_the_previous_one() {
    let (app, state, _notifier) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/signup", Some("uid_1"), &signup_payload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let request_recovery = post_json(
        "/api/account/password-recovery",
        None,
        &serde_json::json!({"email": "alice@example.com"}),
    );
    let response = app.clone().oneshot(request_recovery).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first_token = state
        .store()
        .get_by_id("uid_1")
        .await
        .unwrap()
        .unwrap()
        .recovery_token
        .unwrap();

    let request_recovery = post_json(
        "/api/account/password-recovery",
        None,
        &serde_json::json!({"email": "alice@example.com"}),
    );
    let response = app.clone().oneshot(request_recovery).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let second_token = state
        .store()
        .get_by_id("uid_1")
        .await
        .unwrap()
        .unwrap()
        .recovery_token
        .unwrap();

    assert_ne!(first_token, second_token);
    assert!(
        state
            .store()
            .get_by_token(&first_token)
            .await
            .unwrap()
            .is_none()
    );
    assert!(
        state
            .store()
            .get_by_token(&second_token)
            .await
            .unwrap()
            .is_some()
    );

    // The stale token no longer completes recovery.
    let response = app
        .oneshot(post_json(
            &format!("/api/account/password-recovery/{first_token}"),
            None,
            &serde_json::json!({"password": "whatever"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn email_confirmation_end_to_end() {
    let (app, state, _notifier) = spawn_app().await;

    let response = app
        .clone()
        .oneshot(post_json("/api/signup", Some("uid_1"), &signup_payload()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // Signup already issued a confirmation token.
    let token = state
        .store()
        .get_by_id("uid_1")
        .await
        .unwrap()
        .unwrap()
        .recovery_token
        .unwrap();

    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/api/account/email-confirm/{token}"),
            None,
            &serde_json::json!({}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let settings = state.store().get_by_id("uid_1").await.unwrap().unwrap();
    assert!(settings.email_confirmed);
    assert!(settings.recovery_token.is_none());

    // Requesting confirmation again for a confirmed address is an error.
    let response = app
        .oneshot(post_json(
            "/api/account/email-confirm",
            None,
            &serde_json::json!({"email": "alice@example.com"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["error"].as_str().unwrap().contains("already confirmed"));
}

#[tokio::test]
async fn confirmation_request_for_unknown_email_is_silent_success() {
    let (app, _state, notifier) = spawn_app().await;

    let response = app
        .oneshot(post_json(
            "/api/account/email-confirm",
            None,
            &serde_json::json!({"email": "ghost@example.com"}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(notifier.sent().is_empty());
}
