//! Aggregation of a user's personal data for a portability export.

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;

use crate::db::Store;

#[derive(Debug, Error)]
pub enum TakeoutError {
    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for TakeoutError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

/// One exported image: a data-URI payload plus its path inside the archive's
/// `images/` directory.
#[derive(Debug, Clone)]
pub struct TakeoutImage {
    pub b64_image_data: String,
    pub image_export_path: String,
}

/// The aggregate export bundle: a JSON document plus associated images.
#[derive(Debug, Clone)]
pub struct TakeoutData {
    pub user_data: serde_json::Value,
    pub user_images: Vec<TakeoutImage>,
}

#[async_trait]
pub trait TakeoutService: Send + Sync {
    async fn export(&self, user_id: &str) -> Result<TakeoutData, TakeoutError>;
}

/// Builds the export bundle from the user-settings store.
pub struct StoreTakeoutService {
    store: Store,
}

impl StoreTakeoutService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl TakeoutService for StoreTakeoutService {
    async fn export(&self, user_id: &str) -> Result<TakeoutData, TakeoutError> {
        let settings = self
            .store
            .get_by_id(user_id)
            .await?
            .ok_or(TakeoutError::UserNotFound)?;

        let user_data = json!({
            "username": settings.username,
            "email": settings.email,
            "email_confirmed": settings.email_confirmed,
            "user_bio": settings.user_bio,
            "name": settings.name,
            "surname": settings.surname,
            "subject_interests": settings.subject_interests,
            "preferred_language_codes": settings.preferred_language_codes,
            "preferred_site_language_code": settings.preferred_site_language_code,
            "preferred_audio_language_code": settings.preferred_audio_language_code,
            "default_dashboard": settings.default_dashboard,
            "can_receive_email_updates": settings.can_receive_email_updates,
            "can_receive_editor_role_email": settings.can_receive_editor_role_email,
            "can_receive_feedback_message_email": settings.can_receive_feedback_message_email,
            "can_receive_subscription_email": settings.can_receive_subscription_email,
            "last_agreed_to_terms": settings.last_agreed_to_terms,
            "created_at": settings.created_at,
        });

        let user_images = settings
            .profile_picture_data_url
            .into_iter()
            .map(|data_url| TakeoutImage {
                b64_image_data: data_url,
                image_export_path: "profile_picture.png".to_string(),
            })
            .collect();

        Ok(TakeoutData {
            user_data,
            user_images,
        })
    }
}
