use axum::{Extension, Json, extract::State};
use std::sync::Arc;

use super::auth::AuthedUser;
use super::validation::require_valid_bio;
use super::{
    ApiError, ApiResponse, AppState, EmptyAck, PreferencesDto, PreferencesUpdate, ProfilePictureDto,
};

/// GET /preferences
pub async fn get_preferences(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthedUser>,
) -> Result<Json<ApiResponse<PreferencesDto>>, ApiError> {
    let settings = state
        .store()
        .get_by_id(&user.user_id)
        .await?
        .ok_or_else(ApiError::page_not_found)?;

    Ok(Json(ApiResponse::success(PreferencesDto {
        user_bio: settings.user_bio,
        name: settings.name,
        surname: settings.surname,
        subject_interests: settings.subject_interests,
        preferred_language_codes: settings.preferred_language_codes,
        preferred_site_language_code: settings.preferred_site_language_code,
        preferred_audio_language_code: settings.preferred_audio_language_code,
        profile_picture_data_url: settings.profile_picture_data_url,
        default_dashboard: settings.default_dashboard,
        can_receive_email_updates: settings.can_receive_email_updates,
        can_receive_editor_role_email: settings.can_receive_editor_role_email,
        can_receive_feedback_message_email: settings.can_receive_feedback_message_email,
        can_receive_subscription_email: settings.can_receive_subscription_email,
    })))
}

/// PUT /preferences
/// Updates exactly one named field per call. Unknown update types are
/// rejected before anything is written.
pub async fn update_preferences(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthedUser>,
    Json(payload): Json<serde_json::Value>,
) -> Result<Json<ApiResponse<EmptyAck>>, ApiError> {
    let update: PreferencesUpdate = serde_json::from_value(payload.clone()).map_err(|_| {
        let update_type = payload
            .get("update_type")
            .and_then(|v| v.as_str())
            .unwrap_or("");
        ApiError::validation(format!("Invalid update type: {update_type}"))
    })?;

    let store = state.store();
    let user_id = user.user_id.as_str();

    match update {
        PreferencesUpdate::UserBio(bio) => {
            require_valid_bio(&bio)?;
            store.update_user_bio(user_id, &bio).await?;
        }
        PreferencesUpdate::Password(password) => {
            let security = state.config().read().await.security.clone();
            store
                .hash_and_store_password(user_id, &password, &security)
                .await?;
        }
        PreferencesUpdate::Name(name) => {
            store.update_name(user_id, &name).await?;
        }
        PreferencesUpdate::Surname(surname) => {
            store.update_surname(user_id, &surname).await?;
        }
        PreferencesUpdate::SubjectInterests(interests) => {
            store.update_subject_interests(user_id, &interests).await?;
        }
        PreferencesUpdate::PreferredLanguageCodes(codes) => {
            store
                .update_preferred_language_codes(user_id, &codes)
                .await?;
        }
        PreferencesUpdate::PreferredSiteLanguageCode(code) => {
            store
                .update_preferred_site_language_code(user_id, &code)
                .await?;
        }
        PreferencesUpdate::PreferredAudioLanguageCode(code) => {
            store
                .update_preferred_audio_language_code(user_id, &code)
                .await?;
        }
        PreferencesUpdate::ProfilePictureDataUrl(data_url) => {
            store
                .update_profile_picture_data_url(user_id, &data_url)
                .await?;
        }
        PreferencesUpdate::DefaultDashboard(dashboard) => {
            store.set_default_dashboard(user_id, &dashboard).await?;
        }
        PreferencesUpdate::EmailPreferences(prefs) => {
            store
                .update_email_preferences(
                    user_id,
                    prefs.can_receive_email_updates,
                    prefs.can_receive_editor_role_email,
                    prefs.can_receive_feedback_message_email,
                    prefs.can_receive_subscription_email,
                )
                .await?;
        }
    }

    Ok(Json(ApiResponse::success(EmptyAck {})))
}

/// GET /preferences/picture
/// The caller's own profile picture data URI.
pub async fn get_own_profile_picture(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthedUser>,
) -> Result<Json<ApiResponse<ProfilePictureDto>>, ApiError> {
    let settings = state
        .store()
        .get_by_id(&user.user_id)
        .await?
        .ok_or_else(ApiError::page_not_found)?;

    Ok(Json(ApiResponse::success(ProfilePictureDto {
        profile_picture_data_url: settings.profile_picture_data_url,
    })))
}
