use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Empty `{}` payload for operations that acknowledge without returning data.
#[derive(Debug, Serialize)]
pub struct EmptyAck {}

#[derive(Debug, Serialize)]
pub struct ProfileDto {
    pub username: String,
    pub user_bio: String,
    pub subject_interests: Vec<String>,
    pub profile_picture_data_url: Option<String>,
    pub name: Option<String>,
    pub surname: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PreferencesDto {
    pub user_bio: String,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub subject_interests: Vec<String>,
    pub preferred_language_codes: Vec<String>,
    pub preferred_site_language_code: Option<String>,
    pub preferred_audio_language_code: Option<String>,
    pub profile_picture_data_url: Option<String>,
    pub default_dashboard: Option<String>,
    pub can_receive_email_updates: bool,
    pub can_receive_editor_role_email: bool,
    pub can_receive_feedback_message_email: bool,
    pub can_receive_subscription_email: bool,
}

#[derive(Debug, Deserialize)]
pub struct EmailPreferencesUpdate {
    pub can_receive_email_updates: bool,
    pub can_receive_editor_role_email: bool,
    pub can_receive_feedback_message_email: bool,
    pub can_receive_subscription_email: bool,
}

/// One recognized preference/profile field per update call. Unknown tags are
/// rejected at the boundary before any dispatch happens.
#[derive(Debug, Deserialize)]
#[serde(tag = "update_type", content = "data", rename_all = "snake_case")]
pub enum PreferencesUpdate {
    UserBio(String),
    Password(String),
    Name(String),
    Surname(String),
    SubjectInterests(Vec<String>),
    PreferredLanguageCodes(Vec<String>),
    PreferredSiteLanguageCode(String),
    PreferredAudioLanguageCode(String),
    ProfilePictureDataUrl(String),
    DefaultDashboard(String),
    EmailPreferences(EmailPreferencesUpdate),
}

#[derive(Debug, Serialize)]
pub struct ProfilePictureDto {
    pub profile_picture_data_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupStatusDto {
    pub can_send_emails: bool,
    pub has_agreed_to_latest_terms: bool,
    pub has_ever_registered: bool,
    pub username: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub username: Option<String>,
    pub agreed_to_terms: Option<bool>,
    pub password: Option<String>,
    pub email: Option<String>,
    pub default_dashboard: Option<String>,
    pub can_receive_email_updates: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct UsernameCheckRequest {
    pub username: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UsernameCheckResponse {
    pub username_is_taken: bool,
}

#[derive(Debug, Serialize)]
pub struct DeleteAccountResponse {
    pub success: bool,
}

#[derive(Debug, Deserialize)]
pub struct RecoveryRequest {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PasswordResetRequest {
    pub password: Option<String>,
}
