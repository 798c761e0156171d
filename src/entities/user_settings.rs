use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "user_settings")]
pub struct Model {
    /// Opaque user id assigned by the upstream identity layer.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Set exactly once during signup completion; unique across all users.
    #[sea_orm(unique)]
    pub username: Option<String>,

    pub email: Option<String>,

    pub email_confirmed: bool,

    /// Argon2id password hash (PHC string), absent until first registration.
    pub password_hash: Option<String>,

    pub user_bio: String,

    pub name: Option<String>,

    pub surname: Option<String>,

    /// JSON-encoded list of subject interest strings.
    pub subject_interests: String,

    /// JSON-encoded list of preferred content language codes.
    pub preferred_language_codes: String,

    pub preferred_site_language_code: Option<String>,

    pub preferred_audio_language_code: Option<String>,

    pub profile_picture_data_url: Option<String>,

    pub default_dashboard: Option<String>,

    pub can_receive_email_updates: bool,

    pub can_receive_editor_role_email: bool,

    pub can_receive_feedback_message_email: bool,

    pub can_receive_subscription_email: bool,

    pub last_agreed_to_terms: Option<String>,

    /// Live recovery/confirmation token; at most one per user, overwritten on
    /// reissue and cleared on first successful consumption.
    pub recovery_token: Option<String>,

    pub deletion_requested_at: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
