use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set};
use tokio::task;

use crate::config::SecurityConfig;
use crate::entities::user_settings;

/// User settings row as seen by the rest of the crate (password hash is not
/// exposed; use [`UserSettingsRepository::verify_password`] instead).
#[derive(Debug, Clone)]
pub struct UserSettings {
    pub id: String,
    pub username: Option<String>,
    pub email: Option<String>,
    pub email_confirmed: bool,
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
    pub last_agreed_to_terms: Option<String>,
    pub recovery_token: Option<String>,
    pub deletion_requested_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl UserSettings {
    /// A user counts as registered once both the username is set and the
    /// terms have been agreed to.
    #[must_use]
    pub fn has_ever_registered(&self) -> bool {
        self.username.is_some() && self.last_agreed_to_terms.is_some()
    }
}

fn decode_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn encode_list(items: &[String]) -> String {
    serde_json::to_string(items).unwrap_or_else(|_| "[]".to_string())
}

impl From<user_settings::Model> for UserSettings {
    fn from(model: user_settings::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            email_confirmed: model.email_confirmed,
            user_bio: model.user_bio,
            name: model.name,
            surname: model.surname,
            subject_interests: decode_list(&model.subject_interests),
            preferred_language_codes: decode_list(&model.preferred_language_codes),
            preferred_site_language_code: model.preferred_site_language_code,
            preferred_audio_language_code: model.preferred_audio_language_code,
            profile_picture_data_url: model.profile_picture_data_url,
            default_dashboard: model.default_dashboard,
            can_receive_email_updates: model.can_receive_email_updates,
            can_receive_editor_role_email: model.can_receive_editor_role_email,
            can_receive_feedback_message_email: model.can_receive_feedback_message_email,
            can_receive_subscription_email: model.can_receive_subscription_email,
            last_agreed_to_terms: model.last_agreed_to_terms,
            recovery_token: model.recovery_token,
            deletion_requested_at: model.deletion_requested_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

pub struct UserSettingsRepository {
    conn: DatabaseConnection,
}

impl UserSettingsRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Inserts a pre-registration row for the given id if none exists yet and
    /// returns the current row either way.
    pub async fn ensure_exists(&self, user_id: &str) -> Result<UserSettings> {
        if let Some(existing) = self.find_model(user_id).await? {
            return Ok(existing.into());
        }

        let now = chrono::Utc::now().to_rfc3339();
        let row = user_settings::ActiveModel {
            id: Set(user_id.to_string()),
            username: Set(None),
            email: Set(None),
            email_confirmed: Set(false),
            password_hash: Set(None),
            user_bio: Set(String::new()),
            name: Set(None),
            surname: Set(None),
            subject_interests: Set("[]".to_string()),
            preferred_language_codes: Set("[]".to_string()),
            preferred_site_language_code: Set(None),
            preferred_audio_language_code: Set(None),
            profile_picture_data_url: Set(None),
            default_dashboard: Set(None),
            can_receive_email_updates: Set(false),
            can_receive_editor_role_email: Set(crate::constants::email_defaults::EDITOR_ROLE),
            can_receive_feedback_message_email: Set(
                crate::constants::email_defaults::FEEDBACK_MESSAGE,
            ),
            can_receive_subscription_email: Set(crate::constants::email_defaults::SUBSCRIPTION),
            last_agreed_to_terms: Set(None),
            recovery_token: Set(None),
            deletion_requested_at: Set(None),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        let inserted = row
            .insert(&self.conn)
            .await
            .context("Failed to insert pre-registration user settings")?;

        Ok(inserted.into())
    }

    pub async fn get_by_id(&self, user_id: &str) -> Result<Option<UserSettings>> {
        Ok(self.find_model(user_id).await?.map(UserSettings::from))
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<UserSettings>> {
        let row = user_settings::Entity::find()
            .filter(user_settings::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user settings by username")?;

        Ok(row.map(UserSettings::from))
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserSettings>> {
        let row = user_settings::Entity::find()
            .filter(user_settings::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user settings by email")?;

        Ok(row.map(UserSettings::from))
    }

    /// Looks up the user whose live token equals the given value. A consumed
    /// or overwritten token no longer matches anything.
    pub async fn get_by_token(&self, token: &str) -> Result<Option<UserSettings>> {
        let row = user_settings::Entity::find()
            .filter(user_settings::Column::RecoveryToken.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query user settings by token")?;

        Ok(row.map(UserSettings::from))
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        Ok(self.get_by_username(username).await?.is_some())
    }

    /// Sets the username and email during first registration. The username is
    /// immutable once set.
    pub async fn set_identity(
        &self,
        user_id: &str,
        username: &str,
        email: Option<&str>,
    ) -> Result<()> {
        let model = self.require_model(user_id).await?;

        if model.username.is_some() {
            anyhow::bail!("Username is already set for user {user_id}");
        }

        let mut active: user_settings::ActiveModel = model.into();
        active.username = Set(Some(username.to_string()));
        active.email = Set(email.map(str::to_string));
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }

    pub async fn record_terms_agreement(&self, user_id: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.update_row(user_id, |active| {
            active.last_agreed_to_terms = Set(Some(now));
        })
        .await
    }

    pub async fn set_token(&self, user_id: &str, token: &str) -> Result<()> {
        let token = token.to_string();
        self.update_row(user_id, |active| {
            active.recovery_token = Set(Some(token));
        })
        .await
    }

    pub async fn clear_token(&self, user_id: &str) -> Result<()> {
        self.update_row(user_id, |active| {
            active.recovery_token = Set(None);
        })
        .await
    }

    pub async fn confirm_email(&self, user_id: &str) -> Result<()> {
        self.update_row(user_id, |active| {
            active.email_confirmed = Set(true);
        })
        .await
    }

    /// Hashes the password with Argon2id and stores it. Hashing runs in a
    /// blocking task because it is CPU-intensive.
    pub async fn hash_and_store_password(
        &self,
        user_id: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        let password = password.to_string();
        let config = config.clone();
        let hash = task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")??;

        self.update_row(user_id, |active| {
            active.password_hash = Set(Some(hash));
        })
        .await
    }

    /// Verifies a plaintext password against the stored hash. Users without a
    /// stored password never verify.
    pub async fn verify_password(&self, user_id: &str, password: &str) -> Result<bool> {
        let Some(model) = self.find_model(user_id).await? else {
            return Ok(false);
        };

        let Some(password_hash) = model.password_hash else {
            return Ok(false);
        };

        let password = password.to_string();
        let is_valid = task::spawn_blocking(move || {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

            let argon2 = Argon2::default();
            Ok::<bool, anyhow::Error>(
                argon2
                    .verify_password(password.as_bytes(), &parsed_hash)
                    .is_ok(),
            )
        })
        .await
        .context("Password verification task panicked")??;

        Ok(is_valid)
    }

    pub async fn update_user_bio(&self, user_id: &str, bio: &str) -> Result<()> {
        let bio = bio.to_string();
        self.update_row(user_id, |active| {
            active.user_bio = Set(bio);
        })
        .await
    }

    pub async fn update_name(&self, user_id: &str, name: &str) -> Result<()> {
        let name = name.to_string();
        self.update_row(user_id, |active| {
            active.name = Set(Some(name));
        })
        .await
    }

    pub async fn update_surname(&self, user_id: &str, surname: &str) -> Result<()> {
        let surname = surname.to_string();
        self.update_row(user_id, |active| {
            active.surname = Set(Some(surname));
        })
        .await
    }

    pub async fn update_subject_interests(
        &self,
        user_id: &str,
        interests: &[String],
    ) -> Result<()> {
        let encoded = encode_list(interests);
        self.update_row(user_id, |active| {
            active.subject_interests = Set(encoded);
        })
        .await
    }

    pub async fn update_preferred_language_codes(
        &self,
        user_id: &str,
        codes: &[String],
    ) -> Result<()> {
        let encoded = encode_list(codes);
        self.update_row(user_id, |active| {
            active.preferred_language_codes = Set(encoded);
        })
        .await
    }

    pub async fn update_preferred_site_language_code(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<()> {
        let code = code.to_string();
        self.update_row(user_id, |active| {
            active.preferred_site_language_code = Set(Some(code));
        })
        .await
    }

    pub async fn update_preferred_audio_language_code(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<()> {
        let code = code.to_string();
        self.update_row(user_id, |active| {
            active.preferred_audio_language_code = Set(Some(code));
        })
        .await
    }

    pub async fn update_profile_picture_data_url(
        &self,
        user_id: &str,
        data_url: &str,
    ) -> Result<()> {
        let data_url = data_url.to_string();
        self.update_row(user_id, |active| {
            active.profile_picture_data_url = Set(Some(data_url));
        })
        .await
    }

    pub async fn set_default_dashboard(&self, user_id: &str, dashboard: &str) -> Result<()> {
        let dashboard = dashboard.to_string();
        self.update_row(user_id, |active| {
            active.default_dashboard = Set(Some(dashboard));
        })
        .await
    }

    pub async fn update_email_preferences(
        &self,
        user_id: &str,
        can_receive_email_updates: bool,
        can_receive_editor_role_email: bool,
        can_receive_feedback_message_email: bool,
        can_receive_subscription_email: bool,
    ) -> Result<()> {
        self.update_row(user_id, |active| {
            active.can_receive_email_updates = Set(can_receive_email_updates);
            active.can_receive_editor_role_email = Set(can_receive_editor_role_email);
            active.can_receive_feedback_message_email = Set(can_receive_feedback_message_email);
            active.can_receive_subscription_email = Set(can_receive_subscription_email);
        })
        .await
    }

    pub async fn mark_deletion_requested(&self, user_id: &str) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        self.update_row(user_id, |active| {
            active.deletion_requested_at = Set(Some(now));
        })
        .await
    }

    async fn find_model(&self, user_id: &str) -> Result<Option<user_settings::Model>> {
        user_settings::Entity::find_by_id(user_id)
            .one(&self.conn)
            .await
            .context("Failed to query user settings by id")
    }

    async fn require_model(&self, user_id: &str) -> Result<user_settings::Model> {
        self.find_model(user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))
    }

    async fn update_row<F>(&self, user_id: &str, apply: F) -> Result<()>
    where
        F: FnOnce(&mut user_settings::ActiveModel),
    {
        let model = self.require_model(user_id).await?;

        let mut active: user_settings::ActiveModel = model.into();
        apply(&mut active);
        active.updated_at = Set(chrono::Utc::now().to_rfc3339());
        active.update(&self.conn).await?;

        Ok(())
    }
}

/// Hash a password using Argon2id with the configured cost parameters.
pub fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}
