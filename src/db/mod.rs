use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

use crate::config::SecurityConfig;
pub use repositories::user_settings::UserSettings;

/// Facade over the database connection. The rest of the crate talks to the
/// user-settings store exclusively through these methods.
#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user_settings::UserSettingsRepository {
        repositories::user_settings::UserSettingsRepository::new(self.conn.clone())
    }

    pub async fn ensure_exists(&self, user_id: &str) -> Result<UserSettings> {
        self.user_repo().ensure_exists(user_id).await
    }

    pub async fn get_by_id(&self, user_id: &str) -> Result<Option<UserSettings>> {
        self.user_repo().get_by_id(user_id).await
    }

    pub async fn get_by_username(&self, username: &str) -> Result<Option<UserSettings>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<UserSettings>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_by_token(&self, token: &str) -> Result<Option<UserSettings>> {
        self.user_repo().get_by_token(token).await
    }

    pub async fn username_exists(&self, username: &str) -> Result<bool> {
        self.user_repo().username_exists(username).await
    }

    pub async fn set_identity(
        &self,
        user_id: &str,
        username: &str,
        email: Option<&str>,
    ) -> Result<()> {
        self.user_repo().set_identity(user_id, username, email).await
    }

    pub async fn record_terms_agreement(&self, user_id: &str) -> Result<()> {
        self.user_repo().record_terms_agreement(user_id).await
    }

    pub async fn set_token(&self, user_id: &str, token: &str) -> Result<()> {
        self.user_repo().set_token(user_id, token).await
    }

    pub async fn clear_token(&self, user_id: &str) -> Result<()> {
        self.user_repo().clear_token(user_id).await
    }

    pub async fn confirm_email(&self, user_id: &str) -> Result<()> {
        self.user_repo().confirm_email(user_id).await
    }

    pub async fn hash_and_store_password(
        &self,
        user_id: &str,
        password: &str,
        config: &SecurityConfig,
    ) -> Result<()> {
        self.user_repo()
            .hash_and_store_password(user_id, password, config)
            .await
    }

    pub async fn verify_password(&self, user_id: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(user_id, password).await
    }

    pub async fn update_user_bio(&self, user_id: &str, bio: &str) -> Result<()> {
        self.user_repo().update_user_bio(user_id, bio).await
    }

    pub async fn update_name(&self, user_id: &str, name: &str) -> Result<()> {
        self.user_repo().update_name(user_id, name).await
    }

    pub async fn update_surname(&self, user_id: &str, surname: &str) -> Result<()> {
        self.user_repo().update_surname(user_id, surname).await
    }

    pub async fn update_subject_interests(
        &self,
        user_id: &str,
        interests: &[String],
    ) -> Result<()> {
        self.user_repo()
            .update_subject_interests(user_id, interests)
            .await
    }

    pub async fn update_preferred_language_codes(
        &self,
        user_id: &str,
        codes: &[String],
    ) -> Result<()> {
        self.user_repo()
            .update_preferred_language_codes(user_id, codes)
            .await
    }

    pub async fn update_preferred_site_language_code(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<()> {
        self.user_repo()
            .update_preferred_site_language_code(user_id, code)
            .await
    }

    pub async fn update_preferred_audio_language_code(
        &self,
        user_id: &str,
        code: &str,
    ) -> Result<()> {
        self.user_repo()
            .update_preferred_audio_language_code(user_id, code)
            .await
    }

    pub async fn update_profile_picture_data_url(
        &self,
        user_id: &str,
        data_url: &str,
    ) -> Result<()> {
        self.user_repo()
            .update_profile_picture_data_url(user_id, data_url)
            .await
    }

    pub async fn set_default_dashboard(&self, user_id: &str, dashboard: &str) -> Result<()> {
        self.user_repo()
            .set_default_dashboard(user_id, dashboard)
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
        self.user_repo()
            .update_email_preferences(
                user_id,
                can_receive_email_updates,
                can_receive_editor_role_email,
                can_receive_feedback_message_email,
                can_receive_subscription_email,
            )
            .await
    }

    pub async fn mark_deletion_requested(&self, user_id: &str) -> Result<()> {
        self.user_repo().mark_deletion_requested(user_id).await
    }
}
