//! Scheduling of irreversible account deletion.
//!
//! The actual wipeout workflow runs outside this service; scheduling only
//! stamps the account so the access layer can treat it as pending deletion.

use async_trait::async_trait;
use thiserror::Error;
use tracing::info;

use crate::db::Store;

#[derive(Debug, Error)]
pub enum WipeoutError {
    #[error("User not found")]
    UserNotFound,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<anyhow::Error> for WipeoutError {
    fn from(err: anyhow::Error) -> Self {
        Self::Database(err.to_string())
    }
}

#[async_trait]
pub trait WipeoutService: Send + Sync {
    async fn schedule_deletion(&self, user_id: &str) -> Result<(), WipeoutError>;
}

pub struct StoreWipeoutService {
    store: Store,
}

impl StoreWipeoutService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl WipeoutService for StoreWipeoutService {
    async fn schedule_deletion(&self, user_id: &str) -> Result<(), WipeoutError> {
        if self.store.get_by_id(user_id).await?.is_none() {
            return Err(WipeoutError::UserNotFound);
        }

        self.store.mark_deletion_requested(user_id).await?;
        info!("Scheduled account deletion for user {user_id}");
        Ok(())
    }
}
