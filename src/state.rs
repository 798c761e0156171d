use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    Notifier, SmtpNotifier, StoreTakeoutService, StoreWipeoutService, TakeoutService, TokenService,
    WipeoutService,
};

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub notifier: Arc<dyn Notifier>,

    pub tokens: TokenService,

    pub takeout: Arc<dyn TakeoutService>,

    pub wipeout: Arc<dyn WipeoutService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let notifier = Arc::new(SmtpNotifier::new(config.mail.clone()));
        Self::with_notifier(config, notifier).await
    }

    /// Builds the state with an externally supplied notifier. Tests inject a
    /// recording implementation here.
    pub async fn with_notifier(
        config: Config,
        notifier: Arc<dyn Notifier>,
    ) -> anyhow::Result<Self> {
        let store = Store::new(&config.general.database_path).await?;

        let tokens = TokenService::new(store.clone());
        let takeout =
            Arc::new(StoreTakeoutService::new(store.clone())) as Arc<dyn TakeoutService>;
        let wipeout =
            Arc::new(StoreWipeoutService::new(store.clone())) as Arc<dyn WipeoutService>;

        Ok(Self {
            config: Arc::new(RwLock::new(config)),
            store,
            notifier,
            tokens,
            takeout,
            wipeout,
        })
    }
}
