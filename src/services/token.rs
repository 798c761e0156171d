//! Single-use recovery/confirmation tokens.
//!
//! A token proves control of an email address. Each user holds at most one
//! live token; issuing a new one overwrites (and thereby invalidates) the
//! previous value, and a successful recovery or confirmation consumes it.

use anyhow::Result;

use crate::db::{Store, UserSettings};

/// Generates a fresh opaque token: 128 bits of cryptographic randomness
/// rendered as 32 hex characters.
#[must_use]
pub fn generate_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 16] = rng.random();

    bytes.iter().fold(String::with_capacity(32), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}

#[derive(Clone)]
pub struct TokenService {
    store: Store,
}

impl TokenService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    /// Issues a fresh token for the user, overwriting any previous one.
    pub async fn issue(&self, user_id: &str) -> Result<String> {
        let token = generate_token();
        self.store.set_token(user_id, &token).await?;
        Ok(token)
    }

    /// Resolves a token back to the user currently holding it.
    pub async fn resolve(&self, token: &str) -> Result<Option<UserSettings>> {
        self.store.get_by_token(token).await
    }

    /// Clears the user's live token. Called exactly once per successful
    /// recovery or confirmation to enforce single use.
    pub async fn consume(&self, user_id: &str) -> Result<()> {
        self.store.clear_token(user_id).await
    }
}
