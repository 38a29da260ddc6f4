use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::secret::SecretString;
use crate::AuthError;

use super::user::User;

/// A record tying a local user to a third-party provider account.
///
/// At most one link may exist per (provider, provider account id) pair; the
/// storage layer enforces this with a unique index.
#[derive(Debug, Clone)]
pub struct FederatedLink {
    pub id: i64,
    pub user_id: i64,
    pub provider: String,
    pub provider_account_id: String,
    pub access_token: SecretString,
    pub token_expires_at: DateTime<Utc>,
}

/// The fields needed to insert a link, borrowed from the callback flow.
#[derive(Debug, Clone)]
pub struct NewLink<'a> {
    pub provider: &'a str,
    pub provider_account_id: &'a str,
    pub access_token: &'a SecretString,
    pub token_expires_at: DateTime<Utc>,
}

/// Storage abstraction for federated links.
#[async_trait]
pub trait LinkRepository: Send + Sync {
    async fn find_by_provider_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<FederatedLink>, AuthError>;

    /// Links a provider account to an existing user.
    ///
    /// A unique-constraint violation surfaces as [`AuthError::DuplicateLink`]
    /// so callers can resolve concurrent logins by re-reading.
    async fn create_link(
        &self,
        user_id: i64,
        link: &NewLink<'_>,
    ) -> Result<FederatedLink, AuthError>;

    /// Creates a password-less user and its first link as one transaction.
    ///
    /// Either both rows persist or neither does; a failure must not leave an
    /// orphaned user behind.
    async fn create_user_with_link(
        &self,
        email: &str,
        link: &NewLink<'_>,
    ) -> Result<(User, FederatedLink), AuthError>;
}
