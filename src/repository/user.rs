use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::AuthError;

/// The minimal authenticated-user representation carried in a session.
///
/// Only the id and email travel in the cookie; the stored credential never
/// leaves the server. Reconstructing the full [`User`] happens explicitly via
/// [`UserRepository::ensure_full`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: i64,
    pub email: String,
}

/// A password hash together with the tag of the algorithm that produced it.
///
/// Verification always dispatches on the tag, so the hashing scheme can be
/// migrated without invalidating existing rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCredential {
    pub hash: String,
    pub algorithm: String,
}

/// A full user record as loaded from storage.
///
/// `credential` is `None` for accounts created through a federated login;
/// such accounts never match any password, including the empty string.
#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub credential: Option<StoredCredential>,
}

impl User {
    /// True if the account has a usable local password.
    pub fn has_password(&self) -> bool {
        self.credential.as_ref().is_some_and(|c| !c.hash.is_empty())
    }

    pub fn identity(&self) -> Identity {
        Identity {
            user_id: self.id,
            email: self.email.clone(),
        }
    }
}

#[cfg(any(test, feature = "mocks"))]
impl User {
    pub fn mock_with_credential(id: i64, email: &str, credential: StoredCredential) -> Self {
        User {
            id,
            email: email.to_owned(),
            credential: Some(credential),
        }
    }

    pub fn mock_passwordless(id: i64, email: &str) -> Self {
        User {
            id,
            email: email.to_owned(),
            credential: None,
        }
    }
}

/// Storage abstraction for user rows.
///
/// Email uniqueness is the backend's responsibility: `create` must surface a
/// unique-constraint violation as [`AuthError::DuplicateEmail`] rather than
/// racing with a read-then-write check.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;
    async fn create(
        &self,
        email: &str,
        credential: Option<&StoredCredential>,
    ) -> Result<User, AuthError>;
    async fn update_credential(
        &self,
        user_id: i64,
        credential: &StoredCredential,
    ) -> Result<(), AuthError>;

    /// Reloads the full record behind a session-carried [`Identity`].
    ///
    /// Idempotent; this is the only way to get at the stored credential of a
    /// logged-in caller.
    async fn ensure_full(&self, identity: &Identity) -> Result<User, AuthError> {
        self.find_by_id(identity.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn has_password_requires_a_non_empty_hash() {
        let with_hash = User::mock_with_credential(
            1,
            "a@example.com",
            StoredCredential {
                hash: "$argon2id$...".to_owned(),
                algorithm: "argon2id".to_owned(),
            },
        );
        assert!(with_hash.has_password());

        let empty_hash = User::mock_with_credential(
            2,
            "b@example.com",
            StoredCredential {
                hash: String::new(),
                algorithm: "argon2id".to_owned(),
            },
        );
        assert!(!empty_hash.has_password());

        assert!(!User::mock_passwordless(3, "c@example.com").has_password());
    }

    #[test]
    fn identity_is_a_projection() {
        let user = User::mock_passwordless(7, "d@example.com");
        let identity = user.identity();
        assert_eq!(identity.user_id, 7);
        assert_eq!(identity.email, "d@example.com");
    }
}
