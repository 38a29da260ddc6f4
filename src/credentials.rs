//! Algorithm-tagged password hashing and verification.
//!
//! Every stored hash carries the tag of the scheme that produced it, and
//! verification dispatches on that tag. Migrating to a new scheme means
//! registering another hasher and changing the default; existing rows keep
//! verifying under their original algorithm.

use std::collections::HashMap;
use std::sync::Arc;

use crate::crypto::{Argon2Hasher, PasswordHasher};
use crate::repository::{StoredCredential, User};
use crate::validators::PasswordRules;
use crate::{AuthError, SecretString};

/// Tag of the scheme new hashes are produced with.
pub const DEFAULT_ALGORITHM: &str = "argon2id";

/// Hashes new passwords and verifies submitted ones against stored rows.
#[derive(Clone)]
pub struct CredentialStore {
    hashers: HashMap<String, Arc<dyn PasswordHasher>>,
    default_algorithm: String,
    rules: PasswordRules,
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new(PasswordRules::default())
    }
}

impl CredentialStore {
    pub fn new(rules: PasswordRules) -> Self {
        let mut hashers: HashMap<String, Arc<dyn PasswordHasher>> = HashMap::new();
        hashers.insert(
            DEFAULT_ALGORITHM.to_owned(),
            Arc::new(Argon2Hasher::default()),
        );

        Self {
            hashers,
            default_algorithm: DEFAULT_ALGORITHM.to_owned(),
            rules,
        }
    }

    /// Registers a hasher under an algorithm tag.
    ///
    /// Use this to keep verifying hashes from a scheme that is no longer the
    /// default.
    #[must_use]
    pub fn with_hasher(mut self, algorithm: &str, hasher: Arc<dyn PasswordHasher>) -> Self {
        self.hashers.insert(algorithm.to_owned(), hasher);
        self
    }

    /// Makes a registered algorithm the one new hashes are produced with.
    #[must_use]
    pub fn with_default_algorithm(mut self, algorithm: &str) -> Self {
        self.default_algorithm = algorithm.to_owned();
        self
    }

    pub fn rules(&self) -> &PasswordRules {
        &self.rules
    }

    /// Hashes a plaintext with the default algorithm.
    ///
    /// # Errors
    ///
    /// `AuthError::Validation` if the plaintext is below the configured
    /// minimum length; `AuthError::PasswordHash` on hasher failure.
    pub fn hash(&self, plaintext: &SecretString) -> Result<StoredCredential, AuthError> {
        self.rules.validate(plaintext.expose_secret())?;

        let hasher = self
            .hashers
            .get(&self.default_algorithm)
            .ok_or(AuthError::PasswordHash)?;
        let hash = hasher.hash(plaintext.expose_secret())?;

        Ok(StoredCredential {
            hash,
            algorithm: self.default_algorithm.clone(),
        })
    }

    /// Checks a submitted plaintext against a user's stored credential.
    ///
    /// `Ok(false)` for password-less accounts, whatever the input - an absent
    /// hash never matches, not even the empty string. Otherwise dispatches on
    /// the stored algorithm tag; an unrecognized tag fails closed.
    pub fn verify(&self, user: &User, plaintext: &SecretString) -> Result<bool, AuthError> {
        let Some(credential) = user.credential.as_ref().filter(|c| !c.hash.is_empty()) else {
            return Ok(false);
        };

        let Some(hasher) = self.hashers.get(&credential.algorithm) else {
            log::warn!(
                target: "turnstile::credentials",
                "msg=\"unknown hash algorithm\" algorithm=\"{}\" user_id={}",
                credential.algorithm,
                user.id
            );
            return Ok(false);
        };

        hasher.verify(plaintext.expose_secret(), &credential.hash)
    }
}
