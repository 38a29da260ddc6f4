#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::AuthError;

use super::user::{StoredCredential, User, UserRepository};

/// In-memory user repository for tests and examples.
///
/// Enforces email uniqueness the way a real backend does, so duplicate
/// signups surface as [`AuthError::DuplicateEmail`].
#[derive(Clone, Default)]
pub struct MockUserRepository {
    pub users: Arc<Mutex<Vec<User>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let users = self.users.lock().unwrap();
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn create(
        &self,
        email: &str,
        credential: Option<&StoredCredential>,
    ) -> Result<User, AuthError> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == email) {
            return Err(AuthError::DuplicateEmail);
        }

        let user = User {
            id: users.iter().map(|u| u.id).max().unwrap_or(0) + 1,
            email: email.to_owned(),
            credential: credential.cloned(),
        };
        users.push(user.clone());

        Ok(user)
    }

    async fn update_credential(
        &self,
        user_id: i64,
        credential: &StoredCredential,
    ) -> Result<(), AuthError> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == user_id) {
            user.credential = Some(credential.clone());
            Ok(())
        } else {
            Err(AuthError::UserNotFound)
        }
    }
}
