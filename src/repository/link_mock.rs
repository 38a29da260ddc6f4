#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::AuthError;

use super::link::{FederatedLink, LinkRepository, NewLink};
use super::user::User;
use super::user_mock::MockUserRepository;

/// In-memory link repository for tests and examples.
///
/// Shares a [`MockUserRepository`] so `create_user_with_link` behaves like
/// the transactional backend: a duplicate email creates neither row.
#[derive(Clone)]
pub struct MockLinkRepository {
    pub links: Arc<Mutex<Vec<FederatedLink>>>,
    pub users: MockUserRepository,
}

impl MockLinkRepository {
    pub fn new(users: MockUserRepository) -> Self {
        Self {
            links: Arc::new(Mutex::new(Vec::new())),
            users,
        }
    }

    fn insert(&self, user_id: i64, link: &NewLink<'_>) -> Result<FederatedLink, AuthError> {
        let mut links = self.links.lock().unwrap();
        if links
            .iter()
            .any(|l| l.provider == link.provider && l.provider_account_id == link.provider_account_id)
        {
            return Err(AuthError::DuplicateLink);
        }

        let row = FederatedLink {
            id: links.iter().map(|l| l.id).max().unwrap_or(0) + 1,
            user_id,
            provider: link.provider.to_owned(),
            provider_account_id: link.provider_account_id.to_owned(),
            access_token: link.access_token.clone(),
            token_expires_at: link.token_expires_at,
        };
        links.push(row.clone());

        Ok(row)
    }
}

#[async_trait]
impl LinkRepository for MockLinkRepository {
    async fn find_by_provider_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<FederatedLink>, AuthError> {
        let links = self.links.lock().unwrap();
        Ok(links
            .iter()
            .find(|l| l.provider == provider && l.provider_account_id == provider_account_id)
            .cloned())
    }

    async fn create_link(
        &self,
        user_id: i64,
        link: &NewLink<'_>,
    ) -> Result<FederatedLink, AuthError> {
        self.insert(user_id, link)
    }

    async fn create_user_with_link(
        &self,
        email: &str,
        link: &NewLink<'_>,
    ) -> Result<(User, FederatedLink), AuthError> {
        use super::user::UserRepository;

        let user = self.users.create(email, None).await?;
        match self.insert(user.id, link) {
            Ok(row) => Ok((user, row)),
            Err(err) => {
                // roll back the user row to mirror the transactional backend
                self.users.users.lock().unwrap().retain(|u| u.id != user.id);
                Err(err)
            }
        }
    }
}
