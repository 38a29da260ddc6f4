use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::repository::{FederatedLink, LinkRepository, NewLink, User};
use crate::{AuthError, SecretString};

use super::user::{is_unique_violation, storage_error, UserRecord};

#[derive(Clone)]
pub struct SqliteLinkRepository {
    pool: SqlitePool,
}

impl SqliteLinkRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
struct LinkRecord {
    id: i64,
    user_id: i64,
    provider: String,
    provider_account_id: String,
    access_token: String,
    token_expires_at: DateTime<Utc>,
}

impl From<LinkRecord> for FederatedLink {
    fn from(row: LinkRecord) -> Self {
        FederatedLink {
            id: row.id,
            user_id: row.user_id,
            provider: row.provider,
            provider_account_id: row.provider_account_id,
            access_token: SecretString::new(row.access_token),
            token_expires_at: row.token_expires_at,
        }
    }
}

const INSERT_LINK: &str = "INSERT INTO federated_links \
    (user_id, provider, provider_account_id, access_token, token_expires_at, created_at) \
    VALUES (?, ?, ?, ?, ?, ?) \
    RETURNING id, user_id, provider, provider_account_id, access_token, token_expires_at";

#[async_trait]
impl LinkRepository for SqliteLinkRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_provider_account(
        &self,
        provider: &str,
        provider_account_id: &str,
    ) -> Result<Option<FederatedLink>, AuthError> {
        let row: Option<LinkRecord> = sqlx::query_as(
            "SELECT id, user_id, provider, provider_account_id, access_token, token_expires_at \
             FROM federated_links WHERE provider = ? AND provider_account_id = ?",
        )
        .bind(provider)
        .bind(provider_account_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("find_by_provider_account", e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, link), err))]
    async fn create_link(
        &self,
        user_id: i64,
        link: &NewLink<'_>,
    ) -> Result<FederatedLink, AuthError> {
        let row: LinkRecord = sqlx::query_as(INSERT_LINK)
            .bind(user_id)
            .bind(link.provider)
            .bind(link.provider_account_id)
            .bind(link.access_token.expose_secret())
            .bind(link.token_expires_at)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AuthError::DuplicateLink
                } else {
                    storage_error("create_link", e)
                }
            })?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, email, link), err))]
    async fn create_user_with_link(
        &self,
        email: &str,
        link: &NewLink<'_>,
    ) -> Result<(User, FederatedLink), AuthError> {
        // one transaction: a failure on either insert rolls back both, so no
        // orphaned user can persist
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| storage_error("begin", e))?;

        let now = Utc::now();
        let user_row: UserRecord = sqlx::query_as(
            "INSERT INTO users (email, password_hash, password_algo, created_at, updated_at) \
             VALUES (?, NULL, NULL, ?, ?) \
             RETURNING id, email, password_hash, password_algo",
        )
        .bind(email)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::DuplicateEmail
            } else {
                storage_error("create_user_with_link", e)
            }
        })?;

        let link_row: LinkRecord = sqlx::query_as(INSERT_LINK)
            .bind(user_row.id)
            .bind(link.provider)
            .bind(link.provider_account_id)
            .bind(link.access_token.expose_secret())
            .bind(link.token_expires_at)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AuthError::DuplicateLink
                } else {
                    storage_error("create_user_with_link", e)
                }
            })?;

        tx.commit().await.map_err(|e| storage_error("commit", e))?;

        Ok((user_row.into(), link_row.into()))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;
    use sqlx::sqlite::SqlitePoolOptions;

    use super::*;
    use crate::repository::UserRepository;
    use crate::sqlite::{migrations, SqliteUserRepository};

    async fn repos() -> (SqliteUserRepository, SqliteLinkRepository) {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        migrations::run(&pool).await.unwrap();
        (
            SqliteUserRepository::new(pool.clone()),
            SqliteLinkRepository::new(pool),
        )
    }

    fn sample<'a>(token: &'a SecretString) -> NewLink<'a> {
        NewLink {
            provider: "facebook",
            provider_account_id: "12345",
            access_token: token,
            token_expires_at: Utc::now() + Duration::hours(1),
        }
    }

    #[tokio::test]
    async fn create_user_with_link_persists_both_rows() {
        let (users, links) = repos().await;
        let token = SecretString::new("tok");

        let (user, link) = links
            .create_user_with_link("new@example.com", &sample(&token))
            .await
            .unwrap();

        assert_eq!(link.user_id, user.id);
        assert!(!user.has_password());

        let found = links
            .find_by_provider_account("facebook", "12345")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, link.id);
        assert!(users.find_by_id(user.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn duplicate_link_is_distinguishable() {
        let (users, links) = repos().await;
        let token = SecretString::new("tok");
        let user = users.create("a@example.com", None).await.unwrap();

        links.create_link(user.id, &sample(&token)).await.unwrap();
        let duplicate = links.create_link(user.id, &sample(&token)).await;

        assert_eq!(duplicate.unwrap_err(), AuthError::DuplicateLink);
    }

    #[tokio::test]
    async fn failed_link_insert_rolls_back_the_user() {
        let (users, links) = repos().await;
        let token = SecretString::new("tok");

        links
            .create_user_with_link("a@example.com", &sample(&token))
            .await
            .unwrap();

        // same provider account for a second email: the link insert fails
        // inside the transaction and the user row must not survive
        let result = links
            .create_user_with_link("b@example.com", &sample(&token))
            .await;
        assert_eq!(result.unwrap_err(), AuthError::DuplicateLink);
        assert!(users.find_by_email("b@example.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_email_creates_no_link() {
        let (users, links) = repos().await;
        let token = SecretString::new("tok");
        users.create("a@example.com", None).await.unwrap();

        let result = links
            .create_user_with_link("a@example.com", &sample(&token))
            .await;
        assert_eq!(result.unwrap_err(), AuthError::DuplicateEmail);
        assert!(links
            .find_by_provider_account("facebook", "12345")
            .await
            .unwrap()
            .is_none());
    }
}
