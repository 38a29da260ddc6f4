use async_trait::async_trait;
use chrono::Utc;
use sqlx::{FromRow, SqlitePool};

use crate::repository::{StoredCredential, User, UserRepository};
use crate::AuthError;

#[derive(Clone)]
pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(FromRow)]
pub(crate) struct UserRecord {
    pub(crate) id: i64,
    pub(crate) email: String,
    pub(crate) password_hash: Option<String>,
    pub(crate) password_algo: Option<String>,
}

impl From<UserRecord> for User {
    fn from(row: UserRecord) -> Self {
        // an empty hash column means a password-less account
        let credential = match (row.password_hash, row.password_algo) {
            (Some(hash), Some(algorithm)) if !hash.is_empty() => {
                Some(StoredCredential { hash, algorithm })
            }
            _ => None,
        };

        User {
            id: row.id,
            email: row.email,
            credential,
        }
    }
}

pub(crate) fn storage_error(operation: &str, e: sqlx::Error) -> AuthError {
    log::error!(
        target: "turnstile::sqlite",
        "msg=\"database error\" operation=\"{operation}\" error=\"{e}\""
    );
    AuthError::DatabaseError(e.to_string())
}

pub(crate) fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self), err))]
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, AuthError> {
        let row: Option<UserRecord> = sqlx::query_as(
            "SELECT id, email, password_hash, password_algo FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("find_by_id", e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, email), err))]
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row: Option<UserRecord> = sqlx::query_as(
            "SELECT id, email, password_hash, password_algo FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("find_by_email", e))?;

        Ok(row.map(Into::into))
    }

    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(skip(self, email, credential), err)
    )]
    async fn create(
        &self,
        email: &str,
        credential: Option<&StoredCredential>,
    ) -> Result<User, AuthError> {
        let now = Utc::now();
        let row: UserRecord = sqlx::query_as(
            "INSERT INTO users (email, password_hash, password_algo, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?) \
             RETURNING id, email, password_hash, password_algo",
        )
        .bind(email)
        .bind(credential.map(|c| c.hash.as_str()))
        .bind(credential.map(|c| c.algorithm.as_str()))
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AuthError::DuplicateEmail
            } else {
                storage_error("create", e)
            }
        })?;

        Ok(row.into())
    }

    #[cfg_attr(feature = "tracing", tracing::instrument(skip(self, credential), err))]
    async fn update_credential(
        &self,
        user_id: i64,
        credential: &StoredCredential,
    ) -> Result<(), AuthError> {
        let result = sqlx::query(
            "UPDATE users SET password_hash = ?, password_algo = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&credential.hash)
        .bind(&credential.algorithm)
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("update_credential", e))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }

        Ok(())
    }
}
