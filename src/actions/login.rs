use chrono::Utc;

use crate::credentials::CredentialStore;
use crate::events::{dispatch, AuthEvent};
use crate::repository::Identity;
use crate::{AuthError, SecretString, UserRepository};

/// Authenticates a password login form.
pub struct LoginAction<U> {
    users: U,
    credentials: CredentialStore,
}

impl<U: UserRepository> LoginAction<U> {
    pub fn new(users: U, credentials: CredentialStore) -> Self {
        LoginAction { users, credentials }
    }

    /// Looks up the user and verifies the password.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` for an unknown email, a wrong password and a
    /// password-less account alike - callers must not be able to tell which.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "login", skip_all, err)
    )]
    pub async fn execute(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<Identity, AuthError> {
        let user = self.users.find_by_email(email).await?;

        if let Some(user) = user {
            if self.credentials.verify(&user, password)? {
                dispatch(AuthEvent::LoginSucceeded {
                    user_id: user.id,
                    email: user.email.clone(),
                    at: Utc::now(),
                })
                .await;

                log::info!(
                    target: "turnstile",
                    "msg=\"login success\" user_id={}",
                    user.id
                );

                return Ok(user.identity());
            }
        }

        dispatch(AuthEvent::LoginFailed {
            email: email.to_owned(),
            at: Utc::now(),
        })
        .await;

        Err(AuthError::InvalidCredentials)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserRepository;

    async fn seeded_action(
        email: &str,
        password: &str,
    ) -> (LoginAction<MockUserRepository>, MockUserRepository) {
        let store = CredentialStore::default();
        let credential = store.hash(&SecretString::new(password)).unwrap();

        let users = MockUserRepository::new();
        users.create(email, Some(&credential)).await.unwrap();

        (LoginAction::new(users.clone(), store), users)
    }

    #[tokio::test]
    async fn correct_password_yields_the_identity() {
        let (action, _) = seeded_action("user@example.com", "securepassword").await;

        let identity = action
            .execute("user@example.com", &SecretString::new("securepassword"))
            .await
            .unwrap();
        assert_eq!(identity.email, "user@example.com");
    }

    #[tokio::test]
    async fn wrong_password_and_unknown_email_look_alike() {
        let (action, _) = seeded_action("user@example.com", "securepassword").await;

        let wrong_password = action
            .execute("user@example.com", &SecretString::new("nope"))
            .await;
        let unknown_email = action
            .execute("other@example.com", &SecretString::new("securepassword"))
            .await;

        assert_eq!(wrong_password.unwrap_err(), AuthError::InvalidCredentials);
        assert_eq!(unknown_email.unwrap_err(), AuthError::InvalidCredentials);
    }

    #[tokio::test]
    async fn passwordless_account_rejects_every_password() {
        let users = MockUserRepository::new();
        users.create("oauth@example.com", None).await.unwrap();
        let action = LoginAction::new(users, CredentialStore::default());

        let empty = action
            .execute("oauth@example.com", &SecretString::new(""))
            .await;
        assert_eq!(empty.unwrap_err(), AuthError::InvalidCredentials);

        let nonempty = action
            .execute("oauth@example.com", &SecretString::new("guess"))
            .await;
        assert_eq!(nonempty.unwrap_err(), AuthError::InvalidCredentials);
    }
}
