use chrono::Utc;

use crate::credentials::CredentialStore;
use crate::events::{dispatch, AuthEvent};
use crate::repository::Identity;
use crate::validators::{validate_confirmation, validate_email};
use crate::{AuthError, SecretString, UserRepository};

/// Creates a local account from a signup form.
pub struct SignupAction<U> {
    users: U,
    credentials: CredentialStore,
}

impl<U: UserRepository> SignupAction<U> {
    pub fn new(users: U, credentials: CredentialStore) -> Self {
        SignupAction { users, credentials }
    }

    /// Validates the form, hashes the password and persists the user.
    ///
    /// # Errors
    ///
    /// `Validation` on a bad email, short password or mismatched
    /// confirmation; `DuplicateEmail` when the email is taken (the storage
    /// constraint is the authority, there is no pre-check to race with).
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "signup", skip_all, err)
    )]
    pub async fn execute(
        &self,
        email: &str,
        password: &SecretString,
        confirmation: &SecretString,
    ) -> Result<Identity, AuthError> {
        validate_email(email)?;
        self.credentials
            .rules()
            .validate(password.expose_secret())?;
        validate_confirmation(password.expose_secret(), confirmation.expose_secret())?;

        let credential = self.credentials.hash(password)?;
        let user = self.users.create(email, Some(&credential)).await?;

        dispatch(AuthEvent::UserRegistered {
            user_id: user.id,
            email: user.email.clone(),
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "turnstile",
            "msg=\"signup success\" user_id={}",
            user.id
        );

        Ok(user.identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockUserRepository;
    use crate::validators::ValidationError;

    fn action(users: MockUserRepository) -> SignupAction<MockUserRepository> {
        SignupAction::new(users, CredentialStore::default())
    }

    #[tokio::test]
    async fn signup_persists_a_verifiable_credential() {
        let users = MockUserRepository::new();
        let action = action(users.clone());

        let identity = action
            .execute(
                "new@x.com",
                &SecretString::new("abcd"),
                &SecretString::new("abcd"),
            )
            .await
            .unwrap();
        assert_eq!(identity.email, "new@x.com");

        let user = users.find_by_email("new@x.com").await.unwrap().unwrap();
        assert!(user.has_password());
        assert!(CredentialStore::default()
            .verify(&user, &SecretString::new("abcd"))
            .unwrap());
    }

    #[tokio::test]
    async fn short_password_inserts_nothing() {
        let users = MockUserRepository::new();
        let action = action(users.clone());

        let result = action
            .execute(
                "new@x.com",
                &SecretString::new("ab"),
                &SecretString::new("ab"),
            )
            .await;

        assert_eq!(
            result.unwrap_err(),
            AuthError::Validation(ValidationError::PasswordTooShort(4))
        );
        assert!(users.users.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn mismatched_confirmation_is_rejected() {
        let action = action(MockUserRepository::new());

        let result = action
            .execute(
                "new@x.com",
                &SecretString::new("abcd"),
                &SecretString::new("abce"),
            )
            .await;

        assert_eq!(
            result.unwrap_err(),
            AuthError::Validation(ValidationError::PasswordMismatch)
        );
    }

    #[tokio::test]
    async fn invalid_email_is_rejected() {
        let action = action(MockUserRepository::new());

        let result = action
            .execute(
                "not-an-email",
                &SecretString::new("abcd"),
                &SecretString::new("abcd"),
            )
            .await;

        assert_eq!(
            result.unwrap_err(),
            AuthError::Validation(ValidationError::EmailInvalidFormat)
        );
    }

    #[tokio::test]
    async fn second_signup_with_same_email_fails() {
        let users = MockUserRepository::new();
        let action = action(users.clone());

        let first = action
            .execute(
                "a@example.com",
                &SecretString::new("abcd"),
                &SecretString::new("abcd"),
            )
            .await
            .unwrap();

        let second = action
            .execute(
                "a@example.com",
                &SecretString::new("efgh"),
                &SecretString::new("efgh"),
            )
            .await;
        assert_eq!(second.unwrap_err(), AuthError::DuplicateEmail);

        // the first user's row is unaffected
        let user = users.find_by_email("a@example.com").await.unwrap().unwrap();
        assert_eq!(user.id, first.user_id);
    }
}
