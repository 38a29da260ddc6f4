use chrono::Utc;

use crate::credentials::CredentialStore;
use crate::events::{dispatch, AuthEvent};
use crate::repository::Identity;
use crate::validators::validate_confirmation;
use crate::{AuthError, SecretString, UserRepository};

/// Changes the password of a logged-in user.
pub struct ChangePasswordAction<U> {
    users: U,
    credentials: CredentialStore,
}

impl<U: UserRepository> ChangePasswordAction<U> {
    pub fn new(users: U, credentials: CredentialStore) -> Self {
        ChangePasswordAction { users, credentials }
    }

    /// Verifies the current password and stores the new one.
    ///
    /// The session carries only the identity, so the stored credential is
    /// reloaded here. For a password-less account (created through a
    /// federated login) the current-password check is skipped: there is
    /// nothing to check, and the user is setting a first password.
    ///
    /// # Errors
    ///
    /// `InvalidCredentials` when the current password is wrong; `Validation`
    /// when the new password or its confirmation fails the rules.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "change_password", skip_all, err)
    )]
    pub async fn execute(
        &self,
        identity: &Identity,
        current_password: &SecretString,
        new_password: &SecretString,
        confirmation: &SecretString,
    ) -> Result<(), AuthError> {
        let user = self.users.ensure_full(identity).await?;

        if user.has_password() && !self.credentials.verify(&user, current_password)? {
            return Err(AuthError::InvalidCredentials);
        }

        self.credentials
            .rules()
            .validate(new_password.expose_secret())?;
        validate_confirmation(new_password.expose_secret(), confirmation.expose_secret())?;

        let credential = self.credentials.hash(new_password)?;
        self.users.update_credential(user.id, &credential).await?;

        dispatch(AuthEvent::PasswordChanged {
            user_id: user.id,
            at: Utc::now(),
        })
        .await;

        log::info!(
            target: "turnstile",
            "msg=\"password changed\" user_id={}",
            user.id
        );

        Ok(())
    }
}
