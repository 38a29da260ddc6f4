//! The account-linking state machine behind federated login.

use chrono::Utc;

use crate::crypto::random_url_token;
use crate::events::{dispatch, AuthEvent};
use crate::repository::{Identity, LinkRepository, NewLink, User, UserRepository};
use crate::session::Session;
use crate::AuthError;

use super::gateway::{ExchangedToken, ProviderGateway, ProviderProfile};

/// Bytes of entropy in the `state` nonce.
const STATE_NONCE_BYTES: usize = 16;

/// Drives federated login from authorization URL to a local [`Identity`].
pub struct OAuthLinker<U, L, G> {
    users: U,
    links: L,
    gateway: G,
    merge_by_email: bool,
}

impl<U, L, G> OAuthLinker<U, L, G>
where
    U: UserRepository,
    L: LinkRepository,
    G: ProviderGateway,
{
    pub fn new(users: U, links: L, gateway: G) -> Self {
        Self {
            users,
            links,
            gateway,
            merge_by_email: false,
        }
    }

    /// Allows a provider login to attach to an existing local account that
    /// shares the profile email. Only safe when the provider verifies email
    /// ownership; see [`ProviderConfig::merge_by_email`](super::ProviderConfig).
    #[must_use]
    pub fn with_email_merge(mut self) -> Self {
        self.merge_by_email = true;
        self
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Phase one: mint a nonce, stash it in the session, hand back the
    /// provider authorization URL carrying it as `state`.
    ///
    /// The caller must persist the mutated session in its response cookie.
    pub fn start(&self, session: &mut Session) -> String {
        let state = random_url_token(STATE_NONCE_BYTES);
        session.stash_oauth_state(state.clone());
        self.gateway.authorize_url(&state)
    }

    /// Phase two: validate `state`, exchange `code`, fetch the profile and
    /// resolve it to a local user.
    ///
    /// The stashed nonce is consumed whether or not it matches, so it can
    /// never be replayed; the caller must persist the mutated session even on
    /// failure.
    ///
    /// # Errors
    ///
    /// `InvalidOauthState` before any network call on nonce mismatch or
    /// absence; `CodeExchange`/`ProfileFetch`/`ProviderTimeout` from the
    /// gateway; storage errors from resolution.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(name = "oauth_callback", skip_all, err)
    )]
    pub async fn callback(
        &self,
        session: &mut Session,
        state: &str,
        code: &str,
    ) -> Result<Identity, AuthError> {
        let stashed = session.take_oauth_state();
        if stashed.as_deref() != Some(state) {
            log::warn!(
                target: "turnstile::oauth",
                "msg=\"oauth state rejected\" provider=\"{}\" stashed={}",
                self.gateway.provider(),
                stashed.is_some()
            );
            return Err(AuthError::InvalidOauthState);
        }

        let token = self.gateway.exchange_code(code).await?;
        let profile = self.gateway.fetch_profile(&token).await?;
        let user = self.resolve(&profile, &token).await?;

        dispatch(AuthEvent::FederatedLoginSucceeded {
            user_id: user.id,
            provider: self.gateway.provider().to_owned(),
            at: Utc::now(),
        })
        .await;

        Ok(user.identity())
    }

    /// Maps a provider profile to a local user, creating rows as needed.
    ///
    /// Idempotent for an already-linked account. User+link creation is one
    /// transaction in the repository, so no orphaned user can persist; a
    /// concurrent login for the same provider account loses the insert race
    /// and re-reads the winner's link.
    async fn resolve(
        &self,
        profile: &ProviderProfile,
        token: &ExchangedToken,
    ) -> Result<User, AuthError> {
        let provider = self.gateway.provider();

        if let Some(link) = self
            .links
            .find_by_provider_account(provider, &profile.account_id)
            .await?
        {
            return self
                .users
                .find_by_id(link.user_id)
                .await?
                .ok_or(AuthError::UserNotFound);
        }

        let new_link = NewLink {
            provider,
            provider_account_id: &profile.account_id,
            access_token: &token.access_token,
            token_expires_at: token.expires_at,
        };

        if self.merge_by_email {
            if let Some(user) = self.users.find_by_email(&profile.email).await? {
                return match self.links.create_link(user.id, &new_link).await {
                    Ok(_link) => {
                        self.link_created(&user, provider).await;
                        Ok(user)
                    }
                    Err(AuthError::DuplicateLink) => self.linked_owner(profile).await,
                    Err(err) => Err(err),
                };
            }
        }

        match self.links.create_user_with_link(&profile.email, &new_link).await {
            Ok((user, _link)) => {
                self.link_created(&user, provider).await;
                Ok(user)
            }
            Err(AuthError::DuplicateLink) => self.linked_owner(profile).await,
            Err(err) => Err(err),
        }
    }

    /// Re-reads the owner after losing a concurrent link-insert race.
    async fn linked_owner(&self, profile: &ProviderProfile) -> Result<User, AuthError> {
        let link = self
            .links
            .find_by_provider_account(self.gateway.provider(), &profile.account_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        self.users
            .find_by_id(link.user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    async fn link_created(&self, user: &User, provider: &str) {
        dispatch(AuthEvent::FederatedLinkCreated {
            user_id: user.id,
            provider: provider.to_owned(),
            at: Utc::now(),
        })
        .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oauth::MockProviderGateway;
    use crate::repository::{MockLinkRepository, MockUserRepository};
    use crate::session::{SessionConfig, SessionManager};

    fn session() -> Session {
        SessionManager::new(SessionConfig::default()).open(None)
    }

    fn linker(
        users: MockUserRepository,
        links: MockLinkRepository,
        gateway: MockProviderGateway,
    ) -> OAuthLinker<MockUserRepository, MockLinkRepository, MockProviderGateway> {
        OAuthLinker::new(users, links, gateway)
    }

    #[test]
    fn start_stashes_the_nonce_it_sends() {
        let users = MockUserRepository::new();
        let links = MockLinkRepository::new(users.clone());
        let linker = linker(users, links, MockProviderGateway::new("77", "a@example.com"));

        let mut session = session();
        let url = linker.start(&mut session);

        let stashed = session.take_oauth_state().unwrap();
        assert!(url.contains(&format!("state={stashed}")));
    }

    #[tokio::test]
    async fn mismatched_state_never_reaches_the_provider() {
        let users = MockUserRepository::new();
        let links = MockLinkRepository::new(users.clone());
        let gateway = MockProviderGateway::new("77", "a@example.com");
        let linker = linker(users, links, gateway.clone());

        let mut session = session();
        linker.start(&mut session);

        let result = linker.callback(&mut session, "wrong-state", "code").await;
        assert_eq!(result.unwrap_err(), AuthError::InvalidOauthState);
        assert_eq!(gateway.exchange_count(), 0);

        // the nonce was consumed: replaying the correct state also fails now
        assert_eq!(session.take_oauth_state(), None);
    }

    #[tokio::test]
    async fn missing_nonce_is_rejected() {
        let users = MockUserRepository::new();
        let links = MockLinkRepository::new(users.clone());
        let gateway = MockProviderGateway::new("77", "a@example.com");
        let linker = linker(users, links, gateway.clone());

        let mut session = session();
        let result = linker.callback(&mut session, "any-state", "code").await;

        assert_eq!(result.unwrap_err(), AuthError::InvalidOauthState);
        assert_eq!(gateway.exchange_count(), 0);
    }

    #[tokio::test]
    async fn first_login_creates_user_and_link() {
        let users = MockUserRepository::new();
        let links = MockLinkRepository::new(users.clone());
        let linker = linker(
            users.clone(),
            links.clone(),
            MockProviderGateway::new("77", "new@example.com"),
        );

        let mut session = session();
        let url = linker.start(&mut session);
        let state = url.rsplit_once("state=").unwrap().1.to_owned();

        let identity = linker.callback(&mut session, &state, "code").await.unwrap();
        assert_eq!(identity.email, "new@example.com");

        let user = users.find_by_email("new@example.com").await.unwrap().unwrap();
        assert!(!user.has_password());
        assert_eq!(links.links.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn relogin_is_idempotent() {
        let users = MockUserRepository::new();
        let links = MockLinkRepository::new(users.clone());
        let linker = linker(
            users.clone(),
            links.clone(),
            MockProviderGateway::new("77", "new@example.com"),
        );

        let mut first = session();
        let state = linker.start(&mut first).rsplit_once("state=").unwrap().1.to_owned();
        let first_identity = linker.callback(&mut first, &state, "code").await.unwrap();

        let mut second = session();
        let state = linker.start(&mut second).rsplit_once("state=").unwrap().1.to_owned();
        let second_identity = linker.callback(&mut second, &state, "code").await.unwrap();

        assert_eq!(first_identity.user_id, second_identity.user_id);
        assert_eq!(links.links.lock().unwrap().len(), 1);
        assert_eq!(users.users.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn email_merge_links_to_the_existing_account() {
        let users = MockUserRepository::new();
        users.create("local@example.com", None).await.unwrap();
        let links = MockLinkRepository::new(users.clone());
        let linker = linker(
            users.clone(),
            links.clone(),
            MockProviderGateway::new("77", "local@example.com"),
        )
        .with_email_merge();

        let mut session = session();
        let state = linker.start(&mut session).rsplit_once("state=").unwrap().1.to_owned();
        let identity = linker.callback(&mut session, &state, "code").await.unwrap();

        assert_eq!(identity.email, "local@example.com");
        assert_eq!(users.users.lock().unwrap().len(), 1);
        assert_eq!(links.links.lock().unwrap()[0].user_id, identity.user_id);
    }

    #[tokio::test]
    async fn without_merge_a_shared_email_is_a_duplicate() {
        let users = MockUserRepository::new();
        users.create("local@example.com", None).await.unwrap();
        let links = MockLinkRepository::new(users.clone());
        let linker = linker(
            users.clone(),
            links.clone(),
            MockProviderGateway::new("77", "local@example.com"),
        );

        let mut session = session();
        let state = linker.start(&mut session).rsplit_once("state=").unwrap().1.to_owned();
        let result = linker.callback(&mut session, &state, "code").await;

        assert_eq!(result.unwrap_err(), AuthError::DuplicateEmail);
        assert!(links.links.lock().unwrap().is_empty());
        assert_eq!(users.users.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn rejected_code_propagates() {
        let users = MockUserRepository::new();
        let links = MockLinkRepository::new(users.clone());
        let linker = linker(
            users.clone(),
            links,
            MockProviderGateway::new("77", "a@example.com"),
        );

        let mut session = session();
        let state = linker.start(&mut session).rsplit_once("state=").unwrap().1.to_owned();
        let result = linker.callback(&mut session, &state, "bad-code").await;

        assert!(matches!(result.unwrap_err(), AuthError::CodeExchange(_)));
        assert!(users.users.lock().unwrap().is_empty());
    }
}
