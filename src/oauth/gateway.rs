//! The outbound half of federated login: authorization URLs, code exchange
//! and profile fetch.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use oauth2::basic::BasicClient;
use oauth2::reqwest::async_http_client;
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, RedirectUrl, Scope,
    TokenResponse, TokenUrl,
};
use serde::Deserialize;
use tokio::time::timeout;

use crate::{AuthError, SecretString};

/// One configured OAuth2 provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// Tag stored on federated links, e.g. `"facebook"`.
    pub provider: String,
    pub client_id: String,
    pub client_secret: SecretString,
    pub auth_url: String,
    pub token_url: String,
    pub profile_url: String,
    pub redirect_url: String,
    pub scopes: Vec<String>,
    /// Attach a provider login to a pre-existing local account that shares
    /// the profile email. Only enable for providers that verify email
    /// ownership; with an unverified email this is an account takeover.
    pub merge_by_email: bool,
    /// Deadline for each outbound provider call.
    pub timeout: Duration,
}

impl ProviderConfig {
    /// Facebook login via the Graph API, requesting the `email` scope.
    ///
    /// Facebook only reports verified emails, so `merge_by_email` is on.
    pub fn facebook(
        client_id: impl Into<String>,
        client_secret: impl Into<SecretString>,
        redirect_url: impl Into<String>,
    ) -> Self {
        Self {
            provider: "facebook".to_owned(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: "https://www.facebook.com/v12.0/dialog/oauth".to_owned(),
            token_url: "https://graph.facebook.com/v12.0/oauth/access_token".to_owned(),
            profile_url: "https://graph.facebook.com/me".to_owned(),
            redirect_url: redirect_url.into(),
            scopes: vec!["email".to_owned()],
            merge_by_email: true,
            timeout: Duration::from_secs(10),
        }
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        if self.client_id.is_empty() {
            return Err("client_id must not be empty");
        }
        if self.client_secret.is_empty() {
            return Err("client_secret must not be empty");
        }
        if self.redirect_url.is_empty() {
            return Err("redirect_url must not be empty");
        }
        Ok(())
    }
}

/// The provider token obtained for an authorization code.
#[derive(Debug, Clone)]
pub struct ExchangedToken {
    pub access_token: SecretString,
    pub expires_at: DateTime<Utc>,
}

/// The provider's view of the logged-in account.
#[derive(Debug, Clone)]
pub struct ProviderProfile {
    pub account_id: String,
    pub email: String,
}

/// Outbound provider calls, abstracted so the linker is testable offline.
#[async_trait]
pub trait ProviderGateway: Send + Sync {
    /// The provider tag stored on federated links.
    fn provider(&self) -> &str;

    /// The authorization URL carrying `state` for the callback to verify.
    fn authorize_url(&self, state: &str) -> String;

    /// Exchanges an authorization code for a provider token.
    ///
    /// # Errors
    ///
    /// `AuthError::CodeExchange` when the provider rejects the code,
    /// `AuthError::ProviderTimeout` when the call exceeds its deadline.
    async fn exchange_code(&self, code: &str) -> Result<ExchangedToken, AuthError>;

    /// Fetches the account profile for an exchanged token.
    ///
    /// # Errors
    ///
    /// `AuthError::ProfileFetch` on transport or decoding failure,
    /// `AuthError::ProviderTimeout` on deadline expiry.
    async fn fetch_profile(&self, token: &ExchangedToken) -> Result<ProviderProfile, AuthError>;
}

#[derive(Debug, Deserialize)]
struct ProfileBody {
    id: String,
    email: Option<String>,
}

/// [`ProviderGateway`] over the `oauth2` crate and `reqwest`.
pub struct OauthGateway {
    config: ProviderConfig,
    client: BasicClient,
    http: reqwest::Client,
}

impl OauthGateway {
    /// Builds the gateway, validating the configured endpoints.
    ///
    /// # Errors
    ///
    /// `AuthError::Configuration` when a URL does not parse or the HTTP
    /// client cannot be constructed.
    pub fn new(config: ProviderConfig) -> Result<Self, AuthError> {
        config
            .validate()
            .map_err(|msg| AuthError::Configuration(msg.to_owned()))?;

        let auth_url = AuthUrl::new(config.auth_url.clone())
            .map_err(|e| AuthError::Configuration(format!("auth_url: {e}")))?;
        let token_url = TokenUrl::new(config.token_url.clone())
            .map_err(|e| AuthError::Configuration(format!("token_url: {e}")))?;
        let redirect_url = RedirectUrl::new(config.redirect_url.clone())
            .map_err(|e| AuthError::Configuration(format!("redirect_url: {e}")))?;

        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(
                config.client_secret.expose_secret().to_owned(),
            )),
            auth_url,
            Some(token_url),
        )
        .set_redirect_uri(redirect_url);

        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AuthError::Configuration(e.to_string()))?;

        Ok(Self {
            config,
            client,
            http,
        })
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }
}

#[async_trait]
impl ProviderGateway for OauthGateway {
    fn provider(&self) -> &str {
        &self.config.provider
    }

    fn authorize_url(&self, state: &str) -> String {
        let state = state.to_owned();
        let mut request = self.client.authorize_url(move || CsrfToken::new(state));
        for scope in &self.config.scopes {
            request = request.add_scope(Scope::new(scope.clone()));
        }

        let (url, _) = request.url();
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<ExchangedToken, AuthError> {
        let exchange = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_owned()))
            .request_async(async_http_client);

        let token = timeout(self.config.timeout, exchange)
            .await
            .map_err(|_| AuthError::ProviderTimeout)?
            .map_err(|e| {
                log::error!(
                    target: "turnstile::oauth",
                    "msg=\"code exchange failed\" provider=\"{}\" error=\"{e}\"",
                    self.config.provider
                );
                AuthError::CodeExchange(e.to_string())
            })?;

        let expires_at = token
            .expires_in()
            .and_then(|d| chrono::Duration::from_std(d).ok())
            .map_or_else(|| Utc::now() + chrono::Duration::hours(1), |d| Utc::now() + d);

        Ok(ExchangedToken {
            access_token: SecretString::new(token.access_token().secret().as_str()),
            expires_at,
        })
    }

    async fn fetch_profile(&self, token: &ExchangedToken) -> Result<ProviderProfile, AuthError> {
        let request = self
            .http
            .get(&self.config.profile_url)
            .query(&[("fields", "id,email")])
            .bearer_auth(token.access_token.expose_secret());

        let fetch = async {
            let response = request
                .send()
                .await
                .map_err(|e| AuthError::ProfileFetch(e.to_string()))?;

            if !response.status().is_success() {
                return Err(AuthError::ProfileFetch(format!(
                    "provider returned {}",
                    response.status()
                )));
            }

            response
                .json::<ProfileBody>()
                .await
                .map_err(|e| AuthError::ProfileFetch(e.to_string()))
        };

        let body = timeout(self.config.timeout, fetch)
            .await
            .map_err(|_| AuthError::ProviderTimeout)??;

        let email = body
            .email
            .ok_or_else(|| AuthError::ProfileFetch("profile carries no email".to_owned()))?;

        Ok(ProviderProfile {
            account_id: body.id,
            email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig::facebook("client-id", "client-secret", "https://app.test/login/oauth-callback")
    }

    #[test]
    fn facebook_preset() {
        let config = config();
        assert_eq!(config.provider, "facebook");
        assert_eq!(config.scopes, vec!["email".to_owned()]);
        assert!(config.merge_by_email);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_fields() {
        let mut config = config();
        config.client_id.clear();
        assert!(config.validate().is_err());

        let mut config = self::config();
        config.client_secret = SecretString::new("");
        assert!(config.validate().is_err());
    }

    #[test]
    fn authorize_url_carries_state_and_scope() {
        let gateway = OauthGateway::new(config()).unwrap();
        let url = gateway.authorize_url("nonce123");

        assert!(url.starts_with("https://www.facebook.com/v12.0/dialog/oauth"));
        assert!(url.contains("state=nonce123"));
        assert!(url.contains("scope=email"));
        assert!(url.contains("client_id=client-id"));
    }

    #[test]
    fn bad_endpoint_url_is_a_configuration_error() {
        let mut bad = config();
        bad.auth_url = "not a url".to_owned();
        assert!(matches!(
            OauthGateway::new(bad),
            Err(AuthError::Configuration(_))
        ));
    }
}
