#![allow(clippy::unwrap_used)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use crate::{AuthError, SecretString};

use super::gateway::{ExchangedToken, ProviderGateway, ProviderProfile};

/// Offline [`ProviderGateway`] for tests.
///
/// Returns a configurable profile, counts exchange calls (so tests can prove
/// a rejected `state` never reached the provider) and treats the code
/// `"bad-code"` as rejected.
#[derive(Clone)]
pub struct MockProviderGateway {
    profile: Arc<Mutex<ProviderProfile>>,
    exchange_calls: Arc<AtomicUsize>,
}

impl MockProviderGateway {
    pub fn new(account_id: &str, email: &str) -> Self {
        Self {
            profile: Arc::new(Mutex::new(ProviderProfile {
                account_id: account_id.to_owned(),
                email: email.to_owned(),
            })),
            exchange_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Swaps the profile the provider will report next.
    pub fn set_profile(&self, account_id: &str, email: &str) {
        *self.profile.lock().unwrap() = ProviderProfile {
            account_id: account_id.to_owned(),
            email: email.to_owned(),
        };
    }

    /// How many code exchanges have been attempted.
    pub fn exchange_count(&self) -> usize {
        self.exchange_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ProviderGateway for MockProviderGateway {
    fn provider(&self) -> &str {
        "facebook"
    }

    fn authorize_url(&self, state: &str) -> String {
        format!("https://provider.test/authorize?state={state}")
    }

    async fn exchange_code(&self, code: &str) -> Result<ExchangedToken, AuthError> {
        self.exchange_calls.fetch_add(1, Ordering::SeqCst);

        if code == "bad-code" {
            return Err(AuthError::CodeExchange("invalid code".to_owned()));
        }

        Ok(ExchangedToken {
            access_token: SecretString::new(format!("token-for-{code}")),
            expires_at: Utc::now() + Duration::hours(1),
        })
    }

    async fn fetch_profile(&self, _token: &ExchangedToken) -> Result<ProviderProfile, AuthError> {
        Ok(self.profile.lock().unwrap().clone())
    }
}
