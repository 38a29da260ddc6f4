//! Federated login: provider gateway and the account-linking state machine.
//!
//! [`OAuthLinker`] drives the two-phase flow. `start` stashes a random nonce
//! in the session and returns the provider authorization URL; `callback`
//! validates the returned `state` against that nonce, exchanges the code,
//! fetches the profile and resolves it to a local user.
//!
//! The network sits behind the [`ProviderGateway`] trait so the linker can be
//! exercised without a provider. [`OauthGateway`] is the real implementation.

mod gateway;
mod linker;

#[cfg(any(test, feature = "mocks"))]
mod gateway_mock;

pub use gateway::{ExchangedToken, OauthGateway, ProviderConfig, ProviderGateway,
    ProviderProfile};
pub use linker::OAuthLinker;

#[cfg(any(test, feature = "mocks"))]
pub use gateway_mock::MockProviderGateway;
