//! Session-cookie and OAuth2 login toolkit for web applications.
//!
//! `turnstile` covers the authentication core of a classic form-based web
//! application: password hashing and verification with per-user algorithm
//! tags, an identity carried in a signed client-held session cookie, CSRF
//! protection for state-changing submissions, and an OAuth2 login flow that
//! links provider accounts to local users.
//!
//! Storage is consumed through the [`UserRepository`] and [`LinkRepository`]
//! traits; a `sqlx` SQLite backend ships behind the `sqlite` feature and
//! in-memory mocks behind `mocks`. The HTTP surface (axum handlers, routes
//! and the auth-gate middleware) lives in [`api::axum`] behind `axum_api`.

use std::fmt;

pub mod actions;
pub mod api;
pub mod config;
pub mod credentials;
pub mod crypto;
pub mod csrf;
pub mod events;
pub mod oauth;
pub mod repository;
pub mod secret;
pub mod session;
#[cfg(feature = "sqlite")]
pub mod sqlite;
pub mod validators;

pub use config::AuthConfig;
pub use credentials::CredentialStore;
pub use csrf::CsrfGuard;
pub use events::register_event_listeners;
pub use oauth::{OAuthLinker, ProviderConfig, ProviderGateway};
pub use repository::{FederatedLink, Identity, LinkRepository, StoredCredential, User,
    UserRepository};
pub use secret::SecretString;
pub use session::{Session, SessionConfig, SessionManager};
pub use validators::ValidationError;

#[cfg(any(test, feature = "mocks"))]
pub use oauth::MockProviderGateway;
#[cfg(any(test, feature = "mocks"))]
pub use repository::{MockLinkRepository, MockUserRepository};

/// Errors produced by the authentication core.
///
/// Validation and credential failures are recoverable and rendered back into
/// the submitted form; storage and provider failures propagate unchanged to
/// the outermost handler, which translates them into an opaque response.
#[derive(Debug, Clone, PartialEq)]
pub enum AuthError {
    /// Form-level input failure (bad email, short password, mismatched
    /// confirmation).
    Validation(ValidationError),
    /// A user row with this email already exists.
    DuplicateEmail,
    /// A federated link for this (provider, account id) pair already exists.
    DuplicateLink,
    /// Wrong email or password. Deliberately does not say which.
    InvalidCredentials,
    UserNotFound,
    /// The submitted CSRF token does not belong to the caller's session.
    CsrfRejected,
    /// The OAuth callback `state` did not match the stashed nonce, or no
    /// nonce was stashed.
    InvalidOauthState,
    /// The provider rejected the authorization code.
    CodeExchange(String),
    /// Fetching or decoding the provider profile failed.
    ProfileFetch(String),
    /// An outbound provider call exceeded its deadline. Retryable.
    ProviderTimeout,
    /// Password hashing internals failed.
    PasswordHash,
    /// Invalid wiring (bad provider URLs, unbuildable HTTP client).
    Configuration(String),
    DatabaseError(String),
}

impl std::error::Error for AuthError {}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Validation(err) => err.fmt(f),
            AuthError::DuplicateEmail => write!(f, "User already exists"),
            AuthError::DuplicateLink => write!(f, "Provider account is already linked"),
            AuthError::InvalidCredentials => write!(f, "Invalid email or password"),
            AuthError::UserNotFound => write!(f, "User not found"),
            AuthError::CsrfRejected => write!(f, "Request rejected"),
            AuthError::InvalidOauthState => write!(f, "Invalid login state"),
            AuthError::CodeExchange(msg) => write!(f, "Code exchange failed: {msg}"),
            AuthError::ProfileFetch(msg) => write!(f, "Profile fetch failed: {msg}"),
            AuthError::ProviderTimeout => write!(f, "Login provider did not respond"),
            AuthError::PasswordHash => write!(f, "Failed to hash password"),
            AuthError::Configuration(msg) => write!(f, "Configuration error: {msg}"),
            AuthError::DatabaseError(msg) => write!(f, "Database error: {msg}"),
        }
    }
}

impl From<ValidationError> for AuthError {
    fn from(err: ValidationError) -> Self {
        AuthError::Validation(err)
    }
}
