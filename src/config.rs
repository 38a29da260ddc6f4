//! Configuration for the authentication subsystem.
//!
//! One explicitly constructed [`AuthConfig`] is injected into the components
//! that need it; there are no global singletons. Provider settings live in
//! [`ProviderConfig`](crate::oauth::ProviderConfig) and are passed to the
//! gateway separately.
//!
//! # Example
//!
//! ```rust
//! use turnstile::config::AuthConfig;
//! use turnstile::session::SessionConfig;
//! use turnstile::validators::PasswordRules;
//! use turnstile::SecretString;
//!
//! let config = AuthConfig {
//!     session: SessionConfig {
//!         secret_key: SecretString::new("a-signing-key-that-is-long-enough-to-use"),
//!         ..Default::default()
//!     },
//!     password_rules: PasswordRules::new().min(8),
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use crate::session::SessionConfig;
use crate::validators::PasswordRules;

/// Where the handlers redirect.
///
/// `login` must match wherever the account routes are mounted; `home` is the
/// fallback target after login and logout.
#[derive(Debug, Clone)]
pub struct RoutePaths {
    pub home: String,
    pub login: String,
}

impl Default for RoutePaths {
    fn default() -> Self {
        Self {
            home: "/".to_owned(),
            login: "/login".to_owned(),
        }
    }
}

/// Top-level configuration: session cookie, password rules, redirect paths.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    pub session: SessionConfig,
    pub password_rules: PasswordRules,
    pub paths: RoutePaths,
}

impl AuthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn validate(&self) -> Result<(), &'static str> {
        self.session.validate()
    }
}
