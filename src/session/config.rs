use chrono::Duration;

use crate::SecretString;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SameSite {
    None,
    // Lax is required for the OAuth callback: the provider redirect is a
    // top-level cross-site navigation and must still carry the cookie
    // holding the state nonce.
    #[default]
    Lax,
    Strict,
}

impl SameSite {
    pub fn as_str(self) -> &'static str {
        match self {
            SameSite::None => "None",
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
        }
    }
}

/// Cookie attributes and the signing key for the session token.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub cookie_path: String,
    pub cookie_domain: Option<String>,
    pub cookie_secure: bool,
    pub cookie_http_only: bool,
    pub cookie_same_site: SameSite,
    /// Max-Age of the session cookie.
    pub cookie_max_age: Duration,
    /// HMAC key for sealing the payload. Must be at least 32 bytes.
    pub secret_key: SecretString,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: "account_session".to_owned(),
            cookie_path: "/".to_owned(),
            cookie_domain: None,
            cookie_secure: true,
            cookie_http_only: true,
            cookie_same_site: SameSite::Lax,
            cookie_max_age: Duration::days(7),
            secret_key: SecretString::new(""),
        }
    }
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.secret_key.is_empty() {
            return Err("secret_key must not be empty");
        }
        if self.secret_key.len() < 32 {
            return Err("secret_key should be at least 32 bytes");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.cookie_name, "account_session");
        assert!(config.cookie_secure);
        assert!(config.cookie_http_only);
        assert_eq!(config.cookie_same_site, SameSite::Lax);
    }

    #[test]
    fn validate_rejects_weak_secrets() {
        let empty = SessionConfig::default();
        assert!(empty.validate().is_err());

        let short = SessionConfig {
            secret_key: SecretString::new("short"),
            ..Default::default()
        };
        assert!(short.validate().is_err());

        let ok = SessionConfig {
            secret_key: SecretString::new("a-signing-key-that-is-long-enough-to-use"),
            ..Default::default()
        };
        assert!(ok.validate().is_ok());
    }
}
