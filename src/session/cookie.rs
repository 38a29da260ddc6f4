//! Sealed cookie codec for the client-held session payload.
//!
//! The cookie value is `base64url(payload) "." hex(hmac_sha256(key, base64url))`.
//! The client can read neither field meaningfully nor alter either without
//! breaking the signature.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;

use crate::crypto::{constant_time_eq, hmac_sha256};
use crate::SecretString;

use super::config::SessionConfig;

/// Seals a serialized payload into a cookie value.
///
/// Deterministic: sealing the same bytes twice yields the same value, which
/// makes re-saving an unchanged session idempotent.
pub(crate) fn seal(payload: &[u8], secret: &SecretString) -> String {
    let encoded = URL_SAFE_NO_PAD.encode(payload);
    let signature = hmac_sha256(secret.expose_secret().as_bytes(), encoded.as_bytes());
    format!("{}.{}", encoded, hex::encode(signature))
}

/// Verifies a sealed cookie value and returns the payload bytes.
///
/// Returns `None` on any malformation or signature mismatch.
pub(crate) fn unseal(value: &str, secret: &SecretString) -> Option<Vec<u8>> {
    let (encoded, signature_hex) = value.rsplit_once('.')?;

    let actual_sig = hex::decode(signature_hex).ok()?;
    let expected_sig = hmac_sha256(secret.expose_secret().as_bytes(), encoded.as_bytes());

    if !constant_time_eq(&expected_sig, &actual_sig) {
        log::warn!(
            target: "turnstile::session",
            "msg=\"session cookie tampered\" cookie_prefix=\"{}...\"",
            &value.chars().take(8).collect::<String>()
        );
        return None;
    }

    URL_SAFE_NO_PAD.decode(encoded).ok()
}

/// Picks the named cookie out of a raw `Cookie` header value.
pub(crate) fn find_cookie<'a>(header: &'a str, name: &str) -> Option<&'a str> {
    header
        .split(';')
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}

/// Formats the full `Set-Cookie` value for a sealed session.
pub(crate) fn format_set_cookie(config: &SessionConfig, value: &str) -> String {
    let mut cookie = format!(
        "{}={}; Path={}; Max-Age={}; SameSite={}",
        config.cookie_name,
        value,
        config.cookie_path,
        config.cookie_max_age.num_seconds(),
        config.cookie_same_site.as_str(),
    );

    if let Some(domain) = &config.cookie_domain {
        cookie.push_str("; Domain=");
        cookie.push_str(domain);
    }
    if config.cookie_secure {
        cookie.push_str("; Secure");
    }
    if config.cookie_http_only {
        cookie.push_str("; HttpOnly");
    }

    cookie
}

/// Formats a `Set-Cookie` value that expires the session immediately.
pub(crate) fn format_removal_cookie(config: &SessionConfig) -> String {
    format!(
        "{}=; Path={}; Max-Age=0",
        config.cookie_name, config.cookie_path
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secret() -> SecretString {
        SecretString::new("a-signing-key-that-is-long-enough-to-use")
    }

    #[test]
    fn seal_and_unseal_round_trip() {
        let sealed = seal(b"{\"hello\":1}", &secret());
        assert_eq!(unseal(&sealed, &secret()).unwrap(), b"{\"hello\":1}");
    }

    #[test]
    fn sealing_is_deterministic() {
        assert_eq!(seal(b"payload", &secret()), seal(b"payload", &secret()));
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let sealed = seal(b"payload", &secret());
        let signature = sealed.rsplit_once('.').unwrap().1;
        let tampered = format!("{}.{}", URL_SAFE_NO_PAD.encode(b"evil"), signature);

        assert!(unseal(&tampered, &secret()).is_none());
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let sealed = seal(b"payload", &secret());
        let encoded = sealed.rsplit_once('.').unwrap().0;
        let tampered = format!("{}.{}", encoded, "0".repeat(64));

        assert!(unseal(&tampered, &secret()).is_none());
    }

    #[test]
    fn wrong_key_is_rejected() {
        let sealed = seal(b"payload", &secret());
        let other = SecretString::new("a-different-signing-key-thats-also-long");

        assert!(unseal(&sealed, &other).is_none());
    }

    #[test]
    fn malformed_values_are_rejected() {
        assert!(unseal("noseparator", &secret()).is_none());
        assert!(unseal("payload.nothex", &secret()).is_none());
        assert!(unseal("", &secret()).is_none());
    }

    #[test]
    fn find_cookie_handles_multiple_pairs() {
        let header = "theme=dark; account_session=abc.def; other=1";
        assert_eq!(find_cookie(header, "account_session"), Some("abc.def"));
        assert_eq!(find_cookie(header, "theme"), Some("dark"));
        assert_eq!(find_cookie(header, "missing"), None);
    }

    #[test]
    fn set_cookie_carries_attributes() {
        let config = SessionConfig {
            secret_key: secret(),
            ..Default::default()
        };
        let value = format_set_cookie(&config, "abc.def");

        assert!(value.starts_with("account_session=abc.def; "));
        assert!(value.contains("HttpOnly"));
        assert!(value.contains("Secure"));
        assert!(value.contains("SameSite=Lax"));
    }

    #[test]
    fn removal_cookie_expires_immediately() {
        let config = SessionConfig::default();
        assert_eq!(
            format_removal_cookie(&config),
            "account_session=; Path=/; Max-Age=0"
        );
    }
}
