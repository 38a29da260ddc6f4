//! Session-bound CSRF tokens.
//!
//! The token is derived from the session's random seed, never stored: the
//! form rendered under a session and the submission that follows it agree
//! because both compute the same HMAC. A request with no session gets a
//! fresh seed, so no submitted value can validate.

use crate::crypto::{constant_time_eq, hmac_sha256};
use crate::session::Session;
use crate::SecretString;

/// The form field state-changing submissions must carry.
pub const CSRF_FIELD: &str = "csrf_token";

/// Issues and checks per-session CSRF tokens.
#[derive(Debug, Clone)]
pub struct CsrfGuard {
    secret: SecretString,
}

impl CsrfGuard {
    pub fn new(secret: SecretString) -> Self {
        Self { secret }
    }

    /// The token for this session. Stable across calls within one session.
    pub fn issue(&self, session: &Session) -> String {
        hex::encode(hmac_sha256(
            self.secret.expose_secret().as_bytes(),
            session.csrf_seed().as_bytes(),
        ))
    }

    /// True only if `submitted` is the token of exactly this session.
    ///
    /// Must be the first check on every mutating request, before any storage
    /// or provider work.
    pub fn validate(&self, session: &Session, submitted: &str) -> bool {
        let expected = self.issue(session);
        let ok = constant_time_eq(expected.as_bytes(), submitted.as_bytes());
        if !ok {
            log::warn!(target: "turnstile::csrf", "msg=\"csrf token rejected\"");
        }
        ok
    }
}
