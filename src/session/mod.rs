//! Client-held session state in a sealed cookie.
//!
//! The server keeps no per-session record: everything lives in the cookie,
//! HMAC-signed so the client can neither forge nor alter it. Each request
//! decodes its own independent snapshot, so there is no cross-request locking
//! concern; whoever mutates the session must send the re-sealed cookie back.

mod config;
mod cookie;

pub use config::{SameSite, SessionConfig};

use serde::{Deserialize, Serialize};

use crate::crypto::random_url_token;
use crate::repository::Identity;

/// Everything a session can carry.
///
/// `oauth_state` and `post_login_path` are transient: they are set once and
/// removed by the accessor that consumes them, which is what prevents replay
/// of the OAuth nonce and repeated post-login redirects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct SessionPayload {
    user: Option<Identity>,
    oauth_state: Option<String>,
    post_login_path: Option<String>,
    csrf_seed: String,
}

/// One request's decoded snapshot of the caller's session.
#[derive(Debug, Clone)]
pub struct Session {
    payload: SessionPayload,
}

impl Session {
    fn fresh() -> Self {
        Session {
            payload: SessionPayload {
                user: None,
                oauth_state: None,
                post_login_path: None,
                csrf_seed: random_url_token(16),
            },
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.payload.user.as_ref()
    }

    pub fn set_identity(&mut self, identity: Identity) {
        self.payload.user = Some(identity);
    }

    /// The per-session secret the CSRF token is derived from.
    pub fn csrf_seed(&self) -> &str {
        &self.payload.csrf_seed
    }

    pub fn stash_oauth_state(&mut self, state: String) {
        self.payload.oauth_state = Some(state);
    }

    /// Removes and returns the stashed OAuth nonce. Always clears the field,
    /// matched or not, so a nonce can never be presented twice.
    pub fn take_oauth_state(&mut self) -> Option<String> {
        self.payload.oauth_state.take()
    }

    pub fn stash_post_login_path(&mut self, path: String) {
        self.payload.post_login_path = Some(path);
    }

    /// Removes and returns the stashed post-login redirect target.
    pub fn take_post_login_path(&mut self) -> Option<String> {
        self.payload.post_login_path.take()
    }
}

/// Decodes and seals session cookies. The only component that touches the
/// cookie format.
#[derive(Debug, Clone)]
pub struct SessionManager {
    config: SessionConfig,
}

impl SessionManager {
    pub fn new(config: SessionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Opens the session carried by a raw `Cookie` header.
    ///
    /// Never fails: a missing cookie, a bad signature or an unknown payload
    /// schema all yield a fresh anonymous session (tamper is logged by the
    /// codec). There is no transport to fail here - the token is the state.
    pub fn open(&self, cookie_header: Option<&str>) -> Session {
        let Some(header) = cookie_header else {
            return Session::fresh();
        };
        let Some(value) = cookie::find_cookie(header, &self.config.cookie_name) else {
            return Session::fresh();
        };
        let Some(bytes) = cookie::unseal(value, &self.config.secret_key) else {
            return Session::fresh();
        };

        match serde_json::from_slice::<SessionPayload>(&bytes) {
            Ok(payload) => Session { payload },
            Err(err) => {
                log::warn!(
                    target: "turnstile::session",
                    "msg=\"session payload schema mismatch\" error=\"{err}\""
                );
                Session::fresh()
            }
        }
    }

    /// Convenience for the auth gate: the identity behind a request, if any.
    pub fn identity_from(&self, cookie_header: Option<&str>) -> Option<Identity> {
        self.open(cookie_header).payload.user
    }

    /// Seals a session into its full `Set-Cookie` value.
    ///
    /// Idempotent: the same session state always produces the same value.
    ///
    /// # Panics
    ///
    /// Cannot panic: the payload contains only JSON-representable fields.
    pub fn session_cookie(&self, session: &Session) -> String {
        #[allow(clippy::expect_used)]
        let bytes =
            serde_json::to_vec(&session.payload).expect("session payload serializes to JSON");
        let sealed = cookie::seal(&bytes, &self.config.secret_key);
        cookie::format_set_cookie(&self.config, &sealed)
    }

    /// A `Set-Cookie` value that drops the session, identity and transients
    /// included. Used by logout.
    pub fn removal_cookie(&self) -> String {
        cookie::format_removal_cookie(&self.config)
    }
}
