//! The auth gate: a pair of capability checks over `Identity | None`.
//!
//! Both are plain middleware functions composed by the router, applied
//! per-route. A cookie that fails to decode collapses to anonymous here - the
//! sealed token is the only session transport, so "corrupt" and "absent" are
//! the same degraded state; nothing is granted on that path, a require-user
//! check just redirects to login again.

use axum::extract::{Request, State};
use axum::http::header::{COOKIE, LOCATION, SET_COOKIE};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::Next;
use axum::response::{AppendHeaders, IntoResponse, Response};

use crate::oauth::ProviderGateway;
use crate::repository::{LinkRepository, UserRepository};

use super::routes::AppState;

/// The raw `Cookie` header of a request, if any.
pub fn cookie_header(headers: &HeaderMap) -> Option<&str> {
    headers.get(COOKIE)?.to_str().ok()
}

/// 302 Found, the redirect the original form flows expect.
pub(crate) fn found(location: &str) -> Response {
    (
        StatusCode::FOUND,
        AppendHeaders([(LOCATION, location.to_owned())]),
    )
        .into_response()
}

pub(crate) fn found_with_cookie(location: &str, cookie: String) -> Response {
    (
        StatusCode::FOUND,
        AppendHeaders([(LOCATION, location.to_owned()), (SET_COOKIE, cookie)]),
    )
        .into_response()
}

/// Gate for login/signup pages: an authenticated caller is bounced home.
pub async fn require_no_user<U, L, G>(
    State(state): State<AppState<U, L, G>>,
    request: Request,
    next: Next,
) -> Response
where
    U: UserRepository + Clone + 'static,
    L: LinkRepository + 'static,
    G: ProviderGateway + 'static,
{
    if state
        .sessions
        .identity_from(cookie_header(request.headers()))
        .is_some()
    {
        return found(&state.paths.home);
    }

    next.run(request).await
}

/// Gate for account pages: an anonymous caller is sent to login, with the
/// requested path stashed for the post-login redirect.
pub async fn require_user<U, L, G>(
    State(state): State<AppState<U, L, G>>,
    request: Request,
    next: Next,
) -> Response
where
    U: UserRepository + Clone + 'static,
    L: LinkRepository + 'static,
    G: ProviderGateway + 'static,
{
    let mut session = state.sessions.open(cookie_header(request.headers()));
    if session.identity().is_none() {
        session.stash_post_login_path(request.uri().path().to_owned());
        return found_with_cookie(&state.paths.login, state.sessions.session_cookie(&session));
    }

    next.run(request).await
}
