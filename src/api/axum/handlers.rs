//! HTTP handlers for the account routes.
//!
//! Every POST handler validates the CSRF token before touching anything
//! else. Recoverable failures re-render the submitted form with a field
//! message; storage and provider failures propagate as [`AppError`] and
//! become opaque server errors.

use axum::extract::{Query, State};
use axum::http::header::SET_COOKIE;
use axum::http::{HeaderMap, HeaderValue};
use axum::response::{Html, IntoResponse, Response};
use axum::Form;
use chrono::Utc;
use serde::Deserialize;

use crate::actions::{ChangePasswordAction, LoginAction, SignupAction};
use crate::events::{dispatch, AuthEvent};
use crate::validators::ValidationError;
use crate::{AuthError, SecretString};

use super::error::AppError;
use super::forms::{
    ChangePasswordContext, ChangePasswordForm, LoginContext, LoginForm, SignupContext, SignupForm,
};
use super::middleware::{cookie_header, found_with_cookie};
use super::render::View;
use super::routes::AppState;
use crate::oauth::ProviderGateway;
use crate::repository::{LinkRepository, UserRepository};
use crate::session::Session;

/// GET /login
pub async fn login_page<U, L, G>(
    State(state): State<AppState<U, L, G>>,
    headers: HeaderMap,
) -> Response
where
    U: UserRepository + Clone + 'static,
    L: LinkRepository + 'static,
    G: ProviderGateway + 'static,
{
    let session = state.sessions.open(cookie_header(&headers));
    let ctx = state.login_context(&session, String::new(), None);
    let body = state.renderer.render(&View::Login(&ctx));

    // the fresh session must reach the client: its seed is what the
    // submitted CSRF token will be checked against
    with_cookie(Html(body).into_response(), state.sessions.session_cookie(&session))
}

/// POST /login
pub async fn login_submit<U, L, G>(
    State(state): State<AppState<U, L, G>>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError>
where
    U: UserRepository + Clone + 'static,
    L: LinkRepository + 'static,
    G: ProviderGateway + 'static,
{
    let mut session = state.sessions.open(cookie_header(&headers));
    if !state.csrf.validate(&session, &form.csrf_token) {
        return Err(AppError(AuthError::CsrfRejected));
    }

    let action = LoginAction::new(state.users.clone(), state.credentials.clone());
    match action
        .execute(&form.email, &SecretString::new(form.password))
        .await
    {
        Ok(identity) => {
            session.set_identity(identity);
            Ok(redirect_after_login(&state, &mut session))
        }
        Err(AuthError::InvalidCredentials) => {
            let ctx = state.login_context(
                &session,
                form.email,
                Some("Invalid email or password".to_owned()),
            );
            Ok(Html(state.renderer.render(&View::Login(&ctx))).into_response())
        }
        Err(err) => Err(AppError(err)),
    }
}

/// GET /signup
pub async fn signup_page<U, L, G>(
    State(state): State<AppState<U, L, G>>,
    headers: HeaderMap,
) -> Response
where
    U: UserRepository + Clone + 'static,
    L: LinkRepository + 'static,
    G: ProviderGateway + 'static,
{
    let session = state.sessions.open(cookie_header(&headers));
    let ctx = SignupContext::empty(
        state.credentials.rules().min_length,
        state.csrf.issue(&session),
    );
    let body = state.renderer.render(&View::Signup(&ctx));

    with_cookie(Html(body).into_response(), state.sessions.session_cookie(&session))
}

/// POST /signup
pub async fn signup_submit<U, L, G>(
    State(state): State<AppState<U, L, G>>,
    headers: HeaderMap,
    Form(form): Form<SignupForm>,
) -> Result<Response, AppError>
where
    U: UserRepository + Clone + 'static,
    L: LinkRepository + 'static,
    G: ProviderGateway + 'static,
{
    let mut session = state.sessions.open(cookie_header(&headers));
    if !state.csrf.validate(&session, &form.csrf_token) {
        return Err(AppError(AuthError::CsrfRejected));
    }

    let action = SignupAction::new(state.users.clone(), state.credentials.clone());
    match action
        .execute(
            &form.email,
            &SecretString::new(form.password),
            &SecretString::new(form.password2),
        )
        .await
    {
        Ok(identity) => {
            session.set_identity(identity);
            Ok(redirect_after_login(&state, &mut session))
        }
        Err(err) => {
            let Some((field, message)) = signup_field_error(&err) else {
                return Err(AppError(err));
            };

            let mut ctx = SignupContext::empty(
                state.credentials.rules().min_length,
                state.csrf.issue(&session),
            );
            ctx.email = form.email;
            ctx.errors.insert(field, message);
            Ok(Html(state.renderer.render(&View::Signup(&ctx))).into_response())
        }
    }
}

/// GET /login/oauth-start
pub async fn oauth_start<U, L, G>(
    State(state): State<AppState<U, L, G>>,
    headers: HeaderMap,
) -> Response
where
    U: UserRepository + Clone + 'static,
    L: LinkRepository + 'static,
    G: ProviderGateway + 'static,
{
    let mut session = state.sessions.open(cookie_header(&headers));
    let url = state.linker.start(&mut session);

    found_with_cookie(&url, state.sessions.session_cookie(&session))
}

#[derive(Debug, Deserialize)]
pub struct OauthCallbackQuery {
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub code: String,
}

/// GET /login/oauth-callback
pub async fn oauth_callback<U, L, G>(
    State(state): State<AppState<U, L, G>>,
    headers: HeaderMap,
    Query(query): Query<OauthCallbackQuery>,
) -> Response
where
    U: UserRepository + Clone + 'static,
    L: LinkRepository + 'static,
    G: ProviderGateway + 'static,
{
    let mut session = state.sessions.open(cookie_header(&headers));
    match state
        .linker
        .callback(&mut session, &query.state, &query.code)
        .await
    {
        Ok(identity) => {
            session.set_identity(identity);
            redirect_after_login(&state, &mut session)
        }
        Err(err) => {
            // the nonce was consumed either way; the client must see its
            // removal or the rejected state could be replayed
            let cookie = state.sessions.session_cookie(&session);
            with_cookie(AppError(err).into_response(), cookie)
        }
    }
}

/// GET /logout
pub async fn logout<U, L, G>(
    State(state): State<AppState<U, L, G>>,
    headers: HeaderMap,
) -> Response
where
    U: UserRepository + Clone + 'static,
    L: LinkRepository + 'static,
    G: ProviderGateway + 'static,
{
    let session = state.sessions.open(cookie_header(&headers));
    if let Some(identity) = session.identity() {
        dispatch(AuthEvent::LoggedOut {
            user_id: identity.user_id,
            at: Utc::now(),
        })
        .await;
    }

    found_with_cookie(&state.paths.home, state.sessions.removal_cookie())
}

/// GET /change_password
pub async fn change_password_page<U, L, G>(
    State(state): State<AppState<U, L, G>>,
    headers: HeaderMap,
) -> Response
where
    U: UserRepository + Clone + 'static,
    L: LinkRepository + 'static,
    G: ProviderGateway + 'static,
{
    let session = state.sessions.open(cookie_header(&headers));
    let ctx = ChangePasswordContext {
        error: None,
        message: None,
        csrf_token: state.csrf.issue(&session),
    };

    Html(state.renderer.render(&View::ChangePassword(&ctx))).into_response()
}

/// POST /change_password
pub async fn change_password_submit<U, L, G>(
    State(state): State<AppState<U, L, G>>,
    headers: HeaderMap,
    Form(form): Form<ChangePasswordForm>,
) -> Result<Response, AppError>
where
    U: UserRepository + Clone + 'static,
    L: LinkRepository + 'static,
    G: ProviderGateway + 'static,
{
    let session = state.sessions.open(cookie_header(&headers));
    if !state.csrf.validate(&session, &form.csrf_token) {
        return Err(AppError(AuthError::CsrfRejected));
    }

    let Some(identity) = session.identity() else {
        return Err(AppError(AuthError::UserNotFound));
    };

    let action = ChangePasswordAction::new(state.users.clone(), state.credentials.clone());
    let result = action
        .execute(
            identity,
            &SecretString::new(form.old_password),
            &SecretString::new(form.new_password),
            &SecretString::new(form.confirm_new_password),
        )
        .await;

    let ctx = match result {
        Ok(()) => ChangePasswordContext {
            error: None,
            message: Some("Password changed".to_owned()),
            csrf_token: state.csrf.issue(&session),
        },
        Err(AuthError::InvalidCredentials) => ChangePasswordContext {
            error: Some("Incorrect old password".to_owned()),
            message: None,
            csrf_token: state.csrf.issue(&session),
        },
        Err(AuthError::Validation(err)) => ChangePasswordContext {
            error: Some(err.to_string()),
            message: None,
            csrf_token: state.csrf.issue(&session),
        },
        Err(err) => return Err(AppError(err)),
    };

    Ok(Html(state.renderer.render(&View::ChangePassword(&ctx))).into_response())
}

/// 302 to the stashed post-login target, else home. Consuming the stash
/// mutates the session, so the sealed cookie rides along.
fn redirect_after_login<U, L, G>(state: &AppState<U, L, G>, session: &mut Session) -> Response {
    let target = session
        .take_post_login_path()
        .unwrap_or_else(|| state.paths.home.clone());
    found_with_cookie(&target, state.sessions.session_cookie(session))
}

fn with_cookie(mut response: Response, cookie: String) -> Response {
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().append(SET_COOKIE, value);
    }
    response
}

fn signup_field_error(err: &AuthError) -> Option<(&'static str, String)> {
    match err {
        AuthError::Validation(
            v @ (ValidationError::EmailEmpty
            | ValidationError::EmailTooLong
            | ValidationError::EmailInvalidFormat),
        ) => Some(("email", v.to_string())),
        AuthError::Validation(v) => Some(("password", v.to_string())),
        AuthError::DuplicateEmail => Some(("email", "User already exists".to_owned())),
        _ => None,
    }
}
