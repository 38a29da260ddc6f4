use std::sync::Arc;

use axum::routing::{get, post};
use axum::{middleware, Router};

use crate::config::{AuthConfig, RoutePaths};
use crate::credentials::CredentialStore;
use crate::csrf::CsrfGuard;
use crate::oauth::{OAuthLinker, ProviderGateway};
use crate::repository::{LinkRepository, UserRepository};
use crate::session::{Session, SessionManager};

use super::forms::LoginContext;
use super::handlers;
use super::middleware::{require_no_user, require_user};
use super::render::TemplateRenderer;

/// Everything the account handlers need, wired once at startup.
pub struct AppState<U, L, G> {
    pub users: U,
    pub sessions: Arc<SessionManager>,
    pub csrf: Arc<CsrfGuard>,
    pub credentials: CredentialStore,
    pub linker: Arc<OAuthLinker<U, L, G>>,
    pub renderer: Arc<dyn TemplateRenderer>,
    pub paths: RoutePaths,
}

impl<U: Clone, L, G> Clone for AppState<U, L, G> {
    fn clone(&self) -> Self {
        Self {
            users: self.users.clone(),
            sessions: Arc::clone(&self.sessions),
            csrf: Arc::clone(&self.csrf),
            credentials: self.credentials.clone(),
            linker: Arc::clone(&self.linker),
            renderer: Arc::clone(&self.renderer),
            paths: self.paths.clone(),
        }
    }
}

impl<U, L, G> AppState<U, L, G>
where
    U: UserRepository + Clone + 'static,
    L: LinkRepository + 'static,
    G: ProviderGateway + 'static,
{
    /// Builds the state from its parts.
    ///
    /// The CSRF guard shares the session signing key: both derive from the
    /// same secret material, per session.
    pub fn new(
        users: U,
        linker: OAuthLinker<U, L, G>,
        config: AuthConfig,
        renderer: Arc<dyn TemplateRenderer>,
    ) -> Self {
        let secret = config.session.secret_key.clone();

        AppState {
            users,
            sessions: Arc::new(SessionManager::new(config.session)),
            csrf: Arc::new(CsrfGuard::new(secret)),
            credentials: CredentialStore::new(config.password_rules),
            linker: Arc::new(linker),
            renderer,
            paths: config.paths,
        }
    }

    pub(crate) fn login_context(
        &self,
        session: &Session,
        email: String,
        error: Option<String>,
    ) -> LoginContext {
        LoginContext {
            email,
            error,
            oauth_url: format!("{}/oauth-start", self.paths.login),
            csrf_token: self.csrf.issue(session),
        }
    }
}

/// The account routes, auth gates applied per route.
///
/// GET form pages and the OAuth flow are for anonymous callers only; the
/// password-change page requires a user. POST routes carry no gate - they are
/// guarded by the CSRF check (and, for password change, the session identity)
/// inside the handler.
pub fn account_routes<U, L, G>(state: AppState<U, L, G>) -> Router
where
    U: UserRepository + Clone + 'static,
    L: LinkRepository + 'static,
    G: ProviderGateway + 'static,
{
    let anonymous_pages = Router::new()
        .route("/login", get(handlers::login_page::<U, L, G>))
        .route("/signup", get(handlers::signup_page::<U, L, G>))
        .route("/login/oauth-start", get(handlers::oauth_start::<U, L, G>))
        .route(
            "/login/oauth-callback",
            get(handlers::oauth_callback::<U, L, G>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_no_user::<U, L, G>,
        ));

    let user_pages = Router::new()
        .route(
            "/change_password",
            get(handlers::change_password_page::<U, L, G>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_user::<U, L, G>,
        ));

    let submissions = Router::new()
        .route("/login", post(handlers::login_submit::<U, L, G>))
        .route("/signup", post(handlers::signup_submit::<U, L, G>))
        .route(
            "/change_password",
            post(handlers::change_password_submit::<U, L, G>),
        )
        .route("/logout", get(handlers::logout::<U, L, G>));

    Router::new()
        .merge(anonymous_pages)
        .merge(user_pages)
        .merge(submissions)
        .with_state(state)
}
