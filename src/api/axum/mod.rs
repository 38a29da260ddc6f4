//! Axum bindings: form handlers, routes and the auth-gate middleware.
//!
//! Mount [`account_routes`] into your application router:
//!
//! ```rust,ignore
//! let state = AppState::new(users, linker, config, Arc::new(BasicFormRenderer));
//! let app = Router::new().merge(account_routes(state));
//! ```

mod error;
mod forms;
mod handlers;
mod middleware;
mod render;
mod routes;

pub use error::AppError;
pub use forms::{
    ChangePasswordContext, ChangePasswordForm, LoginContext, LoginForm, SignupContext, SignupForm,
};
pub use middleware::{cookie_header, require_no_user, require_user};
pub use render::{BasicFormRenderer, TemplateRenderer, View};
pub use routes::{account_routes, AppState};
