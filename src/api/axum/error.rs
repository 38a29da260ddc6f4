use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::AuthError;

/// Converts `AuthError` into an HTTP response.
///
/// This is the single point translating storage and provider failures into an
/// opaque response: the caller sees a generic line, the detail goes to the
/// log. Recoverable failures (validation, wrong password) are normally turned
/// into re-rendered forms by the handlers before reaching this.
#[derive(Debug)]
pub struct AppError(pub AuthError);

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        Self(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            AuthError::Validation(_) | AuthError::DuplicateEmail => StatusCode::BAD_REQUEST,
            AuthError::InvalidCredentials | AuthError::UserNotFound => StatusCode::UNAUTHORIZED,
            AuthError::CsrfRejected | AuthError::InvalidOauthState => StatusCode::FORBIDDEN,
            AuthError::CodeExchange(_)
            | AuthError::ProfileFetch(_)
            | AuthError::ProviderTimeout => StatusCode::BAD_GATEWAY,
            AuthError::DuplicateLink
            | AuthError::PasswordHash
            | AuthError::Configuration(_)
            | AuthError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            log::error!(
                target: "turnstile::http",
                "msg=\"request failed\" error=\"{}\"",
                self.0
            );
        }

        let body = match &self.0 {
            AuthError::Validation(err) => err.to_string(),
            AuthError::DuplicateEmail => "User already exists".to_owned(),
            AuthError::InvalidCredentials | AuthError::UserNotFound => {
                "Invalid credentials".to_owned()
            }
            AuthError::CsrfRejected | AuthError::InvalidOauthState => "Request rejected".to_owned(),
            AuthError::ProviderTimeout => {
                "The login provider did not respond, please try again".to_owned()
            }
            AuthError::CodeExchange(_) | AuthError::ProfileFetch(_) => {
                "Logging in with the provider failed, please try again".to_owned()
            }
            _ => "Internal server error".to_owned(),
        };

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validators::ValidationError;

    fn status_of(err: AuthError) -> StatusCode {
        AppError(err).into_response().status()
    }

    #[test]
    fn status_mapping() {
        assert_eq!(
            status_of(AuthError::Validation(ValidationError::PasswordTooShort(4))),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(status_of(AuthError::DuplicateEmail), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(AuthError::InvalidCredentials),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(status_of(AuthError::CsrfRejected), StatusCode::FORBIDDEN);
        assert_eq!(
            status_of(AuthError::InvalidOauthState),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            status_of(AuthError::CodeExchange("denied".to_owned())),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(status_of(AuthError::ProviderTimeout), StatusCode::BAD_GATEWAY);
        assert_eq!(
            status_of(AuthError::DatabaseError("oops".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
