pub mod email;
pub mod password;

pub use email::validate_email;
pub use password::{validate_confirmation, PasswordRules};

/// Recoverable form-level failures.
///
/// These always re-render the submitted form with a field message and never
/// surface as a server error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmailEmpty,
    EmailTooLong,
    EmailInvalidFormat,
    PasswordTooShort(usize),
    PasswordTooLong(usize),
    PasswordMismatch,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmailEmpty => write!(f, "Email cannot be empty"),
            Self::EmailTooLong => write!(f, "Email is too long (max 254 characters)"),
            Self::EmailInvalidFormat => write!(f, "Invalid email address"),
            Self::PasswordTooShort(min) => {
                write!(f, "Password must be at least {min} characters")
            }
            Self::PasswordTooLong(max) => write!(f, "Password is too long (max {max} characters)"),
            Self::PasswordMismatch => write!(f, "Passwords don't match"),
        }
    }
}

impl std::error::Error for ValidationError {}
