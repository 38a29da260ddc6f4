//! Form bodies and the contexts handed to the template renderer.

use std::collections::BTreeMap;

use serde::Deserialize;

// Request forms. Fields default to empty so a partial submission validates
// like an empty one instead of failing extraction.

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password2: String,
    #[serde(default)]
    pub csrf_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordForm {
    #[serde(default)]
    pub old_password: String,
    #[serde(default)]
    pub new_password: String,
    #[serde(default)]
    pub confirm_new_password: String,
    #[serde(default)]
    pub csrf_token: String,
}

// Render contexts.

#[derive(Debug, Clone)]
pub struct LoginContext {
    /// Echoed back so the user does not retype the email after a failure.
    pub email: String,
    pub error: Option<String>,
    /// Where the "log in with provider" link points.
    pub oauth_url: String,
    pub csrf_token: String,
}

#[derive(Debug, Clone)]
pub struct SignupContext {
    pub email: String,
    pub min_password_len: usize,
    /// Field-level errors keyed by field name (`email`, `password`).
    pub errors: BTreeMap<&'static str, String>,
    pub csrf_token: String,
}

impl SignupContext {
    pub fn empty(min_password_len: usize, csrf_token: String) -> Self {
        Self {
            email: String::new(),
            min_password_len,
            errors: BTreeMap::new(),
            csrf_token,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChangePasswordContext {
    pub error: Option<String>,
    pub message: Option<String>,
    pub csrf_token: String,
}
