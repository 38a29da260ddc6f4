use super::ValidationError;

/// Length rules applied to new passwords.
///
/// The minimum is deliberately low by default; tighten it per deployment.
///
/// # Examples
///
/// ```
/// use turnstile::validators::PasswordRules;
///
/// let rules = PasswordRules::default();
/// assert!(rules.validate("abcd").is_ok());
/// assert!(rules.validate("abc").is_err());
///
/// let strict = PasswordRules::new().min(12);
/// assert!(strict.validate("abcd").is_err());
/// ```
#[derive(Debug, Clone)]
pub struct PasswordRules {
    /// Minimum password length (default: 4)
    pub min_length: usize,
    /// Maximum password length (default: 128)
    pub max_length: usize,
}

impl Default for PasswordRules {
    fn default() -> Self {
        Self {
            min_length: 4,
            max_length: 128,
        }
    }
}

impl PasswordRules {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the minimum password length.
    #[must_use]
    pub fn min(mut self, len: usize) -> Self {
        self.min_length = len;
        self
    }

    /// Sets the maximum password length.
    #[must_use]
    pub fn max(mut self, len: usize) -> Self {
        self.max_length = len;
        self
    }

    /// Validates a new password against these rules.
    ///
    /// # Errors
    ///
    /// Returns a `ValidationError` naming the violated rule.
    pub fn validate(&self, password: &str) -> Result<(), ValidationError> {
        if password.len() < self.min_length {
            return Err(ValidationError::PasswordTooShort(self.min_length));
        }

        if password.len() > self.max_length {
            return Err(ValidationError::PasswordTooLong(self.max_length));
        }

        Ok(())
    }
}

/// Checks that a password and its confirmation field agree.
pub fn validate_confirmation(password: &str, confirmation: &str) -> Result<(), ValidationError> {
    if password != confirmation {
        return Err(ValidationError::PasswordMismatch);
    }
    Ok(())
}
