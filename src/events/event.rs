use chrono::{DateTime, Utc};

/// Authentication events emitted by actions and the OAuth linker.
///
/// Events are always fired; with no listeners registered they are silently
/// ignored. Register listeners via
/// [`register_event_listeners`](crate::register_event_listeners) to observe
/// them.
#[derive(Debug, Clone)]
pub enum AuthEvent {
    UserRegistered {
        user_id: i64,
        email: String,
        at: DateTime<Utc>,
    },
    LoginSucceeded {
        user_id: i64,
        email: String,
        at: DateTime<Utc>,
    },
    LoginFailed {
        email: String,
        at: DateTime<Utc>,
    },
    LoggedOut {
        user_id: i64,
        at: DateTime<Utc>,
    },
    PasswordChanged {
        user_id: i64,
        at: DateTime<Utc>,
    },
    FederatedLinkCreated {
        user_id: i64,
        provider: String,
        at: DateTime<Utc>,
    },
    FederatedLoginSucceeded {
        user_id: i64,
        provider: String,
        at: DateTime<Utc>,
    },
}

impl AuthEvent {
    /// Dot-separated event name for logging.
    pub fn name(&self) -> &'static str {
        match self {
            Self::UserRegistered { .. } => "user.registered",
            Self::LoginSucceeded { .. } => "auth.login.success",
            Self::LoginFailed { .. } => "auth.login.failed",
            Self::LoggedOut { .. } => "auth.logout",
            Self::PasswordChanged { .. } => "auth.password.changed",
            Self::FederatedLinkCreated { .. } => "oauth.link.created",
            Self::FederatedLoginSucceeded { .. } => "oauth.login.success",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_stable() {
        let event = AuthEvent::LoginFailed {
            email: "a@example.com".to_owned(),
            at: Utc::now(),
        };
        assert_eq!(event.name(), "auth.login.failed");

        let event = AuthEvent::FederatedLinkCreated {
            user_id: 1,
            provider: "facebook".to_owned(),
            at: Utc::now(),
        };
        assert_eq!(event.name(), "oauth.link.created");
    }
}
