use async_trait::async_trait;

use crate::events::{AuthEvent, Listener};

/// Logs every authentication event through the `log` facade.
pub struct LoggingListener {
    level: log::Level,
}

impl LoggingListener {
    /// INFO-level listener.
    pub fn new() -> Self {
        Self {
            level: log::Level::Info,
        }
    }

    pub fn with_level(level: log::Level) -> Self {
        Self { level }
    }
}

impl Default for LoggingListener {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Listener for LoggingListener {
    async fn handle(&self, event: &AuthEvent) {
        log::log!(
            target: "turnstile::events",
            self.level,
            "event={} {:?}",
            event.name(),
            event
        );
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[tokio::test]
    async fn handle_does_not_panic() {
        let listener = LoggingListener::default();
        listener
            .handle(&AuthEvent::LoginSucceeded {
                user_id: 1,
                email: "a@example.com".to_owned(),
                at: Utc::now(),
            })
            .await;
    }

    #[test]
    fn level_is_configurable() {
        let listener = LoggingListener::with_level(log::Level::Debug);
        assert_eq!(listener.level, log::Level::Debug);
    }
}
