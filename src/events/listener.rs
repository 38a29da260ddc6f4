use async_trait::async_trait;

use super::AuthEvent;

/// Trait for handling authentication events asynchronously.
///
/// Implement this to observe logins, signups, password changes and federated
/// links - for metrics, audit trails or alerting.
#[async_trait]
pub trait Listener: Send + Sync + 'static {
    /// Called for every dispatched event; match on the variant to filter.
    async fn handle(&self, event: &AuthEvent);
}
