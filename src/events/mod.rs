//! Event system for authentication actions.
//!
//! Actions and the OAuth linker fire an [`AuthEvent`] for every noteworthy
//! transition. If no listeners are registered, dispatch is a no-op.
//!
//! ```rust,ignore
//! use turnstile::register_event_listeners;
//! use turnstile::events::listeners::LoggingListener;
//!
//! register_event_listeners(|registry| {
//!     registry.listen(LoggingListener::new());
//! });
//! ```

mod event;
mod listener;
mod registry;

pub mod listeners;

pub use event::AuthEvent;
pub use listener::Listener;
pub use registry::{dispatch, register_event_listeners};
