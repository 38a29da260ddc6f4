//! Repository traits and data types.
//!
//! Storage is consumed through these abstractions only; implement them to put
//! the user directory and the federated-link table on your own database.
//!
//! | Trait | Description |
//! |-------|-------------|
//! | [`UserRepository`] | User rows: lookup, creation, credential updates |
//! | [`LinkRepository`] | Federated links, including transactional user+link creation |
//!
//! Enable the `mocks` feature for the in-memory implementations used in the
//! test suites: [`MockUserRepository`] and [`MockLinkRepository`].

mod link;
mod user;

#[cfg(any(test, feature = "mocks"))]
mod link_mock;
#[cfg(any(test, feature = "mocks"))]
mod user_mock;

pub use link::{FederatedLink, LinkRepository, NewLink};
pub use user::{Identity, StoredCredential, User, UserRepository};

#[cfg(any(test, feature = "mocks"))]
pub use link_mock::MockLinkRepository;
#[cfg(any(test, feature = "mocks"))]
pub use user_mock::MockUserRepository;
