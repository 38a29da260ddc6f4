//! `SQLite` backend for the repository traits, on `sqlx`.
//!
//! Uniqueness (user email, one link per provider account) is enforced by the
//! schema; both repositories translate the resulting constraint violations
//! into the distinguishable error variants callers branch on.

mod link;
pub mod migrations;
mod user;

pub use link::SqliteLinkRepository;
pub use user::SqliteUserRepository;

use sqlx::SqlitePool;

/// Creates both repositories from one connection pool.
pub fn create_repositories(pool: SqlitePool) -> (SqliteUserRepository, SqliteLinkRepository) {
    (
        SqliteUserRepository::new(pool.clone()),
        SqliteLinkRepository::new(pool),
    )
}
