//! # warden-database
//!
//! PostgreSQL connection management, migrations, startup integrity seeding,
//! and repositories for permissions, roles, and users.
//!
//! Every mutation of a role's permission set or a user's role list is a
//! single transaction that deletes the old links and inserts the new ones.

pub mod connection;
pub mod migration;
pub mod repositories;
pub mod seed;

pub use connection::DatabasePool;
