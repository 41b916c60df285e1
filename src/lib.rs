//! # gomig
//!
//! Minimal forward-only schema migrations for PostgreSQL.
//!
//! - [`migration::generate_migration`] writes `<hash>_<name>.up.sql` files from a name
//!   like `create_users` and column descriptors like `email:varchar(255)`
//! - [`migration::Runner`] applies the files not yet recorded in `gomig_migrations`,
//!   one transaction per file by default
//!
//! Database access goes through the [`SqlExecutor`] trait; [`PostgresExecutor`] wraps a
//! `may_postgres` client.

pub mod config;
pub mod connection;
pub mod executor;
pub mod migration;
pub mod transaction;

#[cfg(test)]
mod test_helpers;

pub use config::GomigConfig;
pub use connection::{connect, validate_connection_string, ConnectionError};
pub use executor::{DbError, PostgresExecutor, SqlExecutor, TextRow};
pub use migration::{MigrationError, Runner};
pub use transaction::{Transaction, TransactionError};
