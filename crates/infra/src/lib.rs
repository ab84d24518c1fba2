//! Infrastructure layer: account stores, database schema, configuration.

pub mod config;
pub mod ledger;
pub mod schema;
pub mod store;

pub use config::{ConfigError, DatabaseConfig};
pub use ledger::AccountLedger;
pub use store::{AccountStore, InMemoryAccountStore, PostgresAccountStore};
