//! Migration-tracked relational storage for conversation memory, user
//! profiles, and CRM data.
//!
//! Migrations are strictly ordered integers with an idempotent SQL body
//! and optional rollback SQL, recorded in a `schema_migrations` ledger
//! that tracks `{number, name, checksum, applied_at, execution_ms,
//! rollback_sql}`. Migrations declare dependencies on earlier numbers;
//! the runner refuses to apply one whose dependencies are unmet.

pub mod error;
pub mod migration;
pub mod repository;
pub mod runner;

pub use error::PersistenceError;
pub use migration::{Migration, MIGRATIONS};
pub use repository::{ConversationRepository, CrmRepository, UserProfileRepository};
pub use runner::MigrationRunner;
