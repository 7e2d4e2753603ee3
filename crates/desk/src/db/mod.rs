//! Database operations for the repair-shop record store.
//!
//! # Schema: `workshop`
//!
//! ## Tables
//!
//! - `customer` - Customers, unique on the formatted CPF
//! - `operator` - Desk operators (login accounts), unique on username and email
//! - `work_order` - Repair jobs referencing one customer and one operator
//!
//! Work-order numbers (`OS0001`, `OS0002`, ...) come from the
//! `work_order_number_seq` sequence; the application never assigns them.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/desk/migrations/` and run via:
//! ```bash
//! wb migrate
//! ```
//!
//! # Transactions
//!
//! Every repository method runs as a single statement or inside its own
//! transaction. A dropped transaction rolls back, so an error part-way through
//! leaves no partial writes.

pub mod customers;
pub mod operators;
pub mod work_orders;

use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use std::time::Duration;
use thiserror::Error;

pub use customers::CustomerRepository;
pub use operators::OperatorRepository;
pub use work_orders::WorkOrderRepository;

use crate::config::{ConfigError, DatabaseConfig};

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., duplicate CPF).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A foreign key points at a missing row. Holds the constraint name.
    #[error("missing referenced row: {0}")]
    MissingReference(String),
}

/// Errors raised while opening the pool or migrating the schema.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("database connection error: {0}")]
    Connect(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

/// Create a `PostgreSQL` connection pool from the desk configuration.
///
/// # Errors
///
/// Returns `SetupError::Config` if the connection string is malformed and
/// `SetupError::Connect` if the connection cannot be established.
pub async fn create_pool(config: &DatabaseConfig) -> Result<PgPool, SetupError> {
    let options = config.connect_options()?;

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect_with(options)
        .await?;

    Ok(pool)
}

/// Apply any pending migrations.
///
/// # Errors
///
/// Returns `SetupError::Migrate` if a migration fails or the applied history
/// does not match the embedded migrations.
pub async fn run_migrations(pool: &PgPool) -> Result<(), SetupError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Round-trip a trivial query to confirm the store is reachable.
///
/// Returns the server version string.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
pub async fn ping(pool: &PgPool) -> Result<String, RepositoryError> {
    let version: String = sqlx::query_scalar("SELECT version()")
        .fetch_one(pool)
        .await?;
    Ok(version)
}

/// Map a unique-constraint violation to `RepositoryError::Conflict`.
///
/// `describe` receives the violated constraint name, when the server reports one.
pub(crate) fn map_unique_violation(
    e: sqlx::Error,
    describe: impl FnOnce(Option<&str>) -> String,
) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(describe(db_err.constraint()));
    }
    RepositoryError::Database(e)
}

/// Map a foreign-key violation to `RepositoryError::MissingReference`.
pub(crate) fn map_foreign_key_violation(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::MissingReference(
            db_err.constraint().unwrap_or_default().to_owned(),
        );
    }
    RepositoryError::Database(e)
}
