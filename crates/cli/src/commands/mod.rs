//! Subcommand implementations.
//!
//! Each command opens its own pool from [`DeskConfig`], calls one or more
//! desk services and prints the result through [`crate::output`].

pub mod check;
pub mod customer;
pub mod migrate;
pub mod operator;
pub mod order;

use secrecy::{ExposeSecret, SecretString};
use sqlx::PgPool;
use workbench_desk::models::Operator;
use workbench_desk::services::AuthService;
use workbench_desk::{DeskConfig, DeskError, db};

/// Connect to the record store.
async fn connect(config: &DeskConfig) -> Result<PgPool, DeskError> {
    tracing::debug!(database = ?config.database.target, "Connecting to database");
    Ok(db::create_pool(&config.database).await?)
}

/// Environment variable holding the acting operator's password.
pub const PASSWORD_VAR: &str = "WORKBENCH_PASSWORD";

/// Authenticate the acting operator with the password from [`PASSWORD_VAR`].
async fn login(pool: &PgPool, username: &str) -> Result<Operator, DeskError> {
    let password = SecretString::from(std::env::var(PASSWORD_VAR).unwrap_or_default());
    if password.expose_secret().is_empty() {
        tracing::warn!("{PASSWORD_VAR} is not set");
    }

    Ok(AuthService::new(pool)
        .authenticate(username, password.expose_secret())
        .await?)
}
