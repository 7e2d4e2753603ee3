//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! wb migrate
//! ```
//!
//! Migrations live in `crates/desk/migrations/` and are embedded in the
//! binary, so `wb migrate` works without the source tree.

use workbench_desk::{DeskConfig, DeskError, db};

/// Apply pending migrations.
pub async fn run(config: &DeskConfig) -> Result<(), DeskError> {
    let pool = super::connect(config).await?;

    tracing::info!("Running migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete");
    Ok(())
}
