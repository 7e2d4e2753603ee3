//! Connectivity check.

use workbench_desk::{DeskConfig, DeskError, db};

/// Connect, ask the server for its version and report it.
pub async fn run(config: &DeskConfig) -> Result<(), DeskError> {
    let pool = super::connect(config).await?;
    let version = db::ping(&pool).await?;

    crate::output::line(&format!("Connected: {version}"));
    Ok(())
}
