//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! preluda migrate
//! ```
//!
//! # Environment Variables
//!
//! - `PRELUDA_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded in
//! the binary.

use preluda_storefront::StorefrontConfig;
use preluda_storefront::db::{MIGRATOR, run_migrations};

use super::{CliError, connect};

/// Apply all pending storefront migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run(config: &StorefrontConfig) -> Result<(), CliError> {
    let pool = connect(config).await?;

    run_migrations(&pool).await?;

    tracing::info!(
        latest = MIGRATOR.iter().map(|m| m.version).max().unwrap_or_default(),
        "Storefront migrations complete"
    );
    Ok(())
}
