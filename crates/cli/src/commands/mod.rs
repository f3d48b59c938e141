//! CLI command implementations.

pub mod catalog;
pub mod checkout;
pub mod migrate;
pub mod orders;

use std::sync::Arc;

use thiserror::Error;

use preluda_storefront::config::ConfigError;
use preluda_storefront::{AppError, Catalog, SlugResolver, StorefrontConfig};

/// Errors surfaced by CLI commands.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    App(#[from] AppError),

    /// The order file could not be read or parsed.
    #[error("Invalid order file: {0}")]
    OrderFile(String),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        Self::App(err.into())
    }
}

/// Load the configured catalog and build a resolver over it.
pub(crate) fn load_resolver(config: &StorefrontConfig) -> Result<SlugResolver, AppError> {
    let catalog: Arc<Catalog> = Arc::new(config.load_catalog()?);
    let resolver = SlugResolver::new(catalog, config.resolver_config()?)?;
    Ok(resolver)
}

/// Connect to the configured database.
pub(crate) async fn connect(config: &StorefrontConfig) -> Result<sqlx::PgPool, AppError> {
    let url = config.require_database_url()?;
    let pool = preluda_storefront::db::create_pool(url).await?;
    tracing::debug!("Connected to database");
    Ok(pool)
}
