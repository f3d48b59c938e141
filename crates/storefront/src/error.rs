//! Unified error handling.
//!
//! Each module has its own error enum; `AppError` wraps them for callers
//! (the CLI, future HTTP handlers) that drive several modules at once.

use thiserror::Error;

use crate::catalog::CatalogError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::db::RepositoryError;
use crate::notify::NotifyError;
use crate::orders::OrderSinkError;
use crate::resolver::ResolverError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Catalog error: {0}")]
    Catalog(#[from] CatalogError),

    #[error("Resolver error: {0}")]
    Resolver(#[from] ResolverError),

    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    #[error("Order error: {0}")]
    Orders(#[from] OrderSinkError),

    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    #[error("Notification error: {0}")]
    Notify(#[from] NotifyError),
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Database(RepositoryError::Database(err))
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wraps_module_errors() {
        let err: AppError = CatalogError::Empty.into();
        assert_eq!(err.to_string(), "Catalog error: catalog is empty");

        let err: AppError = ResolverError::UnknownDefault("nope".to_string()).into();
        assert!(matches!(err, AppError::Resolver(_)));
    }
}
