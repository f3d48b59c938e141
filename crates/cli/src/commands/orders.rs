//! Order administration commands.
//!
//! # Usage
//!
//! ```bash
//! preluda orders list
//! preluda orders list --status pending
//! preluda orders set-status 3f0c9f0e-8a4e-4c55-9d37-2f1a8b9e6c11 shipped --notes "PE-123"
//! ```
//!
//! # Environment Variables
//!
//! - `PRELUDA_DATABASE_URL` (or `DATABASE_URL`) - `PostgreSQL` connection string

use preluda_core::{OrderId, OrderStatus};
use preluda_storefront::db::orders::PgOrderStore;
use preluda_storefront::{AppError, OrderStore, StorefrontConfig};

use super::{CliError, connect};

/// Print stored orders, newest first.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub async fn list(config: &StorefrontConfig, status: Option<OrderStatus>) -> Result<(), CliError> {
    let store = PgOrderStore::new(connect(config).await?);
    let orders = store.list_orders(status).await.map_err(AppError::from)?;

    #[allow(clippy::print_stdout)]
    {
        if orders.is_empty() {
            println!("No orders");
        }
        for order in &orders {
            println!(
                "{}  {}  {:<10}  {:>3} pcs  {:>12}  {}",
                order.id,
                order.created_at.format("%Y-%m-%d %H:%M"),
                order.status.as_str(),
                order.item_count(),
                order.totals.total.display_rsd(),
                order.shipping.full_name(),
            );
        }
    }
    Ok(())
}

/// Advance an order's status.
///
/// # Errors
///
/// Returns an error if the order does not exist, the transition is not
/// allowed, or the update fails.
pub async fn set_status(
    config: &StorefrontConfig,
    id: OrderId,
    status: OrderStatus,
    notes: Option<String>,
) -> Result<(), CliError> {
    let store = PgOrderStore::new(connect(config).await?);
    let order = store
        .update_status(id, status, notes)
        .await
        .map_err(AppError::from)?;

    #[allow(clippy::print_stdout)]
    {
        println!("Order {} is now {}", order.id, order.status);
    }
    Ok(())
}
