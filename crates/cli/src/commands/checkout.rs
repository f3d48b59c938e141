//! Place an order from a YAML description.
//!
//! # Usage
//!
//! ```bash
//! preluda checkout order.yaml            # store in Postgres
//! preluda checkout order.yaml --dry-run  # keep in memory only
//! ```
//!
//! # Order file
//!
//! ```yaml
//! items:
//!   - product: BASS          # any input the resolver accepts
//!     size: a4               # optional, defaults to the first size
//!     finish: black-frame    # optional, defaults to the first finish
//!     quantity: 2
//! instagram: "@preluda.fan"  # optional, applies the promo discount
//! shipping:
//!   firstName: Marko
//!   lastName: Marković
//!   email: marko@example.rs
//!   phone: "0601234567"
//!   address: Knez Mihailova 1
//!   city: Beograd
//!   postalCode: "11000"
//!   country: Srbija
//! ```
//!
//! Confirmation emails go through Resend when `RESEND_API_KEY` is set and
//! are only logged otherwise.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use preluda_core::ShippingInfo;
use preluda_storefront::db::orders::PgOrderStore;
use preluda_storefront::notify::{
    LogNotificationSink, NotificationSink, ResendClient, spawn_notification_worker,
};
use preluda_storefront::{
    AppError, CheckoutFlow, CheckoutService, InMemoryOrderSink, OrderSink, PriceCalculator,
    SlugResolver, StorefrontConfig,
};

use super::{CliError, connect, load_resolver};

/// Upper bound on delivering one confirmation email.
const SEND_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(15);

#[derive(Debug, Deserialize)]
struct OrderFile {
    items: Vec<OrderFileItem>,
    #[serde(default)]
    instagram: Option<String>,
    shipping: ShippingInfo,
}

#[derive(Debug, Deserialize)]
struct OrderFileItem {
    product: String,
    #[serde(default)]
    size: Option<String>,
    #[serde(default)]
    finish: Option<String>,
    #[serde(default = "default_quantity")]
    quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

async fn read_order_file(path: &Path) -> Result<OrderFile, CliError> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| CliError::OrderFile(format!("{}: {e}", path.display())))?;
    let order: OrderFile =
        serde_yaml::from_str(&content).map_err(|e| CliError::OrderFile(e.to_string()))?;
    if order.items.is_empty() {
        return Err(CliError::OrderFile("no items".to_string()));
    }
    Ok(order)
}

/// Fill a checkout flow from the order file, up to the shipping form.
fn build_flow(resolver: &SlugResolver, order: &OrderFile) -> Result<CheckoutFlow, CliError> {
    let mut flow = CheckoutFlow::new();
    let cart = flow.cart_mut().map_err(AppError::from)?;

    for item in &order.items {
        let resolution = resolver.explain(&item.product);
        let product = resolution.product;
        let size = item
            .size
            .clone()
            .or_else(|| product.default_size().map(|s| s.id.to_string()))
            .ok_or_else(|| CliError::OrderFile(format!("{} has no sizes", product.slug)))?;
        let finish = item
            .finish
            .clone()
            .or_else(|| product.default_finish().map(|f| f.id.to_string()))
            .ok_or_else(|| CliError::OrderFile(format!("{} has no finishes", product.slug)))?;

        tracing::info!(
            input = %item.product,
            slug = %product.slug,
            rule = %resolution.rule,
            %size,
            %finish,
            quantity = item.quantity,
            "Adding to cart"
        );
        cart.add_line(product, &size, &finish, item.quantity);
    }

    flow.begin_checkout().map_err(AppError::from)?;
    let promo = match &order.instagram {
        Some(handle) => flow.apply_promo(handle),
        None => flow.skip_promo(),
    };
    promo.map_err(AppError::from)?;

    Ok(flow)
}

async fn submit<S: OrderSink, N: NotificationSink>(
    config: &StorefrontConfig,
    pricing: PriceCalculator,
    sink: S,
    notifier: N,
    mut flow: CheckoutFlow,
    shipping: ShippingInfo,
) -> Result<(), CliError> {
    let (queue, worker) =
        spawn_notification_worker(notifier, config.notify_queue_capacity, SEND_TIMEOUT);

    let service = CheckoutService::new(pricing, sink)
        .with_policy(config.promo_policy())
        .with_notifications(queue)
        .with_submit_timeout(config.submit_timeout);

    let totals = flow.totals(service.pricing(), service.policy());
    let result = service.submit(&mut flow, shipping).await;

    // Dropping the service closes the queue so the worker can drain and stop.
    drop(service);
    if let Err(e) = worker.await {
        tracing::error!(error = %e, "Notification worker panicked");
    }

    let order_id = result.map_err(AppError::from)?;

    #[allow(clippy::print_stdout)]
    {
        println!("Order {order_id} placed");
        println!("  Items:    {}", totals.item_count);
        println!("  Subtotal: {}", totals.subtotal.display_rsd());
        if !totals.discount.is_zero() {
            println!("  Discount: -{}", totals.discount.display_rsd());
        }
        println!("  Total:    {}", totals.total.display_rsd());
    }
    Ok(())
}

/// Submit the order described in `path`.
///
/// # Errors
///
/// Returns an error if the file is invalid, the cart cannot be checked out,
/// or the order cannot be stored.
pub async fn run(config: &StorefrontConfig, path: &Path, dry_run: bool) -> Result<(), CliError> {
    let order = read_order_file(path).await?;
    let resolver = load_resolver(config)?;
    let pricing = PriceCalculator::new(Arc::clone(resolver.catalog()));
    let flow = build_flow(&resolver, &order)?;
    let shipping = order.shipping;

    let resend = config
        .email
        .as_ref()
        .map(ResendClient::new)
        .transpose()
        .map_err(AppError::from)?;

    match (dry_run, resend) {
        (true, Some(resend)) => {
            submit(config, pricing, InMemoryOrderSink::new(), resend, flow, shipping).await
        }
        (true, None) => {
            submit(config, pricing, InMemoryOrderSink::new(), LogNotificationSink, flow, shipping)
                .await
        }
        (false, resend) => {
            let store = PgOrderStore::new(connect(config).await?);
            match resend {
                Some(resend) => submit(config, pricing, store, resend, flow, shipping).await,
                None => {
                    submit(config, pricing, store, LogNotificationSink, flow, shipping).await
                }
            }
        }
    }
}
