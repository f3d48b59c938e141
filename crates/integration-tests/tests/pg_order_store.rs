//! Integration tests for Postgres persistence of catalogs and orders.
//!
//! These need a database reachable through `PRELUDA_TEST_DATABASE_URL`;
//! migrations are applied on connect.

#![allow(clippy::unwrap_used)]

use preluda_core::{OrderStatus, Price};
use preluda_integration_tests::{catalog, pricing, resolver, shipping, test_database_url};
use preluda_storefront::db::orders::PgOrderStore;
use preluda_storefront::db::{create_pool, products, run_migrations};
use preluda_storefront::{CheckoutFlow, CheckoutService, OrderSinkError, OrderStore};

async fn pool() -> sqlx::PgPool {
    let url = test_database_url().expect("PRELUDA_TEST_DATABASE_URL must be set");
    let pool = create_pool(&url).await.unwrap();
    run_migrations(&pool).await.unwrap();
    pool
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
#[ignore = "Requires a Postgres database"]
async fn test_catalog_round_trips_through_postgres() {
    let pool = pool().await;
    let catalog = catalog();

    let written = products::upsert_products(&pool, catalog.products(), 7)
        .await
        .unwrap();
    assert_eq!(written, catalog.len());

    let loaded = products::load_catalog(&pool).await.unwrap();
    let slugs: Vec<_> = loaded.products().iter().map(|p| p.slug.as_str()).collect();
    let expected: Vec<_> = catalog.products().iter().map(|p| p.slug.as_str()).collect();
    assert_eq!(slugs, expected);
    assert_eq!(loaded.by_slug("bass"), catalog.by_slug("bass"));
}

// =============================================================================
// Orders
// =============================================================================

#[tokio::test]
#[ignore = "Requires a Postgres database"]
async fn test_checkout_persists_order_with_items() {
    let store = PgOrderStore::new(pool().await);
    let service = CheckoutService::new(pricing(), store.clone());
    let resolver = resolver();

    let mut flow = CheckoutFlow::new();
    let cart = flow.cart_mut().unwrap();
    cart.add_line(resolver.resolve("BASS"), "a4", "black-frame", 3);
    cart.add_line(resolver.resolve("kleo"), "a3", "no-frame", 1);
    flow.begin_checkout().unwrap();
    flow.apply_promo("@pg.test").unwrap();

    let order_id = service
        .submit(&mut flow, shipping("pg@example.rs"))
        .await
        .unwrap();

    let order = store.get_order(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.items.first().unwrap().unit_price, Price::new(1575));
    assert_eq!(order.totals.subtotal, Price::new(5925));
    assert_eq!(order.totals.discount, Price::new(593));
    assert_eq!(order.totals.total, Price::new(5332));
    assert_eq!(order.shipping.instagram.unwrap().as_str(), "pg.test");
}

#[tokio::test]
#[ignore = "Requires a Postgres database"]
async fn test_status_updates_are_validated() {
    let store = PgOrderStore::new(pool().await);
    let service = CheckoutService::new(pricing(), store.clone());

    let mut flow = CheckoutFlow::new();
    flow.cart_mut()
        .unwrap()
        .add_line(resolver().resolve("casino"), "a4", "no-frame", 1);
    flow.begin_checkout().unwrap();
    flow.skip_promo().unwrap();
    let order_id = service
        .submit(&mut flow, shipping("status@example.rs"))
        .await
        .unwrap();

    let err = store
        .update_status(order_id, OrderStatus::Delivered, None)
        .await
        .unwrap_err();
    assert!(matches!(err, OrderSinkError::InvalidTransition(_)));

    let canceled = store
        .update_status(order_id, OrderStatus::Canceled, Some("Kupac odustao".to_string()))
        .await
        .unwrap();
    assert_eq!(canceled.status, OrderStatus::Canceled);
    assert!(canceled.updated_at.is_some());

    let listed = store.list_orders(Some(OrderStatus::Canceled)).await.unwrap();
    assert!(listed.iter().any(|order| order.id == order_id));
}
