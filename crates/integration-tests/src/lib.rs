//! Integration tests for the Preluda storefront.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory scenarios and HTTP mocks
//! cargo test -p preluda-integration-tests
//!
//! # Postgres-backed tests (need a migrated database)
//! PRELUDA_TEST_DATABASE_URL=postgres://localhost/preluda_test \
//!     cargo test -p preluda-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `slug_resolution` - URL inputs to catalog products
//! - `checkout_flow` - cart to stored order, including failures
//! - `resend_notifications` - confirmation emails against a mock Resend API
//! - `pg_order_store` - order and catalog persistence

#![allow(clippy::missing_panics_doc)]

use std::sync::Arc;

use secrecy::SecretString;
use tokio::sync::Mutex;

use preluda_core::{Email, NewOrder, OrderId, ShippingInfo};
use preluda_storefront::notify::{NotificationSink, NotifyError, OrderConfirmation};
use preluda_storefront::{
    Catalog, OrderSink, OrderSinkError, PriceCalculator, ResolverConfig, SlugResolver,
};

/// The built-in catalog, shared.
#[must_use]
pub fn catalog() -> Arc<Catalog> {
    Arc::new(Catalog::builtin().expect("built-in catalog is valid"))
}

/// Resolver over the built-in catalog with the built-in alias table.
#[must_use]
pub fn resolver() -> SlugResolver {
    SlugResolver::new(catalog(), ResolverConfig::default()).expect("built-in aliases are valid")
}

#[must_use]
pub fn pricing() -> PriceCalculator {
    PriceCalculator::new(catalog())
}

/// Shipping details for a customer in Belgrade.
#[must_use]
pub fn shipping(email: &str) -> ShippingInfo {
    ShippingInfo {
        first_name: "Milica".to_string(),
        last_name: "Stojanović".to_string(),
        email: Email::parse(email).expect("fixture email is valid"),
        phone: "0641234567".to_string(),
        address: "Resavska 22".to_string(),
        city: "Beograd".to_string(),
        postal_code: "11000".to_string(),
        country: "Srbija".to_string(),
        instagram: None,
    }
}

/// Connection string for Postgres-backed tests.
#[must_use]
pub fn test_database_url() -> Option<SecretString> {
    std::env::var("PRELUDA_TEST_DATABASE_URL")
        .ok()
        .map(SecretString::from)
}

/// Notification sink that remembers what it was asked to send.
#[derive(Debug, Clone, Default)]
pub struct RecordingNotifier {
    sent: Arc<Mutex<Vec<OrderConfirmation>>>,
}

impl RecordingNotifier {
    pub async fn sent(&self) -> Vec<OrderConfirmation> {
        self.sent.lock().await.clone()
    }
}

impl NotificationSink for RecordingNotifier {
    async fn send(&self, confirmation: &OrderConfirmation) -> Result<(), NotifyError> {
        self.sent.lock().await.push(confirmation.clone());
        Ok(())
    }
}

/// Notification sink whose provider always rejects the message.
#[derive(Debug, Clone, Copy, Default)]
pub struct RejectingNotifier;

impl NotificationSink for RejectingNotifier {
    async fn send(&self, _: &OrderConfirmation) -> Result<(), NotifyError> {
        Err(NotifyError::Api {
            status: 503,
            message: "provider unavailable".to_string(),
        })
    }
}

/// Order sink that fails a fixed number of times, then accepts orders.
#[derive(Debug, Clone, Default)]
pub struct FlakyOrderSink {
    failures_left: Arc<Mutex<u32>>,
    accepted: Arc<Mutex<Vec<NewOrder>>>,
}

impl FlakyOrderSink {
    #[must_use]
    pub fn failing(times: u32) -> Self {
        Self {
            failures_left: Arc::new(Mutex::new(times)),
            accepted: Arc::default(),
        }
    }

    pub async fn accepted(&self) -> Vec<NewOrder> {
        self.accepted.lock().await.clone()
    }
}

impl OrderSink for FlakyOrderSink {
    async fn create_order(&self, order: NewOrder) -> Result<OrderId, OrderSinkError> {
        let mut failures_left = self.failures_left.lock().await;
        if *failures_left > 0 {
            *failures_left -= 1;
            return Err(OrderSinkError::Unavailable("connection reset".to_string()));
        }
        drop(failures_left);

        self.accepted.lock().await.push(order);
        Ok(OrderId::generate())
    }
}
