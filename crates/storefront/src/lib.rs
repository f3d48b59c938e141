//! Preluda storefront library.
//!
//! Everything between "a customer typed a URL" and "an order was stored":
//! the canonical [`catalog`], the forgiving slug [`resolver`], [`pricing`],
//! the session [`cart`], the [`checkout`] state machine with its
//! [`orders`] sink and best-effort [`notify`] queue, plus the Postgres
//! repositories in [`db`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod db;
pub mod error;
pub mod notify;
pub mod orders;
pub mod pricing;
pub mod resolver;

pub use cart::{Cart, CartLine, CartTotals, LineKey, PromoPolicy};
pub use catalog::{Catalog, CatalogError};
pub use checkout::{CheckoutError, CheckoutFlow, CheckoutService, CheckoutStage};
pub use config::{ConfigError, StorefrontConfig};
pub use error::{AppError, Result};
pub use notify::{NotificationQueue, NotificationSink, OrderConfirmation};
pub use orders::{InMemoryOrderSink, OrderSink, OrderSinkError, OrderStore};
pub use pricing::PriceCalculator;
pub use resolver::{AliasTable, MatchRule, Resolution, ResolverConfig, SlugResolver};
