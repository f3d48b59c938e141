//! Preluda Core - Shared domain types.
//!
//! This crate provides the types used across all Preluda components:
//! - `storefront` - Catalog, slug resolution, pricing, cart and checkout
//! - `cli` - Operator tools for migrations, catalog seeding and order admin
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and allows it to be
//! used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, slugs, prices, contact data,
//!   statuses, and the product/order records built from them

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
