//! Core types for Preluda.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod contact;
pub mod id;
pub mod locale;
pub mod order;
pub mod price;
pub mod product;
pub mod slug;
pub mod status;

pub use contact::{Email, EmailError, InstagramHandle, InstagramHandleError};
pub use id::*;
pub use locale::{Language, LocalizedText};
pub use order::{NewOrder, Order, OrderItem, OrderTotals, ShippingInfo};
pub use price::{Multiplier, MultiplierError, Price};
pub use product::{Finish, Product, Size};
pub use slug::{Slug, SlugError};
pub use status::{OrderStatus, StatusTransitionError};
