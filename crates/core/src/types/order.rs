//! Order snapshots.
//!
//! An order stores denormalized copies of product names and unit prices so
//! that later catalog edits never alter historical orders. Only the status,
//! its timestamps and the admin notes change after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{
    Email, FinishId, InstagramHandle, OrderId, OrderStatus, Price, ProductId, SizeId,
    StatusTransitionError,
};

/// One purchased (product, size, finish) line, frozen at submission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: ProductId,
    pub name: String,
    pub size_id: SizeId,
    pub size_name: String,
    pub finish_id: FinishId,
    pub finish_name: String,
    pub unit_price: Price,
    pub quantity: u32,
    pub image: String,
}

impl OrderItem {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Customer shipping details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    #[serde(default)]
    pub instagram: Option<InstagramHandle>,
}

impl ShippingInfo {
    /// `First Last`, as used in greetings and on the shipping label.
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }
}

/// Order-level money totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct OrderTotals {
    pub subtotal: Price,
    pub discount: Price,
    pub total: Price,
}

impl OrderTotals {
    /// Build totals from a subtotal and discount; the total never goes
    /// below zero.
    #[must_use]
    pub fn new(subtotal: Price, discount: Price) -> Self {
        Self {
            subtotal,
            discount,
            total: subtotal.saturating_sub(discount),
        }
    }
}

/// An order as handed to the order sink, before it has an ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    pub items: Vec<OrderItem>,
    pub shipping: ShippingInfo,
    pub totals: OrderTotals,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}

impl NewOrder {
    /// Create a pending order stamped with the current time.
    #[must_use]
    pub fn pending(items: Vec<OrderItem>, shipping: ShippingInfo, totals: OrderTotals) -> Self {
        Self {
            items,
            shipping,
            totals,
            status: OrderStatus::Pending,
            created_at: Utc::now(),
        }
    }

    /// Attach the sink-assigned ID, producing the stored order.
    #[must_use]
    pub fn into_order(self, id: OrderId) -> Order {
        Order {
            id,
            items: self.items,
            shipping: self.shipping,
            totals: self.totals,
            status: self.status,
            created_at: self.created_at,
            updated_at: None,
            shipped_at: None,
            delivered_at: None,
            notes: None,
        }
    }
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub items: Vec<OrderItem>,
    pub shipping: ShippingInfo,
    pub totals: OrderTotals,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub shipped_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Order {
    /// Move the order to `next`, stamping the lifecycle timestamps.
    ///
    /// # Errors
    ///
    /// Returns [`StatusTransitionError`] if the lifecycle forbids the move;
    /// the order is left unchanged.
    pub fn apply_status(
        &mut self,
        next: OrderStatus,
        at: DateTime<Utc>,
    ) -> Result<(), StatusTransitionError> {
        self.status = self.status.transition_to(next)?;
        self.updated_at = Some(at);
        match next {
            OrderStatus::Shipped => self.shipped_at = Some(at),
            OrderStatus::Delivered => self.delivered_at = Some(at),
            _ => {}
        }
        Ok(())
    }

    /// Total number of prints in the order.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }
}
