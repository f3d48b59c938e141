//! Order lifecycle status.
//!
//! ```text
//! pending ──> processing ──> shipped ──> delivered
//!    │             │            │
//!    └─────────────┴────────────┴──────> canceled
//! ```
//!
//! `delivered` and `canceled` are terminal.

use serde::{Deserialize, Serialize};

/// Order fulfillment status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    /// Submitted by the customer, not yet handled.
    #[default]
    Pending,
    /// Being printed/framed.
    Processing,
    /// Handed to the courier.
    Shipped,
    /// Received by the customer.
    Delivered,
    /// Canceled by the shop.
    Canceled,
}

/// Attempted a status change the lifecycle does not allow.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot move order from {from} to {to}")]
pub struct StatusTransitionError {
    pub from: OrderStatus,
    pub to: OrderStatus,
}

impl OrderStatus {
    /// All statuses in lifecycle order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Processing,
        Self::Shipped,
        Self::Delivered,
        Self::Canceled,
    ];

    /// Returns `true` if no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Canceled)
    }

    /// Returns `true` if the lifecycle allows moving from `self` to `next`.
    #[must_use]
    pub const fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Processing)
                | (Self::Processing, Self::Shipped)
                | (Self::Shipped, Self::Delivered)
                | (Self::Pending | Self::Processing | Self::Shipped, Self::Canceled)
        )
    }

    /// Validate a transition.
    ///
    /// # Errors
    ///
    /// Returns [`StatusTransitionError`] if the lifecycle forbids it.
    pub const fn transition_to(self, next: Self) -> Result<Self, StatusTransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(StatusTransitionError {
                from: self,
                to: next,
            })
        }
    }

    /// Lowercase wire name, as stored in the database.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Canceled => "canceled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "shipped" => Ok(Self::Shipped),
            "delivered" => Ok(Self::Delivered),
            "canceled" | "cancelled" => Ok(Self::Canceled),
            _ => Err(format!("invalid order status: {s}")),
        }
    }
}
