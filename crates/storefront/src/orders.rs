//! Order persistence seams.
//!
//! Checkout only needs an append-only [`OrderSink`]; the admin side reads
//! and advances orders through [`OrderStore`]. [`InMemoryOrderSink`] backs
//! tests and CLI dry runs, [`crate::db::orders::PgOrderStore`] backs
//! production.

use std::future::Future;
use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;
use tokio::sync::Mutex;

use preluda_core::{NewOrder, Order, OrderId, OrderStatus, StatusTransitionError};

use crate::db::RepositoryError;

/// Errors raised by order sinks and stores.
#[derive(Debug, Error)]
pub enum OrderSinkError {
    /// The backing store failed.
    #[error("order store error: {0}")]
    Repository(#[from] RepositoryError),

    /// The sink is not accepting orders.
    #[error("order sink unavailable: {0}")]
    Unavailable(String),

    /// No order with this ID.
    #[error("order not found: {0}")]
    NotFound(OrderId),

    /// The requested status change is not allowed.
    #[error(transparent)]
    InvalidTransition(#[from] StatusTransitionError),
}

/// Append-only destination for submitted orders.
pub trait OrderSink: Send + Sync {
    /// Persist a new order and return its generated ID.
    fn create_order(
        &self,
        order: NewOrder,
    ) -> impl Future<Output = Result<OrderId, OrderSinkError>> + Send;
}

/// Read and lifecycle access to stored orders.
pub trait OrderStore: OrderSink {
    fn get_order(
        &self,
        id: OrderId,
    ) -> impl Future<Output = Result<Option<Order>, OrderSinkError>> + Send;

    /// Orders newest first, optionally filtered by status.
    fn list_orders(
        &self,
        status: Option<OrderStatus>,
    ) -> impl Future<Output = Result<Vec<Order>, OrderSinkError>> + Send;

    /// Move an order to `next`, optionally replacing its admin notes.
    fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
        notes: Option<String>,
    ) -> impl Future<Output = Result<Order, OrderSinkError>> + Send;
}

/// Order store held in process memory.
///
/// Clones share the same storage.
#[derive(Debug, Clone, Default)]
pub struct InMemoryOrderSink {
    orders: Arc<Mutex<Vec<Order>>>,
}

impl InMemoryOrderSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored orders.
    pub async fn len(&self) -> usize {
        self.orders.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.orders.lock().await.is_empty()
    }

    /// Snapshot of all orders in submission order.
    pub async fn orders(&self) -> Vec<Order> {
        self.orders.lock().await.clone()
    }
}

impl OrderSink for InMemoryOrderSink {
    async fn create_order(&self, order: NewOrder) -> Result<OrderId, OrderSinkError> {
        let id = OrderId::generate();
        self.orders.lock().await.push(order.into_order(id));
        Ok(id)
    }
}

impl OrderStore for InMemoryOrderSink {
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, OrderSinkError> {
        let orders = self.orders.lock().await;
        Ok(orders.iter().find(|order| order.id == id).cloned())
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, OrderSinkError> {
        let orders = self.orders.lock().await;
        Ok(orders
            .iter()
            .rev()
            .filter(|order| status.is_none_or(|status| order.status == status))
            .cloned()
            .collect())
    }

    async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
        notes: Option<String>,
    ) -> Result<Order, OrderSinkError> {
        let mut orders = self.orders.lock().await;
        let order = orders
            .iter_mut()
            .find(|order| order.id == id)
            .ok_or(OrderSinkError::NotFound(id))?;

        order.apply_status(next, Utc::now())?;
        if notes.is_some() {
            order.notes = notes;
        }
        Ok(order.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use preluda_core::{
        Email, FinishId, OrderItem, OrderTotals, Price, ProductId, ShippingInfo, SizeId,
    };

    use super::*;

    fn new_order() -> NewOrder {
        let item = OrderItem {
            product_id: ProductId::new("28"),
            name: "SAT".to_string(),
            size_id: SizeId::new("a4"),
            size_name: "A4".to_string(),
            finish_id: FinishId::new("no-frame"),
            finish_name: "Bez rama".to_string(),
            unit_price: Price::new(900),
            quantity: 1,
            image: "/product-photos/sat.png".to_string(),
        };
        let shipping = ShippingInfo {
            first_name: "Marko".to_string(),
            last_name: "Marković".to_string(),
            email: Email::parse("marko@example.rs").unwrap(),
            phone: "0601234567".to_string(),
            address: "Bulevar 12".to_string(),
            city: "Novi Sad".to_string(),
            postal_code: "21000".to_string(),
            country: "Srbija".to_string(),
            instagram: None,
        };
        NewOrder::pending(vec![item], shipping, OrderTotals::new(Price::new(900), Price::ZERO))
    }

    #[tokio::test]
    async fn test_create_assigns_unique_ids() {
        let sink = InMemoryOrderSink::new();
        let first = sink.create_order(new_order()).await.unwrap();
        let second = sink.create_order(new_order()).await.unwrap();
        assert_ne!(first, second);
        assert_eq!(sink.len().await, 2);
        assert_eq!(
            sink.get_order(first).await.unwrap().unwrap().status,
            OrderStatus::Pending
        );
    }

    #[tokio::test]
    async fn test_clones_share_storage() {
        let sink = InMemoryOrderSink::new();
        let clone = sink.clone();
        clone.create_order(new_order()).await.unwrap();
        assert!(!sink.is_empty().await);
    }

    #[tokio::test]
    async fn test_update_status_and_filter() {
        let sink = InMemoryOrderSink::new();
        let id = sink.create_order(new_order()).await.unwrap();
        sink.create_order(new_order()).await.unwrap();

        let order = sink
            .update_status(id, OrderStatus::Processing, Some("uramiti".to_string()))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.notes.as_deref(), Some("uramiti"));
        assert!(order.updated_at.is_some());

        let processing = sink.list_orders(Some(OrderStatus::Processing)).await.unwrap();
        assert_eq!(processing.len(), 1);
        assert_eq!(sink.list_orders(None).await.unwrap().len(), 2);

        // Notes survive a status change without new notes.
        let order = sink
            .update_status(id, OrderStatus::Shipped, None)
            .await
            .unwrap();
        assert_eq!(order.notes.as_deref(), Some("uramiti"));
        assert!(order.shipped_at.is_some());
    }

    #[tokio::test]
    async fn test_update_status_errors() {
        let sink = InMemoryOrderSink::new();
        let id = sink.create_order(new_order()).await.unwrap();

        assert!(matches!(
            sink.update_status(id, OrderStatus::Delivered, None).await,
            Err(OrderSinkError::InvalidTransition(_))
        ));
        assert!(matches!(
            sink.update_status(OrderId::generate(), OrderStatus::Canceled, None)
                .await,
            Err(OrderSinkError::NotFound(_))
        ));
    }
}
