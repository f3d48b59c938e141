//! Order confirmation notifications.
//!
//! Confirmations are best effort: checkout hands them to a bounded
//! [`NotificationQueue`] and a background worker delivers them through a
//! [`NotificationSink`]. A full queue or a failed delivery is logged and
//! never affects the order itself.

pub mod resend;

use std::future::Future;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use preluda_core::{Email, Order, OrderId, Price};

pub use resend::ResendClient;

/// Errors that can occur when delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Template rendering error.
    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    /// Failed to build a request or parse a response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// Delivery did not finish in time.
    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),
}

/// One line of a confirmation email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmationItem {
    pub name: String,
    pub size: String,
    pub finish: String,
    pub unit_price: Price,
    pub quantity: u32,
}

impl ConfirmationItem {
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// Everything a confirmation email shows, taken from a stored order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub customer_name: String,
    pub customer_email: Email,
    pub items: Vec<ConfirmationItem>,
    pub address: String,
    pub city: String,
    pub postal_code: String,
    pub country: String,
    pub subtotal: Price,
    /// Present only when a promo reduced the total.
    pub discount: Option<Price>,
    pub total: Price,
    pub placed_at: DateTime<Utc>,
}

impl OrderConfirmation {
    #[must_use]
    pub fn from_order(order: &Order) -> Self {
        let items = order
            .items
            .iter()
            .map(|item| ConfirmationItem {
                name: item.name.clone(),
                size: item.size_name.clone(),
                finish: item.finish_name.clone(),
                unit_price: item.unit_price,
                quantity: item.quantity,
            })
            .collect();

        let discount = order.totals.discount;
        Self {
            order_id: order.id,
            customer_name: order.shipping.full_name(),
            customer_email: order.shipping.email.clone(),
            items,
            address: order.shipping.address.clone(),
            city: order.shipping.city.clone(),
            postal_code: order.shipping.postal_code.clone(),
            country: order.shipping.country.clone(),
            subtotal: order.totals.subtotal,
            discount: (!discount.is_zero()).then_some(discount),
            total: order.totals.total,
            placed_at: order.created_at,
        }
    }

    /// Email subject line.
    #[must_use]
    pub fn subject(&self) -> String {
        format!("Potvrda porudžbine #{}", self.order_id)
    }
}

/// Delivers order confirmations.
pub trait NotificationSink: Send + Sync + 'static {
    /// Deliver one confirmation.
    fn send(
        &self,
        confirmation: &OrderConfirmation,
    ) -> impl Future<Output = Result<(), NotifyError>> + Send;
}

/// Sink that only logs, used when no email provider is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotificationSink;

impl NotificationSink for LogNotificationSink {
    async fn send(&self, confirmation: &OrderConfirmation) -> Result<(), NotifyError> {
        tracing::info!(
            order_id = %confirmation.order_id,
            to = %confirmation.customer_email,
            total = %confirmation.total,
            "Email delivery not configured, confirmation logged only"
        );
        Ok(())
    }
}

/// Producer side of the confirmation queue.
///
/// Cloning shares the same queue.
#[derive(Debug, Clone)]
pub struct NotificationQueue {
    tx: mpsc::Sender<OrderConfirmation>,
}

impl NotificationQueue {
    /// Queue a confirmation without waiting.
    ///
    /// Returns `false` when the confirmation was dropped because the queue is
    /// full or the worker has stopped.
    pub fn enqueue(&self, confirmation: OrderConfirmation) -> bool {
        let order_id = confirmation.order_id;
        match self.tx.try_send(confirmation) {
            Ok(()) => {
                tracing::debug!(order_id = %order_id, "Confirmation queued");
                true
            }
            Err(mpsc::error::TrySendError::Full(_)) => {
                tracing::warn!(order_id = %order_id, "Notification queue full, confirmation dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::warn!(order_id = %order_id, "Notification worker stopped, confirmation dropped");
                false
            }
        }
    }
}

/// Start the background worker draining the queue into `sink`.
///
/// The worker exits once every [`NotificationQueue`] clone is dropped and
/// the remaining confirmations are delivered.
pub fn spawn_notification_worker<S: NotificationSink>(
    sink: S,
    capacity: usize,
    send_timeout: Duration,
) -> (NotificationQueue, JoinHandle<()>) {
    let (tx, mut rx) = mpsc::channel::<OrderConfirmation>(capacity.max(1));

    let handle = tokio::spawn(async move {
        while let Some(confirmation) = rx.recv().await {
            let outcome = tokio::time::timeout(send_timeout, sink.send(&confirmation))
                .await
                .unwrap_or(Err(NotifyError::Timeout(send_timeout)));

            match outcome {
                Ok(()) => {
                    tracing::info!(order_id = %confirmation.order_id, "Confirmation delivered");
                }
                Err(e) => {
                    tracing::error!(
                        order_id = %confirmation.order_id,
                        error = %e,
                        "Failed to deliver order confirmation"
                    );
                }
            }
        }
        tracing::debug!("Notification worker stopped");
    });

    (NotificationQueue { tx }, handle)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tokio::sync::Mutex;

    use preluda_core::{
        FinishId, NewOrder, OrderItem, OrderTotals, ProductId, ShippingInfo, SizeId,
    };

    use super::*;

    #[derive(Clone, Default)]
    struct Recorder {
        sent: Arc<Mutex<Vec<OrderId>>>,
    }

    impl NotificationSink for Recorder {
        async fn send(&self, confirmation: &OrderConfirmation) -> Result<(), NotifyError> {
            self.sent.lock().await.push(confirmation.order_id);
            Ok(())
        }
    }

    struct Failing;

    impl NotificationSink for Failing {
        async fn send(&self, _: &OrderConfirmation) -> Result<(), NotifyError> {
            Err(NotifyError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        }
    }

    fn order(discount: i64) -> Order {
        let item = OrderItem {
            product_id: ProductId::new("13"),
            name: "BASS".to_string(),
            size_id: SizeId::new("a4"),
            size_name: "A4".to_string(),
            finish_id: FinishId::new("black-frame"),
            finish_name: "Crni ram".to_string(),
            unit_price: Price::new(1575),
            quantity: 2,
            image: "/product-photos/bass.png".to_string(),
        };
        let shipping = ShippingInfo {
            first_name: "Marko".to_string(),
            last_name: " Marković ".to_string(),
            email: Email::parse("marko@example.rs").unwrap(),
            phone: "0601234567".to_string(),
            address: "Knez Mihailova 1".to_string(),
            city: "Beograd".to_string(),
            postal_code: "11000".to_string(),
            country: "Srbija".to_string(),
            instagram: None,
        };
        let totals = OrderTotals::new(Price::new(3150), Price::new(discount));
        NewOrder::pending(vec![item], shipping, totals).into_order(OrderId::generate())
    }

    #[test]
    fn test_confirmation_from_order() {
        let order = order(0);
        let confirmation = OrderConfirmation::from_order(&order);
        assert_eq!(confirmation.customer_name, "Marko Marković");
        assert_eq!(confirmation.items.len(), 1);
        assert_eq!(confirmation.items.first().unwrap().line_total(), Price::new(3150));
        assert_eq!(confirmation.discount, None);
        assert_eq!(confirmation.total, Price::new(3150));
        assert_eq!(
            confirmation.subject(),
            format!("Potvrda porudžbine #{}", order.id)
        );
    }

    #[test]
    fn test_confirmation_carries_discount() {
        let confirmation = OrderConfirmation::from_order(&order(315));
        assert_eq!(confirmation.discount, Some(Price::new(315)));
        assert_eq!(confirmation.total, Price::new(2835));
    }

    #[tokio::test]
    async fn test_worker_delivers_queued_confirmations() {
        let recorder = Recorder::default();
        let (queue, handle) =
            spawn_notification_worker(recorder.clone(), 4, Duration::from_secs(1));

        let first = OrderConfirmation::from_order(&order(0));
        let second = OrderConfirmation::from_order(&order(0));
        let expected = vec![first.order_id, second.order_id];
        assert!(queue.enqueue(first));
        assert!(queue.enqueue(second));

        drop(queue);
        handle.await.unwrap();
        assert_eq!(*recorder.sent.lock().await, expected);
    }

    #[tokio::test]
    async fn test_failed_delivery_does_not_stop_worker() {
        let (queue, handle) = spawn_notification_worker(Failing, 2, Duration::from_secs(1));
        assert!(queue.enqueue(OrderConfirmation::from_order(&order(0))));
        assert!(queue.enqueue(OrderConfirmation::from_order(&order(0))));
        drop(queue);
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn test_enqueue_after_worker_stops_is_dropped() {
        let (queue, handle) =
            spawn_notification_worker(LogNotificationSink, 1, Duration::from_secs(1));
        handle.abort();
        let _ = handle.await;
        assert!(!queue.enqueue(OrderConfirmation::from_order(&order(0))));
    }
}
