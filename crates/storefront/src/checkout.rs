//! Checkout state machine and order submission.
//!
//! A [`CheckoutFlow`] is one customer's session: the cart, the optional
//! Instagram promo handle and the current [`CheckoutStage`]. Stage changes
//! are synchronous methods on the flow; the only async step is
//! [`CheckoutService::submit`], which snapshots the cart into an order,
//! persists it and queues the confirmation email.
//!
//! ```text
//! Browsing -> PromoPrompt -> ShippingForm -> Submitting -> Complete
//!                                 ^               |
//!                                 +--- Error <----+
//!                                        |
//!                                        v
//!                                    Abandoned
//! ```

use std::time::Duration;

use thiserror::Error;

use preluda_core::{
    InstagramHandle, InstagramHandleError, Language, NewOrder, OrderId, OrderItem, ProductId,
    ShippingInfo,
};

use crate::cart::{Cart, CartTotals, LineKey, PromoPolicy};
use crate::notify::{NotificationQueue, OrderConfirmation};
use crate::orders::{OrderSink, OrderSinkError};
use crate::pricing::PriceCalculator;

/// Default upper bound on one persistence attempt.
pub const DEFAULT_SUBMIT_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a customer is in the checkout.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CheckoutStage {
    /// Shopping; the cart may be edited.
    #[default]
    Browsing,
    /// Asked whether they follow the shop on Instagram.
    PromoPrompt,
    /// Filling in shipping details.
    ShippingForm,
    /// Order handed to the sink, waiting for the outcome.
    Submitting,
    /// Order stored; the cart has been cleared.
    Complete { order_id: OrderId },
    /// Persisting failed; the cart is intact and the customer may retry.
    Error { message: String },
    /// The customer gave up after a failure.
    Abandoned,
}

impl CheckoutStage {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Browsing => "browsing",
            Self::PromoPrompt => "promo_prompt",
            Self::ShippingForm => "shipping_form",
            Self::Submitting => "submitting",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
            Self::Abandoned => "abandoned",
        }
    }

    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Abandoned)
    }
}

impl std::fmt::Display for CheckoutStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors returned by checkout operations.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    /// The operation is not allowed from the current stage.
    #[error("cannot {operation} while {stage}")]
    InvalidStage {
        operation: &'static str,
        stage: &'static str,
    },

    /// A submission for this flow is already in flight.
    #[error("order is already being submitted")]
    AlreadySubmitting,

    /// A cart line references a product that is no longer sold.
    #[error("product {0} is no longer available")]
    UnknownProduct(ProductId),

    /// A cart line references a size or finish the product does not offer.
    #[error("selection {0} is not available")]
    InvalidSelection(LineKey),

    #[error("invalid Instagram handle: {0}")]
    InvalidPromo(#[from] InstagramHandleError),

    /// The order sink did not answer in time; the order may or may not exist.
    #[error("order submission timed out after {0:?}")]
    Timeout(Duration),

    #[error("order submission failed: {0}")]
    Sink(#[from] OrderSinkError),
}

/// One customer's checkout session.
#[derive(Debug, Clone, Default)]
pub struct CheckoutFlow {
    cart: Cart,
    promo: Option<InstagramHandle>,
    stage: CheckoutStage,
}

impl CheckoutFlow {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a session from a restored cart.
    #[must_use]
    pub fn with_cart(cart: Cart) -> Self {
        Self {
            cart,
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn stage(&self) -> &CheckoutStage {
        &self.stage
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// Mutable cart access, only while browsing.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::InvalidStage` outside [`CheckoutStage::Browsing`].
    pub fn cart_mut(&mut self) -> Result<&mut Cart, CheckoutError> {
        self.expect_stage("edit the cart", |stage| {
            matches!(stage, CheckoutStage::Browsing)
        })?;
        Ok(&mut self.cart)
    }

    /// The Instagram handle entered at the promo prompt, if any.
    #[must_use]
    pub const fn promo(&self) -> Option<&InstagramHandle> {
        self.promo.as_ref()
    }

    /// Current totals, including the promo discount when a handle is set.
    #[must_use]
    pub fn totals(&self, pricing: &PriceCalculator, policy: &PromoPolicy) -> CartTotals {
        self.cart.totals(pricing, policy, self.promo.as_ref())
    }

    /// `Browsing -> PromoPrompt`.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCart` if there is nothing to buy.
    pub fn begin_checkout(&mut self) -> Result<(), CheckoutError> {
        self.expect_stage("begin checkout", |stage| {
            matches!(stage, CheckoutStage::Browsing)
        })?;
        if self.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        self.stage = CheckoutStage::PromoPrompt;
        Ok(())
    }

    /// `PromoPrompt -> ShippingForm` with the promo discount applied.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPromo` if `handle` is not a usable Instagram handle;
    /// the stage is unchanged.
    pub fn apply_promo(&mut self, handle: &str) -> Result<(), CheckoutError> {
        self.expect_stage("apply a promo", |stage| {
            matches!(stage, CheckoutStage::PromoPrompt)
        })?;
        let handle = InstagramHandle::parse(handle)?;
        tracing::debug!(handle = %handle, "Instagram promo applied");
        self.promo = Some(handle);
        self.stage = CheckoutStage::ShippingForm;
        Ok(())
    }

    /// `PromoPrompt -> ShippingForm` without a discount.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStage` outside the promo prompt.
    pub fn skip_promo(&mut self) -> Result<(), CheckoutError> {
        self.expect_stage("skip the promo", |stage| {
            matches!(stage, CheckoutStage::PromoPrompt)
        })?;
        self.promo = None;
        self.stage = CheckoutStage::ShippingForm;
        Ok(())
    }

    /// Return to the cart from the prompt, the form or a failed submission.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStage` while submitting or after checkout finished.
    pub fn back_to_cart(&mut self) -> Result<(), CheckoutError> {
        self.expect_stage("go back to the cart", |stage| {
            matches!(
                stage,
                CheckoutStage::Browsing
                    | CheckoutStage::PromoPrompt
                    | CheckoutStage::ShippingForm
                    | CheckoutStage::Error { .. }
            )
        })?;
        self.stage = CheckoutStage::Browsing;
        Ok(())
    }

    /// `Error -> ShippingForm`, keeping the cart and promo.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStage` unless the last submission failed.
    pub fn retry(&mut self) -> Result<(), CheckoutError> {
        self.expect_stage("retry", |stage| matches!(stage, CheckoutStage::Error { .. }))?;
        self.stage = CheckoutStage::ShippingForm;
        Ok(())
    }

    /// Give up after a failed or interrupted submission.
    ///
    /// An interrupted submission has an unknown outcome, so giving up is the
    /// only way out of `Submitting`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStage` from any other stage.
    pub fn give_up(&mut self) -> Result<(), CheckoutError> {
        self.expect_stage("give up", |stage| {
            matches!(stage, CheckoutStage::Error { .. } | CheckoutStage::Submitting)
        })?;
        self.stage = CheckoutStage::Abandoned;
        Ok(())
    }

    /// Begin a new session after checkout finished. The promo is cleared;
    /// an abandoned cart is kept.
    ///
    /// # Errors
    ///
    /// Returns `InvalidStage` unless the stage is terminal.
    pub fn start_over(&mut self) -> Result<(), CheckoutError> {
        self.expect_stage("start over", CheckoutStage::is_terminal)?;
        self.promo = None;
        self.stage = CheckoutStage::Browsing;
        Ok(())
    }

    fn expect_stage(
        &self,
        operation: &'static str,
        allowed: impl Fn(&CheckoutStage) -> bool,
    ) -> Result<(), CheckoutError> {
        if allowed(&self.stage) {
            Ok(())
        } else {
            Err(CheckoutError::InvalidStage {
                operation,
                stage: self.stage.name(),
            })
        }
    }
}

/// Turns checkout flows into stored orders.
#[derive(Debug, Clone)]
pub struct CheckoutService<S> {
    pricing: PriceCalculator,
    policy: PromoPolicy,
    sink: S,
    notifications: Option<NotificationQueue>,
    submit_timeout: Duration,
}

impl<S: OrderSink> CheckoutService<S> {
    /// Create a service with the default promo and timeout and no
    /// confirmation emails.
    #[must_use]
    pub fn new(pricing: PriceCalculator, sink: S) -> Self {
        Self {
            pricing,
            policy: PromoPolicy::default(),
            sink,
            notifications: None,
            submit_timeout: DEFAULT_SUBMIT_TIMEOUT,
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: PromoPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub fn with_notifications(mut self, queue: NotificationQueue) -> Self {
        self.notifications = Some(queue);
        self
    }

    #[must_use]
    pub const fn with_submit_timeout(mut self, timeout: Duration) -> Self {
        self.submit_timeout = timeout;
        self
    }

    #[must_use]
    pub const fn pricing(&self) -> &PriceCalculator {
        &self.pricing
    }

    #[must_use]
    pub const fn policy(&self) -> &PromoPolicy {
        &self.policy
    }

    #[must_use]
    pub const fn sink(&self) -> &S {
        &self.sink
    }

    /// Freeze the flow's cart into an order with current names and prices.
    ///
    /// # Errors
    ///
    /// Returns `EmptyCart`, `UnknownProduct` or `InvalidSelection` if the
    /// cart cannot be ordered as it stands.
    pub fn snapshot(
        &self,
        flow: &CheckoutFlow,
        mut shipping: ShippingInfo,
    ) -> Result<NewOrder, CheckoutError> {
        if flow.cart.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let catalog = self.pricing.catalog();
        let items = flow
            .cart
            .lines()
            .iter()
            .map(|line| {
                let key = &line.key;
                let product = catalog
                    .by_id(&key.product_id)
                    .ok_or_else(|| CheckoutError::UnknownProduct(key.product_id.clone()))?;
                let (Some(size), Some(finish)) = (
                    product.size(key.size_id.as_str()),
                    product.finish(key.finish_id.as_str()),
                ) else {
                    return Err(CheckoutError::InvalidSelection(key.clone()));
                };

                Ok(OrderItem {
                    product_id: product.id.clone(),
                    name: product.name.get(Language::Sr).to_string(),
                    size_id: size.id.clone(),
                    size_name: size.name.clone(),
                    finish_id: finish.id.clone(),
                    finish_name: finish.name.get(Language::Sr).to_string(),
                    unit_price: self.pricing.line_unit_price(key),
                    quantity: line.quantity,
                    image: product.image_path(),
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        shipping.instagram.clone_from(&flow.promo);
        let totals = flow.totals(&self.pricing, &self.policy).order_totals();
        Ok(NewOrder::pending(items, shipping, totals))
    }

    /// Submit the flow's cart as an order.
    ///
    /// On success the cart is cleared, the confirmation email is queued and
    /// the flow is `Complete`. If the sink fails or times out the flow moves
    /// to `Error` with the cart intact. Snapshot errors leave the flow in
    /// `ShippingForm`.
    ///
    /// # Errors
    ///
    /// Returns `AlreadySubmitting` if an earlier submission was interrupted,
    /// `InvalidStage` outside the shipping form, snapshot errors, or the
    /// sink failure.
    #[tracing::instrument(skip_all, fields(lines = flow.cart.lines().len()))]
    pub async fn submit(
        &self,
        flow: &mut CheckoutFlow,
        shipping: ShippingInfo,
    ) -> Result<OrderId, CheckoutError> {
        if flow.stage == CheckoutStage::Submitting {
            return Err(CheckoutError::AlreadySubmitting);
        }
        flow.expect_stage("submit", |stage| {
            matches!(stage, CheckoutStage::ShippingForm)
        })?;

        let order = self.snapshot(flow, shipping)?;
        flow.stage = CheckoutStage::Submitting;

        let outcome = tokio::time::timeout(self.submit_timeout, self.sink.create_order(order.clone()))
            .await
            .map_err(|_| CheckoutError::Timeout(self.submit_timeout))
            .and_then(|result| result.map_err(CheckoutError::from));

        match outcome {
            Ok(order_id) => {
                tracing::info!(
                    order_id = %order_id,
                    total = %order.totals.total,
                    promo = order.shipping.instagram.is_some(),
                    "Order submitted"
                );
                if let Some(queue) = &self.notifications {
                    let stored = order.into_order(order_id);
                    queue.enqueue(OrderConfirmation::from_order(&stored));
                }
                flow.cart.clear();
                flow.stage = CheckoutStage::Complete { order_id };
                Ok(order_id)
            }
            Err(e) => {
                tracing::error!(error = %e, "Order submission failed");
                flow.stage = CheckoutStage::Error {
                    message: e.to_string(),
                };
                Err(e)
            }
        }
    }
}
