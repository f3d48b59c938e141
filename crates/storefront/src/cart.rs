//! Per-session shopping cart.
//!
//! Lines are keyed by `(product, size, finish)`; adding a selection that is
//! already in the cart bumps its quantity instead of appending a new line.
//! The cart stores identity and quantity only. Prices are re-derived from
//! the live catalog on every read and frozen into the order at checkout.

use serde::{Deserialize, Serialize};

use preluda_core::{FinishId, InstagramHandle, OrderTotals, Price, Product, ProductId, SizeId};

use crate::pricing::PriceCalculator;

/// Discount granted to Instagram followers, in percent.
pub const DEFAULT_PROMO_PERCENT: u8 = 10;

/// Composite identity of a cart line.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineKey {
    pub product_id: ProductId,
    pub size_id: SizeId,
    pub finish_id: FinishId,
}

impl LineKey {
    #[must_use]
    pub const fn new(product_id: ProductId, size_id: SizeId, finish_id: FinishId) -> Self {
        Self {
            product_id,
            size_id,
            finish_id,
        }
    }
}

impl std::fmt::Display for LineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}-{}", self.product_id, self.size_id, self.finish_id)
    }
}

/// One selection in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    #[serde(flatten)]
    pub key: LineKey,
    pub quantity: u32,
}

/// Promotional discount rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromoPolicy {
    percent: u8,
}

impl Default for PromoPolicy {
    fn default() -> Self {
        Self {
            percent: DEFAULT_PROMO_PERCENT,
        }
    }
}

impl PromoPolicy {
    /// Create a policy; percentages above 100 are capped.
    #[must_use]
    pub fn new(percent: u8) -> Self {
        Self {
            percent: percent.min(100),
        }
    }

    #[must_use]
    pub const fn percent(&self) -> u8 {
        self.percent
    }

    /// `round(subtotal × percent / 100)` when the promo flag is present,
    /// zero otherwise.
    #[must_use]
    pub fn discount(&self, subtotal: Price, promo: Option<&InstagramHandle>) -> Price {
        if promo.is_some() {
            subtotal.percent(self.percent)
        } else {
            Price::ZERO
        }
    }
}

/// Cart summary shown on the cart page and at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartTotals {
    pub item_count: u32,
    pub subtotal: Price,
    pub discount: Price,
    pub total: Price,
}

impl CartTotals {
    #[must_use]
    pub const fn order_totals(&self) -> OrderTotals {
        OrderTotals {
            subtotal: self.subtotal,
            discount: self.discount,
            total: self.total,
        }
    }
}

/// A shopping cart.
///
/// Deserializing replays every stored line through the same merge and
/// clamping rules as [`Cart::add_line`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "CartDocument")]
pub struct Cart {
    lines: Vec<CartLine>,
}

/// Cart as persisted by a client, before its lines are normalized.
#[derive(Deserialize)]
struct CartDocument {
    #[serde(default)]
    lines: Vec<CartLine>,
}

impl From<CartDocument> for Cart {
    fn from(document: CartDocument) -> Self {
        let mut cart = Self::new();
        for line in document.lines {
            cart.merge_line(line.key, line.quantity);
        }
        cart
    }
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `quantity` of a selection, merging with an existing line.
    ///
    /// A quantity of zero is treated as one. Returns the line's key.
    pub fn add_line(
        &mut self,
        product: &Product,
        size_id: &str,
        finish_id: &str,
        quantity: u32,
    ) -> LineKey {
        let key = LineKey::new(
            product.id.clone(),
            SizeId::new(size_id),
            FinishId::new(finish_id),
        );
        self.merge_line(key.clone(), quantity);
        key
    }

    fn merge_line(&mut self, key: LineKey, quantity: u32) {
        let quantity = quantity.max(1);
        if let Some(line) = self.lines.iter_mut().find(|line| line.key == key) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(CartLine { key, quantity });
        }
    }

    /// Set a line's quantity. Quantities below one are ignored (use
    /// [`Cart::remove_line`] to delete a line).
    ///
    /// Returns `true` if a line was updated.
    pub fn update_quantity(&mut self, key: &LineKey, quantity: u32) -> bool {
        if quantity < 1 {
            return false;
        }
        match self.lines.iter_mut().find(|line| &line.key == key) {
            Some(line) => {
                line.quantity = quantity;
                true
            }
            None => false,
        }
    }

    /// Remove a line. Removing a missing line is a no-op.
    ///
    /// Returns `true` if a line was removed.
    pub fn remove_line(&mut self, key: &LineKey) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| &line.key != key);
        self.lines.len() != before
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    #[must_use]
    pub fn line(&self, key: &LineKey) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.key == key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of prints across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0, |count, line| count.saturating_add(line.quantity))
    }

    /// Sum of live unit price × quantity.
    #[must_use]
    pub fn subtotal(&self, pricing: &PriceCalculator) -> Price {
        self.lines
            .iter()
            .map(|line| pricing.line_unit_price(&line.key).times(line.quantity))
            .sum()
    }

    /// Subtotal, discount and total for the current cart contents.
    #[must_use]
    pub fn totals(
        &self,
        pricing: &PriceCalculator,
        policy: &PromoPolicy,
        promo: Option<&InstagramHandle>,
    ) -> CartTotals {
        let subtotal = self.subtotal(pricing);
        let discount = policy.discount(subtotal, promo);
        CartTotals {
            item_count: self.item_count(),
            subtotal,
            discount,
            total: subtotal.saturating_sub(discount),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use crate::catalog::Catalog;

    use super::*;

    fn pricing() -> PriceCalculator {
        PriceCalculator::new(Arc::new(Catalog::builtin().unwrap()))
    }

    fn product(pricing: &PriceCalculator, slug: &str) -> Product {
        pricing.catalog().by_slug(slug).unwrap().clone()
    }

    #[test]
    fn test_adding_same_selection_merges() {
        let pricing = pricing();
        let bass = product(&pricing, "bass");
        let mut cart = Cart::new();
        cart.add_line(&bass, "a4", "black-frame", 2);
        let key = cart.add_line(&bass, "a4", "black-frame", 3);
        assert_eq!(cart.line(&key).unwrap().quantity, 5);
        assert_eq!(cart.lines().len(), 1);
    }

    #[test]
    fn test_different_finish_is_a_new_line() {
        let pricing = pricing();
        let bass = product(&pricing, "bass");
        let mut cart = Cart::new();
        cart.add_line(&bass, "a4", "black-frame", 1);
        cart.add_line(&bass, "a4", "white-frame", 1);
        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.lines()[1].key.to_string(), "13-a4-white-frame");
    }

    #[test]
    fn test_add_clamps_zero_quantity() {
        let pricing = pricing();
        let sat = product(&pricing, "sat");
        let mut cart = Cart::new();
        let key = cart.add_line(&sat, "a4", "no-frame", 0);
        assert_eq!(cart.line(&key).unwrap().quantity, 1);
    }

    #[test]
    fn test_update_quantity_ignores_zero() {
        let pricing = pricing();
        let sat = product(&pricing, "sat");
        let mut cart = Cart::new();
        let key = cart.add_line(&sat, "a4", "no-frame", 2);
        assert!(!cart.update_quantity(&key, 0));
        assert_eq!(cart.line(&key).unwrap().quantity, 2);
        assert!(cart.update_quantity(&key, 7));
        assert_eq!(cart.item_count(), 7);

        let missing = LineKey::new(ProductId::new("1"), SizeId::new("a4"), FinishId::new("no-frame"));
        assert!(!cart.update_quantity(&missing, 3));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let pricing = pricing();
        let sat = product(&pricing, "sat");
        let mut cart = Cart::new();
        let key = cart.add_line(&sat, "a4", "no-frame", 1);
        assert!(cart.remove_line(&key));
        assert!(!cart.remove_line(&key));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_bass_scenario() {
        let pricing = pricing();
        let bass = product(&pricing, "bass");
        let mut cart = Cart::new();
        cart.add_line(&bass, "a4", "black-frame", 2);
        cart.add_line(&bass, "a4", "black-frame", 1);

        let totals = cart.totals(&pricing, &PromoPolicy::default(), None);
        assert_eq!(cart.lines().len(), 1);
        assert_eq!(totals.item_count, 3);
        assert_eq!(totals.subtotal, Price::new(4725));
        assert_eq!(totals.discount, Price::ZERO);
        assert_eq!(totals.total, Price::new(4725));
    }

    #[test]
    fn test_promo_discount() {
        let pricing = pricing();
        let mut cart = Cart::new();
        // 900 + 1800 = 2700
        cart.add_line(&product(&pricing, "sat"), "a4", "no-frame", 1);
        cart.add_line(&product(&pricing, "bik"), "a4", "no-frame", 2);
        let handle = InstagramHandle::parse("@preluda.fan").unwrap();

        let totals = cart.totals(&pricing, &PromoPolicy::default(), Some(&handle));
        assert_eq!(totals.subtotal, Price::new(2700));
        assert_eq!(totals.discount, Price::new(270));
        assert_eq!(totals.total, Price::new(2430));
        assert_eq!(totals.order_totals().total, Price::new(2430));
    }

    #[test]
    fn test_promo_policy_bounds() {
        let handle = InstagramHandle::parse("fan").unwrap();
        let all = PromoPolicy::new(250);
        assert_eq!(all.percent(), 100);
        assert_eq!(all.discount(Price::new(900), Some(&handle)), Price::new(900));
        let none = PromoPolicy::new(0);
        assert_eq!(none.discount(Price::new(900), Some(&handle)), Price::ZERO);
        assert_eq!(
            PromoPolicy::default().discount(Price::new(1575), Some(&handle)),
            Price::new(158)
        );
    }

    #[test]
    fn test_subtotal_uses_live_prices() {
        let pricing = pricing();
        let mut cart = Cart::new();
        cart.add_line(&product(&pricing, "sat"), "a4", "no-frame", 1);

        let mut products = pricing.catalog().products().to_vec();
        let sat = products.iter_mut().find(|p| p.slug.as_str() == "sat").unwrap();
        sat.sizes[0].base_price = Price::new(1000);
        let repriced = PriceCalculator::new(Arc::new(Catalog::new(products).unwrap()));

        assert_eq!(cart.subtotal(&pricing), Price::new(900));
        assert_eq!(cart.subtotal(&repriced), Price::new(1000));
    }

    #[test]
    fn test_cart_round_trips_through_json() {
        let pricing = pricing();
        let mut cart = Cart::new();
        cart.add_line(&product(&pricing, "bass"), "a3", "white-frame", 2);
        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json["lines"][0]["productId"], "13");
        assert_eq!(json["lines"][0]["finishId"], "white-frame");
        let restored: Cart = serde_json::from_value(json).unwrap();
        assert_eq!(restored, cart);
    }

    #[test]
    fn test_restored_cart_merges_duplicates_and_clamps_zero() {
        let pricing = pricing();
        let restored: Cart = serde_json::from_value(serde_json::json!({
            "lines": [
                { "productId": "13", "sizeId": "a4", "finishId": "no-frame", "quantity": 0 },
                { "productId": "13", "sizeId": "a4", "finishId": "no-frame", "quantity": 2 },
                { "productId": "13", "sizeId": "a3", "finishId": "no-frame", "quantity": 0 }
            ]
        }))
        .unwrap();

        assert_eq!(restored.lines().len(), 2);
        assert_eq!(restored.lines()[0].quantity, 3);
        assert_eq!(restored.lines()[1].quantity, 1);
        assert!(restored.lines().iter().all(|line| line.quantity >= 1));
        assert_eq!(restored.subtotal(&pricing), Price::new(3900));

        let mut added = Cart::new();
        let bass = product(&pricing, "bass");
        added.add_line(&bass, "a4", "no-frame", 0);
        added.add_line(&bass, "a4", "no-frame", 2);
        added.add_line(&bass, "a3", "no-frame", 0);
        assert_eq!(restored, added);
    }

    #[test]
    fn test_restored_cart_without_lines_is_empty() {
        let restored: Cart = serde_json::from_str("{}").unwrap();
        assert!(restored.is_empty());
    }
}
