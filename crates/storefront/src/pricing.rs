//! Price calculation for (product, size, finish) selections.
//!
//! `price = round(size.basePrice × finish.priceMultiplier)`, rounded half
//! away from zero on exact decimals. An unknown size or finish prices at
//! zero: the product page shows `0 RSD` instead of failing.

use std::sync::Arc;

use preluda_core::{Finish, Price, Product, Size};

use crate::cart::LineKey;
use crate::catalog::Catalog;

/// One cell of a product's price table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceEntry<'a> {
    pub size: &'a Size,
    pub finish: &'a Finish,
    pub price: Price,
}

/// Prices selections against a shared catalog.
#[derive(Debug, Clone)]
pub struct PriceCalculator {
    catalog: Arc<Catalog>,
}

impl PriceCalculator {
    #[must_use]
    pub const fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// Price of one unit of `product` in the given size and finish.
    ///
    /// Returns [`Price::ZERO`] if either ID is not offered for the product.
    #[must_use]
    pub fn price(&self, product: &Product, size_id: &str, finish_id: &str) -> Price {
        match (product.size(size_id), product.finish(finish_id)) {
            (Some(size), Some(finish)) => size.base_price.scaled(finish.price_multiplier),
            _ => {
                tracing::debug!(
                    slug = %product.slug,
                    size_id,
                    finish_id,
                    "Unknown size or finish, pricing at zero"
                );
                Price::ZERO
            }
        }
    }

    /// Live unit price of a cart line, looked up in the catalog.
    ///
    /// A line whose product has left the catalog prices at zero.
    #[must_use]
    pub fn line_unit_price(&self, key: &LineKey) -> Price {
        self.catalog.by_id(&key.product_id).map_or_else(
            || {
                tracing::debug!(product_id = %key.product_id, "Product not in catalog, pricing at zero");
                Price::ZERO
            },
            |product| self.price(product, key.size_id.as_str(), key.finish_id.as_str()),
        )
    }

    /// Price of the default selection (first size, first finish).
    #[must_use]
    pub fn default_price(&self, product: &Product) -> Price {
        match (product.default_size(), product.default_finish()) {
            (Some(size), Some(finish)) => self.price(product, size.id.as_str(), finish.id.as_str()),
            _ => Price::ZERO,
        }
    }

    /// Every size × finish combination, sizes outermost, in declaration order.
    #[must_use]
    pub fn price_table<'a>(&self, product: &'a Product) -> Vec<PriceEntry<'a>> {
        product
            .sizes
            .iter()
            .flat_map(|size| {
                product.finishes.iter().map(move |finish| PriceEntry {
                    size,
                    finish,
                    price: size.base_price.scaled(finish.price_multiplier),
                })
            })
            .collect()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use preluda_core::{FinishId, ProductId, SizeId};

    use super::*;

    fn calculator() -> PriceCalculator {
        PriceCalculator::new(Arc::new(Catalog::builtin().unwrap()))
    }

    #[test]
    fn test_builtin_prices() {
        let calc = calculator();
        let bass = calc.catalog().by_slug("bass").unwrap().clone();
        assert_eq!(calc.price(&bass, "a4", "no-frame"), Price::new(900));
        assert_eq!(calc.price(&bass, "a4", "black-frame"), Price::new(1575));
        assert_eq!(calc.price(&bass, "a4", "white-frame"), Price::new(1575));
        assert_eq!(calc.price(&bass, "a3", "no-frame"), Price::new(1200));
        assert_eq!(calc.price(&bass, "a3", "black-frame"), Price::new(2100));
    }

    #[test]
    fn test_unknown_selection_prices_zero() {
        let calc = calculator();
        let bass = calc.catalog().by_slug("bass").unwrap().clone();
        assert_eq!(calc.price(&bass, "a2", "no-frame"), Price::ZERO);
        assert_eq!(calc.price(&bass, "a4", "gold-frame"), Price::ZERO);
        assert_eq!(calc.price(&bass, "", ""), Price::ZERO);
    }

    #[test]
    fn test_matches_formula_for_every_combination() {
        let calc = calculator();
        for product in calc.catalog().products() {
            for entry in calc.price_table(product) {
                let direct = calc.price(product, entry.size.id.as_str(), entry.finish.id.as_str());
                assert_eq!(entry.price, direct);
                assert_eq!(direct, entry.size.base_price.scaled(entry.finish.price_multiplier));
            }
        }
    }

    #[test]
    fn test_extreme_catalog_values_saturate() {
        let catalog = Catalog::from_yaml_str(
            r#"
products:
  - id: "1"
    slug: bass
    displaySlug: bass
    name: { sr: BASS, en: BASS }
    sizes:
      - { id: a4, name: A4, basePrice: 1000000000000000000 }
    finishes:
      - { id: gold-frame, name: { sr: Zlatni ram, en: Gold frame }, priceMultiplier: 100000000000 }
"#,
        )
        .unwrap();
        let calc = PriceCalculator::new(Arc::new(catalog));
        let bass = calc.catalog().by_slug("bass").unwrap().clone();
        assert_eq!(calc.price(&bass, "a4", "gold-frame"), Price::new(i64::MAX));
    }

    #[test]
    fn test_price_table_order() {
        let calc = calculator();
        let sat = calc.catalog().by_slug("sat").unwrap();
        let table = calc.price_table(sat);
        assert_eq!(table.len(), 6);
        assert_eq!(table[0].size.id.as_str(), "a4");
        assert_eq!(table[0].finish.id.as_str(), "no-frame");
        assert_eq!(table[5].size.id.as_str(), "a3");
        assert_eq!(table[5].finish.id.as_str(), "white-frame");
    }

    #[test]
    fn test_default_and_line_prices() {
        let calc = calculator();
        let sat = calc.catalog().by_slug("sat").unwrap();
        assert_eq!(calc.default_price(sat), Price::new(900));

        let key = LineKey::new(
            ProductId::new("28"),
            SizeId::new("a3"),
            FinishId::new("black-frame"),
        );
        assert_eq!(calc.line_unit_price(&key), Price::new(2100));

        let gone = LineKey::new(ProductId::new("999"), SizeId::new("a3"), FinishId::new("no-frame"));
        assert_eq!(calc.line_unit_price(&gone), Price::ZERO);
    }
}
