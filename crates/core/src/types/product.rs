//! Catalog records: products and their size/finish variants.

use serde::{Deserialize, Serialize};

use super::{FinishId, LocalizedText, Multiplier, Price, ProductId, SizeId, Slug};

/// A print dimension option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Size {
    pub id: SizeId,
    /// Short label, e.g. `A4`.
    pub name: String,
    /// Human-readable dimensions, e.g. `21x30 cm`.
    #[serde(default)]
    pub dimensions: String,
    pub base_price: Price,
}

/// A framing/treatment option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Finish {
    pub id: FinishId,
    pub name: LocalizedText,
    pub price_multiplier: Multiplier,
}

/// One sellable artwork design.
///
/// `sizes` and `finishes` are ordered; the first entry of each is the
/// default selection on the product page. Non-emptiness is enforced when the
/// product is admitted into a catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub slug: Slug,
    /// Exact-case variant of the slug used for the image asset filename.
    pub display_slug: String,
    pub name: LocalizedText,
    #[serde(default)]
    pub artist: Option<LocalizedText>,
    pub sizes: Vec<Size>,
    pub finishes: Vec<Finish>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub is_featured: bool,
    #[serde(default)]
    pub is_new: bool,
    #[serde(default)]
    pub is_trending: bool,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

const fn default_active() -> bool {
    true
}

impl Product {
    /// Look up a size variant by ID.
    #[must_use]
    pub fn size(&self, id: &str) -> Option<&Size> {
        self.sizes.iter().find(|s| s.id.as_str() == id)
    }

    /// Look up a finish variant by ID.
    #[must_use]
    pub fn finish(&self, id: &str) -> Option<&Finish> {
        self.finishes.iter().find(|f| f.id.as_str() == id)
    }

    /// The size pre-selected on the product page.
    #[must_use]
    pub fn default_size(&self) -> Option<&Size> {
        self.sizes.first()
    }

    /// The finish pre-selected on the product page (conventionally no frame).
    #[must_use]
    pub fn default_finish(&self) -> Option<&Finish> {
        self.finishes.first()
    }

    /// Path of the product photo, using the exact-case asset name.
    #[must_use]
    pub fn image_path(&self) -> String {
        format!("/product-photos/{}.png", self.display_slug)
    }

    /// Canonical product page path.
    #[must_use]
    pub fn url_path(&self) -> String {
        format!("/products/{}", self.slug)
    }

    /// Returns `true` if the product carries `tag` (case-insensitive).
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}
