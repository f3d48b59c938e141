//! The canonical product catalog.
//!
//! A [`Catalog`] is an immutable, validated, ordered set of products. It is
//! built once (from the built-in seed, a YAML/JSON file, or the database) and
//! shared behind an `Arc` by the resolver, the price calculator and the
//! checkout service. Declaration order is preserved and is the order every
//! scan (containment matching, classification views) walks.

mod seed;

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use preluda_core::{Product, ProductId, Slug, SizeId};

/// Errors raised while building or loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A catalog must contain at least one product.
    #[error("catalog is empty")]
    Empty,

    /// Two products share a slug.
    #[error("duplicate product slug: {0}")]
    DuplicateSlug(Slug),

    /// Two products share an ID.
    #[error("duplicate product id: {0}")]
    DuplicateId(ProductId),

    /// A product offers no sizes.
    #[error("product {0} has no sizes")]
    MissingSizes(Slug),

    /// A product offers no finishes.
    #[error("product {0} has no finishes")]
    MissingFinishes(Slug),

    /// A size has a zero or negative base price.
    #[error("product {slug} size {size} must have a positive base price")]
    NonPositivePrice { slug: Slug, size: SizeId },

    /// The display slug is not a case variant of the slug.
    #[error("product {slug} display slug {display_slug:?} does not match its slug")]
    DisplaySlugMismatch { slug: Slug, display_slug: String },

    /// A record could not be turned into a product.
    #[error("invalid catalog record: {0}")]
    InvalidRecord(String),

    /// A catalog document failed to parse.
    #[error("failed to parse catalog: {0}")]
    Parse(String),

    /// A catalog file has an extension we do not read.
    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(String),

    /// Reading a catalog file failed.
    #[error("failed to read catalog: {0}")]
    Io(#[from] std::io::Error),
}

/// On-disk catalog document: `{ products: [...] }`.
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogDocument {
    pub products: Vec<Product>,
}

/// Validated, ordered product catalog.
#[derive(Debug, Clone)]
pub struct Catalog {
    products: Vec<Product>,
    by_slug: HashMap<String, usize>,
    by_id: HashMap<ProductId, usize>,
}

impl Catalog {
    /// Build a catalog, checking every product invariant.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] for the first invariant violation found:
    /// an empty catalog, duplicate slugs or IDs, products without sizes or
    /// finishes, non-positive base prices, or mismatched display slugs.
    pub fn new(products: Vec<Product>) -> Result<Self, CatalogError> {
        if products.is_empty() {
            return Err(CatalogError::Empty);
        }

        let mut by_slug = HashMap::with_capacity(products.len());
        let mut by_id = HashMap::with_capacity(products.len());

        for (index, product) in products.iter().enumerate() {
            validate_product(product)?;

            if by_slug
                .insert(product.slug.as_str().to_owned(), index)
                .is_some()
            {
                return Err(CatalogError::DuplicateSlug(product.slug.clone()));
            }
            if by_id.insert(product.id.clone(), index).is_some() {
                return Err(CatalogError::DuplicateId(product.id.clone()));
            }
        }

        Ok(Self {
            products,
            by_slug,
            by_id,
        })
    }

    /// The built-in PreludaStvar catalog (31 posters, A4/A3, three finishes).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] only if the seed data itself is inconsistent.
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(seed::products()?)
    }

    /// Parse a YAML catalog document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] on malformed YAML, or a validation
    /// error if the products break an invariant.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument =
            serde_yaml::from_str(yaml).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(document.products)
    }

    /// Parse a JSON catalog document.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] on malformed JSON, or a validation
    /// error if the products break an invariant.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let document: CatalogDocument =
            serde_json::from_str(json).map_err(|e| CatalogError::Parse(e.to_string()))?;
        Self::new(document.products)
    }

    /// Load a catalog file, picking the format from its extension
    /// (`.yaml`, `.yml` or `.json`).
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError`] if the file cannot be read, has an unknown
    /// extension, or does not hold a valid catalog.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let contents = std::fs::read_to_string(path)?;
        let catalog = match extension.as_str() {
            "yaml" | "yml" => Self::from_yaml_str(&contents)?,
            "json" => Self::from_json_str(&contents)?,
            _ => return Err(CatalogError::UnsupportedFormat(path.display().to_string())),
        };

        tracing::info!(path = %path.display(), products = catalog.len(), "Loaded catalog");
        Ok(catalog)
    }

    /// Exact lookup by canonical slug.
    #[must_use]
    pub fn by_slug(&self, slug: &str) -> Option<&Product> {
        self.by_slug
            .get(slug)
            .and_then(|&index| self.products.get(index))
    }

    /// Lookup by product ID.
    #[must_use]
    pub fn by_id(&self, id: &ProductId) -> Option<&Product> {
        self.by_id
            .get(id)
            .and_then(|&index| self.products.get(index))
    }

    /// All products in declaration order.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    /// Number of products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.products.len()
    }

    /// Always `false`: an empty catalog cannot be constructed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Featured products, in catalog order.
    pub fn featured(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.is_featured)
    }

    /// New arrivals, in catalog order.
    pub fn new_arrivals(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.is_new)
    }

    /// Trending products, in catalog order.
    pub fn trending(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.is_trending)
    }

    /// Products visible in the storefront, in catalog order.
    pub fn active(&self) -> impl Iterator<Item = &Product> {
        self.products.iter().filter(|p| p.is_active)
    }

    /// Products carrying `tag`, in catalog order.
    pub fn tagged<'a>(&'a self, tag: &'a str) -> impl Iterator<Item = &'a Product> {
        self.products.iter().filter(move |p| p.has_tag(tag))
    }
}

fn validate_product(product: &Product) -> Result<(), CatalogError> {
    if product.sizes.is_empty() {
        return Err(CatalogError::MissingSizes(product.slug.clone()));
    }
    if product.finishes.is_empty() {
        return Err(CatalogError::MissingFinishes(product.slug.clone()));
    }
    if let Some(size) = product.sizes.iter().find(|s| s.base_price.amount() <= 0) {
        return Err(CatalogError::NonPositivePrice {
            slug: product.slug.clone(),
            size: size.id.clone(),
        });
    }
    if !product
        .display_slug
        .eq_ignore_ascii_case(product.slug.as_str())
    {
        return Err(CatalogError::DisplaySlugMismatch {
            slug: product.slug.clone(),
            display_slug: product.display_slug.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use preluda_core::Price;

    use super::*;

    const TWO_POSTERS: &str = r#"
products:
  - id: "1"
    slug: bass
    displaySlug: bass
    name: { sr: BASS, en: BASS }
    sizes:
      - { id: a4, name: A4, dimensions: 21x30 cm, basePrice: 900 }
    finishes:
      - { id: no-frame, name: { sr: Bez rama, en: No frame }, priceMultiplier: 1.0 }
      - { id: black-frame, name: { sr: Crni ram, en: Black frame }, priceMultiplier: 1.75 }
    tags: [music, lyrics]
    isNew: true
  - id: "2"
    slug: sat
    displaySlug: SAT
    name: { sr: SAT, en: SAT }
    sizes:
      - { id: a4, name: A4, basePrice: 900 }
    finishes:
      - { id: no-frame, name: { sr: Bez rama, en: No frame }, priceMultiplier: 1 }
    isActive: false
"#;

    #[test]
    fn test_builtin_catalog_is_valid() {
        let catalog = Catalog::builtin().unwrap();
        assert_eq!(catalog.len(), 31);
        assert_eq!(catalog.products()[0].slug.as_str(), "apsolutnotvoj");
        assert_eq!(catalog.products()[30].slug.as_str(), "cecapack");
        for product in catalog.products() {
            assert_eq!(catalog.by_slug(product.slug.as_str()), Some(product));
            assert_eq!(catalog.by_id(&product.id), Some(product));
        }
    }

    #[test]
    fn test_builtin_classifications() {
        let catalog = Catalog::builtin().unwrap();
        let featured: Vec<_> = catalog.featured().map(|p| p.slug.as_str()).collect();
        assert_eq!(featured, ["apsolutnotvoj", "bangbang", "casino", "idepetak"]);
        let trending: Vec<_> = catalog.trending().map(|p| p.slug.as_str()).collect();
        assert_eq!(
            trending,
            ["apsolutnotvoj", "bangbang", "idepetak", "lajukuje", "zovime"]
        );
        let packs: Vec<_> = catalog.tagged("pack").map(|p| p.slug.as_str()).collect();
        assert_eq!(packs, ["cecapack"]);
        assert_eq!(catalog.new_arrivals().count(), 10);
    }

    #[test]
    fn test_from_yaml_preserves_order_and_flags() {
        let catalog = Catalog::from_yaml_str(TWO_POSTERS).unwrap();
        let slugs: Vec<_> = catalog.products().iter().map(|p| p.slug.as_str()).collect();
        assert_eq!(slugs, ["bass", "sat"]);
        assert_eq!(catalog.active().count(), 1);
        let bass = catalog.by_slug("bass").unwrap();
        assert_eq!(bass.sizes[0].base_price, Price::new(900));
        assert!(bass.is_new);
    }

    #[test]
    fn test_from_json() {
        let json = r#"{"products":[{"id":"7","slug":"jecapack","displaySlug":"JECAPACK",
            "name":{"sr":"JECAPACK","en":"JECAPACK"},
            "sizes":[{"id":"a3","name":"A3","basePrice":1200}],
            "finishes":[{"id":"no-frame","name":{"sr":"Bez rama","en":"No frame"},"priceMultiplier":"1.0"}]}]}"#;
        let catalog = Catalog::from_json_str(json).unwrap();
        assert!(catalog.by_slug("jecapack").is_some());
        assert!(catalog.by_slug("JECAPACK").is_none());
    }

    #[test]
    fn test_rejects_duplicates() {
        let mut products = Catalog::from_yaml_str(TWO_POSTERS).unwrap().products().to_vec();
        let mut clone = products[0].clone();
        clone.id = ProductId::new("99");
        products.push(clone);
        assert!(matches!(
            Catalog::new(products.clone()),
            Err(CatalogError::DuplicateSlug(_))
        ));

        let last = products.len() - 1;
        products[last].slug = Slug::parse("bass-remix").unwrap();
        products[last].display_slug = "bass-remix".to_string();
        products[last].id = ProductId::new("1");
        assert!(matches!(
            Catalog::new(products),
            Err(CatalogError::DuplicateId(_))
        ));
    }

    #[test]
    fn test_rejects_broken_products() {
        let base = Catalog::from_yaml_str(TWO_POSTERS).unwrap().products()[0].clone();

        let mut no_sizes = base.clone();
        no_sizes.sizes.clear();
        assert!(matches!(
            Catalog::new(vec![no_sizes]),
            Err(CatalogError::MissingSizes(_))
        ));

        let mut no_finishes = base.clone();
        no_finishes.finishes.clear();
        assert!(matches!(
            Catalog::new(vec![no_finishes]),
            Err(CatalogError::MissingFinishes(_))
        ));

        let mut free = base.clone();
        free.sizes[0].base_price = Price::ZERO;
        assert!(matches!(
            Catalog::new(vec![free]),
            Err(CatalogError::NonPositivePrice { .. })
        ));

        let mut renamed = base;
        renamed.display_slug = "BASSS".to_string();
        assert!(matches!(
            Catalog::new(vec![renamed]),
            Err(CatalogError::DisplaySlugMismatch { .. })
        ));

        assert!(matches!(Catalog::new(Vec::new()), Err(CatalogError::Empty)));
    }

    #[test]
    fn test_rejects_discounting_multiplier_at_parse_time() {
        let yaml = TWO_POSTERS.replace("priceMultiplier: 1.75", "priceMultiplier: 0.5");
        assert!(matches!(
            Catalog::from_yaml_str(&yaml),
            Err(CatalogError::Parse(_))
        ));
    }

    #[test]
    fn test_load_rejects_unknown_extension() {
        let path = std::env::temp_dir().join(format!("catalog-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "products = []").unwrap();
        let result = Catalog::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(matches!(result, Err(CatalogError::UnsupportedFormat(_))));
    }

    #[test]
    fn test_load_yaml_file() {
        let path = std::env::temp_dir().join(format!("catalog-{}.yaml", uuid::Uuid::new_v4()));
        std::fs::write(&path, TWO_POSTERS).unwrap();
        let result = Catalog::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert_eq!(result.unwrap().len(), 2);
    }
}
