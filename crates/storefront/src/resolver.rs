//! Forgiving slug resolution.
//!
//! Every URL the storefront ever published (old campaign links, nicknames,
//! typos with hyphens, mixed case) must land on a real product page. The
//! resolver maps any input string to exactly one catalog product and never
//! fails: rules are tried in a fixed order and the configured default
//! product is the last resort.
//!
//! | order | rule | matches when |
//! |---|---|---|
//! | 1 | [`MatchRule::Exact`] | the lowercased, trimmed key equals a slug |
//! | 2 | [`MatchRule::Alias`] | the key contains an alias token (table order) |
//! | 3 | [`MatchRule::Dehyphenated`] | the key without hyphens equals a slug |
//! | 4 | [`MatchRule::Containment`] | a slug contains the key or vice versa (catalog order) |
//! | - | [`MatchRule::Default`] | nothing else matched, or the input was empty |

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use preluda_core::Product;

use crate::catalog::Catalog;

/// Slug of the product shown when nothing else matches.
pub const DEFAULT_PRODUCT_SLUG: &str = "idepetak";

/// Errors raised while configuring a resolver.
///
/// Resolution itself cannot fail; these are construction-time checks.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The default slug is not in the catalog.
    #[error("default product {0:?} is not in the catalog")]
    UnknownDefault(String),

    /// An alias points at a slug that is not in the catalog.
    #[error("alias {token:?} targets unknown product {target:?}")]
    UnknownAliasTarget { token: String, target: String },

    /// An alias token is empty and would match every input.
    #[error("alias tokens cannot be empty (target {0:?})")]
    EmptyAliasToken(String),

    /// An alias file failed to parse.
    #[error("failed to parse alias table: {0}")]
    Parse(String),

    /// Reading an alias file failed.
    #[error("failed to read alias table: {0}")]
    Io(#[from] std::io::Error),
}

/// One resolution rule, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchRule {
    Exact,
    Alias,
    Dehyphenated,
    Containment,
    Default,
}

impl MatchRule {
    /// The matching rules in the order they are tried.
    pub const CASCADE: [Self; 4] = [
        Self::Exact,
        Self::Alias,
        Self::Dehyphenated,
        Self::Containment,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Alias => "alias",
            Self::Dehyphenated => "dehyphenated",
            Self::Containment => "containment",
            Self::Default => "default",
        }
    }
}

impl std::fmt::Display for MatchRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A substring token that redirects to a canonical slug.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alias {
    pub token: String,
    pub target: String,
}

/// Ordered alias table. The first token contained in the key wins.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AliasTable {
    entries: Vec<Alias>,
}

/// An alias token that also appears inside a different product's slug.
///
/// Inputs close to `slug` may be captured by the alias before the
/// containment rule gets a chance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasOverlap {
    pub token: String,
    pub target: String,
    pub slug: String,
}

#[rustfmt::skip]
const BUILTIN_ALIASES: &[(&str, &str)] = &[
    ("idepe", "idepetak"),
    ("petak", "idepetak"),
    ("kazino", "casino"),
    ("cas", "casino"),
    ("laju", "lajukuje"),
    ("kuje", "lajukuje"),
    ("laju-kuje", "lajukuje"),
    ("grsh", "grshemiach"),
    ("vlado", "vladoandjele"),
    ("andjele", "vladoandjele"),
    ("elena", "elenablakablaka"),
    ("blaka", "elenablakablaka"),
    ("jeca", "jecapack"),
    ("bang", "bangbang"),
    ("zovi", "zovime"),
    ("oprostajna", "oprostajna"),
    ("nikad", "nikad"),
    ("bicu", "bicu1"),
    ("jan", "januar"),
    ("svesto", "svesto"),
];

impl AliasTable {
    /// Build a table from `(token, target)` pairs, keeping their order.
    ///
    /// Tokens are lowercased and trimmed.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::EmptyAliasToken`] if a token is blank.
    pub fn new<I, T, S>(pairs: I) -> Result<Self, ResolverError>
    where
        I: IntoIterator<Item = (T, S)>,
        T: AsRef<str>,
        S: Into<String>,
    {
        let entries = pairs
            .into_iter()
            .map(|(token, target)| {
                let token = normalize(token.as_ref());
                let target = target.into();
                if token.is_empty() {
                    return Err(ResolverError::EmptyAliasToken(target));
                }
                Ok(Alias { token, target })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { entries })
    }

    /// The alias table the storefront has always shipped with.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            entries: BUILTIN_ALIASES
                .iter()
                .map(|&(token, target)| Alias {
                    token: token.to_string(),
                    target: target.to_string(),
                })
                .collect(),
        }
    }

    /// Parse a YAML list of `{ token, target }` entries.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError::Parse`] on malformed YAML or
    /// [`ResolverError::EmptyAliasToken`] for blank tokens.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ResolverError> {
        let entries: Vec<Alias> =
            serde_yaml::from_str(yaml).map_err(|e| ResolverError::Parse(e.to_string()))?;
        Self::new(entries.into_iter().map(|a| (a.token, a.target)))
    }

    /// Read a YAML alias file.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError`] if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ResolverError> {
        let contents = std::fs::read_to_string(path)?;
        let table = Self::from_yaml_str(&contents)?;
        tracing::info!(path = %path.display(), aliases = table.len(), "Loaded alias table");
        Ok(table)
    }

    /// Entries in match order.
    #[must_use]
    pub fn entries(&self) -> &[Alias] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// First alias whose token is contained in `key`.
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&Alias> {
        self.entries.iter().find(|alias| key.contains(&alias.token))
    }

    /// Report alias tokens that also occur inside another product's slug.
    #[must_use]
    pub fn overlaps(&self, catalog: &Catalog) -> Vec<AliasOverlap> {
        let mut overlaps = Vec::new();
        for alias in &self.entries {
            for product in catalog.products() {
                let slug = product.slug.as_str();
                if slug != alias.target && slug.contains(&alias.token) {
                    overlaps.push(AliasOverlap {
                        token: alias.token.clone(),
                        target: alias.target.clone(),
                        slug: slug.to_string(),
                    });
                }
            }
        }
        overlaps
    }
}

/// Resolver settings: fallback product and alias table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    pub default_slug: String,
    pub aliases: AliasTable,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            default_slug: DEFAULT_PRODUCT_SLUG.to_string(),
            aliases: AliasTable::builtin(),
        }
    }
}

/// The outcome of resolving an input, with the rule that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution<'a> {
    pub product: &'a Product,
    pub rule: MatchRule,
}

/// Maps arbitrary input strings onto catalog products.
#[derive(Debug, Clone)]
pub struct SlugResolver {
    catalog: Arc<Catalog>,
    aliases: AliasTable,
    default: Product,
}

impl SlugResolver {
    /// Create a resolver over `catalog`.
    ///
    /// # Errors
    ///
    /// Returns [`ResolverError`] if the default slug or any alias target is
    /// missing from the catalog.
    pub fn new(catalog: Arc<Catalog>, config: ResolverConfig) -> Result<Self, ResolverError> {
        let default = catalog
            .by_slug(&config.default_slug)
            .cloned()
            .ok_or_else(|| ResolverError::UnknownDefault(config.default_slug.clone()))?;

        if let Some(alias) = config
            .aliases
            .entries()
            .iter()
            .find(|alias| catalog.by_slug(&alias.target).is_none())
        {
            return Err(ResolverError::UnknownAliasTarget {
                token: alias.token.clone(),
                target: alias.target.clone(),
            });
        }

        Ok(Self {
            catalog,
            aliases: config.aliases,
            default,
        })
    }

    /// The catalog this resolver reads.
    #[must_use]
    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    /// The product returned when nothing matches.
    #[must_use]
    pub const fn default_product(&self) -> &Product {
        &self.default
    }

    /// Resolve `input` to a product. Never fails.
    #[must_use]
    pub fn resolve(&self, input: &str) -> &Product {
        self.explain(input).product
    }

    /// Resolve an optional input; `None` yields the default product.
    #[must_use]
    pub fn resolve_opt(&self, input: Option<&str>) -> &Product {
        input.map_or(&self.default, |input| self.resolve(input))
    }

    /// Resolve `input` and report which rule matched.
    #[must_use]
    pub fn explain(&self, input: &str) -> Resolution<'_> {
        let key = normalize(input);
        if key.is_empty() {
            return self.fallback(input);
        }

        for rule in MatchRule::CASCADE {
            if let Some(product) = self.apply(rule, &key) {
                tracing::debug!(input, %rule, slug = %product.slug, "Resolved slug");
                return Resolution { product, rule };
            }
        }

        self.fallback(input)
    }

    fn fallback(&self, input: &str) -> Resolution<'_> {
        tracing::debug!(input, slug = %self.default.slug, "No match, using default product");
        Resolution {
            product: &self.default,
            rule: MatchRule::Default,
        }
    }

    fn apply(&self, rule: MatchRule, key: &str) -> Option<&Product> {
        match rule {
            MatchRule::Exact => self.catalog.by_slug(key),
            MatchRule::Alias => self
                .aliases
                .lookup(key)
                .and_then(|alias| self.catalog.by_slug(&alias.target)),
            MatchRule::Dehyphenated => {
                let stripped = key.replace('-', "");
                if stripped.is_empty() {
                    None
                } else {
                    self.catalog.by_slug(&stripped)
                }
            }
            MatchRule::Containment => self.catalog.products().iter().find(|product| {
                let slug = product.slug.as_str();
                slug.contains(key) || key.contains(slug)
            }),
            MatchRule::Default => Some(&self.default),
        }
    }
}

fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn resolver() -> SlugResolver {
        let catalog = Arc::new(Catalog::builtin().unwrap());
        SlugResolver::new(catalog, ResolverConfig::default()).unwrap()
    }

    fn slug_of(resolver: &SlugResolver, input: &str) -> String {
        resolver.resolve(input).slug.to_string()
    }

    #[test]
    fn test_every_slug_resolves_to_itself() {
        let resolver = resolver();
        for product in resolver.catalog().products() {
            let resolution = resolver.explain(product.slug.as_str());
            assert_eq!(resolution.product, product);
            assert_eq!(resolution.rule, MatchRule::Exact);
        }
    }

    #[test]
    fn test_case_and_whitespace_insensitive() {
        let resolver = resolver();
        assert_eq!(slug_of(&resolver, "BASS"), "bass");
        assert_eq!(slug_of(&resolver, "  Casino \n"), "casino");
    }

    #[test]
    fn test_empty_and_absent_inputs_use_default() {
        let resolver = resolver();
        for input in ["", "   ", "\t"] {
            let resolution = resolver.explain(input);
            assert_eq!(resolution.product.slug.as_str(), DEFAULT_PRODUCT_SLUG);
            assert_eq!(resolution.rule, MatchRule::Default);
        }
        assert_eq!(
            resolver.resolve_opt(None).slug.as_str(),
            DEFAULT_PRODUCT_SLUG
        );
        assert_eq!(resolver.resolve_opt(Some("sat")).slug.as_str(), "sat");
    }

    #[test]
    fn test_unknown_inputs_use_default() {
        let resolver = resolver();
        for input in ["unknown-poster", "qqq", "-", "---"] {
            let resolution = resolver.explain(input);
            assert_eq!(resolution.rule, MatchRule::Default, "{input}");
            assert_eq!(resolution.product.slug.as_str(), DEFAULT_PRODUCT_SLUG);
        }
    }

    #[test]
    fn test_alias_rule() {
        let resolver = resolver();
        let resolution = resolver.explain("laju-kuje");
        assert_eq!(resolution.product.slug.as_str(), "lajukuje");
        assert_eq!(resolution.rule, MatchRule::Alias);
        assert_eq!(slug_of(&resolver, "kazino"), "casino");
        assert_eq!(slug_of(&resolver, "ide-petak"), "idepetak");
        assert_eq!(slug_of(&resolver, "bojan"), "januar");
    }

    #[test]
    fn test_alias_table_order_breaks_ties() {
        let resolver = resolver();
        assert_eq!(slug_of(&resolver, "cas-bang"), "casino");
        assert_eq!(slug_of(&resolver, "bang-cas"), "casino");
    }

    #[test]
    fn test_exact_beats_alias() {
        let resolver = resolver();
        assert_eq!(resolver.explain("casino").rule, MatchRule::Exact);
        assert_eq!(resolver.explain("bangbang").rule, MatchRule::Exact);
    }

    #[test]
    fn test_dehyphenated_rule() {
        let resolver = resolver();
        let resolution = resolver.explain("moj-beograd");
        assert_eq!(resolution.product.slug.as_str(), "mojbeograd");
        assert_eq!(resolution.rule, MatchRule::Dehyphenated);
    }

    #[test]
    fn test_containment_rule_uses_catalog_order() {
        let resolver = resolver();
        let resolution = resolver.explain("sat-remix");
        assert_eq!(resolution.product.slug.as_str(), "sat");
        assert_eq!(resolution.rule, MatchRule::Containment);

        // "kleo" is inside "kleopatra"
        assert_eq!(slug_of(&resolver, "kleo"), "kleopatra");
    }

    #[test]
    fn test_resolution_is_deterministic() {
        let resolver = resolver();
        for input in ["bang-cas", "sat-remix", "qqq", "MKMZ"] {
            assert_eq!(resolver.resolve(input), resolver.resolve(input));
        }
    }

    #[test]
    fn test_rejects_unknown_default_and_targets() {
        let catalog = Arc::new(Catalog::builtin().unwrap());
        let config = ResolverConfig {
            default_slug: "nope".to_string(),
            ..ResolverConfig::default()
        };
        assert!(matches!(
            SlugResolver::new(Arc::clone(&catalog), config),
            Err(ResolverError::UnknownDefault(_))
        ));

        let config = ResolverConfig {
            default_slug: "bass".to_string(),
            aliases: AliasTable::new([("ghost", "missing")]).unwrap(),
        };
        assert!(matches!(
            SlugResolver::new(catalog, config),
            Err(ResolverError::UnknownAliasTarget { .. })
        ));
    }

    #[test]
    fn test_alias_table_from_yaml_keeps_order() {
        let table = AliasTable::from_yaml_str(
            "- { token: ' Bang ', target: bangbang }\n- { token: cas, target: casino }\n",
        )
        .unwrap();
        let tokens: Vec<_> = table.entries().iter().map(|a| a.token.as_str()).collect();
        assert_eq!(tokens, ["bang", "cas"]);
        assert_eq!(table.lookup("bang-cas").unwrap().target, "bangbang");

        assert!(matches!(
            AliasTable::from_yaml_str("- { token: '  ', target: casino }"),
            Err(ResolverError::EmptyAliasToken(_))
        ));
    }

    #[test]
    fn test_custom_default_product() {
        let catalog = Arc::new(Catalog::builtin().unwrap());
        let config = ResolverConfig {
            default_slug: "bass".to_string(),
            aliases: AliasTable::default(),
        };
        let resolver = SlugResolver::new(catalog, config).unwrap();
        assert_eq!(resolver.resolve("qqq").slug.as_str(), "bass");
        // Without aliases, "laju-kuje" falls through to the dehyphenated rule.
        assert_eq!(resolver.explain("laju-kuje").rule, MatchRule::Dehyphenated);
    }

    #[test]
    fn test_overlaps() {
        let catalog = Catalog::builtin().unwrap();
        assert!(AliasTable::builtin().overlaps(&catalog).is_empty());

        let table = AliasTable::new([("ba", "bass")]).unwrap();
        let overlaps = table.overlaps(&catalog);
        let slugs: Vec<_> = overlaps.iter().map(|o| o.slug.as_str()).collect();
        assert_eq!(slugs, ["bangbang"]);
    }
}
