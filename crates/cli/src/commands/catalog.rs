//! Catalog inspection and seeding commands.
//!
//! # Usage
//!
//! ```bash
//! # Validate the catalog, the alias table and the default product
//! preluda catalog check
//!
//! # Upsert the catalog into Postgres
//! preluda catalog seed --batch-size 100
//!
//! # Resolve inputs the way product URLs are resolved
//! preluda resolve BASS laju-kuje --explain
//!
//! # Print the price table for a product, or one price
//! preluda price casino
//! preluda price casino --size a3 --finish white-frame
//! ```
//!
//! # Environment Variables
//!
//! - `PRELUDA_CATALOG_PATH` - YAML/JSON catalog file (built-in catalog otherwise)
//! - `PRELUDA_ALIASES_PATH` - YAML alias table (built-in table otherwise)
//! - `PRELUDA_DEFAULT_PRODUCT` - Fallback product slug
//! - `PRELUDA_DATABASE_URL` - Required by `seed`

use preluda_storefront::db::products::{effective_batch_size, upsert_products};
use preluda_storefront::{AppError, PriceCalculator, StorefrontConfig};

use super::{CliError, connect, load_resolver};

/// Validate the configured catalog and alias table.
///
/// Alias tokens that also match a catalog slug by containment are reported
/// as warnings; they are legal but make resolution order-dependent.
///
/// # Errors
///
/// Returns an error if the catalog or alias table is invalid.
pub fn check(config: &StorefrontConfig) -> Result<(), CliError> {
    let resolver = load_resolver(config)?;
    let catalog = resolver.catalog();
    let aliases = config.resolver_config().map_err(AppError::from)?.aliases;

    for overlap in aliases.overlaps(catalog) {
        tracing::warn!(
            token = %overlap.token,
            target = %overlap.target,
            slug = %overlap.slug,
            "Alias token also matches a catalog slug"
        );
    }

    #[allow(clippy::print_stdout)]
    {
        println!("Catalog OK");
        println!("  Products:      {}", catalog.len());
        println!("  Active:        {}", catalog.active().count());
        println!("  Featured:      {}", catalog.featured().count());
        println!("  New arrivals:  {}", catalog.new_arrivals().count());
        println!("  Trending:      {}", catalog.trending().count());
        println!("  Aliases:       {}", aliases.len());
        println!("  Default:       {}", resolver.default_product().slug);
    }
    Ok(())
}

/// Upsert the configured catalog into the database.
///
/// # Errors
///
/// Returns an error if the catalog is invalid or the database write fails.
pub async fn seed(config: &StorefrontConfig, batch_size: usize) -> Result<(), CliError> {
    let catalog = config.load_catalog().map_err(AppError::from)?;
    let pool = connect(config).await?;

    let batch_size = effective_batch_size(batch_size);
    tracing::info!(products = catalog.len(), batch_size, "Seeding catalog");

    let written = upsert_products(&pool, catalog.products(), batch_size)
        .await
        .map_err(AppError::from)?;

    #[allow(clippy::print_stdout)]
    {
        println!("Seeded {written} products");
    }
    Ok(())
}

/// Print the product each input resolves to.
///
/// # Errors
///
/// Returns an error if the catalog or alias table is invalid.
pub fn resolve(config: &StorefrontConfig, inputs: &[String], explain: bool) -> Result<(), CliError> {
    let resolver = load_resolver(config)?;

    for input in inputs {
        let resolution = resolver.explain(input);
        #[allow(clippy::print_stdout)]
        {
            if explain {
                println!("{input} -> {} ({})", resolution.product.slug, resolution.rule);
            } else {
                println!("{input} -> {}", resolution.product.slug);
            }
        }
    }
    Ok(())
}

/// Print one price, or the full size x finish table.
///
/// # Errors
///
/// Returns an error if the catalog or alias table is invalid.
pub fn price(
    config: &StorefrontConfig,
    input: &str,
    selection: Option<(String, String)>,
) -> Result<(), CliError> {
    let resolver = load_resolver(config)?;
    let pricing = PriceCalculator::new(resolver.catalog().clone());
    let product = resolver.resolve(input);

    #[allow(clippy::print_stdout)]
    {
        match selection {
            Some((size, finish)) => {
                let price = pricing.price(product, &size, &finish);
                if price.is_zero() {
                    tracing::warn!(product = %product.slug, %size, %finish, "Selection not offered");
                }
                println!("{} {size} {finish}: {}", product.slug, price.display_rsd());
            }
            None => {
                println!("{}", product.slug);
                for entry in pricing.price_table(product) {
                    println!(
                        "  {:<4} {:<14} {:>10}",
                        entry.size.name,
                        entry.finish.id.as_str(),
                        entry.price.display_rsd()
                    );
                }
            }
        }
    }
    Ok(())
}
