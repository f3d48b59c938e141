//! Catalog product storage.
//!
//! Products are stored whole as JSONB documents alongside the columns the
//! storefront filters on. Seeding upserts in batches, one transaction per
//! batch.

use sqlx::PgPool;

use preluda_core::Product;

use super::RepositoryError;
use crate::catalog::Catalog;

/// Largest number of writes committed in one batch.
pub const MAX_BATCH_SIZE: usize = 499;

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    document: serde_json::Value,
}

/// Clamp a requested batch size to `1..=MAX_BATCH_SIZE`.
#[must_use]
pub fn effective_batch_size(requested: usize) -> usize {
    requested.clamp(1, MAX_BATCH_SIZE)
}

/// Insert or update `products`, keeping their order as the catalog order.
///
/// Returns the number of products written.
///
/// # Errors
///
/// Returns `RepositoryError::Conflict` if a slug is already used by a
/// different product ID, or `RepositoryError::Database` on other failures.
/// Batches committed before the failure stay committed.
pub async fn upsert_products(
    pool: &PgPool,
    products: &[Product],
    batch_size: usize,
) -> Result<usize, RepositoryError> {
    let batch_size = effective_batch_size(batch_size);
    let mut written = 0;

    for (batch_index, batch) in products.chunks(batch_size).enumerate() {
        let mut tx = pool.begin().await?;

        for (offset, product) in batch.iter().enumerate() {
            let position = i32::try_from(batch_index * batch_size + offset).map_err(|_| {
                RepositoryError::DataCorruption("catalog position out of range".to_string())
            })?;
            let document = serde_json::to_value(product).map_err(|e| {
                RepositoryError::DataCorruption(format!("cannot encode {}: {e}", product.slug))
            })?;

            sqlx::query(
                r"
                INSERT INTO preluda.catalog_products (id, slug, position, is_active, document)
                VALUES ($1, $2, $3, $4, $5)
                ON CONFLICT (id) DO UPDATE SET
                    slug = EXCLUDED.slug,
                    position = EXCLUDED.position,
                    is_active = EXCLUDED.is_active,
                    document = EXCLUDED.document,
                    updated_at = NOW()
                ",
            )
            .bind(product.id.as_str())
            .bind(product.slug.as_str())
            .bind(position)
            .bind(product.is_active)
            .bind(document)
            .execute(&mut *tx)
            .await
            .map_err(RepositoryError::from_write)?;
        }

        tx.commit().await?;
        written += batch.len();
        tracing::debug!(batch = batch_index, size = batch.len(), "Committed product batch");
    }

    tracing::info!(products = written, "Upserted catalog products");
    Ok(written)
}

/// Load every stored product, in catalog order, as a validated catalog.
///
/// # Errors
///
/// Returns `RepositoryError::DataCorruption` if a stored document does not
/// decode or the products violate a catalog invariant.
pub async fn load_catalog(pool: &PgPool) -> Result<Catalog, RepositoryError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        r"
        SELECT id, document
        FROM preluda.catalog_products
        ORDER BY position, id
        ",
    )
    .fetch_all(pool)
    .await?;

    let products = rows
        .into_iter()
        .map(|row| {
            serde_json::from_value::<Product>(row.document).map_err(|e| {
                RepositoryError::DataCorruption(format!("invalid product {}: {e}", row.id))
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Catalog::new(products).map_err(|e| RepositoryError::DataCorruption(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_size_is_capped() {
        assert_eq!(effective_batch_size(0), 1);
        assert_eq!(effective_batch_size(100), 100);
        assert_eq!(effective_batch_size(499), 499);
        assert_eq!(effective_batch_size(500), MAX_BATCH_SIZE);
        assert_eq!(effective_batch_size(usize::MAX), MAX_BATCH_SIZE);
    }
}
