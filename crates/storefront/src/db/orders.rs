//! Order repository for database operations.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use preluda_core::{
    Email, FinishId, InstagramHandle, NewOrder, Order, OrderId, OrderItem, OrderStatus,
    OrderTotals, Price, ProductId, ShippingInfo, SizeId,
};

use super::RepositoryError;
use crate::orders::{OrderSink, OrderSinkError, OrderStore};

const ORDER_COLUMNS: &str = r"
    id, status, first_name, last_name, email, phone, address, city, postal_code,
    country, instagram, subtotal, discount, total, notes,
    created_at, updated_at, shipped_at, delivered_at
";

#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: Uuid,
    status: String,
    first_name: String,
    last_name: String,
    email: String,
    phone: String,
    address: String,
    city: String,
    postal_code: String,
    country: String,
    instagram: Option<String>,
    subtotal: i64,
    discount: i64,
    total: i64,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    shipped_at: Option<DateTime<Utc>>,
    delivered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, sqlx::FromRow)]
struct ItemRow {
    order_id: Uuid,
    product_id: String,
    name: String,
    size_id: String,
    size_name: String,
    finish_id: String,
    finish_name: String,
    unit_price: i64,
    quantity: i32,
    image: String,
}

impl ItemRow {
    fn into_item(self) -> Result<OrderItem, RepositoryError> {
        let quantity = u32::try_from(self.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!(
                "invalid quantity {} in order {}",
                self.quantity, self.order_id
            ))
        })?;
        Ok(OrderItem {
            product_id: ProductId::new(self.product_id),
            name: self.name,
            size_id: SizeId::new(self.size_id),
            size_name: self.size_name,
            finish_id: FinishId::new(self.finish_id),
            finish_name: self.finish_name,
            unit_price: Price::new(self.unit_price),
            quantity,
            image: self.image,
        })
    }
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Result<Order, RepositoryError> {
        let status = self.status.parse::<OrderStatus>().map_err(|e| {
            RepositoryError::DataCorruption(format!("order {}: {e}", self.id))
        })?;
        let email = Email::parse(&self.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in order {}: {e}", self.id))
        })?;
        let instagram = self
            .instagram
            .as_deref()
            .map(InstagramHandle::parse)
            .transpose()
            .map_err(|e| {
                RepositoryError::DataCorruption(format!(
                    "invalid instagram handle in order {}: {e}",
                    self.id
                ))
            })?;

        Ok(Order {
            id: OrderId::from_uuid(self.id),
            items,
            shipping: ShippingInfo {
                first_name: self.first_name,
                last_name: self.last_name,
                email,
                phone: self.phone,
                address: self.address,
                city: self.city,
                postal_code: self.postal_code,
                country: self.country,
                instagram,
            },
            totals: OrderTotals {
                subtotal: Price::new(self.subtotal),
                discount: Price::new(self.discount),
                total: Price::new(self.total),
            },
            status,
            created_at: self.created_at,
            updated_at: self.updated_at,
            shipped_at: self.shipped_at,
            delivered_at: self.delivered_at,
            notes: self.notes,
        })
    }
}

/// Insert an order and its items in one transaction.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if any insert fails; nothing is
/// written in that case.
pub async fn insert_order(pool: &PgPool, order: &NewOrder) -> Result<OrderId, RepositoryError> {
    let id = OrderId::generate();
    let mut tx = pool.begin().await?;

    sqlx::query(
        r"
        INSERT INTO preluda.orders (
            id, status, first_name, last_name, email, phone, address, city,
            postal_code, country, instagram, subtotal, discount, total, created_at
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
        ",
    )
    .bind(id.as_uuid())
    .bind(order.status.as_str())
    .bind(&order.shipping.first_name)
    .bind(&order.shipping.last_name)
    .bind(order.shipping.email.as_str())
    .bind(&order.shipping.phone)
    .bind(&order.shipping.address)
    .bind(&order.shipping.city)
    .bind(&order.shipping.postal_code)
    .bind(&order.shipping.country)
    .bind(order.shipping.instagram.as_ref().map(InstagramHandle::as_str))
    .bind(order.totals.subtotal.amount())
    .bind(order.totals.discount.amount())
    .bind(order.totals.total.amount())
    .bind(order.created_at)
    .execute(&mut *tx)
    .await
    .map_err(RepositoryError::from_write)?;

    for (position, item) in order.items.iter().enumerate() {
        let position = i32::try_from(position)
            .map_err(|_| RepositoryError::DataCorruption("too many order items".to_string()))?;
        let quantity = i32::try_from(item.quantity).map_err(|_| {
            RepositoryError::DataCorruption(format!("quantity {} out of range", item.quantity))
        })?;

        sqlx::query(
            r"
            INSERT INTO preluda.order_items (
                order_id, position, product_id, name, size_id, size_name,
                finish_id, finish_name, unit_price, quantity, image
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            ",
        )
        .bind(id.as_uuid())
        .bind(position)
        .bind(item.product_id.as_str())
        .bind(&item.name)
        .bind(item.size_id.as_str())
        .bind(&item.size_name)
        .bind(item.finish_id.as_str())
        .bind(&item.finish_name)
        .bind(item.unit_price.amount())
        .bind(quantity)
        .bind(&item.image)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(id)
}

async fn fetch_items(
    conn: &mut PgConnection,
    order_ids: &[Uuid],
) -> Result<HashMap<Uuid, Vec<OrderItem>>, RepositoryError> {
    let rows = sqlx::query_as::<_, ItemRow>(
        r"
        SELECT order_id, product_id, name, size_id, size_name, finish_id,
               finish_name, unit_price, quantity, image
        FROM preluda.order_items
        WHERE order_id = ANY($1)
        ORDER BY order_id, position
        ",
    )
    .bind(order_ids)
    .fetch_all(conn)
    .await?;

    let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for row in rows {
        let order_id = row.order_id;
        items.entry(order_id).or_default().push(row.into_item()?);
    }
    Ok(items)
}

fn assemble(
    rows: Vec<OrderRow>,
    mut items: HashMap<Uuid, Vec<OrderItem>>,
) -> Result<Vec<Order>, RepositoryError> {
    rows.into_iter()
        .map(|row| {
            let order_items = items.remove(&row.id).unwrap_or_default();
            row.into_order(order_items)
        })
        .collect()
}

/// Get an order with its items.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if stored data is invalid.
pub async fn get_order(pool: &PgPool, id: OrderId) -> Result<Option<Order>, RepositoryError> {
    let mut conn = pool.acquire().await?;
    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM preluda.orders WHERE id = $1"
    ))
    .bind(id.as_uuid())
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };
    let items = fetch_items(&mut conn, &[row.id]).await?;
    Ok(assemble(vec![row], items)?.into_iter().next())
}

/// List orders newest first, optionally filtered by status.
///
/// # Errors
///
/// Returns `RepositoryError::Database` if the query fails.
/// Returns `RepositoryError::DataCorruption` if stored data is invalid.
pub async fn list_orders(
    pool: &PgPool,
    status: Option<OrderStatus>,
) -> Result<Vec<Order>, RepositoryError> {
    let mut conn = pool.acquire().await?;
    let rows = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM preluda.orders
         WHERE ($1::text IS NULL OR status = $1)
         ORDER BY created_at DESC"
    ))
    .bind(status.map(|s| s.as_str()))
    .fetch_all(&mut *conn)
    .await?;

    let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();
    let items = fetch_items(&mut conn, &ids).await?;
    assemble(rows, items)
}

/// Advance an order's status, stamping lifecycle timestamps.
///
/// The row is locked for the duration of the check-and-update.
///
/// # Errors
///
/// Returns `RepositoryError::NotFound` if the order does not exist, and
/// `OrderSinkError::InvalidTransition` (via [`PgOrderStore`]) if the move is
/// not allowed.
pub async fn update_status(
    pool: &PgPool,
    id: OrderId,
    next: OrderStatus,
    notes: Option<String>,
) -> Result<Order, OrderSinkError> {
    let mut tx = pool.begin().await.map_err(RepositoryError::from)?;

    let row = sqlx::query_as::<_, OrderRow>(&format!(
        "SELECT {ORDER_COLUMNS} FROM preluda.orders WHERE id = $1 FOR UPDATE"
    ))
    .bind(id.as_uuid())
    .fetch_optional(&mut *tx)
    .await
    .map_err(RepositoryError::from)?
    .ok_or(OrderSinkError::NotFound(id))?;

    let mut items = fetch_items(&mut tx, &[row.id]).await?;
    let mut order = row.into_order(items.remove(&id.as_uuid()).unwrap_or_default())?;

    order.apply_status(next, Utc::now())?;
    if notes.is_some() {
        order.notes = notes;
    }

    sqlx::query(
        r"
        UPDATE preluda.orders
        SET status = $2, updated_at = $3, shipped_at = $4, delivered_at = $5, notes = $6
        WHERE id = $1
        ",
    )
    .bind(id.as_uuid())
    .bind(order.status.as_str())
    .bind(order.updated_at)
    .bind(order.shipped_at)
    .bind(order.delivered_at)
    .bind(&order.notes)
    .execute(&mut *tx)
    .await
    .map_err(RepositoryError::from)?;

    tx.commit().await.map_err(RepositoryError::from)?;
    tracing::info!(order_id = %id, status = %order.status, "Order status updated");
    Ok(order)
}

/// Postgres-backed [`OrderStore`].
#[derive(Debug, Clone)]
pub struct PgOrderStore {
    pool: PgPool,
}

impl PgOrderStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl OrderSink for PgOrderStore {
    async fn create_order(&self, order: NewOrder) -> Result<OrderId, OrderSinkError> {
        Ok(insert_order(&self.pool, &order).await?)
    }
}

impl OrderStore for PgOrderStore {
    async fn get_order(&self, id: OrderId) -> Result<Option<Order>, OrderSinkError> {
        Ok(get_order(&self.pool, id).await?)
    }

    async fn list_orders(&self, status: Option<OrderStatus>) -> Result<Vec<Order>, OrderSinkError> {
        Ok(list_orders(&self.pool, status).await?)
    }

    async fn update_status(
        &self,
        id: OrderId,
        next: OrderStatus,
        notes: Option<String>,
    ) -> Result<Order, OrderSinkError> {
        update_status(&self.pool, id, next, notes).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(status: &str, instagram: Option<&str>) -> OrderRow {
        OrderRow {
            id: Uuid::new_v4(),
            status: status.to_string(),
            first_name: "Jelena".to_string(),
            last_name: "Petrović".to_string(),
            email: "jelena@example.rs".to_string(),
            phone: "0641112223".to_string(),
            address: "Cara Dušana 5".to_string(),
            city: "Niš".to_string(),
            postal_code: "18000".to_string(),
            country: "Srbija".to_string(),
            instagram: instagram.map(str::to_string),
            subtotal: 2700,
            discount: 270,
            total: 2430,
            notes: None,
            created_at: Utc::now(),
            updated_at: None,
            shipped_at: None,
            delivered_at: None,
        }
    }

    #[test]
    fn test_row_decodes_into_order() {
        let order = row("processing", Some("jelena.p")).into_order(Vec::new()).unwrap();
        assert_eq!(order.status, OrderStatus::Processing);
        assert_eq!(order.shipping.instagram.unwrap().as_str(), "jelena.p");
        assert_eq!(order.totals.total, Price::new(2430));
    }

    #[test]
    fn test_corrupt_rows_are_reported() {
        assert!(matches!(
            row("lost", None).into_order(Vec::new()),
            Err(RepositoryError::DataCorruption(_))
        ));
        let mut bad_email = row("pending", None);
        bad_email.email = "nope".to_string();
        assert!(matches!(
            bad_email.into_order(Vec::new()),
            Err(RepositoryError::DataCorruption(_))
        ));
    }

    #[test]
    fn test_negative_quantity_is_corruption() {
        let item = ItemRow {
            order_id: Uuid::new_v4(),
            product_id: "13".to_string(),
            name: "BASS".to_string(),
            size_id: "a4".to_string(),
            size_name: "A4".to_string(),
            finish_id: "no-frame".to_string(),
            finish_name: "Bez rama".to_string(),
            unit_price: 900,
            quantity: -1,
            image: "/product-photos/bass.png".to_string(),
        };
        assert!(matches!(
            item.into_item(),
            Err(RepositoryError::DataCorruption(_))
        ));
    }
}
