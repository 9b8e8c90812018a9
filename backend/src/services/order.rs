//! Order service
//!
//! Every mutation runs in one transaction: the order row and the affected
//! materials are locked, staged with the involved products in a
//! [`MemoryStore`], pushed through the shared [`OrderDesk`] workflow, and only
//! the resulting changes are written back. A rejected operation rolls back
//! without touching stock.
//!
//! The stock each item consumed is stored in `order_item_materials`, so
//! cancellation and edits restore exactly that amount.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::{
    InventoryRepository, Material, MemoryStore, Order, OrderDesk, OrderItem, OrderLine,
    OrderStatus, Pagination, PaginationMeta, Product,
};

use super::material::{lock_materials, store_quantities};
use super::product::load_products;

/// Order service
#[derive(Clone)]
pub struct OrderService {
    db: PgPool,
    edit_window: Duration,
}

/// Input for placing an order
#[derive(Debug, Deserialize, Validate)]
pub struct CreateOrderInput {
    /// Defaults to today
    pub order_date: Option<NaiveDate>,
    #[validate(length(min = 1, message = "Order must contain at least one item"))]
    pub items: Vec<OrderLine>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuantityInput {
    #[validate(range(min = 1, message = "Order quantity must be greater than zero"))]
    pub quantity: i64,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    pub status: Option<OrderStatus>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(default.page),
            limit: self.limit.unwrap_or(default.limit),
        }
        .normalized()
    }
}

#[derive(Debug, FromRow)]
struct OrderRow {
    id: Uuid,
    order_date: NaiveDate,
    status: String,
    created_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> AppResult<Order> {
        let status = OrderStatus::parse(&self.status)
            .ok_or_else(|| AppError::Internal(format!("Unknown order status {}", self.status)))?;
        Ok(Order {
            id: self.id,
            order_date: self.order_date,
            status,
            items,
            created_at: self.created_at,
        })
    }
}

#[derive(Debug, FromRow)]
struct OrderItemRow {
    id: Uuid,
    order_id: Uuid,
    product_id: Option<Uuid>,
    product_name_snapshot: String,
    quantity: i64,
}

impl From<OrderItemRow> for OrderItem {
    fn from(row: OrderItemRow) -> Self {
        OrderItem {
            id: row.id,
            order_id: row.order_id,
            product_id: row.product_id,
            product_name_snapshot: row.product_name_snapshot,
            quantity: row.quantity,
            consumed: Default::default(),
        }
    }
}

#[derive(Debug, FromRow)]
struct ConsumptionRow {
    order_item_id: Uuid,
    material_id: Uuid,
    quantity: Decimal,
}

impl OrderService {
    /// Create a new OrderService instance
    pub fn new(db: PgPool, edit_window: Duration) -> Self {
        Self { db, edit_window }
    }

    pub async fn list(&self, query: &OrderListQuery) -> AppResult<(Vec<Order>, PaginationMeta)> {
        let pagination = query.pagination();
        let status = query.status.map(|s| s.as_str());

        let total = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR status = $1)",
        )
        .bind(status)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, OrderRow>(
            r#"
            SELECT id, order_date, status, created_at
            FROM orders
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC, id
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status)
        .bind(i64::from(pagination.limit))
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let mut conn = self.db.acquire().await?;
        let orders = attach_items(&mut conn, rows).await?;
        let meta = PaginationMeta::new(&pagination, u64::try_from(total).unwrap_or(0));
        Ok((orders, meta))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Order> {
        let mut conn = self.db.acquire().await?;
        fetch_order(&mut conn, id, false)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".to_string()))
    }

    /// Orders created at or after `since`, without items
    pub async fn created_since(&self, since: DateTime<Utc>) -> AppResult<Vec<Order>> {
        let rows = sqlx::query_as::<_, OrderRow>(
            "SELECT id, order_date, status, created_at FROM orders WHERE created_at >= $1",
        )
        .bind(since)
        .fetch_all(&self.db)
        .await?;

        rows.into_iter().map(|r| r.into_order(Vec::new())).collect()
    }

    /// Place a confirmed order and consume its materials
    #[tracing::instrument(skip(self, input), fields(items = input.items.len()))]
    pub async fn create(&self, input: CreateOrderInput) -> AppResult<Order> {
        input.validate()?;
        let now = Utc::now();
        let order_date = input.order_date.unwrap_or_else(|| now.date_naive());

        let mut tx = self.db.begin().await?;

        let product_ids: Vec<Uuid> = input.items.iter().map(|l| l.product_id).collect();
        let products = load_products(&mut tx, &product_ids).await?;
        let (mut desk, before) = self.stage(&mut tx, products, None).await?;

        let order = desk.place_order(&input.items, order_date, now)?;

        store_quantities(&mut tx, &changed(&before, desk.repository().materials())).await?;
        insert_order(&mut tx, &order).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %order.id,
            portions = order.total_portions(),
            "order placed"
        );
        Ok(order)
    }

    /// Cancel a confirmed order and restock its materials
    #[tracing::instrument(skip(self))]
    pub async fn cancel(&self, order_id: Uuid) -> AppResult<Order> {
        let mut tx = self.db.begin().await?;

        let order = fetch_order(&mut tx, order_id, true)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
        let (mut desk, before) = self.stage(&mut tx, Vec::new(), Some(order)).await?;

        let order = desk.cancel_order(order_id)?;

        store_quantities(&mut tx, &changed(&before, desk.repository().materials())).await?;
        update_status(&mut tx, &order).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order.id, "order cancelled");
        Ok(order)
    }

    /// Mark a confirmed order completed
    #[tracing::instrument(skip(self))]
    pub async fn complete(&self, order_id: Uuid) -> AppResult<Order> {
        let mut tx = self.db.begin().await?;

        let order = fetch_order(&mut tx, order_id, true)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
        let (mut desk, _) = self.stage(&mut tx, Vec::new(), Some(order)).await?;

        let order = desk.complete_order(order_id)?;

        update_status(&mut tx, &order).await?;
        tx.commit().await?;

        tracing::info!(order_id = %order.id, "order completed");
        Ok(order)
    }

    /// Change one item's quantity inside the edit window
    #[tracing::instrument(skip(self, input), fields(quantity = input.quantity))]
    pub async fn update_item_quantity(
        &self,
        order_id: Uuid,
        item_id: Uuid,
        input: UpdateQuantityInput,
    ) -> AppResult<Order> {
        input.validate()?;
        let mut tx = self.db.begin().await?;

        let order = fetch_order(&mut tx, order_id, true)
            .await?
            .ok_or_else(|| AppError::NotFound("Order".to_string()))?;
        let product_ids: Vec<Uuid> = order
            .item(item_id)
            .and_then(|i| i.product_id)
            .into_iter()
            .collect();
        let products = load_products(&mut tx, &product_ids).await?;
        let (mut desk, before) = self.stage(&mut tx, products, Some(order)).await?;

        let order = desk.edit_item_quantity(order_id, item_id, input.quantity, Utc::now())?;

        store_quantities(&mut tx, &changed(&before, desk.repository().materials())).await?;
        sqlx::query("UPDATE order_items SET quantity = $2 WHERE id = $1")
            .bind(item_id)
            .bind(input.quantity)
            .execute(&mut *tx)
            .await?;
        if let Some(item) = order.item(item_id) {
            store_consumption(&mut tx, item).await?;
        }
        sqlx::query("UPDATE orders SET updated_at = NOW() WHERE id = $1")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(%order_id, %item_id, quantity = input.quantity, "order item edited");
        Ok(order)
    }

    /// Lock the materials the products and the order's items touch and stage
    /// everything for the workflow
    async fn stage(
        &self,
        conn: &mut PgConnection,
        products: Vec<Product>,
        order: Option<Order>,
    ) -> AppResult<(OrderDesk<MemoryStore>, Vec<Material>)> {
        let mut material_ids: Vec<Uuid> = products.iter().flat_map(|p| p.material_ids()).collect();
        if let Some(order) = &order {
            material_ids.extend(order.items.iter().flat_map(|i| i.consumed.keys().copied()));
        }
        material_ids.sort_unstable();
        material_ids.dedup();

        let materials = lock_materials(conn, &material_ids).await?;

        let mut store = MemoryStore::new();
        store.save_materials(materials.clone());
        for product in products {
            store.save_product(product);
        }
        if let Some(order) = order {
            store.save_order(order);
        }

        let desk = OrderDesk::new(store).with_edit_window(self.edit_window);
        Ok((desk, materials))
    }
}

/// Materials whose quantity differs from the staged copy
fn changed(before: &[Material], after: Vec<Material>) -> Vec<Material> {
    after
        .into_iter()
        .filter(|m| {
            before
                .iter()
                .find(|b| b.id == m.id)
                .map_or(true, |b| b.quantity != m.quantity)
        })
        .collect()
}

async fn fetch_order(conn: &mut PgConnection, id: Uuid, lock: bool) -> AppResult<Option<Order>> {
    let sql = if lock {
        "SELECT id, order_date, status, created_at FROM orders WHERE id = $1 FOR UPDATE"
    } else {
        "SELECT id, order_date, status, created_at FROM orders WHERE id = $1"
    };
    let row = sqlx::query_as::<_, OrderRow>(sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(attach_items(conn, vec![row]).await?.pop()),
        None => Ok(None),
    }
}

async fn attach_items(conn: &mut PgConnection, rows: Vec<OrderRow>) -> AppResult<Vec<Order>> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let item_rows = sqlx::query_as::<_, OrderItemRow>(
        r#"
        SELECT id, order_id, product_id, product_name_snapshot, quantity
        FROM order_items
        WHERE order_id = ANY($1)
        ORDER BY position, id
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let item_ids: Vec<Uuid> = item_rows.iter().map(|r| r.id).collect();
    let consumption_rows = sqlx::query_as::<_, ConsumptionRow>(
        r#"
        SELECT order_item_id, material_id, quantity
        FROM order_item_materials
        WHERE order_item_id = ANY($1)
        "#,
    )
    .bind(&item_ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut consumed: HashMap<Uuid, Vec<ConsumptionRow>> = HashMap::new();
    for row in consumption_rows {
        consumed.entry(row.order_item_id).or_default().push(row);
    }

    let mut items: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for row in item_rows {
        let mut item = OrderItem::from(row);
        item.consumed = consumed
            .remove(&item.id)
            .unwrap_or_default()
            .into_iter()
            .map(|c| (c.material_id, c.quantity))
            .collect();
        items.entry(item.order_id).or_default().push(item);
    }

    rows.into_iter()
        .map(|row| {
            let order_items = items.remove(&row.id).unwrap_or_default();
            row.into_order(order_items)
        })
        .collect()
}

async fn insert_order(conn: &mut PgConnection, order: &Order) -> AppResult<()> {
    sqlx::query(
        r#"
        INSERT INTO orders (id, order_date, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $4)
        "#,
    )
    .bind(order.id)
    .bind(order.order_date)
    .bind(order.status.as_str())
    .bind(order.created_at)
    .execute(&mut *conn)
    .await?;

    for (position, item) in order.items.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO order_items (id, order_id, product_id, product_name_snapshot, quantity, position)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(item.id)
        .bind(item.order_id)
        .bind(item.product_id)
        .bind(&item.product_name_snapshot)
        .bind(item.quantity)
        .bind(i32::try_from(position).unwrap_or(i32::MAX))
        .execute(&mut *conn)
        .await?;
        store_consumption(conn, item).await?;
    }
    Ok(())
}

/// Replace the recorded consumption of one item
async fn store_consumption(conn: &mut PgConnection, item: &OrderItem) -> AppResult<()> {
    sqlx::query("DELETE FROM order_item_materials WHERE order_item_id = $1")
        .bind(item.id)
        .execute(&mut *conn)
        .await?;

    for (material_id, quantity) in &item.consumed {
        sqlx::query(
            "INSERT INTO order_item_materials (order_item_id, material_id, quantity) VALUES ($1, $2, $3)",
        )
        .bind(item.id)
        .bind(material_id)
        .bind(quantity)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn update_status(conn: &mut PgConnection, order: &Order) -> AppResult<()> {
    sqlx::query("UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1")
        .bind(order.id)
        .bind(order.status.as_str())
        .execute(&mut *conn)
        .await?;
    Ok(())
}
