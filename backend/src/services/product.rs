//! Product and bill-of-materials service

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::Validate;

use crate::error::{AppError, AppResult};
use shared::{BomLine, Pagination, PaginationMeta, Product};

use super::material::fetch_materials;

/// Product service
#[derive(Clone)]
pub struct ProductService {
    db: PgPool,
}

/// Input for creating or renaming a product
#[derive(Debug, Deserialize, Validate)]
pub struct ProductNameInput {
    #[validate(length(min = 1, max = 120, message = "Product name is required"))]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct BomItemInput {
    pub material_id: Uuid,
    pub quantity_per_portion: Decimal,
}

/// Replacement bill of materials
#[derive(Debug, Deserialize)]
pub struct SetBomInput {
    pub items: Vec<BomItemInput>,
}

/// BOM line with its material's display fields
#[derive(Debug, Clone, Serialize)]
pub struct BomLineView {
    pub material_id: Uuid,
    pub material_name: Option<String>,
    pub unit: Option<String>,
    pub quantity_per_portion: Decimal,
}

/// Product with a readable bill of materials
#[derive(Debug, Clone, Serialize)]
pub struct ProductDetail {
    pub id: Uuid,
    pub name: String,
    pub bom: Vec<BomLineView>,
}

#[derive(Debug, FromRow)]
struct ProductRow {
    id: Uuid,
    name: String,
}

#[derive(Debug, FromRow)]
struct BomRow {
    product_id: Uuid,
    material_id: Uuid,
    quantity_per_portion: Decimal,
}

impl ProductService {
    /// Create a new ProductService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn list(&self, pagination: Pagination) -> AppResult<(Vec<Product>, PaginationMeta)> {
        let pagination = pagination.normalized();

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.db)
            .await?;

        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, name FROM products ORDER BY name, id LIMIT $1 OFFSET $2",
        )
        .bind(i64::from(pagination.limit))
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let mut conn = self.db.acquire().await?;
        let products = attach_boms(&mut conn, rows).await?;
        let meta = PaginationMeta::new(&pagination, u64::try_from(total).unwrap_or(0));
        Ok((products, meta))
    }

    pub async fn count(&self) -> AppResult<usize> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM products")
            .fetch_one(&self.db)
            .await?;
        Ok(usize::try_from(total).unwrap_or(0))
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Product> {
        let mut conn = self.db.acquire().await?;
        load_products(&mut conn, &[id])
            .await?
            .pop()
            .ok_or_else(|| AppError::NotFound("Product".to_string()))
    }

    pub async fn create(&self, input: ProductNameInput) -> AppResult<Product> {
        input.validate()?;

        let row = sqlx::query_as::<_, ProductRow>(
            "INSERT INTO products (name) VALUES ($1) RETURNING id, name",
        )
        .bind(input.name.trim())
        .fetch_one(&self.db)
        .await?;

        tracing::info!(product_id = %row.id, name = %row.name, "product created");
        Ok(Product {
            id: row.id,
            name: row.name,
            bom: Vec::new(),
        })
    }

    pub async fn rename(&self, id: Uuid, input: ProductNameInput) -> AppResult<Product> {
        input.validate()?;

        let result =
            sqlx::query("UPDATE products SET name = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(input.name.trim())
                .execute(&self.db)
                .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }
        self.get(id).await
    }

    /// Delete a product; order items keep their name snapshot
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Product".to_string()));
        }
        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }

    /// Product with material names resolved for display
    pub async fn detail(&self, id: Uuid) -> AppResult<ProductDetail> {
        let product = self.get(id).await?;
        let materials: HashMap<Uuid, shared::Material> =
            fetch_materials(&self.db, &product.material_ids())
                .await?
                .into_iter()
                .map(|m| (m.id, m))
                .collect();

        let bom = product
            .bom
            .iter()
            .map(|line| {
                let material = materials.get(&line.material_id);
                BomLineView {
                    material_id: line.material_id,
                    material_name: material.map(|m| m.name.clone()),
                    unit: material.map(|m| m.unit.clone()),
                    quantity_per_portion: line.quantity_per_portion,
                }
            })
            .collect();

        Ok(ProductDetail {
            id: product.id,
            name: product.name,
            bom,
        })
    }

    /// Replace a product's bill of materials in one transaction
    pub async fn set_bom(&self, id: Uuid, input: SetBomInput) -> AppResult<ProductDetail> {
        let lines: Vec<BomLine> = input
            .items
            .iter()
            .map(|i| BomLine::new(i.material_id, i.quantity_per_portion))
            .collect();
        shared::validate_bom(&lines).map_err(|m| AppError::validation("items", m))?;

        let mut tx = self.db.begin().await?;

        let exists =
            sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM products WHERE id = $1)")
                .bind(id)
                .fetch_one(&mut *tx)
                .await?;
        if !exists {
            return Err(AppError::NotFound("Product".to_string()));
        }

        let material_ids: Vec<Uuid> = lines.iter().map(|l| l.material_id).collect();
        let known = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM materials WHERE id = ANY($1)",
        )
        .bind(&material_ids)
        .fetch_one(&mut *tx)
        .await?;
        if usize::try_from(known).unwrap_or(0) != material_ids.len() {
            return Err(AppError::validation("items", "Unknown material in bill of materials"));
        }

        sqlx::query("DELETE FROM bom_items WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for (position, line) in lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO bom_items (product_id, material_id, quantity_per_portion, position)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(id)
            .bind(line.material_id)
            .bind(line.quantity_per_portion)
            .bind(i32::try_from(position).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE products SET updated_at = NOW() WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::info!(product_id = %id, lines = lines.len(), "bill of materials replaced");

        self.detail(id).await
    }
}

/// Load products with their BOM lines in recipe order
pub(crate) async fn load_products(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> AppResult<Vec<Product>> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT id, name FROM products WHERE id = ANY($1)",
    )
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;

    attach_boms(conn, rows).await
}

async fn attach_boms(conn: &mut PgConnection, rows: Vec<ProductRow>) -> AppResult<Vec<Product>> {
    let ids: Vec<Uuid> = rows.iter().map(|r| r.id).collect();
    let bom_rows = sqlx::query_as::<_, BomRow>(
        r#"
        SELECT product_id, material_id, quantity_per_portion
        FROM bom_items
        WHERE product_id = ANY($1)
        ORDER BY position, id
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await?;

    let mut boms: HashMap<Uuid, Vec<BomLine>> = HashMap::new();
    for row in bom_rows {
        boms.entry(row.product_id)
            .or_default()
            .push(BomLine::new(row.material_id, row.quantity_per_portion));
    }

    Ok(rows
        .into_iter()
        .map(|row| Product {
            bom: boms.remove(&row.id).unwrap_or_default(),
            id: row.id,
            name: row.name,
        })
        .collect())
}
