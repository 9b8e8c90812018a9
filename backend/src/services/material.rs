//! Material stock management service

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{FromRow, PgConnection, PgPool};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::error::{AppError, AppResult};
use shared::{Material, Pagination, PaginationMeta};

use super::rule;

/// Material service for stock CRUD
#[derive(Clone)]
pub struct MaterialService {
    db: PgPool,
}

/// Input for creating a material
#[derive(Debug, Deserialize, Validate)]
pub struct CreateMaterialInput {
    #[validate(length(min = 1, max = 120, message = "Material name is required"))]
    pub name: String,
    #[validate(custom = "supported_unit")]
    pub unit: String,
    #[validate(custom = "non_negative_stock")]
    pub quantity: Decimal,
    pub expiry_date: Option<NaiveDate>,
    #[validate(custom = "non_negative_threshold")]
    pub low_stock_threshold: Option<Decimal>,
}

/// Partial update; absent fields keep their value
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateMaterialInput {
    #[validate(length(min = 1, max = 120, message = "Material name is required"))]
    pub name: Option<String>,
    #[validate(custom = "supported_unit")]
    pub unit: Option<String>,
    #[validate(custom = "non_negative_stock")]
    pub quantity: Option<Decimal>,
    pub expiry_date: Option<NaiveDate>,
    #[validate(custom = "non_negative_threshold")]
    pub low_stock_threshold: Option<Decimal>,
}

/// Query parameters for listing materials
#[derive(Debug, Deserialize)]
pub struct MaterialListQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
    #[serde(default)]
    pub low_stock: bool,
}

impl MaterialListQuery {
    pub fn pagination(&self) -> Pagination {
        let default = Pagination::default();
        Pagination {
            page: self.page.unwrap_or(default.page),
            limit: self.limit.unwrap_or(default.limit),
        }
        .normalized()
    }
}

fn supported_unit(unit: &str) -> Result<(), ValidationError> {
    shared::validate_unit(unit).map_err(|m| rule("unit", m))
}

fn non_negative_stock(quantity: &Decimal) -> Result<(), ValidationError> {
    shared::validate_stock_quantity(*quantity).map_err(|m| rule("quantity", m))
}

fn non_negative_threshold(threshold: &Decimal) -> Result<(), ValidationError> {
    shared::validate_low_stock_threshold(*threshold).map_err(|m| rule("low_stock_threshold", m))
}

#[derive(Debug, FromRow)]
pub(crate) struct MaterialRow {
    id: Uuid,
    name: String,
    unit: String,
    quantity: Decimal,
    low_stock_threshold: Option<Decimal>,
    expiry_date: Option<NaiveDate>,
}

impl From<MaterialRow> for Material {
    fn from(row: MaterialRow) -> Self {
        Material {
            id: row.id,
            name: row.name,
            unit: row.unit,
            quantity: row.quantity,
            low_stock_threshold: row.low_stock_threshold,
            expiry_date: row.expiry_date,
        }
    }
}

pub(crate) const MATERIAL_COLUMNS: &str =
    "id, name, unit, quantity, low_stock_threshold, expiry_date";

const LOW_STOCK_FILTER: &str =
    "($1 = false OR (low_stock_threshold IS NOT NULL AND quantity <= low_stock_threshold))";

impl MaterialService {
    /// Create a new MaterialService instance
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// List materials by name, optionally only those at or below their threshold
    pub async fn list(&self, query: &MaterialListQuery) -> AppResult<(Vec<Material>, PaginationMeta)> {
        let pagination = query.pagination();

        let total = sqlx::query_scalar::<_, i64>(&format!(
            "SELECT COUNT(*) FROM materials WHERE {}",
            LOW_STOCK_FILTER
        ))
        .bind(query.low_stock)
        .fetch_one(&self.db)
        .await?;

        let rows = sqlx::query_as::<_, MaterialRow>(&format!(
            "SELECT {} FROM materials WHERE {} ORDER BY name, id LIMIT $2 OFFSET $3",
            MATERIAL_COLUMNS, LOW_STOCK_FILTER
        ))
        .bind(query.low_stock)
        .bind(i64::from(pagination.limit))
        .bind(pagination.offset())
        .fetch_all(&self.db)
        .await?;

        let meta = PaginationMeta::new(&pagination, u64::try_from(total).unwrap_or(0));
        Ok((rows.into_iter().map(Material::from).collect(), meta))
    }

    /// Every material, for the dashboard
    pub async fn all(&self) -> AppResult<Vec<Material>> {
        let rows = sqlx::query_as::<_, MaterialRow>(&format!(
            "SELECT {} FROM materials ORDER BY name, id",
            MATERIAL_COLUMNS
        ))
        .fetch_all(&self.db)
        .await?;
        Ok(rows.into_iter().map(Material::from).collect())
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Material> {
        sqlx::query_as::<_, MaterialRow>(&format!(
            "SELECT {} FROM materials WHERE id = $1",
            MATERIAL_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?
        .map(Material::from)
        .ok_or_else(|| AppError::NotFound("Material".to_string()))
    }

    pub async fn create(&self, input: CreateMaterialInput) -> AppResult<Material> {
        input.validate()?;

        let row = sqlx::query_as::<_, MaterialRow>(&format!(
            r#"
            INSERT INTO materials (name, unit, quantity, low_stock_threshold, expiry_date)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            MATERIAL_COLUMNS
        ))
        .bind(input.name.trim())
        .bind(&input.unit)
        .bind(input.quantity)
        .bind(input.low_stock_threshold)
        .bind(input.expiry_date)
        .fetch_one(&self.db)
        .await?;

        tracing::info!(material_id = %row.id, name = %row.name, "material created");
        Ok(row.into())
    }

    pub async fn update(&self, id: Uuid, input: UpdateMaterialInput) -> AppResult<Material> {
        input.validate()?;

        sqlx::query_as::<_, MaterialRow>(&format!(
            r#"
            UPDATE materials SET
                name = COALESCE($2, name),
                unit = COALESCE($3, unit),
                quantity = COALESCE($4, quantity),
                expiry_date = COALESCE($5, expiry_date),
                low_stock_threshold = COALESCE($6, low_stock_threshold),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            MATERIAL_COLUMNS
        ))
        .bind(id)
        .bind(input.name.as_deref().map(str::trim))
        .bind(&input.unit)
        .bind(input.quantity)
        .bind(input.expiry_date)
        .bind(input.low_stock_threshold)
        .fetch_optional(&self.db)
        .await?
        .map(Material::from)
        .ok_or_else(|| AppError::NotFound("Material".to_string()))
    }

    /// Delete a material that no product's BOM still uses
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        let used_by = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(DISTINCT product_id) FROM bom_items WHERE material_id = $1",
        )
        .bind(id)
        .fetch_one(&self.db)
        .await?;

        if used_by > 0 {
            return Err(AppError::Conflict(format!(
                "Material is used by {} product(s)",
                used_by
            )));
        }

        let result = sqlx::query("DELETE FROM materials WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Material".to_string()));
        }
        tracing::info!(material_id = %id, "material deleted");
        Ok(())
    }
}

/// Lock the given materials for the rest of the transaction
///
/// Rows are locked in id order so concurrent orders cannot deadlock.
pub(crate) async fn lock_materials(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> AppResult<Vec<Material>> {
    let rows = sqlx::query_as::<_, MaterialRow>(&format!(
        "SELECT {} FROM materials WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        MATERIAL_COLUMNS
    ))
    .bind(ids)
    .fetch_all(&mut *conn)
    .await?;
    Ok(rows.into_iter().map(Material::from).collect())
}

/// Unlocked read of the given materials
pub(crate) async fn fetch_materials(pool: &PgPool, ids: &[Uuid]) -> AppResult<Vec<Material>> {
    let rows = sqlx::query_as::<_, MaterialRow>(&format!(
        "SELECT {} FROM materials WHERE id = ANY($1)",
        MATERIAL_COLUMNS
    ))
    .bind(ids)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Material::from).collect())
}

/// Write back quantities computed by the order workflow
pub(crate) async fn store_quantities(
    conn: &mut PgConnection,
    materials: &[Material],
) -> AppResult<()> {
    for material in materials {
        sqlx::query("UPDATE materials SET quantity = $2, updated_at = NOW() WHERE id = $1")
            .bind(material.id)
            .bind(material.quantity)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}
