//! Production feasibility service
//!
//! Read-only calculations over the current stock of a product's materials.

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppResult;
use shared::{can_fulfill_order, max_producible, FulfillmentCheck, ProductionCapacity, StockSnapshot};

use super::material::fetch_materials;
use super::ProductService;

#[derive(Clone)]
pub struct ProductionService {
    db: PgPool,
}

impl ProductionService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// How many portions of a product the current stock supports
    pub async fn calculate(&self, product_id: Uuid) -> AppResult<ProductionCapacity> {
        let product = ProductService::new(self.db.clone()).get(product_id).await?;
        let stock: StockSnapshot = fetch_materials(&self.db, &product.material_ids())
            .await?
            .into_iter()
            .collect();

        let capacity = max_producible(&product, &stock);
        tracing::debug!(
            product_id = %product_id,
            max_portions = capacity.max_portions,
            shortages = capacity.shortages.len(),
            "production capacity calculated"
        );
        Ok(capacity)
    }

    /// Whether `quantity` portions could be ordered right now
    ///
    /// An unknown product is reported as not fulfillable rather than missing.
    pub async fn check(&self, product_id: Uuid, quantity: i64) -> AppResult<FulfillmentCheck> {
        let product = match ProductService::new(self.db.clone()).get(product_id).await {
            Ok(product) => product,
            Err(crate::error::AppError::NotFound(_)) => return Ok(FulfillmentCheck::default()),
            Err(e) => return Err(e),
        };
        let stock: StockSnapshot = fetch_materials(&self.db, &product.material_ids())
            .await?
            .into_iter()
            .collect();

        Ok(can_fulfill_order(Some(&product), &stock, quantity))
    }
}
