//! HTTP handlers for production feasibility

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::ProductionService;
use crate::AppState;
use shared::{ApiResponse, FulfillmentCheck, ProductionCapacity};

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub quantity: i64,
}

/// Maximum producible portions and single-portion shortages
pub async fn calculate_production(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductionCapacity>>> {
    let service = ProductionService::new(state.db);
    Ok(Json(ApiResponse::ok(service.calculate(product_id).await?)))
}

/// Whether an order of `quantity` portions could be fulfilled now
pub async fn check_fulfillment(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(body): Json<CheckRequest>,
) -> AppResult<Json<ApiResponse<FulfillmentCheck>>> {
    let service = ProductionService::new(state.db);
    let check = service.check(product_id, body.quantity).await?;
    Ok(Json(ApiResponse::ok(check)))
}
