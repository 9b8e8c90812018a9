//! Dashboard handler

use axum::{extract::State, Json};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::dashboard::DashboardData;
use crate::services::{DashboardService, OrderService};
use crate::AppState;
use shared::ApiResponse;

/// Inventory summary and recent order volume
pub async fn get_dashboard(
    State(state): State<AppState>,
    _current_user: CurrentUser,
) -> AppResult<Json<ApiResponse<DashboardData>>> {
    let orders = OrderService::new(state.db.clone(), state.config.orders.edit_window());
    let service = DashboardService::new(state.db, state.config.dashboard.clone());
    Ok(Json(ApiResponse::ok(service.overview(&orders).await?)))
}
