//! HTTP handlers for order endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::order::{CreateOrderInput, OrderListQuery, UpdateQuantityInput};
use crate::services::OrderService;
use crate::AppState;
use shared::{ApiResponse, Order, PaginatedResponse};

fn order_service(state: &AppState) -> OrderService {
    OrderService::new(state.db.clone(), state.config.orders.edit_window())
}

/// List orders, newest first
pub async fn list_orders(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<PaginatedResponse<Order>>> {
    let (orders, pagination) = order_service(&state).list(&query).await?;
    Ok(Json(PaginatedResponse::new(orders, pagination)))
}

/// Place an order; rejected with the shortages when stock is insufficient
pub async fn create_order(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<CreateOrderInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Order>>)> {
    tracing::debug!(user_id = %current_user.0.user_id, "placing order");
    let order = order_service(&state).create(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(order))))
}

pub async fn get_order(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    Ok(Json(ApiResponse::ok(order_service(&state).get(order_id).await?)))
}

/// Change an item's quantity while the edit window is open
pub async fn update_order_item_quantity(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path((order_id, item_id)): Path<(Uuid, Uuid)>,
    Json(input): Json<UpdateQuantityInput>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = order_service(&state)
        .update_item_quantity(order_id, item_id, input)
        .await?;
    Ok(Json(ApiResponse::ok(order)))
}

pub async fn cancel_order(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = order_service(&state).cancel(order_id).await?;
    Ok(Json(ApiResponse::with_message(order, "Order cancelled")))
}

pub async fn complete_order(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(order_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let order = order_service(&state).complete(order_id).await?;
    Ok(Json(ApiResponse::with_message(order, "Order completed")))
}
