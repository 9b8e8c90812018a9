//! HTTP handlers for product and BOM endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::product::{ProductDetail, ProductNameInput, SetBomInput};
use crate::services::ProductService;
use crate::AppState;
use shared::{ApiResponse, PaginatedResponse, Pagination, Product};

pub async fn list_products(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<PaginatedResponse<Product>>> {
    let service = ProductService::new(state.db);
    let (products, meta) = service.list(pagination).await?;
    Ok(Json(PaginatedResponse::new(products, meta)))
}

pub async fn create_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<ProductNameInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let service = ProductService::new(state.db);
    let product = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(product))))
}

pub async fn get_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let service = ProductService::new(state.db);
    Ok(Json(ApiResponse::ok(service.get(product_id).await?)))
}

pub async fn update_product(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<ProductNameInput>,
) -> AppResult<Json<ApiResponse<Product>>> {
    let service = ProductService::new(state.db);
    let product = service.rename(product_id, input).await?;
    Ok(Json(ApiResponse::ok(product)))
}

/// Delete a product (admin only); past order items keep their name snapshot
pub async fn delete_product(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    require_admin(&current_user.0)?;
    let service = ProductService::new(state.db);
    service.delete(product_id).await?;
    Ok(Json(ApiResponse::with_message((), "Product deleted")))
}

/// Product with its bill of materials
pub async fn get_product_bom(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let service = ProductService::new(state.db);
    Ok(Json(ApiResponse::ok(service.detail(product_id).await?)))
}

/// Replace the bill of materials
pub async fn set_product_bom(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(input): Json<SetBomInput>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    let service = ProductService::new(state.db);
    let detail = service.set_bom(product_id, input).await?;
    Ok(Json(ApiResponse::ok(detail)))
}
