//! HTTP handlers for material stock endpoints

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::AppResult;
use crate::middleware::{require_admin, CurrentUser};
use crate::services::material::{CreateMaterialInput, MaterialListQuery, UpdateMaterialInput};
use crate::services::MaterialService;
use crate::AppState;
use shared::{ApiResponse, Material, PaginatedResponse};

/// List materials, optionally only low-stock ones
pub async fn list_materials(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Query(query): Query<MaterialListQuery>,
) -> AppResult<Json<PaginatedResponse<Material>>> {
    let service = MaterialService::new(state.db);
    let (materials, pagination) = service.list(&query).await?;
    Ok(Json(PaginatedResponse::new(materials, pagination)))
}

pub async fn create_material(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Json(input): Json<CreateMaterialInput>,
) -> AppResult<(StatusCode, Json<ApiResponse<Material>>)> {
    let service = MaterialService::new(state.db);
    let material = service.create(input).await?;
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(material))))
}

pub async fn get_material(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(material_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Material>>> {
    let service = MaterialService::new(state.db);
    Ok(Json(ApiResponse::ok(service.get(material_id).await?)))
}

pub async fn update_material(
    State(state): State<AppState>,
    _current_user: CurrentUser,
    Path(material_id): Path<Uuid>,
    Json(input): Json<UpdateMaterialInput>,
) -> AppResult<Json<ApiResponse<Material>>> {
    let service = MaterialService::new(state.db);
    let material = service.update(material_id, input).await?;
    Ok(Json(ApiResponse::ok(material)))
}

/// Delete a material (admin only)
pub async fn delete_material(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(material_id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<()>>> {
    require_admin(&current_user.0)?;
    let service = MaterialService::new(state.db);
    service.delete(material_id).await?;
    Ok(Json(ApiResponse::with_message((), "Material deleted")))
}
