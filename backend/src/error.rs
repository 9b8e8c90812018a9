//! Error handling for the Production Planner server
//!
//! Every error renders as `{ "error": { code, message, field?, shortages? } }`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use shared::{OrderError, Shortage};
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Authentication errors
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Insufficient permissions")]
    InsufficientPermissions,

    // Validation errors
    #[error("Validation error: {message}")]
    Validation { field: String, message: String },

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    // Business logic errors
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Insufficient stock for {} material(s)", shortages.len())]
    InsufficientStock { shortages: Vec<Shortage> },

    #[error("Edit window closed for order {0}")]
    EditWindowClosed(uuid::Uuid),

    // Database errors
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // Internal errors
    #[error("Internal server error: {0}")]
    Internal(String),

    #[error("Internal server error")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::EmptyOrder => AppError::validation("items", err.to_string()),
            OrderError::InvalidQuantity(_) => AppError::validation("quantity", err.to_string()),
            OrderError::ProductNotFound(_) | OrderError::ProductRemoved(_) => {
                AppError::NotFound("Product".to_string())
            }
            OrderError::OrderNotFound(_) => AppError::NotFound("Order".to_string()),
            OrderError::ItemNotFound(_) => AppError::NotFound("Order item".to_string()),
            OrderError::Insufficient { shortages } => AppError::InsufficientStock { shortages },
            OrderError::EditWindowClosed(id) => AppError::EditWindowClosed(id),
            OrderError::InvalidTransition { .. } => {
                AppError::InvalidStateTransition(err.to_string())
            }
            OrderError::QuantityOverflow(_) => AppError::validation("quantity", err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let first = errors
            .field_errors()
            .into_iter()
            .next()
            .map(|(field, errs)| {
                let message = errs
                    .first()
                    .and_then(|e| e.message.as_ref())
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid", field));
                (field.to_string(), message)
            });

        match first {
            Some((field, message)) => AppError::Validation { field, message },
            None => AppError::validation("body", errors.to_string()),
        }
    }
}

/// Error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortages: Option<Vec<Shortage>>,
}

impl ErrorDetail {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            field: None,
            shortages: None,
        }
    }
}

impl AppError {
    fn status_and_detail(&self) -> (StatusCode, ErrorDetail) {
        match self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("INVALID_CREDENTIALS", "Invalid email or password"),
            ),
            AppError::Unauthorized(message) => (
                StatusCode::UNAUTHORIZED,
                ErrorDetail::new("UNAUTHORIZED", message.clone()),
            ),
            AppError::InsufficientPermissions => (
                StatusCode::FORBIDDEN,
                ErrorDetail::new(
                    "INSUFFICIENT_PERMISSIONS",
                    "You do not have permission to perform this action",
                ),
            ),
            AppError::Validation { field, message } => (
                StatusCode::BAD_REQUEST,
                ErrorDetail {
                    field: Some(field.clone()),
                    ..ErrorDetail::new("VALIDATION_ERROR", message.clone())
                },
            ),
            AppError::NotFound(resource) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", format!("{} not found", resource)),
            ),
            AppError::Conflict(message) => (
                StatusCode::CONFLICT,
                ErrorDetail::new("CONFLICT", message.clone()),
            ),
            AppError::InvalidStateTransition(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("INVALID_STATE_TRANSITION", message.clone()),
            ),
            AppError::InsufficientStock { shortages } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail {
                    shortages: Some(shortages.clone()),
                    ..ErrorDetail::new("INSUFFICIENT_STOCK", self.to_string())
                },
            ),
            AppError::EditWindowClosed(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorDetail::new("EDIT_WINDOW_CLOSED", "Order can no longer be edited"),
            ),
            AppError::DatabaseError(sqlx::Error::RowNotFound) => (
                StatusCode::NOT_FOUND,
                ErrorDetail::new("NOT_FOUND", "Record not found"),
            ),
            AppError::DatabaseError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("DATABASE_ERROR", "A database error occurred"),
            ),
            AppError::Internal(message) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", message.clone()),
            ),
            AppError::InternalError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorDetail::new("INTERNAL_ERROR", "An internal server error occurred"),
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_detail) = self.status_and_detail();

        // Log the error for debugging
        tracing::error!("Error: {:?}", self);

        (status, Json(ErrorResponse { error: error_detail })).into_response()
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    #[test]
    fn test_order_errors_map_to_status_codes() {
        let cases = [
            (OrderError::EmptyOrder, StatusCode::BAD_REQUEST),
            (OrderError::InvalidQuantity(0), StatusCode::BAD_REQUEST),
            (OrderError::QuantityOverflow(Uuid::nil()), StatusCode::BAD_REQUEST),
            (OrderError::OrderNotFound(Uuid::nil()), StatusCode::NOT_FOUND),
            (
                OrderError::EditWindowClosed(Uuid::nil()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                OrderError::InvalidTransition {
                    from: shared::OrderStatus::Cancelled,
                    to: shared::OrderStatus::Completed,
                },
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
        ];

        for (err, status) in cases {
            assert_eq!(AppError::from(err).into_response().status(), status);
        }
    }

    #[test]
    fn test_insufficient_stock_carries_shortages() {
        let shortage = Shortage {
            material_id: Uuid::new_v4(),
            material_name: "Sugar".into(),
            unit: "kg".into(),
            required: Decimal::from(4),
            available: Decimal::from(3),
            deficit: Decimal::ONE,
        };
        let err = AppError::from(OrderError::Insufficient {
            shortages: vec![shortage.clone()],
        });

        let (status, detail) = err.status_and_detail();
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(detail.code, "INSUFFICIENT_STOCK");
        assert_eq!(detail.shortages, Some(vec![shortage]));
    }

    #[test]
    fn test_validation_error_names_field() {
        let (status, detail) = AppError::validation("unit", "bad unit").status_and_detail();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(detail.field.as_deref(), Some("unit"));
    }
}
