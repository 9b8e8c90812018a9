//! Business logic services for the Production Planner

use validator::ValidationError;

pub mod auth;
pub mod dashboard;
pub mod material;
pub mod order;
pub mod product;
pub mod production;

pub use auth::AuthService;
pub use dashboard::DashboardService;
pub use material::MaterialService;
pub use order::OrderService;
pub use product::ProductService;
pub use production::ProductionService;

/// Custom validator failure carrying a shared validator's message
pub(crate) fn rule(code: &'static str, message: &'static str) -> ValidationError {
    let mut err = ValidationError::new(code);
    err.message = Some(message.into());
    err
}
