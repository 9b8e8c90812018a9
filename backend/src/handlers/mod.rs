//! HTTP handlers for the Production Planner API

pub mod auth;
pub mod dashboard;
pub mod health;
pub mod materials;
pub mod orders;
pub mod products;
pub mod production;

pub use auth::*;
pub use dashboard::*;
pub use health::*;
pub use materials::*;
pub use orders::*;
pub use products::*;
pub use production::*;
