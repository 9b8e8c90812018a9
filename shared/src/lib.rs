//! Shared types and models for the Production Planner
//!
//! This crate contains the domain models and the production feasibility
//! calculator shared between the backend, the browser client (via WASM),
//! and the tests.

pub mod feasibility;
pub mod models;
pub mod orders;
pub mod store;
pub mod types;
pub mod validation;

pub use feasibility::*;
pub use models::*;
pub use orders::*;
pub use store::*;
pub use types::*;
pub use validation::*;
