//! Domain models for the Production Planner

mod inventory;
mod material;
mod order;
mod product;
mod user;

pub use inventory::*;
pub use material::*;
pub use order::*;
pub use product::*;
pub use user::*;
