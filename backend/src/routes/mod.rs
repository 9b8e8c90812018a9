//! Route definitions for the Production Planner API

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/auth/profile", get(handlers::profile))
        .route("/auth/logout", post(handlers::logout))
        .nest("/materials", material_routes())
        .nest("/products", product_routes())
        .nest("/orders", order_routes())
        .route("/dashboard", get(handlers::get_dashboard))
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Login (public)
        .route("/auth/login", post(handlers::login))
        .merge(protected)
}

/// Material stock routes
fn material_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_materials).post(handlers::create_material),
        )
        .route(
            "/:material_id",
            get(handlers::get_material)
                .put(handlers::update_material)
                .delete(handlers::delete_material),
        )
}

/// Product, BOM and feasibility routes
fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_products).post(handlers::create_product))
        .route(
            "/:product_id",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route(
            "/:product_id/bom",
            get(handlers::get_product_bom).post(handlers::set_product_bom),
        )
        .route(
            "/:product_id/calculate",
            get(handlers::calculate_production),
        )
        .route("/:product_id/check", post(handlers::check_fulfillment))
}

/// Order routes
fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_orders).post(handlers::create_order))
        .route("/:order_id", get(handlers::get_order))
        .route(
            "/:order_id/items/:item_id/quantity",
            put(handlers::update_order_item_quantity),
        )
        .route("/:order_id/cancel", post(handlers::cancel_order))
        .route("/:order_id/complete", post(handlers::complete_order))
}
