//! WebAssembly module for the Production Planner
//!
//! Provides client-side computation for:
//! - Production capacity and order feasibility
//! - Stock movements for placed and cancelled orders
//! - Dashboard inventory summary
//! - An offline inventory ([`LocalInventory`]) persisted as JSON by the page
//!
//! All structured values cross the boundary as JSON strings.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{de::DeserializeOwned, Serialize};
use uuid::Uuid;
use wasm_bindgen::prelude::*;

use shared::{
    InventoryRepository, Material, MemoryStore, OrderDesk, OrderLine, Product, StockSnapshot,
};

// Re-export shared types for use in JavaScript
pub use shared::models::*;
pub use shared::validation::*;

fn parse<T: DeserializeOwned>(json: &str, what: &str) -> Result<T, JsValue> {
    serde_json::from_str(json).map_err(|e| JsValue::from_str(&format!("Invalid {} JSON: {}", what, e)))
}

fn to_json<T: Serialize>(value: &T) -> Result<String, JsValue> {
    serde_json::to_string(value).map_err(|e| JsValue::from_str(&e.to_string()))
}

fn parse_id(id: &str) -> Result<Uuid, JsValue> {
    Uuid::parse_str(id).map_err(|_| JsValue::from_str(&format!("Invalid id: {}", id)))
}

fn error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Wall clock of the host; chrono has no clock on wasm32 without extra features
fn now() -> DateTime<Utc> {
    #[cfg(target_arch = "wasm32")]
    {
        DateTime::from_timestamp_millis(js_sys::Date::now() as i64).unwrap_or_default()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        Utc::now()
    }
}

fn log_warning(message: &str) {
    #[cfg(target_arch = "wasm32")]
    web_sys::console::warn_1(&JsValue::from_str(message));
    #[cfg(not(target_arch = "wasm32"))]
    let _ = message;
}

/// Maximum producible portions of a product and its single-portion shortages
#[wasm_bindgen]
pub fn calculate_max_producible(product_json: &str, materials_json: &str) -> Result<String, JsValue> {
    let product: Product = parse(product_json, "product")?;
    let materials: Vec<Material> = parse(materials_json, "materials")?;
    let stock: StockSnapshot = materials.into_iter().collect();

    to_json(&shared::max_producible(&product, &stock))
}

/// Whether exactly `quantity` portions can be ordered; `product_json` may be `null`
#[wasm_bindgen]
pub fn check_order_fulfillment(
    product_json: &str,
    materials_json: &str,
    quantity: i32,
) -> Result<String, JsValue> {
    let product: Option<Product> = parse(product_json, "product")?;
    let materials: Vec<Material> = parse(materials_json, "materials")?;
    let stock: StockSnapshot = materials.into_iter().collect();

    to_json(&shared::can_fulfill_order(
        product.as_ref(),
        &stock,
        i64::from(quantity),
    ))
}

/// New material list after moving `signed_delta` portions (negative consumes)
#[wasm_bindgen]
pub fn apply_order_delta(
    product_json: &str,
    materials_json: &str,
    signed_delta: i32,
) -> Result<String, JsValue> {
    let product: Product = parse(product_json, "product")?;
    let materials: Vec<Material> = parse(materials_json, "materials")?;

    let updated =
        shared::try_apply_order_material_delta(&product, &materials, i64::from(signed_delta))
            .map_err(error)?;
    to_json(&updated)
}

/// Dashboard summary; `today` is an ISO date (YYYY-MM-DD)
#[wasm_bindgen]
pub fn summarize_inventory_json(
    materials_json: &str,
    total_products: u32,
    today: &str,
) -> Result<String, JsValue> {
    let materials: Vec<Material> = parse(materials_json, "materials")?;
    let today = NaiveDate::parse_from_str(today, "%Y-%m-%d").map_err(error)?;

    to_json(&shared::summarize_inventory(
        &materials,
        total_products as usize,
        today,
        shared::DEFAULT_EXPIRY_HORIZON_DAYS,
        shared::DEFAULT_LIST_LIMIT,
    ))
}

/// Offline inventory backed by an in-memory store
#[wasm_bindgen]
pub struct LocalInventory {
    desk: OrderDesk<MemoryStore>,
}

impl Default for LocalInventory {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl LocalInventory {
    #[wasm_bindgen(constructor)]
    pub fn new() -> LocalInventory {
        LocalInventory {
            desk: OrderDesk::new(MemoryStore::new()),
        }
    }

    /// Restore from a snapshot produced by [`LocalInventory::export_json`]
    pub fn load_json(json: &str) -> Result<LocalInventory, JsValue> {
        let store = MemoryStore::from_json(json).map_err(error)?;
        Ok(LocalInventory {
            desk: OrderDesk::new(store),
        })
    }

    pub fn export_json(&self) -> Result<String, JsValue> {
        self.desk.repository().to_json().map_err(error)
    }

    pub fn materials_json(&self) -> Result<String, JsValue> {
        to_json(&self.desk.repository().materials())
    }

    pub fn products_json(&self) -> Result<String, JsValue> {
        to_json(&self.desk.repository().products())
    }

    pub fn orders_json(&self) -> Result<String, JsValue> {
        to_json(&self.desk.repository().orders())
    }

    /// Insert or replace a material after field validation
    pub fn save_material(&mut self, material_json: &str) -> Result<(), JsValue> {
        let material: Material = parse(material_json, "material")?;
        validate_material_name(&material.name).map_err(error)?;
        validate_unit(&material.unit).map_err(error)?;
        validate_stock_quantity(material.quantity).map_err(error)?;
        if let Some(threshold) = material.low_stock_threshold {
            validate_low_stock_threshold(threshold).map_err(error)?;
        }
        self.desk.repository_mut().save_materials(vec![material]);
        Ok(())
    }

    pub fn remove_material(&mut self, material_id: &str) -> Result<bool, JsValue> {
        let id = parse_id(material_id)?;
        Ok(self.desk.repository_mut().remove_material(id).is_some())
    }

    /// Insert or replace a product with its bill of materials
    pub fn save_product(&mut self, product_json: &str) -> Result<(), JsValue> {
        let product: Product = parse(product_json, "product")?;
        validate_product_name(&product.name).map_err(error)?;
        validate_bom(&product.bom).map_err(error)?;
        self.desk.repository_mut().save_product(product);
        Ok(())
    }

    pub fn remove_product(&mut self, product_id: &str) -> Result<bool, JsValue> {
        let id = parse_id(product_id)?;
        Ok(self.desk.repository_mut().remove_product(id).is_some())
    }

    /// Production capacity of a stored product; `null` when it does not exist
    pub fn max_producible(&self, product_id: &str) -> Result<String, JsValue> {
        let id = parse_id(product_id)?;
        to_json(&self.desk.max_producible(id))
    }

    pub fn check(&self, product_id: &str, quantity: i32) -> Result<String, JsValue> {
        let id = parse_id(product_id)?;
        to_json(&self.desk.check(id, i64::from(quantity)))
    }

    /// Place an order from `[{ product_id, quantity }]`; returns the order JSON
    pub fn place_order(&mut self, lines_json: &str, order_date: &str) -> Result<String, JsValue> {
        let lines: Vec<OrderLine> = parse(lines_json, "order lines")?;
        let order_date = NaiveDate::parse_from_str(order_date, "%Y-%m-%d").map_err(error)?;

        match self.desk.place_order(&lines, order_date, now()) {
            Ok(order) => to_json(&order),
            Err(e) => {
                log_warning(&format!("order rejected: {}", e));
                Err(error(e))
            }
        }
    }

    pub fn cancel_order(&mut self, order_id: &str) -> Result<String, JsValue> {
        let id = parse_id(order_id)?;
        to_json(&self.desk.cancel_order(id).map_err(error)?)
    }

    pub fn complete_order(&mut self, order_id: &str) -> Result<String, JsValue> {
        let id = parse_id(order_id)?;
        to_json(&self.desk.complete_order(id).map_err(error)?)
    }

    /// Change an item's quantity while the order is inside its edit window
    pub fn edit_item_quantity(
        &mut self,
        order_id: &str,
        item_id: &str,
        quantity: i32,
    ) -> Result<String, JsValue> {
        let order_id = parse_id(order_id)?;
        let item_id = parse_id(item_id)?;
        let order = self
            .desk
            .edit_item_quantity(order_id, item_id, i64::from(quantity), now())
            .map_err(error)?;
        to_json(&order)
    }
}
