//! Repository seam for inventory state
//!
//! The order workflow reads and writes materials, products and orders only
//! through [`InventoryRepository`]. The backend keeps this state in
//! PostgreSQL; the browser keeps it in a [`MemoryStore`] persisted as JSON.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{Material, Order, Product, StockSnapshot};

/// Storage for materials, products and orders
pub trait InventoryRepository {
    fn materials(&self) -> Vec<Material>;

    fn material(&self, id: Uuid) -> Option<Material>;

    /// Insert or replace each material by id
    fn save_materials(&mut self, materials: Vec<Material>);

    fn remove_material(&mut self, id: Uuid) -> Option<Material>;

    fn products(&self) -> Vec<Product>;

    fn product(&self, id: Uuid) -> Option<Product>;

    /// Insert or replace a product by id
    fn save_product(&mut self, product: Product);

    /// Remove a product. Order items keep their name snapshot but lose the link.
    fn remove_product(&mut self, id: Uuid) -> Option<Product>;

    /// Orders, newest first
    fn orders(&self) -> Vec<Order>;

    fn order(&self, id: Uuid) -> Option<Order>;

    /// Insert or replace an order by id
    fn save_order(&mut self, order: Order);

    /// Point-in-time copy of all stock for the calculator
    fn stock_snapshot(&self) -> StockSnapshot {
        self.materials().into_iter().collect()
    }
}

/// Serializable contents of a [`MemoryStore`]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub products: Vec<Product>,
    #[serde(default)]
    pub orders: Vec<Order>,
}

/// In-memory repository preserving insertion order
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    materials: Vec<Material>,
    products: Vec<Product>,
    orders: Vec<Order>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: StoreSnapshot) -> Self {
        Self {
            materials: snapshot.materials,
            products: snapshot.products,
            orders: snapshot.orders,
        }
    }

    pub fn to_snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            materials: self.materials.clone(),
            products: self.products.clone(),
            orders: self.orders.clone(),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<StoreSnapshot>(json).map(Self::from_snapshot)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&self.to_snapshot())
    }
}

impl InventoryRepository for MemoryStore {
    fn materials(&self) -> Vec<Material> {
        self.materials.clone()
    }

    fn material(&self, id: Uuid) -> Option<Material> {
        self.materials.iter().find(|m| m.id == id).cloned()
    }

    fn save_materials(&mut self, materials: Vec<Material>) {
        for material in materials {
            match self.materials.iter_mut().find(|m| m.id == material.id) {
                Some(existing) => *existing = material,
                None => self.materials.push(material),
            }
        }
    }

    fn remove_material(&mut self, id: Uuid) -> Option<Material> {
        let idx = self.materials.iter().position(|m| m.id == id)?;
        Some(self.materials.remove(idx))
    }

    fn products(&self) -> Vec<Product> {
        self.products.clone()
    }

    fn product(&self, id: Uuid) -> Option<Product> {
        self.products.iter().find(|p| p.id == id).cloned()
    }

    fn save_product(&mut self, product: Product) {
        match self.products.iter_mut().find(|p| p.id == product.id) {
            Some(existing) => *existing = product,
            None => self.products.push(product),
        }
    }

    fn remove_product(&mut self, id: Uuid) -> Option<Product> {
        let idx = self.products.iter().position(|p| p.id == id)?;
        for item in self.orders.iter_mut().flat_map(|o| o.items.iter_mut()) {
            if item.product_id == Some(id) {
                item.product_id = None;
            }
        }
        Some(self.products.remove(idx))
    }

    fn orders(&self) -> Vec<Order> {
        self.orders.clone()
    }

    fn order(&self, id: Uuid) -> Option<Order> {
        self.orders.iter().find(|o| o.id == id).cloned()
    }

    fn save_order(&mut self, order: Order) {
        match self.orders.iter_mut().find(|o| o.id == order.id) {
            Some(existing) => *existing = order,
            None => self.orders.insert(0, order),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{OrderItem, OrderStatus};
    use chrono::Utc;
    use rust_decimal::Decimal;

    #[test]
    fn test_save_materials_upserts() {
        let mut store = MemoryStore::new();
        let mut flour = Material::new("Flour", "kg", Decimal::from(10));
        store.save_materials(vec![flour.clone()]);

        flour.quantity = Decimal::from(4);
        let sugar = Material::new("Sugar", "kg", Decimal::ONE);
        store.save_materials(vec![flour.clone(), sugar.clone()]);

        assert_eq!(store.materials(), vec![flour.clone(), sugar]);
        assert_eq!(store.stock_snapshot().available(&flour.id), Decimal::from(4));
    }

    #[test]
    fn test_remove_product_unlinks_order_items() {
        let mut store = MemoryStore::new();
        let product = Product::new("Cake");
        store.save_product(product.clone());

        let order_id = Uuid::new_v4();
        store.save_order(Order {
            id: order_id,
            order_date: Utc::now().date_naive(),
            status: OrderStatus::Confirmed,
            items: vec![OrderItem {
                id: Uuid::new_v4(),
                order_id,
                product_id: Some(product.id),
                product_name_snapshot: "Cake".into(),
                quantity: 2,
                consumed: Default::default(),
            }],
            created_at: Utc::now(),
        });

        assert!(store.remove_product(product.id).is_some());
        let order = store.order(order_id).unwrap();
        assert_eq!(order.items[0].product_id, None);
        assert_eq!(order.items[0].product_name_snapshot, "Cake");
        assert!(store.remove_product(product.id).is_none());
    }

    #[test]
    fn test_json_snapshot_restores_state() {
        let mut store = MemoryStore::new();
        store.save_materials(vec![Material::new("Milk", "liter", Decimal::new(15, 1))]);
        store.save_product(Product::new("Latte"));

        let json = store.to_json().unwrap();
        let restored = MemoryStore::from_json(&json).unwrap();

        assert_eq!(restored.materials(), store.materials());
        assert_eq!(restored.products(), store.products());
    }

    #[test]
    fn test_empty_json_object_is_empty_store() {
        let store = MemoryStore::from_json("{}").unwrap();
        assert!(store.materials().is_empty());
        assert!(store.orders().is_empty());
    }
}
