//! Order workflow over an injected repository
//!
//! Placement, cancellation, completion and quantity edits. Every operation
//! computes the new stock on a copy and writes it back only once it has
//! passed validation, so a rejected operation leaves the repository untouched.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::feasibility::{
    apply_material_deltas, can_fulfill_order, check_order_lines, material_deltas,
    max_producible, negate_deltas, sum_material_deltas, FulfillmentCheck, MaterialDeltas,
    ProductionCapacity, QuantityOverflow, Shortage,
};
use crate::models::{
    default_edit_window, Order, OrderItem, OrderLine, OrderStatus, Product, StockSnapshot,
};
use crate::store::InventoryRepository;

/// Order workflow errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum OrderError {
    #[error("Order has no items")]
    EmptyOrder,

    #[error("Quantity must be positive, got {0}")]
    InvalidQuantity(i64),

    #[error("Product not found: {0}")]
    ProductNotFound(Uuid),

    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("Order item not found: {0}")]
    ItemNotFound(Uuid),

    #[error("Product of order item {0} no longer exists")]
    ProductRemoved(Uuid),

    #[error("Insufficient stock for {} material(s)", shortages.len())]
    Insufficient { shortages: Vec<Shortage> },

    #[error("Edit window for order {0} has closed")]
    EditWindowClosed(Uuid),

    #[error("Cannot move order from {from} to {to}")]
    InvalidTransition { from: OrderStatus, to: OrderStatus },

    #[error("Quantity of material {0} is out of range")]
    QuantityOverflow(Uuid),
}

impl From<QuantityOverflow> for OrderError {
    fn from(err: QuantityOverflow) -> Self {
        OrderError::QuantityOverflow(err.material_id)
    }
}

/// Order entry desk backed by an [`InventoryRepository`]
#[derive(Debug, Clone)]
pub struct OrderDesk<R> {
    repo: R,
    edit_window: Duration,
}

impl<R: InventoryRepository> OrderDesk<R> {
    pub fn new(repo: R) -> Self {
        Self {
            repo,
            edit_window: default_edit_window(),
        }
    }

    pub fn with_edit_window(mut self, edit_window: Duration) -> Self {
        self.edit_window = edit_window;
        self
    }

    pub fn edit_window(&self) -> Duration {
        self.edit_window
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn repository_mut(&mut self) -> &mut R {
        &mut self.repo
    }

    pub fn into_inner(self) -> R {
        self.repo
    }

    /// Production capacity of a product against current stock
    pub fn max_producible(&self, product_id: Uuid) -> Option<ProductionCapacity> {
        let product = self.repo.product(product_id)?;
        Some(max_producible(&product, &self.repo.stock_snapshot()))
    }

    /// Whether `quantity` portions of a product could be ordered now
    pub fn check(&self, product_id: Uuid, quantity: i64) -> FulfillmentCheck {
        let product = self.repo.product(product_id);
        can_fulfill_order(product.as_ref(), &self.repo.stock_snapshot(), quantity)
    }

    /// Place a confirmed order, consuming stock for every line
    pub fn place_order(
        &mut self,
        lines: &[OrderLine],
        order_date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        if lines.is_empty() {
            return Err(OrderError::EmptyOrder);
        }

        let mut products: Vec<(Product, i64)> = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity <= 0 {
                return Err(OrderError::InvalidQuantity(line.quantity));
            }
            let product = self
                .repo
                .product(line.product_id)
                .ok_or(OrderError::ProductNotFound(line.product_id))?;
            products.push((product, line.quantity));
        }

        let stock = self.repo.stock_snapshot();
        let consumption = check_order_lines(&stock, products.iter().map(|(p, q)| (p, *q)))
            .map_err(|shortages| {
                tracing::warn!(shortages = shortages.len(), "order rejected");
                OrderError::Insufficient { shortages }
            })?;

        let order_id = Uuid::new_v4();
        let mut items = Vec::with_capacity(products.len());
        for (product, quantity) in &products {
            items.push(OrderItem {
                id: Uuid::new_v4(),
                order_id,
                product_id: Some(product.id),
                product_name_snapshot: product.name.clone(),
                quantity: *quantity,
                consumed: material_deltas(product, *quantity)?,
            });
        }
        let order = Order {
            id: order_id,
            order_date,
            status: OrderStatus::Confirmed,
            items,
            created_at: now,
        };

        self.commit_deltas(&consumption)?;
        self.repo.save_order(order.clone());
        tracing::debug!(order_id = %order.id, items = order.items.len(), "order placed");
        Ok(order)
    }

    /// Cancel a confirmed order and restock what it consumed
    ///
    /// Restocks the consumption recorded on each item, so later BOM changes
    /// or deleted products do not affect the amounts returned.
    pub fn cancel_order(&mut self, order_id: Uuid) -> Result<Order, OrderError> {
        let mut order = self.transition(order_id, OrderStatus::Cancelled)?;

        let restock = sum_material_deltas(order.items.iter().map(|i| &i.consumed))?;

        self.commit_deltas(&restock)?;
        order.status = OrderStatus::Cancelled;
        self.repo.save_order(order.clone());
        tracing::debug!(order_id = %order.id, materials = restock.len(), "order cancelled");
        Ok(order)
    }

    /// Mark a confirmed order completed; stock was already consumed at placement
    pub fn complete_order(&mut self, order_id: Uuid) -> Result<Order, OrderError> {
        let mut order = self.transition(order_id, OrderStatus::Completed)?;
        order.status = OrderStatus::Completed;
        self.repo.save_order(order.clone());
        Ok(order)
    }

    /// Change an item's quantity inside the edit window
    ///
    /// The recorded consumption is reverted, the new quantity validated against
    /// the reverted stock using the current BOM, and only then the new
    /// consumption applied and recorded. A failed
    /// validation leaves both stock and order as they were.
    pub fn edit_item_quantity(
        &mut self,
        order_id: Uuid,
        item_id: Uuid,
        new_quantity: i64,
        now: DateTime<Utc>,
    ) -> Result<Order, OrderError> {
        if new_quantity <= 0 {
            return Err(OrderError::InvalidQuantity(new_quantity));
        }
        let mut order = self
            .repo
            .order(order_id)
            .ok_or(OrderError::OrderNotFound(order_id))?;
        if !order.is_editable(now, self.edit_window) {
            return Err(OrderError::EditWindowClosed(order_id));
        }
        let item = order
            .item(item_id)
            .cloned()
            .ok_or(OrderError::ItemNotFound(item_id))?;
        let product_id = item.product_id.ok_or(OrderError::ProductRemoved(item_id))?;
        let product = self
            .repo
            .product(product_id)
            .ok_or(OrderError::ProductNotFound(product_id))?;

        let reverted = apply_material_deltas(&self.repo.materials(), &item.consumed)?;
        let reverted_stock: StockSnapshot = reverted.iter().collect();

        let check = can_fulfill_order(Some(&product), &reverted_stock, new_quantity);
        let consumption = match check_order_lines(&reverted_stock, [(&product, new_quantity)]) {
            Ok(consumption) if check.can_fulfill => consumption,
            Ok(consumption) => {
                // a per-line shortfall the combined check did not see
                let shortages = check
                    .shortages
                    .iter()
                    .map(|m| {
                        let required = consumption.get(&m.id).map_or(Default::default(), |d| -*d);
                        Shortage::new(m.id, reverted_stock.get(&m.id), required)
                    })
                    .collect();
                return Err(OrderError::Insufficient { shortages });
            }
            Err(shortages) => return Err(OrderError::Insufficient { shortages }),
        };

        let updated = apply_material_deltas(&reverted, &consumption)?;
        self.repo.save_materials(updated);
        if let Some(target) = order.items.iter_mut().find(|i| i.id == item_id) {
            target.quantity = new_quantity;
            target.consumed = negate_deltas(&consumption);
        }
        self.repo.save_order(order.clone());
        tracing::debug!(%order_id, %item_id, from = item.quantity, to = new_quantity, "order item edited");
        Ok(order)
    }

    fn transition(&self, order_id: Uuid, to: OrderStatus) -> Result<Order, OrderError> {
        let order = self
            .repo
            .order(order_id)
            .ok_or(OrderError::OrderNotFound(order_id))?;
        if !order.status.can_transition_to(to) {
            return Err(OrderError::InvalidTransition {
                from: order.status,
                to,
            });
        }
        Ok(order)
    }

    fn commit_deltas(&mut self, deltas: &MaterialDeltas) -> Result<(), OrderError> {
        let touched: Vec<_> = self
            .repo
            .materials()
            .into_iter()
            .filter(|m| deltas.contains_key(&m.id))
            .collect();
        let updated = apply_material_deltas(&touched, deltas)?;
        self.repo.save_materials(updated);
        Ok(())
    }
}
