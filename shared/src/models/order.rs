//! Order models and the order status state machine

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Confirmed orders may have item quantities edited for this long after creation
pub const DEFAULT_EDIT_WINDOW_SECS: i64 = 5 * 60;

/// Lifecycle state of a persisted order
///
/// Drafts being entered are never stored, so the first persisted state is
/// `Confirmed`. `Cancelled` and `Completed` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    Confirmed,
    Cancelled,
    Completed,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Confirmed => "CONFIRMED",
            OrderStatus::Cancelled => "CANCELLED",
            OrderStatus::Completed => "COMPLETED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CONFIRMED" => Some(OrderStatus::Confirmed),
            "CANCELLED" => Some(OrderStatus::Cancelled),
            "COMPLETED" => Some(OrderStatus::Completed),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        matches!(
            (self, next),
            (OrderStatus::Confirmed, OrderStatus::Cancelled)
                | (OrderStatus::Confirmed, OrderStatus::Completed)
        )
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, OrderStatus::Confirmed)
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A product line inside an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: Uuid,
    pub order_id: Uuid,
    /// `None` once the product has been deleted
    pub product_id: Option<Uuid>,
    /// Product name at the time the order was placed
    pub product_name_snapshot: String,
    pub quantity: i64,
    /// Stock this item took out, per material id
    ///
    /// Cancellation and edits restore exactly this amount, independent of
    /// later BOM changes or product deletion.
    #[serde(default)]
    pub consumed: BTreeMap<Uuid, Decimal>,
}

/// A customer order consuming material stock through product BOMs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: Uuid,
    pub order_date: NaiveDate,
    pub status: OrderStatus,
    pub items: Vec<OrderItem>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Item quantities can still be changed at `now`
    pub fn is_editable(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.status == OrderStatus::Confirmed && now.signed_duration_since(self.created_at) <= window
    }

    pub fn item(&self, item_id: Uuid) -> Option<&OrderItem> {
        self.items.iter().find(|i| i.id == item_id)
    }

    pub fn total_portions(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }
}

/// A requested line when placing an order
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderLine {
    pub product_id: Uuid,
    pub quantity: i64,
}

impl OrderLine {
    pub fn new(product_id: Uuid, quantity: i64) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// Default edit window as a chrono duration
pub fn default_edit_window() -> Duration {
    Duration::seconds(DEFAULT_EDIT_WINDOW_SECS)
}
