//! Inventory overview models

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Material, Order, OrderStatus};

/// Materials expiring within this many days count as expiring soon
pub const DEFAULT_EXPIRY_HORIZON_DAYS: i64 = 7;

/// Length of the dashboard order series
pub const DEFAULT_SERIES_DAYS: u32 = 14;

/// Maximum entries in each dashboard list
pub const DEFAULT_LIST_LIMIT: usize = 5;

/// Stock overview for the dashboard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventorySummary {
    pub total_materials: usize,
    pub total_products: usize,
    pub low_stock_count: usize,
    pub expiring_soon_count: usize,
    pub low_stock: Vec<Material>,
    pub expiring_soon: Vec<Material>,
}

/// Number of active orders created on one day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DailyOrderCount {
    pub day: NaiveDate,
    pub count: u32,
}

/// Summarize stock levels and expiry for the dashboard
///
/// Counts cover every matching material; the lists are capped at `list_limit`.
pub fn summarize_inventory(
    materials: &[Material],
    total_products: usize,
    today: NaiveDate,
    horizon_days: i64,
    list_limit: usize,
) -> InventorySummary {
    let low_stock: Vec<&Material> = materials.iter().filter(|m| m.is_low_stock()).collect();
    let expiring: Vec<&Material> = materials
        .iter()
        .filter(|m| m.expires_within(today, horizon_days))
        .collect();

    InventorySummary {
        total_materials: materials.len(),
        total_products,
        low_stock_count: low_stock.len(),
        expiring_soon_count: expiring.len(),
        low_stock: low_stock.into_iter().take(list_limit).cloned().collect(),
        expiring_soon: expiring.into_iter().take(list_limit).cloned().collect(),
    }
}

/// Per-day counts of non-cancelled orders over the last `days` days, oldest first
pub fn daily_order_counts(orders: &[Order], today: NaiveDate, days: u32) -> Vec<DailyOrderCount> {
    let mut counter: HashMap<NaiveDate, u32> = HashMap::new();
    for order in orders.iter().filter(|o| o.status != OrderStatus::Cancelled) {
        *counter.entry(order.created_at.date_naive()).or_insert(0) += 1;
    }

    (0..days)
        .rev()
        .filter_map(|back| today.checked_sub_signed(Duration::days(i64::from(back))))
        .map(|day| DailyOrderCount {
            day,
            count: counter.get(&day).copied().unwrap_or(0),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn order_on(day: NaiveDate, status: OrderStatus) -> Order {
        Order {
            id: Uuid::new_v4(),
            order_date: day,
            status,
            items: Vec::new(),
            created_at: Utc
                .from_utc_datetime(&day.and_hms_opt(10, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_summary_counts_and_limits() {
        let today = date(2024, 6, 1);
        let mut materials = Vec::new();
        for i in 0..7 {
            materials.push(
                Material::new(format!("Low {i}"), "kg", Decimal::ONE)
                    .with_threshold(Decimal::from(2)),
            );
        }
        materials.push(Material::new("Plenty", "kg", Decimal::from(100)).with_threshold(Decimal::ONE));
        materials.push(Material::new("Cream", "ml", Decimal::from(500)).with_expiry(date(2024, 6, 3)));

        let summary = summarize_inventory(&materials, 4, today, DEFAULT_EXPIRY_HORIZON_DAYS, DEFAULT_LIST_LIMIT);

        assert_eq!(summary.total_materials, 9);
        assert_eq!(summary.total_products, 4);
        assert_eq!(summary.low_stock_count, 7);
        assert_eq!(summary.low_stock.len(), 5);
        assert_eq!(summary.expiring_soon_count, 1);
        assert_eq!(summary.expiring_soon[0].name, "Cream");
    }

    #[test]
    fn test_daily_order_counts_skip_cancelled() {
        let today = date(2024, 6, 14);
        let orders = vec![
            order_on(today, OrderStatus::Confirmed),
            order_on(today, OrderStatus::Completed),
            order_on(today, OrderStatus::Cancelled),
            order_on(date(2024, 6, 1), OrderStatus::Confirmed),
            // outside the window
            order_on(date(2024, 5, 1), OrderStatus::Confirmed),
        ];

        let series = daily_order_counts(&orders, today, DEFAULT_SERIES_DAYS);

        assert_eq!(series.len(), 14);
        assert_eq!(series[0].day, date(2024, 6, 1));
        assert_eq!(series[0].count, 1);
        assert_eq!(series[13].day, today);
        assert_eq!(series[13].count, 2);
        assert_eq!(series.iter().map(|d| d.count).sum::<u32>(), 3);
    }
}
