//! Dashboard overview service

use chrono::{Duration, NaiveTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::config::DashboardConfig;
use crate::error::AppResult;
use shared::{daily_order_counts, summarize_inventory, DailyOrderCount, InventorySummary};

use super::{MaterialService, OrderService, ProductService};

/// Dashboard payload
#[derive(Debug, Clone, Serialize)]
pub struct DashboardData {
    pub inventory: InventorySummary,
    pub orders_by_day: Vec<DailyOrderCount>,
}

pub struct DashboardService {
    db: PgPool,
    config: DashboardConfig,
}

impl DashboardService {
    pub fn new(db: PgPool, config: DashboardConfig) -> Self {
        Self { db, config }
    }

    pub async fn overview(&self, orders: &OrderService) -> AppResult<DashboardData> {
        let today = Utc::now().date_naive();

        let materials = MaterialService::new(self.db.clone()).all().await?;
        let total_products = ProductService::new(self.db.clone()).count().await?;
        let inventory = summarize_inventory(
            &materials,
            total_products,
            today,
            self.config.expiry_horizon_days,
            self.config.list_limit,
        );

        let first_day = today - Duration::days(i64::from(self.config.series_days.saturating_sub(1)));
        let since = first_day.and_time(NaiveTime::MIN).and_utc();
        let recent = orders.created_since(since).await?;

        Ok(DashboardData {
            inventory,
            orders_by_day: daily_order_counts(&recent, today, self.config.series_days),
        })
    }
}
