//! Raw material stock models

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name reported for a BOM line whose material cannot be found
pub const UNKNOWN_MATERIAL_NAME: &str = "Unknown";

/// Units a material can be stocked in
pub const MATERIAL_UNITS: &[&str] = &["pcs", "gram", "kg", "ml", "liter", "pack"];

/// A raw-stock item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Material {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    /// Quantity on hand, never negative after order placement
    pub quantity: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub low_stock_threshold: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<NaiveDate>,
}

impl Material {
    pub fn new(name: impl Into<String>, unit: impl Into<String>, quantity: Decimal) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            unit: unit.into(),
            quantity,
            low_stock_threshold: None,
            expiry_date: None,
        }
    }

    /// Stand-in record for a material referenced by a BOM but absent from stock
    pub fn unknown(id: Uuid) -> Self {
        Self {
            id,
            name: UNKNOWN_MATERIAL_NAME.to_string(),
            unit: String::new(),
            quantity: Decimal::ZERO,
            low_stock_threshold: None,
            expiry_date: None,
        }
    }

    pub fn with_threshold(mut self, threshold: Decimal) -> Self {
        self.low_stock_threshold = Some(threshold);
        self
    }

    pub fn with_expiry(mut self, expiry_date: NaiveDate) -> Self {
        self.expiry_date = Some(expiry_date);
        self
    }

    /// At or below the configured low-stock threshold
    pub fn is_low_stock(&self) -> bool {
        self.low_stock_threshold
            .is_some_and(|threshold| self.quantity <= threshold)
    }

    /// Expires on or before `today + days`. Already-expired stock counts.
    pub fn expires_within(&self, today: NaiveDate, days: i64) -> bool {
        match (self.expiry_date, today.checked_add_signed(Duration::days(days))) {
            (Some(expiry), Some(horizon)) => expiry <= horizon,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// Immutable view of material stock keyed by material id
#[derive(Debug, Clone, Default)]
pub struct StockSnapshot {
    materials: HashMap<Uuid, Material>,
}

impl StockSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: &Uuid) -> Option<&Material> {
        self.materials.get(id)
    }

    /// Quantity on hand; a missing material has none
    pub fn available(&self, id: &Uuid) -> Decimal {
        self.materials
            .get(id)
            .map(|m| m.quantity)
            .unwrap_or(Decimal::ZERO)
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn materials(&self) -> impl Iterator<Item = &Material> {
        self.materials.values()
    }
}

impl FromIterator<Material> for StockSnapshot {
    fn from_iter<I: IntoIterator<Item = Material>>(iter: I) -> Self {
        Self {
            materials: iter.into_iter().map(|m| (m.id, m)).collect(),
        }
    }
}

impl<'a> FromIterator<&'a Material> for StockSnapshot {
    fn from_iter<I: IntoIterator<Item = &'a Material>>(iter: I) -> Self {
        iter.into_iter().cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_low_stock_requires_threshold() {
        let flour = Material::new("Flour", "kg", Decimal::from(3));
        assert!(!flour.is_low_stock());

        assert!(flour.clone().with_threshold(Decimal::from(3)).is_low_stock());
        assert!(flour.clone().with_threshold(Decimal::from(5)).is_low_stock());
        assert!(!flour.with_threshold(Decimal::from(2)).is_low_stock());
    }

    #[test]
    fn test_expires_within_horizon() {
        let today = date(2024, 6, 1);
        let milk = Material::new("Milk", "liter", Decimal::ONE);

        assert!(!milk.expires_within(today, 7));
        assert!(milk.clone().with_expiry(date(2024, 6, 8)).expires_within(today, 7));
        assert!(!milk.clone().with_expiry(date(2024, 6, 9)).expires_within(today, 7));
        // already expired
        assert!(milk.with_expiry(date(2024, 5, 1)).expires_within(today, 7));
    }

    #[test]
    fn test_snapshot_missing_material_has_zero_available() {
        let flour = Material::new("Flour", "kg", Decimal::from(10));
        let snapshot: StockSnapshot = [flour.clone()].into_iter().collect();

        assert_eq!(snapshot.available(&flour.id), Decimal::from(10));
        assert_eq!(snapshot.available(&Uuid::new_v4()), Decimal::ZERO);
        assert_eq!(snapshot.len(), 1);
    }

    #[test]
    fn test_unknown_material_placeholder() {
        let id = Uuid::new_v4();
        let placeholder = Material::unknown(id);
        assert_eq!(placeholder.id, id);
        assert_eq!(placeholder.name, "Unknown");
        assert_eq!(placeholder.unit, "");
        assert_eq!(placeholder.quantity, Decimal::ZERO);
    }
}
