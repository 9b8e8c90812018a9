//! Production feasibility calculator
//!
//! Answers two separate questions about a product's bill of materials against
//! a [`StockSnapshot`]:
//! - how many portions can be produced right now ([`max_producible`])
//! - whether exactly N portions can be ordered ([`can_fulfill_order`])
//!
//! The two report shortages against different thresholds. `max_producible`
//! flags a line when not even one portion's worth is on hand, while
//! `can_fulfill_order` scales the requirement by the requested quantity.
//!
//! Everything here is a pure function of its inputs; arithmetic is checked
//! and never panics.

use std::collections::BTreeMap;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{Material, Product, StockSnapshot, UNKNOWN_MATERIAL_NAME};

/// Signed quantity change per material id
pub type MaterialDeltas = BTreeMap<Uuid, Decimal>;

/// A material that cannot cover a production target
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Shortage {
    pub material_id: Uuid,
    pub material_name: String,
    pub unit: String,
    pub required: Decimal,
    pub available: Decimal,
    pub deficit: Decimal,
}

impl Shortage {
    pub(crate) fn new(material_id: Uuid, material: Option<&Material>, required: Decimal) -> Self {
        let available = material.map_or(Decimal::ZERO, |m| m.quantity);
        Self {
            material_id,
            material_name: material
                .map_or_else(|| UNKNOWN_MATERIAL_NAME.to_string(), |m| m.name.clone()),
            unit: material.map(|m| m.unit.clone()).unwrap_or_default(),
            required,
            available,
            deficit: required.saturating_sub(available),
        }
    }
}

/// How many portions the current stock supports
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProductionCapacity {
    pub max_portions: u64,
    pub shortages: Vec<Shortage>,
}

/// Whether a specific order quantity can be met
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FulfillmentCheck {
    pub can_fulfill: bool,
    pub shortages: Vec<Material>,
}

/// Maximum portions of `product` producible from `stock`
///
/// Lines with a non-positive per-portion requirement are skipped. A BOM with
/// no remaining lines yields zero portions. A line is reported short when
/// less than one portion's worth is available; missing materials count as
/// zero stock named "Unknown".
pub fn max_producible(product: &Product, stock: &StockSnapshot) -> ProductionCapacity {
    let mut max_portions: Option<u64> = None;
    let mut shortages = Vec::new();

    for line in product.bom.iter().filter(|l| !l.is_vacuous()) {
        let material = stock.get(&line.material_id);
        let available = material.map_or(Decimal::ZERO, |m| m.quantity);

        let possible = whole_portions(available, line.quantity_per_portion);
        max_portions = Some(max_portions.map_or(possible, |current| current.min(possible)));

        if available < line.quantity_per_portion {
            shortages.push(Shortage::new(
                line.material_id,
                material,
                line.quantity_per_portion,
            ));
        }
    }

    let max_portions = max_portions.unwrap_or(0);
    tracing::trace!(
        product_id = %product.id,
        max_portions,
        shortages = shortages.len(),
        "production capacity"
    );
    ProductionCapacity {
        max_portions,
        shortages,
    }
}

/// Check whether exactly `requested_qty` portions can be ordered
///
/// Every BOM line must have `quantity_per_portion * requested_qty` on hand.
/// A missing material is always short and reported as a zero-stock
/// placeholder. No product or a non-positive quantity never fulfills.
pub fn can_fulfill_order(
    product: Option<&Product>,
    stock: &StockSnapshot,
    requested_qty: i64,
) -> FulfillmentCheck {
    let product = match product {
        Some(p) if requested_qty > 0 => p,
        _ => return FulfillmentCheck::default(),
    };
    let qty = Decimal::from(requested_qty);

    let shortages: Vec<Material> = product
        .bom
        .iter()
        .filter_map(|line| {
            let required = line.quantity_per_portion.checked_mul(qty);
            match (stock.get(&line.material_id), required) {
                (Some(m), Some(required)) if m.quantity >= required => None,
                (Some(m), _) => Some(m.clone()),
                (None, _) => Some(Material::unknown(line.material_id)),
            }
        })
        .collect();

    FulfillmentCheck {
        can_fulfill: shortages.is_empty(),
        shortages,
    }
}

/// A material quantity left the range `Decimal` can represent
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Quantity of material {material_id} is out of range")]
pub struct QuantityOverflow {
    pub material_id: Uuid,
}

/// Per-material deltas for moving `signed_portion_delta` portions of `product`
///
/// Negative consumes stock, positive restores it. Lines sharing a material
/// are summed.
pub fn material_deltas(
    product: &Product,
    signed_portion_delta: i64,
) -> Result<MaterialDeltas, QuantityOverflow> {
    aggregate_material_deltas([(product, signed_portion_delta)])
}

/// Sum the deltas of several `(product, signed_portion_delta)` pairs
pub fn aggregate_material_deltas<'a, I>(lines: I) -> Result<MaterialDeltas, QuantityOverflow>
where
    I: IntoIterator<Item = (&'a Product, i64)>,
{
    let mut deltas = MaterialDeltas::new();
    for (product, portions) in lines {
        let portions = Decimal::from(portions);
        for line in &product.bom {
            let entry = deltas.entry(line.material_id).or_insert(Decimal::ZERO);
            let current = *entry;
            *entry = line
                .quantity_per_portion
                .checked_mul(portions)
                .and_then(|d| current.checked_add(d))
                .ok_or(QuantityOverflow {
                    material_id: line.material_id,
                })?;
        }
    }
    Ok(deltas)
}

/// Sum several delta maps, e.g. the recorded consumption of every order item
pub fn sum_material_deltas<'a, I>(maps: I) -> Result<MaterialDeltas, QuantityOverflow>
where
    I: IntoIterator<Item = &'a MaterialDeltas>,
{
    let mut total = MaterialDeltas::new();
    for (material_id, delta) in maps.into_iter().flatten() {
        let entry = total.entry(*material_id).or_insert(Decimal::ZERO);
        *entry = entry.checked_add(*delta).ok_or(QuantityOverflow {
            material_id: *material_id,
        })?;
    }
    Ok(total)
}

/// The same deltas with the opposite sign
pub fn negate_deltas(deltas: &MaterialDeltas) -> MaterialDeltas {
    deltas.iter().map(|(id, d)| (*id, -*d)).collect()
}

/// Apply summed deltas to a material list in one pass
///
/// Materials without a delta come back unchanged; deltas for unknown
/// materials are dropped. Fails without partial results when any quantity
/// would leave the `Decimal` range.
pub fn apply_material_deltas(
    materials: &[Material],
    deltas: &MaterialDeltas,
) -> Result<Vec<Material>, QuantityOverflow> {
    materials
        .iter()
        .map(|m| {
            let mut updated = m.clone();
            if let Some(delta) = deltas.get(&m.id) {
                updated.quantity = updated
                    .quantity
                    .checked_add(*delta)
                    .ok_or(QuantityOverflow { material_id: m.id })?;
            }
            Ok(updated)
        })
        .collect()
}

/// Move `signed_portion_delta` portions of `product` through `materials`
///
/// `-q` on order placement, `+q` on cancellation. Applying `+q` then `-q`
/// returns every quantity to its original value. Quantities that would leave
/// the `Decimal` range clamp at its bounds; [`try_apply_order_material_delta`]
/// reports that case instead.
pub fn apply_order_material_delta(
    product: &Product,
    materials: &[Material],
    signed_portion_delta: i64,
) -> Vec<Material> {
    let portions = Decimal::from(signed_portion_delta);
    let mut deltas = MaterialDeltas::new();
    for line in &product.bom {
        let entry = deltas.entry(line.material_id).or_insert(Decimal::ZERO);
        *entry = entry.saturating_add(line.quantity_per_portion.saturating_mul(portions));
    }

    materials
        .iter()
        .map(|m| {
            let mut updated = m.clone();
            if let Some(delta) = deltas.get(&m.id) {
                updated.quantity = updated.quantity.saturating_add(*delta);
            }
            updated
        })
        .collect()
}

/// [`apply_order_material_delta`] that fails instead of clamping
pub fn try_apply_order_material_delta(
    product: &Product,
    materials: &[Material],
    signed_portion_delta: i64,
) -> Result<Vec<Material>, QuantityOverflow> {
    let result = material_deltas(product, signed_portion_delta)
        .and_then(|deltas| apply_material_deltas(materials, &deltas));
    if let Err(overflow) = &result {
        tracing::warn!(material_id = %overflow.material_id, "material delta out of range");
    }
    result
}

/// Validate the combined consumption of several order lines
///
/// Returns the consumption deltas when every material stays non-negative,
/// otherwise one shortage per material that would go negative, with
/// `required` being the total consumption across all lines. A consumption
/// too large to represent is reported with `required = Decimal::MAX`.
pub fn check_order_lines<'a, I>(stock: &StockSnapshot, lines: I) -> Result<MaterialDeltas, Vec<Shortage>>
where
    I: IntoIterator<Item = (&'a Product, i64)>,
{
    let consumption =
        aggregate_material_deltas(lines.into_iter().map(|(p, q)| (p, q.saturating_neg())))
            .map_err(|overflow| {
                let id = overflow.material_id;
                vec![Shortage::new(id, stock.get(&id), Decimal::MAX)]
            })?;

    let shortages: Vec<Shortage> = consumption
        .iter()
        .filter_map(|(material_id, delta)| {
            let material = stock.get(material_id);
            let required = -*delta;
            match material {
                Some(m) if m.quantity >= required => None,
                _ => Some(Shortage::new(*material_id, material, required)),
            }
        })
        .collect();

    tracing::trace!(
        materials = consumption.len(),
        shortages = shortages.len(),
        "order lines checked"
    );
    if shortages.is_empty() {
        Ok(consumption)
    } else {
        Err(shortages)
    }
}

fn whole_portions(available: Decimal, per_portion: Decimal) -> u64 {
    if available <= Decimal::ZERO {
        return 0;
    }
    available
        .checked_div(per_portion)
        .map(|q| q.floor())
        .and_then(|q| q.to_u64())
        .unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(n: i64) -> Decimal {
        Decimal::from(n)
    }

    struct Bakery {
        flour: Material,
        sugar: Material,
        cake: Product,
    }

    /// Cake needs 2 flour and 1 sugar per portion
    fn bakery(flour: i64, sugar: i64) -> Bakery {
        let flour = Material::new("Flour", "kg", dec(flour));
        let sugar = Material::new("Sugar", "kg", dec(sugar));
        let cake = Product::new("Cake")
            .with_line(flour.id, dec(2))
            .with_line(sugar.id, dec(1));
        Bakery { flour, sugar, cake }
    }

    fn snapshot(materials: &[Material]) -> StockSnapshot {
        materials.iter().collect()
    }

    #[test]
    fn test_max_producible_min_of_lines() {
        let b = bakery(10, 3);
        let stock = snapshot(&[b.flour.clone(), b.sugar.clone()]);

        let capacity = max_producible(&b.cake, &stock);

        assert_eq!(capacity.max_portions, 3);
        assert!(capacity.shortages.is_empty());
    }

    #[test]
    fn test_max_producible_reports_single_portion_shortage() {
        let b = bakery(1, 5);
        let stock = snapshot(&[b.flour.clone(), b.sugar.clone()]);

        let capacity = max_producible(&b.cake, &stock);

        assert_eq!(capacity.max_portions, 0);
        assert_eq!(capacity.shortages.len(), 1);
        let s = &capacity.shortages[0];
        assert_eq!(s.material_id, b.flour.id);
        assert_eq!(s.material_name, "Flour");
        assert_eq!(s.required, dec(2));
        assert_eq!(s.available, dec(1));
        assert_eq!(s.deficit, dec(1));
    }

    #[test]
    fn test_max_producible_empty_bom_is_zero() {
        let product = Product::new("Air");
        let capacity = max_producible(&product, &StockSnapshot::new());
        assert_eq!(capacity.max_portions, 0);
        assert!(capacity.shortages.is_empty());
    }

    #[test]
    fn test_max_producible_skips_vacuous_lines() {
        let b = bakery(10, 3);
        let water = Uuid::new_v4();
        let product = b.cake.clone().with_line(water, Decimal::ZERO);
        let stock = snapshot(&[b.flour, b.sugar]);

        let capacity = max_producible(&product, &stock);
        assert_eq!(capacity.max_portions, 3);
        assert!(capacity.shortages.is_empty());

        let only_vacuous = Product::new("Ice").with_line(water, dec(-1));
        assert_eq!(max_producible(&only_vacuous, &stock).max_portions, 0);
    }

    #[test]
    fn test_max_producible_missing_material_is_unknown() {
        let ghost = Uuid::new_v4();
        let product = Product::new("Ghost cake").with_line(ghost, dec(1));

        let capacity = max_producible(&product, &StockSnapshot::new());

        assert_eq!(capacity.max_portions, 0);
        assert_eq!(capacity.shortages[0].material_name, "Unknown");
        assert_eq!(capacity.shortages[0].available, Decimal::ZERO);
        assert_eq!(capacity.shortages[0].deficit, dec(1));
    }

    #[test]
    fn test_max_producible_fractional_requirements() {
        let butter = Material::new("Butter", "kg", Decimal::new(9, 1)); // 0.9
        let product = Product::new("Croissant").with_line(butter.id, Decimal::new(3, 1)); // 0.3
        let stock = snapshot(&[butter]);

        assert_eq!(max_producible(&product, &stock).max_portions, 3);
    }

    #[test]
    fn test_can_fulfill_order_scaled_shortage() {
        let b = bakery(10, 3);
        let stock = snapshot(&[b.flour.clone(), b.sugar.clone()]);

        let check = can_fulfill_order(Some(&b.cake), &stock, 4);

        assert!(!check.can_fulfill);
        assert_eq!(check.shortages.len(), 1);
        assert_eq!(check.shortages[0].id, b.sugar.id);

        assert!(can_fulfill_order(Some(&b.cake), &stock, 3).can_fulfill);
    }

    #[test]
    fn test_can_fulfill_order_rejects_bad_input() {
        let b = bakery(10, 3);
        let stock = snapshot(&[b.flour, b.sugar]);

        for qty in [0, -1] {
            let check = can_fulfill_order(Some(&b.cake), &stock, qty);
            assert!(!check.can_fulfill);
            assert!(check.shortages.is_empty());
        }

        let check = can_fulfill_order(None, &stock, 1);
        assert!(!check.can_fulfill);
        assert!(check.shortages.is_empty());
    }

    #[test]
    fn test_can_fulfill_order_missing_material_always_short() {
        let ghost = Uuid::new_v4();
        let product = Product::new("Ghost cake").with_line(ghost, Decimal::ZERO);

        let check = can_fulfill_order(Some(&product), &StockSnapshot::new(), 1);

        assert!(!check.can_fulfill);
        assert_eq!(check.shortages, vec![Material::unknown(ghost)]);
    }

    #[test]
    fn test_can_fulfill_empty_bom() {
        let product = Product::new("Air");
        let check = can_fulfill_order(Some(&product), &StockSnapshot::new(), 5);
        assert!(check.can_fulfill);
    }

    #[test]
    fn test_material_deltas_sum_shared_lines() {
        let b = bakery(10, 3);
        let product = b.cake.clone().with_line(b.flour.id, dec(1));

        let deltas = material_deltas(&product, -2).unwrap();

        assert_eq!(deltas[&b.flour.id], dec(-6));
        assert_eq!(deltas[&b.sugar.id], dec(-2));
    }

    #[test]
    fn test_apply_order_material_delta_round_trip() {
        let b = bakery(10, 3);
        let untouched = Material::new("Salt", "gram", dec(50));
        let materials = vec![b.flour.clone(), b.sugar.clone(), untouched.clone()];

        let consumed = apply_order_material_delta(&b.cake, &materials, -3);
        assert_eq!(consumed[0].quantity, dec(4));
        assert_eq!(consumed[1].quantity, dec(0));
        assert_eq!(consumed[2], untouched);

        let restored = apply_order_material_delta(&b.cake, &consumed, 3);
        assert_eq!(restored, materials);
    }

    #[test]
    fn test_aggregate_deltas_across_products() {
        let b = bakery(10, 3);
        let cookie = Product::new("Cookie").with_line(b.flour.id, Decimal::new(5, 1));

        let deltas = aggregate_material_deltas([(&b.cake, -1), (&cookie, -4)]).unwrap();

        assert_eq!(deltas[&b.flour.id], dec(-4));
        assert_eq!(deltas[&b.sugar.id], dec(-1));
    }

    #[test]
    fn test_check_order_lines_combined_demand() {
        let b = bakery(10, 3);
        let stock = snapshot(&[b.flour.clone(), b.sugar.clone()]);
        let cookie = Product::new("Cookie").with_line(b.flour.id, dec(1));

        // each line alone fits, together they need 6 + 5 = 11 flour
        assert!(check_order_lines(&stock, [(&b.cake, 3)]).is_ok());
        assert!(check_order_lines(&stock, [(&cookie, 5)]).is_ok());

        let shortages = check_order_lines(&stock, [(&b.cake, 3), (&cookie, 5)]).unwrap_err();
        assert_eq!(shortages.len(), 1);
        assert_eq!(shortages[0].material_id, b.flour.id);
        assert_eq!(shortages[0].required, dec(11));
        assert_eq!(shortages[0].deficit, dec(1));
    }

    #[test]
    fn test_check_order_lines_returns_consumption() {
        let b = bakery(10, 3);
        let stock = snapshot(&[b.flour.clone(), b.sugar.clone()]);

        let deltas = check_order_lines(&stock, [(&b.cake, 2)]).unwrap();

        assert_eq!(deltas[&b.flour.id], dec(-4));
        assert_eq!(deltas[&b.sugar.id], dec(-2));
    }

    #[test]
    fn test_apply_delta_overflow_clamps_instead_of_panicking() {
        let salt = Material::new("Salt", "gram", Decimal::MAX);
        let product = Product::new("Brine").with_line(salt.id, dec(1));

        let clamped = apply_order_material_delta(&product, &[salt.clone()], 1);
        assert_eq!(clamped[0].quantity, Decimal::MAX);

        assert_eq!(
            try_apply_order_material_delta(&product, &[salt.clone()], 1),
            Err(QuantityOverflow {
                material_id: salt.id
            })
        );
    }

    #[test]
    fn test_aggregate_deltas_reports_overflow() {
        let salt = Uuid::new_v4();
        let product = Product::new("Brine").with_line(salt, Decimal::MAX);

        assert_eq!(
            aggregate_material_deltas([(&product, 1), (&product, 1)]),
            Err(QuantityOverflow { material_id: salt })
        );
        assert!(material_deltas(&product, 2).is_err());
    }

    #[test]
    fn test_check_order_lines_overflow_is_a_shortage() {
        let salt = Material::new("Salt", "gram", dec(10));
        let product = Product::new("Brine").with_line(salt.id, Decimal::MAX);
        let stock = snapshot(&[salt.clone()]);

        let shortages = check_order_lines(&stock, [(&product, 2)]).unwrap_err();
        assert_eq!(shortages.len(), 1);
        assert_eq!(shortages[0].material_id, salt.id);
        assert_eq!(shortages[0].required, Decimal::MAX);
    }

    #[test]
    fn test_sum_and_negate_recorded_deltas() {
        let b = bakery(10, 3);
        let one = material_deltas(&b.cake, 1).unwrap();
        let two = material_deltas(&b.cake, 2).unwrap();

        let total = sum_material_deltas([&one, &two]).unwrap();
        assert_eq!(total[&b.flour.id], dec(6));
        assert_eq!(negate_deltas(&total)[&b.sugar.id], dec(-3));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(100))]

            /// Checked consume-then-restock is exact whenever it succeeds
            #[test]
            fn prop_checked_round_trip(
                need in 1i64..=5000i64,
                have in 0i64..=1_000_000i64,
                portions in 1i64..1000
            ) {
                let flour = Material::new("Flour", "kg", Decimal::new(have, 3));
                let product = Product::new("Bread").with_line(flour.id, Decimal::new(need, 2));
                let materials = vec![flour];

                let consumed = try_apply_order_material_delta(&product, &materials, -portions).unwrap();
                let restored = try_apply_order_material_delta(&product, &consumed, portions).unwrap();
                prop_assert_eq!(restored, materials);
            }
        }
    }
}
