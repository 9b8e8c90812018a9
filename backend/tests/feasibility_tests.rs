//! Production feasibility tests
//!
//! Tests for the calculator behind `/products/:id/calculate` and `/check`:
//! - Maximum producible portions is the minimum of per-line floors
//! - Shortage reporting for single portions and scaled orders
//! - Consume-then-restock returns stock exactly

use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    apply_order_material_delta, can_fulfill_order, max_producible, Material, Product,
    StockSnapshot,
};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn stock(materials: &[Material]) -> StockSnapshot {
    materials.iter().collect()
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    fn bakery(flour: &str, sugar: &str) -> (Vec<Material>, Product) {
        let flour = Material::new("Flour", "kg", dec(flour));
        let sugar = Material::new("Sugar", "kg", dec(sugar));
        let cake = Product::new("Cake")
            .with_line(flour.id, dec("2"))
            .with_line(sugar.id, dec("1"));
        (vec![flour, sugar], cake)
    }

    /// Stock covering three portions of every line
    #[test]
    fn test_max_producible_min_of_lines() {
        let (materials, cake) = bakery("10", "3");
        let capacity = max_producible(&cake, &stock(&materials));

        assert_eq!(capacity.max_portions, 3);
        assert!(capacity.shortages.is_empty());
    }

    /// Less than one portion of flour on hand
    #[test]
    fn test_single_portion_shortage() {
        let (materials, cake) = bakery("1", "5");
        let capacity = max_producible(&cake, &stock(&materials));

        assert_eq!(capacity.max_portions, 0);
        assert_eq!(capacity.shortages.len(), 1);
        let shortage = &capacity.shortages[0];
        assert_eq!(shortage.material_name, "Flour");
        assert_eq!(shortage.required, dec("2"));
        assert_eq!(shortage.available, dec("1"));
        assert_eq!(shortage.deficit, dec("1"));
    }

    /// A recipe with no lines produces nothing
    #[test]
    fn test_empty_bom_yields_zero() {
        let capacity = max_producible(&Product::new("Air"), &StockSnapshot::new());
        assert_eq!(capacity.max_portions, 0);
        assert!(capacity.shortages.is_empty());
    }

    /// Fractional requirements floor per line
    #[test]
    fn test_fractional_quantities() {
        let milk = Material::new("Milk", "liter", dec("1.0"));
        let latte = Product::new("Latte").with_line(milk.id, dec("0.3"));

        let capacity = max_producible(&latte, &stock(&[milk]));
        assert_eq!(capacity.max_portions, 3);
    }

    /// Missing materials surface as "Unknown"
    #[test]
    fn test_missing_material_is_unknown() {
        let (_, cake) = bakery("10", "3");
        let capacity = max_producible(&cake, &StockSnapshot::new());

        assert_eq!(capacity.max_portions, 0);
        assert_eq!(capacity.shortages.len(), 2);
        assert!(capacity.shortages.iter().all(|s| s.material_name == "Unknown"));
    }

    /// Scaled requirement flags only the short line
    #[test]
    fn test_can_fulfill_scaled_order() {
        let (materials, cake) = bakery("10", "3");
        let snapshot = stock(&materials);

        assert!(can_fulfill_order(Some(&cake), &snapshot, 3).can_fulfill);

        let check = can_fulfill_order(Some(&cake), &snapshot, 4);
        assert!(!check.can_fulfill);
        assert_eq!(check.shortages.len(), 1);
        assert_eq!(check.shortages[0].name, "Sugar");
    }

    /// No product or a non-positive quantity never fulfills
    #[test]
    fn test_can_fulfill_degenerate_inputs() {
        let (materials, cake) = bakery("10", "3");
        let snapshot = stock(&materials);

        for check in [
            can_fulfill_order(None, &snapshot, 1),
            can_fulfill_order(Some(&cake), &snapshot, 0),
            can_fulfill_order(Some(&cake), &snapshot, -2),
        ] {
            assert!(!check.can_fulfill);
            assert!(check.shortages.is_empty());
        }
    }

    /// Empty recipe can be ordered although nothing is producible
    #[test]
    fn test_empty_bom_fulfills_but_produces_nothing() {
        let air = Product::new("Air");
        let snapshot = StockSnapshot::new();

        assert!(can_fulfill_order(Some(&air), &snapshot, 5).can_fulfill);
        assert_eq!(max_producible(&air, &snapshot).max_portions, 0);
    }

    /// Lines sharing a material are applied together
    #[test]
    fn test_delta_sums_shared_material() {
        let flour = Material::new("Flour", "kg", dec("10"));
        let bread = Product::new("Bread")
            .with_line(flour.id, dec("1"))
            .with_line(flour.id, dec("0.5"));

        let after = apply_order_material_delta(&bread, &[flour], -2);
        assert_eq!(after[0].quantity, dec("7"));
    }
}

// ============================================================================
// Property Tests
// ============================================================================

#[cfg(test)]
mod property_tests {
    use super::*;

    /// Strategy for per-portion requirements (0.01 to 50.00)
    fn requirement_strategy() -> impl Strategy<Value = Decimal> {
        (1i64..=5000i64).prop_map(|n| Decimal::new(n, 2))
    }

    /// Strategy for stock on hand (0.000 to 1000.000)
    fn stock_strategy() -> impl Strategy<Value = Decimal> {
        (0i64..=1_000_000i64).prop_map(|n| Decimal::new(n, 3))
    }

    fn recipe(lines: &[(Decimal, Decimal)]) -> (Vec<Material>, Product) {
        let mut product = Product::new("Prop");
        let mut materials = Vec::new();
        for (i, (need, have)) in lines.iter().enumerate() {
            let material = Material::new(format!("M{}", i), "gram", *have);
            product = product.with_line(material.id, *need);
            materials.push(material);
        }
        (materials, product)
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(100))]

        /// Maximum portions equals the minimum floor(available / required)
        #[test]
        fn prop_max_is_min_of_floors(
            lines in prop::collection::vec((requirement_strategy(), stock_strategy()), 1..6)
        ) {
            let (materials, product) = recipe(&lines);
            let capacity = max_producible(&product, &stock(&materials));

            let expected = lines
                .iter()
                .map(|(need, have)| (*have / *need).floor())
                .min()
                .unwrap();
            prop_assert_eq!(Decimal::from(capacity.max_portions), expected);
        }

        /// The maximum itself is always orderable, one more never is
        #[test]
        fn prop_max_is_tight(
            lines in prop::collection::vec((requirement_strategy(), stock_strategy()), 1..6)
        ) {
            let (materials, product) = recipe(&lines);
            let snapshot = stock(&materials);
            let max = max_producible(&product, &snapshot).max_portions as i64;

            if max > 0 {
                prop_assert!(can_fulfill_order(Some(&product), &snapshot, max).can_fulfill);
            }
            prop_assert!(!can_fulfill_order(Some(&product), &snapshot, max + 1).can_fulfill);
        }

        /// Consuming then restocking q portions restores every material exactly
        #[test]
        fn prop_delta_round_trip(
            lines in prop::collection::vec((requirement_strategy(), stock_strategy()), 1..6),
            portions in 1i64..500
        ) {
            let (materials, product) = recipe(&lines);
            let consumed = apply_order_material_delta(&product, &materials, -portions);
            let restored = apply_order_material_delta(&product, &consumed, portions);

            prop_assert_eq!(restored, materials);
        }

        /// A fulfillable order never drives stock negative
        #[test]
        fn prop_fulfillable_never_negative(
            lines in prop::collection::vec((requirement_strategy(), stock_strategy()), 1..6),
            portions in 1i64..200
        ) {
            let (materials, product) = recipe(&lines);
            let check = can_fulfill_order(Some(&product), &stock(&materials), portions);

            if check.can_fulfill {
                let after = apply_order_material_delta(&product, &materials, -portions);
                prop_assert!(after.iter().all(|m| m.quantity >= Decimal::ZERO));
            }
        }
    }
}
