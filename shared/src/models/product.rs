//! Finished product and bill-of-materials models

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One material requirement of a product, per portion produced
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BomLine {
    pub material_id: Uuid,
    pub quantity_per_portion: Decimal,
}

impl BomLine {
    pub fn new(material_id: Uuid, quantity_per_portion: Decimal) -> Self {
        Self {
            material_id,
            quantity_per_portion,
        }
    }

    /// Lines with a non-positive requirement constrain nothing
    pub fn is_vacuous(&self) -> bool {
        self.quantity_per_portion <= Decimal::ZERO
    }
}

/// A finished good defined by its bill of materials
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    /// Line order carries no meaning
    #[serde(default)]
    pub bom: Vec<BomLine>,
}

impl Product {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            bom: Vec::new(),
        }
    }

    pub fn with_line(mut self, material_id: Uuid, quantity_per_portion: Decimal) -> Self {
        self.bom.push(BomLine::new(material_id, quantity_per_portion));
        self
    }

    /// Distinct materials referenced by the BOM, in id order
    pub fn material_ids(&self) -> Vec<Uuid> {
        let ids: BTreeSet<Uuid> = self.bom.iter().map(|l| l.material_id).collect();
        ids.into_iter().collect()
    }
}
