//! Units of measure and conversion arithmetic.
//!
//! Every unit belongs to one category and carries a `factor` relative to the
//! category's reference unit: `1 reference = factor × this unit`. Conversions
//! only make sense inside a category.

use serde::{Deserialize, Serialize};

use pricebook_core::{DomainError, DomainResult, Entity, round_to_step};

use crate::ids::{UomCategoryId, UomId};

pub const DEFAULT_UOM_ROUNDING: f64 = 0.01;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UomCategory {
    pub id: UomCategoryId,
    pub name: String,
}

impl UomCategory {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: UomCategoryId::new(),
            name: name.into(),
        }
    }
}

/// Position of a unit relative to its category's reference unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UomType {
    Bigger,
    Reference,
    Smaller,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Uom {
    pub id: UomId,
    pub name: String,
    pub category: UomCategoryId,
    factor: f64,
    /// Quantities converted into this unit are multiples of this step.
    pub rounding: f64,
    pub active: bool,
    uom_type: UomType,
}

impl Uom {
    /// The reference unit of `category` (factor 1).
    pub fn reference(name: impl Into<String>, category: UomCategoryId) -> Self {
        Self {
            id: UomId::new(),
            name: name.into(),
            category,
            factor: 1.0,
            rounding: DEFAULT_UOM_ROUNDING,
            active: true,
            uom_type: UomType::Reference,
        }
    }

    /// A unit worth `ratio` reference units (`1 this = ratio × reference`).
    pub fn bigger(name: impl Into<String>, category: UomCategoryId, ratio: f64) -> Self {
        let mut uom = Self::reference(name, category);
        uom.uom_type = UomType::Bigger;
        uom.set_factor_inv(ratio);
        uom
    }

    /// A unit such that one reference unit is worth `factor` of it.
    pub fn smaller(name: impl Into<String>, category: UomCategoryId, factor: f64) -> Self {
        let mut uom = Self::reference(name, category);
        uom.uom_type = UomType::Smaller;
        uom.factor = factor;
        uom
    }

    pub fn with_rounding(mut self, rounding: f64) -> Self {
        self.rounding = rounding;
        self
    }

    pub fn factor(&self) -> f64 {
        self.factor
    }

    pub fn set_factor(&mut self, factor: f64) {
        self.factor = factor;
    }

    /// How many reference units one of this unit is worth (`1 / factor`, 0 for a zero factor).
    pub fn factor_inv(&self) -> f64 {
        if self.factor != 0.0 { 1.0 / self.factor } else { 0.0 }
    }

    /// Write through the inverse ratio; only `factor` is stored.
    pub fn set_factor_inv(&mut self, factor_inv: f64) {
        self.factor = if factor_inv != 0.0 { 1.0 / factor_inv } else { 0.0 };
    }

    pub fn uom_type(&self) -> UomType {
        self.uom_type
    }

    /// Switching a unit to `reference` pins its factor to 1.
    pub fn set_uom_type(&mut self, uom_type: UomType) {
        self.uom_type = uom_type;
        if uom_type == UomType::Reference {
            self.factor = 1.0;
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("unit of measure name cannot be empty"));
        }
        if self.factor == 0.0 {
            return Err(DomainError::invariant(format!(
                "the conversion ratio of unit {} cannot be 0",
                self.name
            )));
        }
        if self.rounding <= 0.0 {
            return Err(DomainError::invariant(format!(
                "the rounding precision of unit {} must be greater than 0",
                self.name
            )));
        }
        Ok(())
    }

    /// Convert `qty` expressed in this unit into `to`.
    ///
    /// Without a target unit the reference quantity is returned, unrounded.
    /// Converting across categories is an integrity error.
    pub fn convert_quantity(&self, qty: f64, to: Option<&Uom>, round: bool) -> DomainResult<f64> {
        for unit in std::iter::once(self).chain(to) {
            if unit.factor == 0.0 {
                return Err(DomainError::invariant(format!(
                    "the conversion ratio of unit {} cannot be 0",
                    unit.name
                )));
            }
        }
        let amount = qty / self.factor;
        let Some(to) = to else {
            return Ok(amount);
        };
        if self.category != to.category {
            return Err(DomainError::invariant(format!(
                "conversion from unit {} to unit {} is not possible as they belong to different categories",
                self.name, to.name
            )));
        }
        let amount = amount * to.factor;
        if round {
            Ok(round_to_step(amount, to.rounding))
        } else {
            Ok(amount)
        }
    }

    /// Convert a price per this unit into a price per `to`.
    ///
    /// Units from different categories leave the price untouched.
    pub fn convert_price(&self, price: f64, to: Option<&Uom>) -> f64 {
        let Some(to) = to else {
            return price;
        };
        if price == 0.0 || self.id == to.id || self.category != to.category {
            return price;
        }
        price * self.factor / to.factor
    }
}

impl Entity for Uom {
    type Id = UomId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Quantity conversion where the source unit may be unknown (quantity is then returned as is).
pub fn convert_quantity(qty: f64, from: Option<&Uom>, to: Option<&Uom>, round: bool) -> DomainResult<f64> {
    match from {
        Some(from) => from.convert_quantity(qty, to, round),
        None => Ok(qty),
    }
}

/// Check the units of one category: exactly one active reference unit, with factor 1.
pub fn validate_category_units(units: &[Uom]) -> DomainResult<()> {
    for uom in units {
        uom.validate()?;
    }
    let Some(first) = units.first() else {
        return Ok(());
    };
    if units.iter().any(|u| u.category != first.category) {
        return Err(DomainError::invariant("units of different categories checked together"));
    }
    let references: Vec<&Uom> = units
        .iter()
        .filter(|u| u.active && u.uom_type == UomType::Reference)
        .collect();
    match references.as_slice() {
        [reference] if reference.factor == 1.0 => Ok(()),
        [reference] => Err(DomainError::invariant(format!(
            "reference unit {} must have a ratio of 1",
            reference.name
        ))),
        [] => Err(DomainError::invariant("a unit category needs one reference unit")),
        _ => Err(DomainError::invariant("a unit category can only have one reference unit")),
    }
}
