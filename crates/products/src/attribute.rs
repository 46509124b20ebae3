//! Product attributes, their values and per-template value surcharges.

use serde::{Deserialize, Serialize};

use pricebook_core::{DomainError, DomainResult, Entity};

use crate::ids::{AttributeId, AttributeValueId, ProductId, TemplateId};
use crate::store::CatalogReader;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub id: AttributeId,
    pub name: String,
    pub sequence: i32,
    /// When false, values of this attribute describe a template without
    /// generating distinct variants.
    pub create_variant: bool,
}

impl Attribute {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: AttributeId::new(),
            name: name.into(),
            sequence: 0,
            create_variant: true,
        }
    }

    pub fn without_variants(mut self) -> Self {
        self.create_variant = false;
        self
    }
}

impl Entity for Attribute {
    type Id = AttributeId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeValue {
    pub id: AttributeValueId,
    pub attribute: AttributeId,
    pub name: String,
    pub sequence: i32,
}

impl AttributeValue {
    pub fn new(attribute: AttributeId, name: impl Into<String>) -> Self {
        Self {
            id: AttributeValueId::new(),
            attribute,
            name: name.into(),
            sequence: 0,
        }
    }
}

impl Entity for AttributeValue {
    type Id = AttributeValueId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Surcharge added to a template's list price when a variant carries `value`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributePrice {
    pub template: TemplateId,
    pub value: AttributeValueId,
    pub price_extra: f64,
}

/// One attribute selected on a template, with the values it may take.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeLine {
    pub attribute: AttributeId,
    pub values: Vec<AttributeValueId>,
}

impl AttributeLine {
    pub fn new(attribute: AttributeId, values: Vec<AttributeValueId>) -> Self {
        Self { attribute, values }
    }

    /// Every value must exist and belong to the line's attribute.
    pub fn validate<S>(&self, store: &S) -> DomainResult<()>
    where
        S: CatalogReader + ?Sized,
    {
        let attribute = store
            .attribute(self.attribute)
            .ok_or_else(|| DomainError::not_found(format!("attribute {}", self.attribute)))?;
        for id in &self.values {
            let value = store
                .attribute_value(*id)
                .ok_or_else(|| DomainError::not_found(format!("attribute value {id}")))?;
            if value.attribute != attribute.id {
                return Err(DomainError::invariant(format!(
                    "value {} does not belong to attribute {}",
                    value.name, attribute.name
                )));
            }
        }
        Ok(())
    }

    /// `Color: Red, Blue`
    pub fn display_name<S>(&self, store: &S) -> DomainResult<String>
    where
        S: CatalogReader + ?Sized,
    {
        let attribute = store
            .attribute(self.attribute)
            .ok_or_else(|| DomainError::not_found(format!("attribute {}", self.attribute)))?;
        let names = self
            .values
            .iter()
            .map(|id| {
                store
                    .attribute_value(*id)
                    .map(|v| v.name)
                    .ok_or_else(|| DomainError::not_found(format!("attribute value {id}")))
            })
            .collect::<DomainResult<Vec<_>>>()?;
        Ok(format!("{}: {}", attribute.name, names.join(", ")))
    }
}

/// Variant suffix built from the values of attributes that show on names,
/// ordered by attribute name: `Blue, L`.
///
/// Values of a single-value line are left out since every variant shares them.
pub fn variant_name<S>(store: &S, template_lines: &[AttributeLine], values: &[AttributeValueId]) -> DomainResult<String>
where
    S: CatalogReader + ?Sized,
{
    let mut parts: Vec<(String, String)> = Vec::new();
    for id in values {
        let value = store
            .attribute_value(*id)
            .ok_or_else(|| DomainError::not_found(format!("attribute value {id}")))?;
        let shared = template_lines
            .iter()
            .any(|line| line.attribute == value.attribute && line.values.len() <= 1);
        if shared {
            continue;
        }
        let attribute = store
            .attribute(value.attribute)
            .ok_or_else(|| DomainError::not_found(format!("attribute {}", value.attribute)))?;
        parts.push((attribute.name, value.name));
    }
    parts.sort();
    Ok(parts.into_iter().map(|(_, value)| value).collect::<Vec<_>>().join(", "))
}

/// An attribute value cannot be removed while variants still carry it.
pub fn check_value_unlink<S>(store: &S, value: AttributeValueId) -> DomainResult<()>
where
    S: CatalogReader + ?Sized,
{
    let users: Vec<ProductId> = store.products_with_value(value);
    if users.is_empty() {
        Ok(())
    } else {
        Err(DomainError::invariant(format!(
            "attribute value {value} is used by {} variant(s); archive them first",
            users.len()
        )))
    }
}
