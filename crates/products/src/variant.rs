//! Variant generation: keep a template's variants equal to the cartesian
//! product of its variant-creating attribute lines.

use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::{debug, info};

use pricebook_core::{Deactivation, DomainError, DomainResult, ValueObject, unlink_or_deactivate};

use crate::ids::{AttributeId, AttributeValueId, ProductId, TemplateId};
use crate::product::Product;
use crate::store::{CatalogReader, CatalogWriter};
use crate::template::load_template;

/// Set of attribute values identifying a variant. Equality ignores order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Combination(BTreeSet<AttributeValueId>);

impl Combination {
    pub fn values(&self) -> impl Iterator<Item = &AttributeValueId> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, value: &AttributeValueId) -> bool {
        self.0.contains(value)
    }
}

impl FromIterator<AttributeValueId> for Combination {
    fn from_iter<I: IntoIterator<Item = AttributeValueId>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl ValueObject for Combination {}

/// Cartesian product of the value sets. No sets yields the single empty combination.
pub fn variant_matrix(value_sets: &[Vec<AttributeValueId>]) -> Vec<Combination> {
    let mut matrix: Vec<Vec<AttributeValueId>> = vec![Vec::new()];
    for values in value_sets {
        matrix = matrix
            .iter()
            .flat_map(|prefix| {
                values.iter().map(move |value| {
                    let mut next = prefix.clone();
                    next.push(*value);
                    next
                })
            })
            .collect();
    }
    let mut seen = HashSet::new();
    matrix
        .into_iter()
        .map(Combination::from_iter)
        .filter(|combination| seen.insert(combination.clone()))
        .collect()
}

/// What a reconciliation changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub created: Vec<ProductId>,
    pub reactivated: Vec<ProductId>,
    pub unlinked: Vec<ProductId>,
    pub deactivated: Vec<ProductId>,
    /// Variants that received the value of a single-value line.
    pub completed: Vec<ProductId>,
}

impl ReconcileReport {
    pub fn is_noop(&self) -> bool {
        self.created.is_empty() && self.reactivated.is_empty() && self.unlinked.is_empty() && self.completed.is_empty()
    }
}

/// Resolves `value -> attribute` and `attribute -> create_variant` once per value.
struct ValueIndex<'a, S: ?Sized> {
    store: &'a S,
    attributes: HashMap<AttributeValueId, (AttributeId, bool)>,
}

impl<'a, S> ValueIndex<'a, S>
where
    S: CatalogReader + ?Sized,
{
    fn new(store: &'a S) -> Self {
        Self {
            store,
            attributes: HashMap::new(),
        }
    }

    fn lookup(&mut self, value: AttributeValueId) -> DomainResult<(AttributeId, bool)> {
        if let Some(found) = self.attributes.get(&value) {
            return Ok(*found);
        }
        let record = self
            .store
            .attribute_value(value)
            .ok_or_else(|| DomainError::not_found(format!("attribute value {value}")))?;
        let attribute = self
            .store
            .attribute(record.attribute)
            .ok_or_else(|| DomainError::not_found(format!("attribute {}", record.attribute)))?;
        let found = (attribute.id, attribute.create_variant);
        self.attributes.insert(value, found);
        Ok(found)
    }

    fn combination(&mut self, product: &Product) -> DomainResult<Combination> {
        let mut values = BTreeSet::new();
        for value in &product.attribute_values {
            if self.lookup(*value)?.1 {
                values.insert(*value);
            }
        }
        Ok(Combination(values))
    }
}

/// Bring the variants of `template` in line with its attribute lines.
///
/// Single-value lines are first written onto variants lacking that attribute,
/// so adding such a line never recreates variants. Missing combinations are
/// created, archived matching variants reactivated, and obsolete variants
/// unlinked or, when the store refuses, archived.
pub fn reconcile_variants<S>(store: &mut S, template: TemplateId) -> DomainResult<ReconcileReport>
where
    S: CatalogWriter + ?Sized,
{
    let template = load_template(&*store, template)?;
    let mut report = ReconcileReport::default();

    let mut variant_lines = Vec::new();
    for line in &template.attribute_lines {
        let attribute = store
            .attribute(line.attribute)
            .ok_or_else(|| DomainError::not_found(format!("attribute {}", line.attribute)))?;
        if attribute.create_variant {
            variant_lines.push(line.clone());
        }
    }

    let (completed, mut existing) = {
        let mut index = ValueIndex::new(&*store);
        let mut completed = Vec::new();
        for line in variant_lines.iter().filter(|line| line.values.len() == 1) {
            let value = line.values[0];
            for variant in store.variants(template.id) {
                let mut has_attribute = false;
                for current in &variant.attribute_values {
                    if index.lookup(*current)?.0 == line.attribute {
                        has_attribute = true;
                        break;
                    }
                }
                if !has_attribute {
                    completed.push((variant.id, value));
                }
            }
        }
        let mut existing = Vec::new();
        for variant in store.variants(template.id) {
            let mut combination = index.combination(&variant)?;
            for (id, value) in &completed {
                if *id == variant.id {
                    combination.0.insert(*value);
                }
            }
            existing.push((variant, combination));
        }
        (completed, existing)
    };

    for (id, value) in completed {
        if let Some((variant, _)) = existing.iter_mut().find(|(variant, _)| variant.id == id) {
            variant.attribute_values.push(value);
            store.update_product(variant.clone())?;
            if !report.completed.contains(&id) {
                report.completed.push(id);
            }
        }
    }

    let value_sets: Vec<Vec<AttributeValueId>> = variant_lines
        .iter()
        .filter(|line| !line.values.is_empty())
        .map(|line| line.values.clone())
        .collect();
    let matrix = variant_matrix(&value_sets);
    let wanted: HashSet<&Combination> = matrix.iter().collect();
    let present: HashSet<&Combination> = existing.iter().map(|(_, combination)| combination).collect();

    let mut obsolete = Vec::new();
    for (variant, combination) in &existing {
        if wanted.contains(combination) {
            if !variant.active {
                store.set_active(&variant.id, true)?;
                report.reactivated.push(variant.id);
            }
        } else {
            obsolete.push(variant.id);
        }
    }

    for combination in matrix.iter().filter(|combination| !present.contains(combination)) {
        let product = Product::new(template.id, combination.values().copied().collect());
        debug!(template = %template.id, product = %product.id, "creating variant");
        report.created.push(product.id);
        store.insert_product(product)?;
    }

    for id in obsolete {
        match unlink_or_deactivate(store, &id)? {
            Deactivation::Unlinked => report.unlinked.push(id),
            Deactivation::Deactivated => report.deactivated.push(id),
        }
    }

    info!(
        template = %template.id,
        created = report.created.len(),
        reactivated = report.reactivated.len(),
        unlinked = report.unlinked.len(),
        deactivated = report.deactivated.len(),
        "variants reconciled"
    );
    Ok(report)
}
