//! In-memory catalog for tests, benches and embedding.
//!
//! Records live in plain collections owned by the catalog; writes take
//! `&mut self`, so the borrow checker provides the single-writer transaction.

use std::collections::{HashMap, HashSet};

use pricebook_core::{Archivable, DomainError, DomainResult, Entity, RecordLifecycle, UnlinkOutcome};

use crate::attribute::{Attribute, AttributePrice, AttributeValue};
use crate::category::{ProductCategory, check_category_recursion};
use crate::ids::{
    AttributeId, AttributeValueId, CategoryId, CompanyId, CountryGroupId, PartnerId, PricelistId, ProductId,
    TemplateId, UomId,
};
use crate::partner::{Company, CountryGroup, Partner};
use crate::pricelist::{Pricelist, PricelistItem};
use crate::product::{Product, check_attribute_values};
use crate::store::{CatalogReader, CatalogWriter};
use crate::supplier::SupplierInfo;
use crate::template::ProductTemplate;
use crate::uom::{Uom, validate_category_units};

fn position<E: Entity>(records: &[E], id: &E::Id) -> Option<usize> {
    records.iter().position(|record| record.id() == id)
}

fn find<'r, E: Entity>(records: &'r [E], id: &E::Id) -> Option<&'r E> {
    position(records, id).map(|index| &records[index])
}

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    uoms: HashMap<UomId, Uom>,
    categories: HashMap<CategoryId, ProductCategory>,
    templates: HashMap<TemplateId, ProductTemplate>,
    // Creation order matters for variant listing.
    products: Vec<Product>,
    attributes: HashMap<AttributeId, Attribute>,
    attribute_values: HashMap<AttributeValueId, AttributeValue>,
    attribute_prices: Vec<AttributePrice>,
    pricelists: Vec<Pricelist>,
    items: Vec<PricelistItem>,
    partners: HashMap<PartnerId, Partner>,
    companies: Vec<Company>,
    main_company: Option<CompanyId>,
    country_groups: HashMap<CountryGroupId, CountryGroup>,
    suppliers: Vec<SupplierInfo>,
    /// Products that something outside the catalog still references.
    protected: HashSet<ProductId>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_uom(&mut self, uom: Uom) -> DomainResult<()> {
        uom.validate()?;
        self.uoms.insert(uom.id, uom);
        Ok(())
    }

    /// Check every unit category holds exactly one reference unit.
    pub fn check_units(&self) -> DomainResult<()> {
        let mut by_category: HashMap<_, Vec<Uom>> = HashMap::new();
        for uom in self.uoms.values() {
            by_category.entry(uom.category).or_default().push(uom.clone());
        }
        for units in by_category.values() {
            validate_category_units(units)?;
        }
        Ok(())
    }

    pub fn add_category(&mut self, category: ProductCategory) -> DomainResult<()> {
        check_category_recursion(&*self, category.id, category.parent)?;
        self.categories.insert(category.id, category);
        Ok(())
    }

    pub fn add_attribute(&mut self, attribute: Attribute) {
        self.attributes.insert(attribute.id, attribute);
    }

    pub fn add_attribute_value(&mut self, value: AttributeValue) -> DomainResult<()> {
        if !self.attributes.contains_key(&value.attribute) {
            return Err(DomainError::not_found(format!("attribute {}", value.attribute)));
        }
        self.attribute_values.insert(value.id, value);
        Ok(())
    }

    /// Insert or replace the extra of `price.value` on `price.template`.
    pub fn add_attribute_price(&mut self, price: AttributePrice) {
        match self
            .attribute_prices
            .iter_mut()
            .find(|p| p.template == price.template && p.value == price.value)
        {
            Some(existing) => existing.price_extra = price.price_extra,
            None => self.attribute_prices.push(price),
        }
    }

    pub fn add_pricelist(&mut self, pricelist: Pricelist) {
        self.pricelists.push(pricelist);
    }

    pub fn add_pricelist_item(&mut self, item: PricelistItem) -> DomainResult<()> {
        item.validate()?;
        if find(&self.pricelists, &item.pricelist).is_none() {
            return Err(DomainError::not_found(format!("pricelist {}", item.pricelist)));
        }
        self.items.push(item);
        Ok(())
    }

    /// Replace a stored rule; the new version must pass the same checks as a new one.
    pub fn update_pricelist_item(&mut self, item: PricelistItem) -> DomainResult<()> {
        item.validate()?;
        if find(&self.pricelists, &item.pricelist).is_none() {
            return Err(DomainError::not_found(format!("pricelist {}", item.pricelist)));
        }
        match position(&self.items, &item.id) {
            Some(index) => {
                self.items[index] = item;
                Ok(())
            }
            None => Err(DomainError::not_found(format!("pricelist item {}", item.id))),
        }
    }

    pub fn add_partner(&mut self, partner: Partner) {
        self.partners.insert(partner.id, partner);
    }

    /// The first company added becomes the main company.
    pub fn add_company(&mut self, company: Company) {
        if self.main_company.is_none() {
            self.main_company = Some(company.id);
        }
        self.companies.push(company);
    }

    pub fn set_main_company(&mut self, company: CompanyId) -> DomainResult<()> {
        if find(&self.companies, &company).is_none() {
            return Err(DomainError::not_found(format!("company {company}")));
        }
        self.main_company = Some(company);
        Ok(())
    }

    pub fn add_country_group(&mut self, group: CountryGroup) {
        self.country_groups.insert(group.id, group);
    }

    pub fn add_supplier(&mut self, supplier: SupplierInfo) {
        self.suppliers.push(supplier);
    }

    /// Mark `product` as referenced elsewhere: unlinking it is refused.
    pub fn protect(&mut self, product: ProductId) {
        self.protected.insert(product);
    }

    pub fn release(&mut self, product: ProductId) {
        self.protected.remove(&product);
    }

    fn product_mut(&mut self, id: ProductId) -> DomainResult<&mut Product> {
        match position(&self.products, &id) {
            Some(index) => Ok(&mut self.products[index]),
            None => Err(DomainError::not_found(format!("product {id}"))),
        }
    }
}

impl CatalogReader for InMemoryCatalog {
    fn uom(&self, id: UomId) -> Option<Uom> {
        self.uoms.get(&id).cloned()
    }

    fn category(&self, id: CategoryId) -> Option<ProductCategory> {
        self.categories.get(&id).cloned()
    }

    fn template(&self, id: TemplateId) -> Option<ProductTemplate> {
        self.templates.get(&id).cloned()
    }

    fn product(&self, id: ProductId) -> Option<Product> {
        find(&self.products, &id).cloned()
    }

    fn variants(&self, template: TemplateId) -> Vec<Product> {
        self.products.iter().filter(|p| p.template == template).cloned().collect()
    }

    fn attribute(&self, id: AttributeId) -> Option<Attribute> {
        self.attributes.get(&id).cloned()
    }

    fn attribute_value(&self, id: AttributeValueId) -> Option<AttributeValue> {
        self.attribute_values.get(&id).cloned()
    }

    fn attribute_prices(&self, template: TemplateId) -> Vec<AttributePrice> {
        self.attribute_prices
            .iter()
            .filter(|p| p.template == template)
            .cloned()
            .collect()
    }

    fn products_with_value(&self, value: AttributeValueId) -> Vec<ProductId> {
        self.products
            .iter()
            .filter(|p| p.attribute_values.contains(&value))
            .map(|p| p.id)
            .collect()
    }

    fn pricelist(&self, id: PricelistId) -> Option<Pricelist> {
        find(&self.pricelists, &id).cloned()
    }

    // Sequence ascending, most recently added first among equals.
    fn pricelists(&self) -> Vec<Pricelist> {
        let mut active: Vec<Pricelist> = self.pricelists.iter().rev().filter(|p| p.active).cloned().collect();
        active.sort_by_key(|p| p.sequence);
        active
    }

    fn pricelist_items(&self, pricelist: PricelistId) -> Vec<PricelistItem> {
        self.items.iter().filter(|i| i.pricelist == pricelist).cloned().collect()
    }

    fn partner(&self, id: PartnerId) -> Option<Partner> {
        self.partners.get(&id).cloned()
    }

    fn company(&self, id: CompanyId) -> Option<Company> {
        find(&self.companies, &id).cloned()
    }

    fn main_company(&self) -> Option<Company> {
        self.main_company.and_then(|id| self.company(id))
    }

    fn country_group(&self, id: CountryGroupId) -> Option<CountryGroup> {
        self.country_groups.get(&id).cloned()
    }

    fn suppliers(&self, template: TemplateId) -> Vec<SupplierInfo> {
        let mut lines: Vec<SupplierInfo> = self
            .suppliers
            .iter()
            .filter(|s| s.template == template)
            .cloned()
            .collect();
        lines.sort_by_key(|s| s.sequence);
        lines
    }
}

impl RecordLifecycle<ProductId> for InMemoryCatalog {
    fn unlink(&mut self, id: &ProductId) -> DomainResult<UnlinkOutcome> {
        let Some(index) = position(&self.products, id) else {
            return Err(DomainError::not_found(format!("product {id}")));
        };
        if self.protected.contains(id) {
            return Ok(UnlinkOutcome::Blocked {
                reason: format!("product {id} is still referenced"),
            });
        }
        self.products.remove(index);
        Ok(UnlinkOutcome::Deleted)
    }

    fn set_active(&mut self, id: &ProductId, active: bool) -> DomainResult<()> {
        Archivable::set_active(self.product_mut(*id)?, active);
        Ok(())
    }
}

impl CatalogWriter for InMemoryCatalog {
    fn insert_template(&mut self, template: ProductTemplate) -> DomainResult<()> {
        if self.templates.contains_key(&template.id) {
            return Err(DomainError::conflict(format!("template {} already exists", template.id)));
        }
        self.templates.insert(template.id, template);
        Ok(())
    }

    fn update_template(&mut self, template: ProductTemplate) -> DomainResult<()> {
        match self.templates.get_mut(&template.id) {
            Some(slot) => {
                *slot = template;
                Ok(())
            }
            None => Err(DomainError::not_found(format!("template {}", template.id))),
        }
    }

    fn insert_product(&mut self, product: Product) -> DomainResult<()> {
        if !self.templates.contains_key(&product.template) {
            return Err(DomainError::not_found(format!("template {}", product.template)));
        }
        if find(&self.products, &product.id).is_some() {
            return Err(DomainError::conflict(format!("product {} already exists", product.id)));
        }
        check_attribute_values(&*self, &product)?;
        self.products.push(product);
        Ok(())
    }

    fn update_product(&mut self, product: Product) -> DomainResult<()> {
        check_attribute_values(&*self, &product)?;
        let slot = self.product_mut(product.id)?;
        *slot = product;
        Ok(())
    }

    fn insert_pricelist(&mut self, pricelist: Pricelist) -> DomainResult<()> {
        if find(&self.pricelists, &pricelist.id).is_some() {
            return Err(DomainError::conflict(format!("pricelist {} already exists", pricelist.id)));
        }
        self.pricelists.push(pricelist);
        Ok(())
    }

    fn update_partner(&mut self, partner: Partner) -> DomainResult<()> {
        match self.partners.get_mut(&partner.id) {
            Some(slot) => {
                *slot = partner;
                Ok(())
            }
            None => Err(DomainError::not_found(format!("partner {}", partner.id))),
        }
    }

    fn update_company(&mut self, company: Company) -> DomainResult<()> {
        match position(&self.companies, &company.id) {
            Some(index) => {
                self.companies[index] = company;
                Ok(())
            }
            None => Err(DomainError::not_found(format!("company {}", company.id))),
        }
    }
}
