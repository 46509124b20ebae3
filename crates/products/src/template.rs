//! Product templates: the data shared by every variant of a product.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::info;

use pricebook_core::{Archivable, DomainError, DomainResult, Entity};

use crate::attribute::AttributeLine;
use crate::currency::CurrencyCode;
use crate::ids::{CategoryId, CompanyId, TemplateId, UomId};
use crate::product::Product;
use crate::store::{CatalogReader, CatalogWriter};
use crate::uom::Uom;
use crate::variant::{ReconcileReport, reconcile_variants};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProductKind {
    #[default]
    Consumable,
    Service,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductTemplate {
    pub id: TemplateId,
    pub name: String,
    pub sequence: i32,
    pub kind: ProductKind,
    pub category: CategoryId,
    /// Sale price per `uom`, before attribute extras.
    pub list_price: f64,
    pub uom: UomId,
    /// Unit used on purchase orders; must share a category with `uom`.
    pub uom_po: UomId,
    pub company: Option<CompanyId>,
    pub active: bool,
    pub sale_ok: bool,
    pub purchase_ok: bool,
    pub attribute_lines: Vec<AttributeLine>,
}

impl ProductTemplate {
    pub fn new(name: impl Into<String>, category: CategoryId, uom: UomId) -> Self {
        Self {
            id: TemplateId::new(),
            name: name.into(),
            sequence: 1,
            kind: ProductKind::Consumable,
            category,
            list_price: 1.0,
            uom,
            uom_po: uom,
            company: None,
            active: true,
            sale_ok: true,
            purchase_ok: true,
            attribute_lines: Vec::new(),
        }
    }

    pub fn with_list_price(mut self, list_price: f64) -> Self {
        self.list_price = list_price;
        self
    }

    pub fn with_purchase_uom(mut self, uom_po: UomId) -> Self {
        self.uom_po = uom_po;
        self
    }

    pub fn with_company(mut self, company: CompanyId) -> Self {
        self.company = Some(company);
        self
    }

    pub fn with_line(mut self, line: AttributeLine) -> Self {
        self.attribute_lines.push(line);
        self
    }

    /// Sale and purchase units must belong to the same category.
    pub fn check_uom<S>(&self, store: &S) -> DomainResult<()>
    where
        S: CatalogReader + ?Sized,
    {
        let uom = load_uom(store, self.uom)?;
        let uom_po = load_uom(store, self.uom_po)?;
        if uom.category != uom_po.category {
            return Err(DomainError::invariant(
                "the default unit of measure and the purchase unit of measure must be in the same category",
            ));
        }
        Ok(())
    }

    pub fn validate<S>(&self, store: &S) -> DomainResult<()>
    where
        S: CatalogReader + ?Sized,
    {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("template name cannot be empty"));
        }
        if self.list_price < 0.0 {
            return Err(DomainError::validation("list price cannot be negative"));
        }
        if store.category(self.category).is_none() {
            return Err(DomainError::not_found(format!("category {}", self.category)));
        }
        self.check_uom(store)?;

        let mut seen = HashSet::new();
        for line in &self.attribute_lines {
            if !seen.insert(line.attribute) {
                return Err(DomainError::invariant(format!(
                    "attribute {} appears on more than one line",
                    line.attribute
                )));
            }
            line.validate(store)?;
        }
        Ok(())
    }
}

impl Entity for ProductTemplate {
    type Id = TemplateId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

pub(crate) fn load_uom<S>(store: &S, id: UomId) -> DomainResult<Uom>
where
    S: CatalogReader + ?Sized,
{
    store
        .uom(id)
        .ok_or_else(|| DomainError::not_found(format!("unit of measure {id}")))
}

pub(crate) fn load_template<S>(store: &S, id: TemplateId) -> DomainResult<ProductTemplate>
where
    S: CatalogReader + ?Sized,
{
    store
        .template(id)
        .ok_or_else(|| DomainError::not_found(format!("template {id}")))
}

/// Currency prices of this template are expressed in: its company's, else the main company's.
pub fn template_currency<S>(store: &S, template: &ProductTemplate) -> DomainResult<CurrencyCode>
where
    S: CatalogReader + ?Sized,
{
    if let Some(company) = template.company.and_then(|id| store.company(id)) {
        return Ok(company.currency);
    }
    store
        .main_company()
        .map(|company| company.currency)
        .ok_or_else(|| DomainError::not_found("main company"))
}

/// Store a new template and generate its variants.
pub fn create_template<S>(store: &mut S, template: ProductTemplate) -> DomainResult<ReconcileReport>
where
    S: CatalogWriter + ?Sized,
{
    template.validate(&*store)?;
    let id = template.id;
    store.insert_template(template)?;
    let report = reconcile_variants(store, id)?;
    info!(template = %id, variants = report.created.len(), "template created");
    Ok(report)
}

/// Partial write on a template. `None` leaves the field untouched.
#[derive(Debug, Clone, Default)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub list_price: Option<f64>,
    pub attribute_lines: Option<Vec<AttributeLine>>,
    pub active: Option<bool>,
}

/// Apply `update`; variants are reconciled when the attribute lines change or
/// the template is (re)activated, and all archived when it is archived.
pub fn update_template<S>(store: &mut S, id: TemplateId, update: TemplateUpdate) -> DomainResult<Option<ReconcileReport>>
where
    S: CatalogWriter + ?Sized,
{
    let mut template = load_template(&*store, id)?;
    let lines_changed = update.attribute_lines.is_some();

    if let Some(name) = update.name {
        template.name = name;
    }
    if let Some(list_price) = update.list_price {
        template.list_price = list_price;
    }
    if let Some(lines) = update.attribute_lines {
        template.attribute_lines = lines;
    }
    if let Some(active) = update.active {
        template.active = active;
    }
    template.validate(&*store)?;
    store.update_template(template)?;

    let report = if lines_changed || update.active == Some(true) {
        Some(reconcile_variants(store, id)?)
    } else {
        None
    };

    if update.active == Some(false) {
        for variant in store.variants(id) {
            store.set_active(&variant.id, false)?;
        }
    }
    Ok(report)
}

/// Number of active variants.
pub fn variant_count<S>(store: &S, template: TemplateId) -> usize
where
    S: CatalogReader + ?Sized,
{
    store.variants(template).iter().filter(|v| v.is_active()).count()
}

fn single_variant<S>(store: &S, template: TemplateId) -> Option<Product>
where
    S: CatalogReader + ?Sized,
{
    let mut active = store.variants(template).into_iter().filter(|v| v.is_active());
    match (active.next(), active.next()) {
        (Some(only), None) => Some(only),
        _ => None,
    }
}

/// Cost of the only variant; 0 when the template has several.
pub fn template_standard_price<S>(store: &S, template: TemplateId) -> f64
where
    S: CatalogReader + ?Sized,
{
    single_variant(store, template).map_or(0.0, |v| v.standard_price)
}

pub fn set_template_standard_price<S>(store: &mut S, template: TemplateId, price: f64) -> DomainResult<()>
where
    S: CatalogWriter + ?Sized,
{
    if let Some(mut variant) = single_variant(&*store, template) {
        variant.standard_price = price;
        store.update_product(variant)?;
    }
    Ok(())
}

pub fn template_default_code<S>(store: &S, template: TemplateId) -> Option<String>
where
    S: CatalogReader + ?Sized,
{
    single_variant(store, template).and_then(|v| v.default_code)
}

pub fn set_template_default_code<S>(store: &mut S, template: TemplateId, code: Option<String>) -> DomainResult<()>
where
    S: CatalogWriter + ?Sized,
{
    if let Some(mut variant) = single_variant(&*store, template) {
        variant.default_code = code;
        store.update_product(variant)?;
    }
    Ok(())
}

/// Store `price`, expressed per `uom` (template unit when `None`), as the list price.
pub fn set_template_price<S>(store: &mut S, template: TemplateId, price: f64, uom: Option<&Uom>) -> DomainResult<()>
where
    S: CatalogWriter + ?Sized,
{
    let mut record = load_template(&*store, template)?;
    record.list_price = match uom {
        Some(from) => {
            let to = load_uom(&*store, record.uom)?;
            from.convert_price(price, Some(&to))
        }
        None => price,
    };
    store.update_template(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, AttributeValue};
    use crate::category::ProductCategory;
    use crate::memory::InMemoryCatalog;
    use crate::partner::Company;
    use crate::uom::UomCategory;

    struct Fixture {
        store: InMemoryCatalog,
        category: ProductCategory,
        unit: Uom,
        dozen: Uom,
        kg: Uom,
    }

    fn fixture() -> Fixture {
        let mut store = InMemoryCatalog::new();
        let count = UomCategory::new("Unit");
        let weight = UomCategory::new("Weight");
        let unit = Uom::reference("Unit(s)", count.id);
        let dozen = Uom::bigger("Dozen(s)", count.id, 12.0);
        let kg = Uom::reference("kg", weight.id);
        for uom in [&unit, &dozen, &kg] {
            store.add_uom(uom.clone()).unwrap();
        }
        let category = ProductCategory::new("All");
        store.add_category(category.clone()).unwrap();
        store.add_company(Company::new("Main", CurrencyCode::new("EUR")));
        Fixture { store, category, unit, dozen, kg }
    }

    #[test]
    fn create_generates_a_single_variant_without_attributes() {
        let mut f = fixture();
        let template = ProductTemplate::new("Desk", f.category.id, f.unit.id);
        let report = create_template(&mut f.store, template.clone()).unwrap();

        assert_eq!(report.created.len(), 1);
        assert_eq!(variant_count(&f.store, template.id), 1);
    }

    #[test]
    fn purchase_unit_must_share_the_category() {
        let mut f = fixture();
        let template = ProductTemplate::new("Flour", f.category.id, f.unit.id).with_purchase_uom(f.kg.id);
        match create_template(&mut f.store, template).unwrap_err() {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("Expected InvariantViolation error for mismatched purchase unit"),
        }
    }

    #[test]
    fn duplicate_attribute_lines_are_rejected() {
        let mut f = fixture();
        let color = Attribute::new("Color");
        let red = AttributeValue::new(color.id, "Red");
        f.store.add_attribute(color.clone());
        f.store.add_attribute_value(red.clone()).unwrap();

        let template = ProductTemplate::new("Chair", f.category.id, f.unit.id)
            .with_line(AttributeLine::new(color.id, vec![red.id]))
            .with_line(AttributeLine::new(color.id, vec![red.id]));
        assert!(template.validate(&f.store).is_err());
    }

    #[test]
    fn single_variant_fields_delegate() {
        let mut f = fixture();
        let template = ProductTemplate::new("Desk", f.category.id, f.unit.id);
        create_template(&mut f.store, template.clone()).unwrap();

        set_template_standard_price(&mut f.store, template.id, 42.0).unwrap();
        set_template_default_code(&mut f.store, template.id, Some("DESK".into())).unwrap();

        assert_eq!(template_standard_price(&f.store, template.id), 42.0);
        assert_eq!(template_default_code(&f.store, template.id).as_deref(), Some("DESK"));
        assert_eq!(f.store.variants(template.id)[0].standard_price, 42.0);
    }

    #[test]
    fn template_price_is_stored_in_template_unit() {
        let mut f = fixture();
        let template = ProductTemplate::new("Eggs", f.category.id, f.unit.id);
        create_template(&mut f.store, template.clone()).unwrap();

        set_template_price(&mut f.store, template.id, 24.0, Some(&f.dozen)).unwrap();
        let stored = f.store.template(template.id).unwrap();
        assert!((stored.list_price - 2.0).abs() < 1e-9);

        set_template_price(&mut f.store, template.id, 3.0, None).unwrap();
        assert_eq!(f.store.template(template.id).unwrap().list_price, 3.0);
    }

    #[test]
    fn archiving_the_template_archives_variants() {
        let mut f = fixture();
        let template = ProductTemplate::new("Desk", f.category.id, f.unit.id);
        create_template(&mut f.store, template.clone()).unwrap();

        let report = update_template(
            &mut f.store,
            template.id,
            TemplateUpdate { active: Some(false), ..Default::default() },
        )
        .unwrap();
        assert!(report.is_none());
        assert_eq!(variant_count(&f.store, template.id), 0);

        let report = update_template(
            &mut f.store,
            template.id,
            TemplateUpdate { active: Some(true), ..Default::default() },
        )
        .unwrap()
        .unwrap();
        assert_eq!(report.reactivated.len(), 1);
        assert_eq!(variant_count(&f.store, template.id), 1);
    }

    #[test]
    fn currency_falls_back_to_main_company() {
        let mut f = fixture();
        let template = ProductTemplate::new("Desk", f.category.id, f.unit.id);
        assert_eq!(template_currency(&f.store, &template).unwrap(), CurrencyCode::new("EUR"));

        let usd = Company::new("US branch", CurrencyCode::new("USD"));
        f.store.add_company(usd.clone());
        let template = template.with_company(usd.id);
        assert_eq!(template_currency(&f.store, &template).unwrap(), CurrencyCode::new("USD"));
    }
}
