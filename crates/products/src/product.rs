//! Product variants and the price fields derived from them.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use pricebook_core::{Archivable, DomainError, DomainResult, Entity};

use crate::attribute::variant_name;
use crate::currency::{CurrencyCode, CurrencyConverter};
use crate::ids::{AttributeValueId, ProductId, TemplateId};
use crate::store::{CatalogReader, CatalogWriter};
use crate::template::{ProductTemplate, load_template, load_uom, template_currency};
use crate::uom::Uom;

/// One sellable variant of a template.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub template: TemplateId,
    /// At most one value per attribute.
    pub attribute_values: Vec<AttributeValueId>,
    pub active: bool,
    pub default_code: Option<String>,
    pub barcode: Option<String>,
    /// Cost, in the template's currency.
    pub standard_price: f64,
    pub volume: f64,
    pub weight: f64,
}

impl Product {
    pub fn new(template: TemplateId, attribute_values: Vec<AttributeValueId>) -> Self {
        Self {
            id: ProductId::new(),
            template,
            attribute_values,
            active: true,
            default_code: None,
            barcode: None,
            standard_price: 0.0,
            volume: 0.0,
            weight: 0.0,
        }
    }

    pub fn with_default_code(mut self, code: impl Into<String>) -> Self {
        self.default_code = Some(code.into());
        self
    }

    pub fn with_standard_price(mut self, price: f64) -> Self {
        self.standard_price = price;
        self
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

impl Archivable for Product {
    fn is_active(&self) -> bool {
        self.active
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }
}

/// A product field a price can be based on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PriceField {
    /// Template list price plus the variant's attribute extras.
    ListPrice,
    /// Variant cost.
    StandardPrice,
}

impl PriceField {
    fn accessor(self) -> fn(&ProductSnapshot) -> f64 {
        match self {
            PriceField::ListPrice => |s: &ProductSnapshot| s.template.list_price + s.price_extra,
            PriceField::StandardPrice => |s: &ProductSnapshot| s.product.standard_price,
        }
    }

    /// Raw field value, in the product's unit and currency.
    pub fn read(self, snapshot: &ProductSnapshot) -> f64 {
        (self.accessor())(snapshot)
    }
}

/// A variant loaded together with everything price computations need.
#[derive(Debug, Clone)]
pub struct ProductSnapshot {
    pub product: Product,
    pub template: ProductTemplate,
    pub uom: Uom,
    pub price_extra: f64,
    pub currency: CurrencyCode,
}

impl ProductSnapshot {
    pub fn load<S>(store: &S, id: ProductId) -> DomainResult<Self>
    where
        S: CatalogReader + ?Sized,
    {
        let product = store
            .product(id)
            .ok_or_else(|| DomainError::not_found(format!("product {id}")))?;
        let template = load_template(store, product.template)?;
        let uom = load_uom(store, template.uom)?;
        let price_extra = price_extra(store, &product);
        let currency = template_currency(store, &template)?;
        Ok(Self {
            product,
            template,
            uom,
            price_extra,
            currency,
        })
    }

    /// `field` expressed per `uom` and, rounded, in `currency` (product unit and currency when `None`).
    pub fn price_compute<C>(
        &self,
        currencies: &C,
        field: PriceField,
        uom: Option<&Uom>,
        currency: Option<&CurrencyCode>,
    ) -> DomainResult<f64>
    where
        C: CurrencyConverter + ?Sized,
    {
        let price = self.uom.convert_price(field.read(self), uom);
        match currency {
            Some(to) => currencies.convert(price, &self.currency, to, true),
            None => Ok(price),
        }
    }

    /// List price per `uom` plus attribute extras.
    pub fn lst_price(&self, uom: Option<&Uom>) -> f64 {
        self.uom.convert_price(self.template.list_price, uom) + self.price_extra
    }
}

/// Sum of the surcharges the template defines for the variant's values.
pub fn price_extra<S>(store: &S, product: &Product) -> f64
where
    S: CatalogReader + ?Sized,
{
    store
        .attribute_prices(product.template)
        .iter()
        .filter(|p| product.attribute_values.contains(&p.value))
        .map(|p| p.price_extra)
        .sum()
}

/// Set the variant's sale price (extras included, per `uom`) by writing the template list price.
pub fn set_lst_price<S>(store: &mut S, product: ProductId, price: f64, uom: Option<&Uom>) -> DomainResult<()>
where
    S: CatalogWriter + ?Sized,
{
    let snapshot = ProductSnapshot::load(&*store, product)?;
    let price = match uom {
        Some(from) => from.convert_price(price, Some(&snapshot.uom)),
        None => price,
    };
    let mut template = snapshot.template;
    template.list_price = price - snapshot.price_extra;
    store.update_template(template)
}

/// No two values of the same attribute on one variant.
pub fn check_attribute_values<S>(store: &S, product: &Product) -> DomainResult<()>
where
    S: CatalogReader + ?Sized,
{
    let mut attributes = HashSet::new();
    for id in &product.attribute_values {
        let value = store
            .attribute_value(*id)
            .ok_or_else(|| DomainError::not_found(format!("attribute value {id}")))?;
        if !attributes.insert(value.attribute) {
            return Err(DomainError::invariant(
                "it is not allowed to choose more than one value for a given attribute",
            ));
        }
    }
    Ok(())
}

/// `[code] name`, or the bare name without a code.
pub fn name_format(name: &str, code: Option<&str>) -> String {
    match code {
        Some(code) if !code.is_empty() => format!("[{code}] {name}"),
        _ => name.to_string(),
    }
}

/// `[code] name (value, value)`, listing values of attributes with several values on the template.
pub fn display_name<S>(store: &S, product: ProductId) -> DomainResult<String>
where
    S: CatalogReader + ?Sized,
{
    let product = store
        .product(product)
        .ok_or_else(|| DomainError::not_found(format!("product {product}")))?;
    let template = load_template(store, product.template)?;
    let name = name_format(&template.name, product.default_code.as_deref());
    let variant = variant_name(store, &template.attribute_lines, &product.attribute_values)?;
    if variant.is_empty() {
        Ok(name)
    } else {
        Ok(format!("{name} ({variant})"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribute::{Attribute, AttributeLine, AttributePrice, AttributeValue};
    use crate::category::ProductCategory;
    use crate::currency::RateTable;
    use crate::memory::InMemoryCatalog;
    use crate::partner::Company;
    use crate::template::{ProductTemplate, create_template};
    use crate::uom::UomCategory;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    struct Fixture {
        store: InMemoryCatalog,
        template: ProductTemplate,
        dozen: Uom,
        red: AttributeValue,
        blue: AttributeValue,
    }

    fn fixture() -> Fixture {
        let mut store = InMemoryCatalog::new();
        let count = UomCategory::new("Unit");
        let unit = Uom::reference("Unit(s)", count.id);
        let dozen = Uom::bigger("Dozen(s)", count.id, 12.0);
        store.add_uom(unit.clone()).unwrap();
        store.add_uom(dozen.clone()).unwrap();
        let category = ProductCategory::new("All");
        store.add_category(category.clone()).unwrap();
        store.add_company(Company::new("Main", CurrencyCode::new("EUR")));

        let color = Attribute::new("Color");
        let red = AttributeValue::new(color.id, "Red");
        let blue = AttributeValue::new(color.id, "Blue");
        store.add_attribute(color.clone());
        store.add_attribute_value(red.clone()).unwrap();
        store.add_attribute_value(blue.clone()).unwrap();

        let template = ProductTemplate::new("Mug", category.id, unit.id)
            .with_list_price(10.0)
            .with_line(AttributeLine::new(color.id, vec![red.id, blue.id]));
        store.add_attribute_price(AttributePrice {
            template: template.id,
            value: red.id,
            price_extra: 2.5,
        });
        create_template(&mut store, template.clone()).unwrap();
        Fixture { store, template, dozen, red, blue }
    }

    fn variant_with(f: &Fixture, value: AttributeValueId) -> Product {
        f.store
            .variants(f.template.id)
            .into_iter()
            .find(|v| v.attribute_values.contains(&value))
            .unwrap()
    }

    #[test]
    fn price_extra_sums_template_surcharges() {
        let f = fixture();
        assert!(approx(price_extra(&f.store, &variant_with(&f, f.red.id)), 2.5));
        assert_eq!(price_extra(&f.store, &variant_with(&f, f.blue.id)), 0.0);
    }

    #[test]
    fn list_price_field_includes_extras() {
        let f = fixture();
        let red = ProductSnapshot::load(&f.store, variant_with(&f, f.red.id).id).unwrap();
        assert!(approx(PriceField::ListPrice.read(&red), 12.5));
        assert_eq!(PriceField::StandardPrice.read(&red), 0.0);
        assert!(approx(red.lst_price(None), 12.5));
        // Extras are added after the unit conversion.
        assert!(approx(red.lst_price(Some(&f.dozen)), 122.5));
    }

    #[test]
    fn price_compute_converts_unit_and_currency() {
        let f = fixture();
        let red = ProductSnapshot::load(&f.store, variant_with(&f, f.red.id).id).unwrap();
        let rates = RateTable::new(0.01)
            .with_rate(CurrencyCode::new("EUR"), 1.0)
            .with_rate(CurrencyCode::new("USD"), 1.1);

        let per_dozen = red
            .price_compute(&rates, PriceField::ListPrice, Some(&f.dozen), None)
            .unwrap();
        assert!(approx(per_dozen, 150.0));

        let usd = red
            .price_compute(&rates, PriceField::ListPrice, None, Some(&CurrencyCode::new("USD")))
            .unwrap();
        assert!(approx(usd, 13.75));
    }

    #[test]
    fn setting_lst_price_writes_template_list_price() {
        let mut f = fixture();
        let red = variant_with(&f, f.red.id);
        set_lst_price(&mut f.store, red.id, 20.0, None).unwrap();
        assert!(approx(f.store.template(f.template.id).unwrap().list_price, 17.5));

        let dozen = f.dozen.clone();
        set_lst_price(&mut f.store, red.id, 240.0, Some(&dozen)).unwrap();
        assert!(approx(f.store.template(f.template.id).unwrap().list_price, 17.5));
    }

    #[test]
    fn two_values_of_one_attribute_are_rejected() {
        let f = fixture();
        let bad = Product::new(f.template.id, vec![f.red.id, f.blue.id]);
        match check_attribute_values(&f.store, &bad).unwrap_err() {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("Expected InvariantViolation error for duplicate attribute"),
        }
    }

    #[test]
    fn names_include_code_and_variable_values() {
        let mut f = fixture();
        assert_eq!(name_format("Mug", Some("MUG")), "[MUG] Mug");
        assert_eq!(name_format("Mug", Some("")), "Mug");
        assert_eq!(name_format("Mug", None), "Mug");

        let mut red = variant_with(&f, f.red.id);
        red.default_code = Some("MUG-R".into());
        f.store.update_product(red.clone()).unwrap();
        assert_eq!(display_name(&f.store, red.id).unwrap(), "[MUG-R] Mug (Red)");
    }
}
