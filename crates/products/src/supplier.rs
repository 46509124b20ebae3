//! Vendor price lines and seller selection.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use pricebook_core::{DomainError, DomainResult, Entity};

use crate::currency::CurrencyCode;
use crate::ids::{PartnerId, ProductId, SupplierInfoId, TemplateId};
use crate::partner::Partner;
use crate::store::CatalogReader;
use crate::template::{load_template, load_uom};
use crate::uom::Uom;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierInfo {
    pub id: SupplierInfoId,
    pub vendor: PartnerId,
    pub template: TemplateId,
    /// Restricts the line to one variant.
    pub product: Option<ProductId>,
    pub product_name: Option<String>,
    pub product_code: Option<String>,
    pub sequence: i32,
    /// In the template's purchase unit.
    pub min_qty: f64,
    pub price: f64,
    pub currency: CurrencyCode,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
    /// Lead time in days.
    pub delay: u32,
}

impl SupplierInfo {
    pub fn new(vendor: PartnerId, template: TemplateId, price: f64, currency: CurrencyCode) -> Self {
        Self {
            id: SupplierInfoId::new(),
            vendor,
            template,
            product: None,
            product_name: None,
            product_code: None,
            sequence: 1,
            min_qty: 0.0,
            price,
            currency,
            date_start: None,
            date_end: None,
            delay: 1,
        }
    }

    pub fn with_min_qty(mut self, min_qty: f64) -> Self {
        self.min_qty = min_qty;
        self
    }

    pub fn with_sequence(mut self, sequence: i32) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn for_variant(mut self, product: ProductId) -> Self {
        self.product = Some(product);
        self
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.date_start = start;
        self.date_end = end;
        self
    }
}

impl Entity for SupplierInfo {
    type Id = SupplierInfoId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// First vendor line of `product` (in sequence order) usable for the given
/// partner, quantity and date. `quantity` is expressed in `uom` when given.
pub fn select_seller<S>(
    store: &S,
    product: ProductId,
    partner: Option<&Partner>,
    quantity: f64,
    date: NaiveDate,
    uom: Option<&Uom>,
) -> DomainResult<Option<SupplierInfo>>
where
    S: CatalogReader + ?Sized,
{
    let variant = store
        .product(product)
        .ok_or_else(|| DomainError::not_found(format!("product {product}")))?;
    let template = load_template(store, variant.template)?;
    let seller_uom = load_uom(store, template.uom_po)?;

    let quantity = match uom {
        Some(uom) if quantity != 0.0 && uom.id != seller_uom.id => {
            uom.convert_quantity(quantity, Some(&seller_uom), true)?
        }
        _ => quantity,
    };

    for seller in store.suppliers(template.id) {
        if seller.date_start.is_some_and(|start| start > date) || seller.date_end.is_some_and(|end| end < date) {
            continue;
        }
        if let Some(partner) = partner {
            if seller.vendor != partner.id && Some(seller.vendor) != partner.parent {
                continue;
            }
        }
        if quantity < seller.min_qty {
            continue;
        }
        if seller.product.is_some_and(|p| p != product) {
            continue;
        }
        return Ok(Some(seller));
    }
    Ok(None)
}
