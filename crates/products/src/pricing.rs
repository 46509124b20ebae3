//! Pricelist rule evaluation.
//!
//! For one product, quantity and date the engine collects the rules of a
//! pricelist, orders them (narrowest scope, then highest minimum quantity,
//! then category name) and applies the first rule that really matches. Rules
//! based on another pricelist recurse into it.

use chrono::{NaiveDate, Utc};
use tracing::debug;

use pricebook_core::{DomainError, DomainResult};

use crate::category::category_ancestors;
use crate::config::PricingSettings;
use crate::currency::CurrencyConverter;
use crate::ids::{CategoryId, PartnerId, PricelistId, ProductId, TemplateId, UomId};
use crate::pricelist::{PriceBase, PriceComputation, PricelistItem, sort_rules};
use crate::product::{PriceField, ProductSnapshot};
use crate::store::CatalogReader;
use crate::template::load_uom;

/// Inputs of one price computation. Unset fields fall back to today and the
/// product's own unit.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceRequest {
    pub product: Option<ProductId>,
    pub quantity: f64,
    pub partner: Option<PartnerId>,
    pub date: Option<NaiveDate>,
    /// Unit both `quantity` and the resulting price are expressed in.
    pub uom: Option<UomId>,
}

impl PriceRequest {
    pub fn new(product: ProductId, quantity: f64) -> Self {
        Self {
            product: Some(product),
            quantity,
            partner: None,
            date: None,
            uom: None,
        }
    }

    /// A request without a product; it always prices at 0.
    pub fn without_product(quantity: f64) -> Self {
        Self {
            product: None,
            quantity,
            partner: None,
            date: None,
            uom: None,
        }
    }

    pub fn for_partner(mut self, partner: PartnerId) -> Self {
        self.partner = Some(partner);
        self
    }

    pub fn on(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    pub fn in_uom(mut self, uom: UomId) -> Self {
        self.uom = Some(uom);
        self
    }
}

/// Price together with the rule that produced it (`None` when no rule applied).
#[derive(Debug, Clone, PartialEq)]
pub struct RulePrice {
    pub price: f64,
    pub rule: Option<PricelistItem>,
}

impl RulePrice {
    fn unpriced() -> Self {
        Self { price: 0.0, rule: None }
    }
}

/// Evaluates pricelists against one catalog snapshot.
pub struct PriceEngine<'a, S: ?Sized, C: ?Sized> {
    store: &'a S,
    currencies: &'a C,
    today: NaiveDate,
    max_depth: usize,
}

impl<'a, S, C> PriceEngine<'a, S, C>
where
    S: CatalogReader + ?Sized,
    C: CurrencyConverter + ?Sized,
{
    pub fn new(store: &'a S, currencies: &'a C) -> Self {
        Self {
            store,
            currencies,
            today: Utc::now().date_naive(),
            max_depth: PricingSettings::default().max_pricelist_depth,
        }
    }

    pub fn with_settings(mut self, settings: &PricingSettings) -> Self {
        self.max_depth = settings.max_pricelist_depth;
        self
    }

    /// Date used when a request carries none.
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    /// Price of `request` in `pricelist`, and the rule that produced it.
    pub fn compute_price_rule(&self, pricelist: PricelistId, request: &PriceRequest) -> DomainResult<RulePrice> {
        self.compute(pricelist, request, 0)
    }

    pub fn get_product_price(&self, pricelist: PricelistId, request: &PriceRequest) -> DomainResult<f64> {
        Ok(self.compute_price_rule(pricelist, request)?.price)
    }

    pub fn get_product_price_rule(
        &self,
        pricelist: PricelistId,
        request: &PriceRequest,
    ) -> DomainResult<Option<PricelistItem>> {
        Ok(self.compute_price_rule(pricelist, request)?.rule)
    }

    /// Sale price of a variant for display; `None` without a pricelist.
    /// A zero quantity is read as one unit.
    pub fn product_price(
        &self,
        pricelist: Option<PricelistId>,
        product: ProductId,
        quantity: f64,
        partner: Option<PartnerId>,
    ) -> DomainResult<Option<f64>> {
        let Some(pricelist) = pricelist.filter(|id| self.store.pricelist(*id).is_some()) else {
            return Ok(None);
        };
        let quantity = if quantity == 0.0 { 1.0 } else { quantity };
        let mut request = PriceRequest::new(product, quantity);
        request.partner = partner;
        self.get_product_price(pricelist, &request).map(Some)
    }

    /// Sale price of a template, priced through its first active variant.
    pub fn template_price(
        &self,
        pricelist: Option<PricelistId>,
        template: TemplateId,
        quantity: f64,
        partner: Option<PartnerId>,
    ) -> DomainResult<Option<f64>> {
        let variant = self.store.variants(template).into_iter().find(|v| v.active);
        match variant {
            Some(variant) => self.product_price(pricelist, variant.id, quantity, partner),
            None => Ok(None),
        }
    }

    fn compute(&self, pricelist_id: PricelistId, request: &PriceRequest, depth: usize) -> DomainResult<RulePrice> {
        if depth > self.max_depth {
            return Err(DomainError::invariant(format!(
                "pricelist {pricelist_id} nests other pricelists more than {} levels deep",
                self.max_depth
            )));
        }
        let pricelist = self
            .store
            .pricelist(pricelist_id)
            .ok_or_else(|| DomainError::not_found(format!("pricelist {pricelist_id}")))?;
        let date = request.date.unwrap_or(self.today);
        let Some(product_id) = request.product else {
            return Ok(RulePrice::unpriced());
        };

        let snapshot = ProductSnapshot::load(self.store, product_id)?;
        let price_uom = match request.uom {
            Some(id) => load_uom(self.store, id)?,
            None => snapshot.uom.clone(),
        };
        let categories: Vec<CategoryId> = category_ancestors(self.store, snapshot.template.category)?
            .into_iter()
            .map(|c| c.id)
            .collect();

        let qty_in_product_uom = if price_uom.id != snapshot.uom.id && price_uom.category == snapshot.uom.category {
            price_uom.convert_quantity(request.quantity, Some(&snapshot.uom), true)?
        } else {
            request.quantity
        };

        let mut candidates: Vec<PricelistItem> = self
            .store
            .pricelist_items(pricelist.id)
            .into_iter()
            .filter(|item| item.is_valid_on(date) && item.scope.matches(&snapshot, &categories))
            .collect();
        sort_rules(self.store, &mut candidates);

        let to_price_uom = |amount: f64| snapshot.uom.convert_price(amount, Some(&price_uom));
        let mut price = snapshot.price_compute(self.currencies, PriceField::ListPrice, Some(&price_uom), None)?;
        let mut matched: Option<PricelistItem> = None;

        for rule in candidates {
            if !rule.accepts_quantity(qty_in_product_uom) {
                continue;
            }

            price = match rule.base {
                PriceBase::Pricelist(base_id) => {
                    let base = self
                        .store
                        .pricelist(base_id)
                        .ok_or_else(|| DomainError::not_found(format!("pricelist {base_id}")))?;
                    let nested = PriceRequest {
                        product: Some(product_id),
                        quantity: request.quantity,
                        partner: request.partner,
                        date: None,
                        uom: None,
                    };
                    let inner = self.compute(base.id, &nested, depth + 1)?;
                    let converted = self
                        .currencies
                        .convert(inner.price, &base.currency, &pricelist.currency, false)?;
                    to_price_uom(converted)
                }
                PriceBase::ListPrice => {
                    snapshot.price_compute(self.currencies, PriceField::ListPrice, Some(&price_uom), None)?
                }
                PriceBase::StandardPrice => {
                    snapshot.price_compute(self.currencies, PriceField::StandardPrice, Some(&price_uom), None)?
                }
            };

            if price == 0.0 {
                break;
            }
            price = rule.computation.apply(price, to_price_uom);
            matched = Some(rule);
            break;
        }

        let already_in_target_currency = matched.as_ref().is_some_and(|rule| {
            matches!(rule.computation, PriceComputation::Fixed { .. })
                || matches!(rule.base, PriceBase::Pricelist(_))
        });
        if !already_in_target_currency {
            price = self
                .currencies
                .convert(price, &snapshot.currency, &pricelist.currency, false)?;
        }

        debug!(
            pricelist = %pricelist.id,
            product = %product_id,
            quantity = request.quantity,
            rule = ?matched.as_ref().map(|r| r.id),
            price,
            "price computed"
        );
        Ok(RulePrice { price, rule: matched })
    }
}
