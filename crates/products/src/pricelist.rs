//! Pricelists and their rules.
//!
//! A rule (`PricelistItem`) pairs a scope (which products it targets), a base
//! (what price it starts from) and a computation (how that price is turned
//! into the rule's price). Mutually exclusive options are encoded in the
//! types, so a fixed-price rule simply has no discount field to reset.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use pricebook_core::{DomainError, DomainResult, Entity, round_to_step};

use crate::category::ProductCategory;
use crate::currency::CurrencyCode;
use crate::ids::{CategoryId, CompanyId, CountryGroupId, PricelistId, PricelistItemId, ProductId, TemplateId};
use crate::product::ProductSnapshot;
use crate::store::CatalogReader;

pub const DEFAULT_PRICELIST_SEQUENCE: i32 = 16;
pub const DEFAULT_ITEM_SEQUENCE: i32 = 5;
pub const DEFAULT_MIN_QUANTITY: f64 = 1.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pricelist {
    pub id: PricelistId,
    pub name: String,
    pub active: bool,
    pub currency: CurrencyCode,
    pub company: Option<CompanyId>,
    pub sequence: i32,
    /// Countries this list is meant for; empty means everywhere.
    pub country_groups: Vec<CountryGroupId>,
}

impl Pricelist {
    pub fn new(name: impl Into<String>, currency: CurrencyCode) -> Self {
        Self {
            id: PricelistId::new(),
            name: name.into(),
            active: true,
            currency,
            company: None,
            sequence: DEFAULT_PRICELIST_SEQUENCE,
            country_groups: Vec::new(),
        }
    }

    pub fn with_sequence(mut self, sequence: i32) -> Self {
        self.sequence = sequence;
        self
    }

    pub fn with_company(mut self, company: CompanyId) -> Self {
        self.company = Some(company);
        self
    }

    pub fn with_country_group(mut self, group: CountryGroupId) -> Self {
        self.country_groups.push(group);
        self
    }

    /// `Public Pricelist (EUR)`
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.name, self.currency)
    }
}

impl Entity for Pricelist {
    type Id = PricelistId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Scope level of a rule. Narrower scopes order first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AppliedOn {
    #[serde(rename = "0_product_variant")]
    Variant,
    #[serde(rename = "1_product")]
    Template,
    #[serde(rename = "2_product_category")]
    Category,
    #[serde(rename = "3_global")]
    Global,
}

impl AppliedOn {
    pub fn as_str(self) -> &'static str {
        match self {
            AppliedOn::Variant => "0_product_variant",
            AppliedOn::Template => "1_product",
            AppliedOn::Category => "2_product_category",
            AppliedOn::Global => "3_global",
        }
    }
}

/// Which products a rule targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "applied_on", content = "target", rename_all = "snake_case")]
pub enum RuleScope {
    Global,
    /// The category and all of its descendants.
    Category(CategoryId),
    Template(TemplateId),
    Variant(ProductId),
}

impl RuleScope {
    pub fn applied_on(&self) -> AppliedOn {
        match self {
            RuleScope::Global => AppliedOn::Global,
            RuleScope::Category(_) => AppliedOn::Category,
            RuleScope::Template(_) => AppliedOn::Template,
            RuleScope::Variant(_) => AppliedOn::Variant,
        }
    }

    /// `categories` is the product's category chain, nearest first.
    pub fn matches(&self, snapshot: &ProductSnapshot, categories: &[CategoryId]) -> bool {
        match self {
            RuleScope::Global => true,
            RuleScope::Category(category) => categories.contains(category),
            RuleScope::Template(template) => snapshot.template.id == *template,
            RuleScope::Variant(product) => snapshot.product.id == *product,
        }
    }
}

/// Price a rule starts from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceBase {
    ListPrice,
    StandardPrice,
    /// The price another pricelist computes for the same product.
    Pricelist(PricelistId),
}

/// Discount, rounding, surcharge and margin clamps. A zero field is unset.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FormulaRule {
    /// Percentage taken off the base price.
    pub discount: f64,
    /// Step the discounted price is rounded to.
    pub round: f64,
    pub surcharge: f64,
    pub min_margin: f64,
    pub max_margin: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "compute_price", rename_all = "snake_case")]
pub enum PriceComputation {
    Fixed { price: f64 },
    Percentage { percent: f64 },
    Formula(FormulaRule),
}

impl PriceComputation {
    /// Turn `base` into the rule price. Amounts stored on the rule are per
    /// product unit and go through `to_price_uom` first.
    pub fn apply(&self, base: f64, to_price_uom: impl Fn(f64) -> f64) -> f64 {
        match self {
            PriceComputation::Fixed { price } => to_price_uom(*price),
            PriceComputation::Percentage { percent } => base - base * (percent / 100.0),
            PriceComputation::Formula(formula) => {
                let limit = base;
                let mut price = base - base * (formula.discount / 100.0);
                if formula.round != 0.0 {
                    price = round_to_step(price, formula.round);
                }
                if formula.surcharge != 0.0 {
                    price += to_price_uom(formula.surcharge);
                }
                if formula.min_margin != 0.0 {
                    price = price.max(limit + to_price_uom(formula.min_margin));
                }
                if formula.max_margin != 0.0 {
                    price = price.min(limit + to_price_uom(formula.max_margin));
                }
                price
            }
        }
    }
}

/// One rule of a pricelist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricelistItem {
    pub id: PricelistItemId,
    pub pricelist: PricelistId,
    pub scope: RuleScope,
    /// In the product's unit; 0 disables the threshold.
    pub min_quantity: f64,
    pub sequence: i32,
    pub base: PriceBase,
    pub computation: PriceComputation,
    pub date_start: Option<NaiveDate>,
    pub date_end: Option<NaiveDate>,
}

impl PricelistItem {
    pub fn new(pricelist: PricelistId, computation: PriceComputation) -> Self {
        Self {
            id: PricelistItemId::new(),
            pricelist,
            scope: RuleScope::Global,
            min_quantity: DEFAULT_MIN_QUANTITY,
            sequence: DEFAULT_ITEM_SEQUENCE,
            base: PriceBase::ListPrice,
            computation,
            date_start: None,
            date_end: None,
        }
    }

    pub fn fixed(pricelist: PricelistId, price: f64) -> Self {
        Self::new(pricelist, PriceComputation::Fixed { price })
    }

    pub fn percentage(pricelist: PricelistId, percent: f64) -> Self {
        Self::new(pricelist, PriceComputation::Percentage { percent })
    }

    pub fn formula(pricelist: PricelistId, formula: FormulaRule) -> Self {
        Self::new(pricelist, PriceComputation::Formula(formula))
    }

    pub fn with_scope(mut self, scope: RuleScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_base(mut self, base: PriceBase) -> Self {
        self.base = base;
        self
    }

    pub fn with_min_quantity(mut self, min_quantity: f64) -> Self {
        self.min_quantity = min_quantity;
        self
    }

    pub fn with_dates(mut self, start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        self.date_start = start;
        self.date_end = end;
        self
    }

    pub fn applied_on(&self) -> AppliedOn {
        self.scope.applied_on()
    }

    /// Margin clamps must be ordered (an unset clamp counts as 0) and a rule cannot be based on its own pricelist.
    pub fn validate(&self) -> DomainResult<()> {
        if let PriceComputation::Formula(formula) = &self.computation {
            if formula.min_margin > formula.max_margin {
                return Err(DomainError::invariant(
                    "the minimum margin should be lower than the maximum margin",
                ));
            }
        }
        if self.base == PriceBase::Pricelist(self.pricelist) {
            return Err(DomainError::invariant(
                "a pricelist item cannot be based on its own pricelist",
            ));
        }
        if let (Some(start), Some(end)) = (self.date_start, self.date_end) {
            if start > end {
                return Err(DomainError::validation("rule start date is after its end date"));
            }
        }
        if self.min_quantity < 0.0 {
            return Err(DomainError::validation("minimum quantity cannot be negative"));
        }
        Ok(())
    }

    /// Inclusive validity window; a missing bound is open.
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        self.date_start.is_none_or(|start| start <= date) && self.date_end.is_none_or(|end| end >= date)
    }

    /// Quantity threshold, with `qty` already in the product's unit.
    pub fn accepts_quantity(&self, qty: f64) -> bool {
        self.min_quantity == 0.0 || qty >= self.min_quantity
    }

    /// Display pair: what the rule targets and what it does.
    pub fn label<S>(&self, store: &S) -> DomainResult<(String, String)>
    where
        S: CatalogReader + ?Sized,
    {
        let name = match self.scope {
            RuleScope::Global => "All Products".to_string(),
            RuleScope::Category(id) => {
                let category = store
                    .category(id)
                    .ok_or_else(|| DomainError::not_found(format!("category {id}")))?;
                format!("Category: {}", category.name)
            }
            RuleScope::Template(id) => {
                store
                    .template(id)
                    .ok_or_else(|| DomainError::not_found(format!("template {id}")))?
                    .name
            }
            RuleScope::Variant(id) => {
                let product = store
                    .product(id)
                    .ok_or_else(|| DomainError::not_found(format!("product {id}")))?;
                let name = crate::product::display_name(store, id)?;
                match product.default_code {
                    Some(code) => name.replacen(&format!("[{code}]"), "", 1).trim_start().to_string(),
                    None => name,
                }
            }
        };
        let price = match self.computation {
            PriceComputation::Fixed { price } => {
                let pricelist = store
                    .pricelist(self.pricelist)
                    .ok_or_else(|| DomainError::not_found(format!("pricelist {}", self.pricelist)))?;
                format!("{price} {}", pricelist.currency)
            }
            PriceComputation::Percentage { percent } => format!("{percent} % discount"),
            PriceComputation::Formula(formula) => {
                format!("{} % discount and {} surcharge", formula.discount.abs(), formula.surcharge)
            }
        };
        Ok((name, price))
    }
}

impl Entity for PricelistItem {
    type Id = PricelistItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Evaluation order: scope level, then higher minimum quantity, then category
/// name (rules without a category last). Stable, so equal rules keep storage order.
pub fn sort_rules<S>(store: &S, items: &mut [PricelistItem])
where
    S: CatalogReader + ?Sized,
{
    let category_name = |item: &PricelistItem| -> Option<String> {
        match item.scope {
            RuleScope::Category(id) => store.category(id).map(|c: ProductCategory| c.name),
            _ => None,
        }
    };
    let mut keyed: Vec<(Option<String>, PricelistItem)> =
        items.iter().map(|item| (category_name(item), item.clone())).collect();
    keyed.sort_by(|(a_name, a), (b_name, b)| {
        a.applied_on()
            .cmp(&b.applied_on())
            .then_with(|| b.min_quantity.total_cmp(&a.min_quantity))
            .then_with(|| match (a_name, b_name) {
                (Some(a), Some(b)) => a.cmp(b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            })
    });
    for (slot, (_, item)) in items.iter_mut().zip(keyed) {
        *slot = item;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryCatalog;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn list() -> PricelistId {
        PricelistId::new()
    }

    #[test]
    fn applied_on_orders_like_its_encoding() {
        let mut levels = vec![AppliedOn::Global, AppliedOn::Template, AppliedOn::Variant, AppliedOn::Category];
        levels.sort();
        let encoded: Vec<&str> = levels.iter().map(|l| l.as_str()).collect();
        let mut sorted = encoded.clone();
        sorted.sort();
        assert_eq!(encoded, sorted);
        assert_eq!(levels[0], AppliedOn::Variant);
        assert_eq!(serde_json::to_string(&AppliedOn::Global).unwrap(), "\"3_global\"");
    }

    #[test]
    fn formula_clamps_to_minimum_margin() {
        let formula = PriceComputation::Formula(FormulaRule {
            discount: 10.0,
            round: 1.0,
            surcharge: 2.0,
            min_margin: 5.0,
            ..FormulaRule::default()
        });
        assert!(approx(formula.apply(100.0, |p| p), 105.0));
    }

    #[test]
    fn formula_without_clamps_applies_discount_rounding_and_surcharge() {
        let formula = PriceComputation::Formula(FormulaRule {
            discount: 10.0,
            round: 10.0,
            surcharge: -0.01,
            ..FormulaRule::default()
        });
        assert!(approx(formula.apply(123.0, |p| p), 109.99));
    }

    #[test]
    fn formula_caps_at_maximum_margin() {
        let formula = PriceComputation::Formula(FormulaRule {
            surcharge: 50.0,
            max_margin: 20.0,
            ..FormulaRule::default()
        });
        assert!(approx(formula.apply(100.0, |p| p), 120.0));
    }

    #[test]
    fn fixed_and_surcharge_go_through_price_unit() {
        let per_dozen = |p: f64| p * 12.0;
        assert!(approx(PriceComputation::Fixed { price: 2.0 }.apply(50.0, per_dozen), 24.0));
        assert!(approx(PriceComputation::Percentage { percent: 25.0 }.apply(48.0, per_dozen), 36.0));
    }

    #[test]
    fn inverted_margins_are_rejected() {
        let item = PricelistItem::formula(
            list(),
            FormulaRule {
                min_margin: 10.0,
                max_margin: 5.0,
                ..FormulaRule::default()
            },
        );
        match item.validate().unwrap_err() {
            DomainError::InvariantViolation(msg) => assert!(msg.contains("margin")),
            _ => panic!("Expected InvariantViolation error for inverted margins"),
        }
    }

    #[test]
    fn minimum_margin_above_unset_maximum_is_rejected() {
        let item = PricelistItem::formula(
            list(),
            FormulaRule {
                min_margin: 10.0,
                ..FormulaRule::default()
            },
        );
        match item.validate().unwrap_err() {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("Expected InvariantViolation error for min margin over an unset max"),
        }

        let item = PricelistItem::formula(
            list(),
            FormulaRule {
                max_margin: 5.0,
                ..FormulaRule::default()
            },
        );
        assert!(item.validate().is_ok());
    }

    #[test]
    fn self_referencing_base_is_rejected() {
        let id = list();
        let item = PricelistItem::percentage(id, 10.0).with_base(PriceBase::Pricelist(id));
        match item.validate().unwrap_err() {
            DomainError::InvariantViolation(_) => {}
            _ => panic!("Expected InvariantViolation error for self-referencing pricelist"),
        }
        PricelistItem::percentage(id, 10.0)
            .with_base(PriceBase::Pricelist(list()))
            .validate()
            .unwrap();
    }

    #[test]
    fn validity_window_is_inclusive() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let item = PricelistItem::fixed(list(), 1.0).with_dates(Some(start), Some(end));
        assert!(item.is_valid_on(start));
        assert!(item.is_valid_on(end));
        assert!(!item.is_valid_on(end.succ_opt().unwrap()));
        assert!(PricelistItem::fixed(list(), 1.0).with_dates(None, Some(end)).is_valid_on(start));
    }

    #[test]
    fn zero_min_quantity_disables_threshold() {
        let item = PricelistItem::fixed(list(), 1.0).with_min_quantity(0.0);
        assert!(item.accepts_quantity(0.25));
        assert!(!PricelistItem::fixed(list(), 1.0).accepts_quantity(0.25));
    }

    #[test]
    fn rules_sort_by_scope_then_quantity_then_category_name() {
        let mut store = InMemoryCatalog::new();
        let books = ProductCategory::new("Books");
        let art = ProductCategory::new("Art");
        store.add_category(books.clone()).unwrap();
        store.add_category(art.clone()).unwrap();

        let id = list();
        let global = PricelistItem::fixed(id, 1.0);
        let small = PricelistItem::fixed(id, 2.0)
            .with_scope(RuleScope::Category(books.id))
            .with_min_quantity(5.0);
        let large = PricelistItem::fixed(id, 3.0)
            .with_scope(RuleScope::Category(books.id))
            .with_min_quantity(10.0);
        let art_rule = PricelistItem::fixed(id, 4.0)
            .with_scope(RuleScope::Category(art.id))
            .with_min_quantity(5.0);
        let template = PricelistItem::fixed(id, 5.0).with_scope(RuleScope::Template(TemplateId::new()));

        let mut items = vec![global.clone(), small.clone(), large.clone(), art_rule.clone(), template.clone()];
        sort_rules(&store, &mut items);
        let order: Vec<PricelistItemId> = items.iter().map(|i| i.id).collect();
        assert_eq!(order, vec![template.id, large.id, art_rule.id, small.id, global.id]);
    }

    #[test]
    fn display_name_shows_currency() {
        let pricelist = Pricelist::new("Public", CurrencyCode::new("usd"));
        assert_eq!(pricelist.display_name(), "Public (USD)");
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 300,
                ..ProptestConfig::default()
            })]

            /// Property: both clamps set keep the price inside [base+min, base+max].
            #[test]
            fn clamped_formula_stays_within_margins(
                base in 0.01f64..1.0e5,
                discount in -50.0f64..100.0,
                surcharge in -100.0f64..100.0,
                min_margin in 0.01f64..50.0,
                spread in 0.0f64..50.0,
            ) {
                let formula = PriceComputation::Formula(FormulaRule {
                    discount,
                    surcharge,
                    min_margin,
                    max_margin: min_margin + spread,
                    ..FormulaRule::default()
                });
                let price = formula.apply(base, |p| p);
                prop_assert!(price >= base + min_margin - 1e-9);
                prop_assert!(price <= base + min_margin + spread + 1e-9);
            }
        }
    }
}
