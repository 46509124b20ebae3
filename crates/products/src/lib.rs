//! Products, pricing, units of measure and variants.
//!
//! This crate holds the catalog's business rules as deterministic domain
//! logic. Storage and exchange rates are reached through the traits in
//! [`store`] and [`currency`]; [`memory::InMemoryCatalog`] and
//! [`currency::RateTable`] implement them in memory.

pub mod attribute;
pub mod category;
pub mod config;
pub mod currency;
pub mod ids;
pub mod memory;
pub mod partner;
pub mod pricelist;
pub mod pricing;
pub mod product;
pub mod store;
pub mod supplier;
pub mod template;
pub mod uom;
pub mod variant;

pub use attribute::{
    Attribute, AttributeLine, AttributePrice, AttributeValue, check_value_unlink, variant_name,
};
pub use category::{
    CategoryKind, ProductCategory, category_ancestors, category_display_name, check_category_recursion,
};
pub use config::{CatalogSettings, PricingSettings};
pub use currency::{CurrencyCode, CurrencyConverter, RateTable};
pub use ids::{
    AttributeId, AttributeValueId, CategoryId, CompanyId, CountryGroupId, PartnerId, PricelistId,
    PricelistItemId, ProductId, SupplierInfoId, TemplateId, UomCategoryId, UomId,
};
pub use memory::InMemoryCatalog;
pub use partner::{
    Company, CountryGroup, Partner, assign_company_pricelist, get_partner_pricelist, set_partner_pricelist,
};
pub use pricelist::{
    AppliedOn, FormulaRule, PriceBase, PriceComputation, Pricelist, PricelistItem, RuleScope, sort_rules,
};
pub use pricing::{PriceEngine, PriceRequest, RulePrice};
pub use product::{
    PriceField, Product, ProductSnapshot, check_attribute_values, display_name, name_format, price_extra,
    set_lst_price,
};
pub use store::{CatalogReader, CatalogWriter};
pub use supplier::{SupplierInfo, select_seller};
pub use template::{
    ProductKind, ProductTemplate, TemplateUpdate, create_template, set_template_default_code, set_template_price,
    set_template_standard_price, template_currency, template_default_code, template_standard_price,
    update_template, variant_count,
};
pub use uom::{Uom, UomCategory, UomType, convert_quantity, validate_category_units};
pub use variant::{Combination, ReconcileReport, reconcile_variants, variant_matrix};
