//! Collaborator seams: the catalog is read and written through these traits.
//!
//! Lookups return owned records so that evaluation code can hold them while
//! issuing further queries; a missing record is `None`, never an error.
//! Callers decide whether absence is a `NotFound` or a default.

use pricebook_core::{DomainResult, RecordLifecycle};

use crate::attribute::{Attribute, AttributePrice, AttributeValue};
use crate::category::ProductCategory;
use crate::ids::{
    AttributeId, AttributeValueId, CategoryId, CompanyId, CountryGroupId, PartnerId, PricelistId, ProductId,
    TemplateId, UomId,
};
use crate::partner::{Company, CountryGroup, Partner};
use crate::pricelist::{Pricelist, PricelistItem};
use crate::product::Product;
use crate::supplier::SupplierInfo;
use crate::template::ProductTemplate;
use crate::uom::Uom;

/// Read side of the catalog, assumed to be one consistent snapshot per call chain.
pub trait CatalogReader {
    fn uom(&self, id: UomId) -> Option<Uom>;

    fn category(&self, id: CategoryId) -> Option<ProductCategory>;

    fn template(&self, id: TemplateId) -> Option<ProductTemplate>;

    fn product(&self, id: ProductId) -> Option<Product>;

    /// All variants of a template, archived ones included, in creation order.
    fn variants(&self, template: TemplateId) -> Vec<Product>;

    fn attribute(&self, id: AttributeId) -> Option<Attribute>;

    fn attribute_value(&self, id: AttributeValueId) -> Option<AttributeValue>;

    fn attribute_prices(&self, template: TemplateId) -> Vec<AttributePrice>;

    /// Variants (active or not) carrying `value`.
    fn products_with_value(&self, value: AttributeValueId) -> Vec<ProductId>;

    fn pricelist(&self, id: PricelistId) -> Option<Pricelist>;

    /// Active pricelists, lowest sequence first.
    fn pricelists(&self) -> Vec<Pricelist>;

    fn pricelist_items(&self, pricelist: PricelistId) -> Vec<PricelistItem>;

    fn partner(&self, id: PartnerId) -> Option<Partner>;

    fn company(&self, id: CompanyId) -> Option<Company>;

    fn main_company(&self) -> Option<Company>;

    fn country_group(&self, id: CountryGroupId) -> Option<CountryGroup>;

    /// Vendor lines of a template, lowest sequence first.
    fn suppliers(&self, template: TemplateId) -> Vec<SupplierInfo>;
}

/// Write side of the catalog. Variant removal goes through [`RecordLifecycle`]
/// so that blocked deletes surface as an outcome rather than an error.
pub trait CatalogWriter: CatalogReader + RecordLifecycle<ProductId> {
    fn insert_template(&mut self, template: ProductTemplate) -> DomainResult<()>;

    fn update_template(&mut self, template: ProductTemplate) -> DomainResult<()>;

    fn insert_product(&mut self, product: Product) -> DomainResult<()>;

    fn update_product(&mut self, product: Product) -> DomainResult<()>;

    fn insert_pricelist(&mut self, pricelist: Pricelist) -> DomainResult<()>;

    fn update_partner(&mut self, partner: Partner) -> DomainResult<()>;

    fn update_company(&mut self, company: Company) -> DomainResult<()>;
}
