//! Typed identifiers for catalog records.

use serde::{Deserialize, Serialize};

use pricebook_core::RecordId;

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub RecordId);

        impl $name {
            pub fn new() -> Self {
                Self(RecordId::new())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<RecordId> for $name {
            fn from(value: RecordId) -> Self {
                Self(value)
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

record_id!(
    /// Unit of measure category identifier.
    UomCategoryId
);
record_id!(
    /// Unit of measure identifier.
    UomId
);
record_id!(
    /// Product category identifier.
    CategoryId
);
record_id!(
    /// Product template identifier.
    TemplateId
);
record_id!(
    /// Product variant identifier.
    ProductId
);
record_id!(AttributeId);
record_id!(AttributeValueId);
record_id!(PricelistId);
record_id!(PricelistItemId);
record_id!(PartnerId);
record_id!(CompanyId);
record_id!(CountryGroupId);
record_id!(SupplierInfoId);
