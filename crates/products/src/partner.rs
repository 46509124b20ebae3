//! Partners, companies and the pricelist each of them falls back to.

use serde::{Deserialize, Serialize};
use tracing::debug;

use pricebook_core::{DomainError, DomainResult, Entity};

use crate::currency::CurrencyCode;
use crate::ids::{CompanyId, CountryGroupId, PartnerId, PricelistId};
use crate::pricelist::Pricelist;
use crate::store::{CatalogReader, CatalogWriter};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountryGroup {
    pub id: CountryGroupId,
    pub name: String,
    /// ISO 3166 country codes.
    pub countries: Vec<String>,
}

impl CountryGroup {
    pub fn new(name: impl Into<String>, countries: &[&str]) -> Self {
        Self {
            id: CountryGroupId::new(),
            name: name.into(),
            countries: countries.iter().map(|c| c.to_ascii_uppercase()).collect(),
        }
    }

    pub fn contains(&self, country: &str) -> bool {
        self.countries.iter().any(|c| c.eq_ignore_ascii_case(country))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Partner {
    pub id: PartnerId,
    pub name: String,
    pub country: Option<String>,
    /// Explicitly stored pricelist, if any.
    pub pricelist: Option<PricelistId>,
    /// Commercial entity this contact belongs to.
    pub parent: Option<PartnerId>,
}

impl Partner {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PartnerId::new(),
            name: name.into(),
            country: None,
            pricelist: None,
            parent: None,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_parent(mut self, parent: PartnerId) -> Self {
        self.parent = Some(parent);
        self
    }
}

impl Entity for Partner {
    type Id = PartnerId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Company {
    pub id: CompanyId,
    pub name: String,
    pub currency: CurrencyCode,
    pub default_pricelist: Option<PricelistId>,
}

impl Company {
    pub fn new(name: impl Into<String>, currency: CurrencyCode) -> Self {
        Self {
            id: CompanyId::new(),
            name: name.into(),
            currency,
            default_pricelist: None,
        }
    }
}

impl Entity for Company {
    type Id = CompanyId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// First active pricelist (in sequence order) restricted to a group containing `country`.
fn pricelist_for_country<S>(store: &S, country: &str) -> Option<Pricelist>
where
    S: CatalogReader + ?Sized,
{
    store.pricelists().into_iter().find(|pricelist| {
        pricelist
            .country_groups
            .iter()
            .filter_map(|id| store.country_group(*id))
            .any(|group| group.contains(country))
    })
}

fn unrestricted_pricelist<S>(store: &S) -> Option<Pricelist>
where
    S: CatalogReader + ?Sized,
{
    store.pricelists().into_iter().find(|p| p.country_groups.is_empty())
}

/// Pricelist used for `partner`: stored one, then country match, then an
/// unrestricted list, then the company default, then any list.
///
/// Returns `None` only when the catalog has no pricelist at all.
pub fn get_partner_pricelist<S>(store: &S, partner: Option<&Partner>, company: Option<CompanyId>) -> Option<Pricelist>
where
    S: CatalogReader + ?Sized,
{
    let stored = partner.and_then(|p| p.pricelist).and_then(|id| store.pricelist(id));
    let resolved = stored
        .or_else(|| {
            partner
                .and_then(|p| p.country.as_deref())
                .and_then(|country| pricelist_for_country(store, country))
        })
        .or_else(|| unrestricted_pricelist(store))
        .or_else(|| {
            company
                .and_then(|id| store.company(id))
                .or_else(|| store.main_company())
                .and_then(|c| c.default_pricelist)
                .and_then(|id| store.pricelist(id))
        })
        .or_else(|| store.pricelists().into_iter().next());

    debug!(
        partner = ?partner.map(|p| p.id),
        pricelist = ?resolved.as_ref().map(|p| p.id),
        "partner pricelist resolved"
    );
    resolved
}

/// Store `pricelist` on the partner. Clearing it (`None`) stores the country
/// default instead, unless the partner already uses that default.
pub fn set_partner_pricelist<S>(store: &mut S, partner: PartnerId, pricelist: Option<PricelistId>) -> DomainResult<()>
where
    S: CatalogWriter + ?Sized,
{
    let mut record = store
        .partner(partner)
        .ok_or_else(|| DomainError::not_found(format!("partner {partner}")))?;
    let country_default = match record.country.as_deref() {
        Some(country) => pricelist_for_country(&*store, country),
        None => unrestricted_pricelist(&*store),
    }
    .map(|p| p.id);
    let actual = record.pricelist;

    match pricelist {
        Some(id) => {
            if store.pricelist(id).is_none() {
                return Err(DomainError::not_found(format!("pricelist {id}")));
            }
            record.pricelist = Some(id);
        }
        None if actual.is_some() && actual != country_default => {
            record.pricelist = country_default;
        }
        None => return Ok(()),
    }
    store.update_partner(record)
}

/// Give `company` a default pricelist: a company-less list in its currency,
/// else a new one named after the company.
pub fn assign_company_pricelist<S>(store: &mut S, company: CompanyId) -> DomainResult<PricelistId>
where
    S: CatalogWriter + ?Sized,
{
    let mut record = store
        .company(company)
        .ok_or_else(|| DomainError::not_found(format!("company {company}")))?;
    let existing = store
        .pricelists()
        .into_iter()
        .find(|p| p.company.is_none() && p.currency == record.currency);
    let pricelist = match existing {
        Some(pricelist) => pricelist.id,
        None => {
            let pricelist = Pricelist::new(record.name.clone(), record.currency.clone());
            let id = pricelist.id;
            store.insert_pricelist(pricelist)?;
            id
        }
    };
    record.default_pricelist = Some(pricelist);
    store.update_company(record)?;
    Ok(pricelist)
}
