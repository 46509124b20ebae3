//! Catalog settings, read from the process environment.

use serde::{Deserialize, Serialize};

use pricebook_core::{DomainError, DomainResult};

pub const MAX_PRICELIST_DEPTH_VAR: &str = "PRICEBOOK_MAX_PRICELIST_DEPTH";
pub const CURRENCY_ROUNDING_VAR: &str = "PRICEBOOK_CURRENCY_ROUNDING";

/// Knobs of the price rule evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricingSettings {
    /// How many pricelists deep an "other pricelist" rule chain may go.
    pub max_pricelist_depth: usize,
}

impl Default for PricingSettings {
    fn default() -> Self {
        Self { max_pricelist_depth: 8 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CatalogSettings {
    pub pricing: PricingSettings,
    /// Rounding step for currencies without an explicit precision.
    pub currency_rounding: f64,
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            pricing: PricingSettings::default(),
            currency_rounding: 0.01,
        }
    }
}

impl CatalogSettings {
    /// Load settings from `PRICEBOOK_*` environment variables.
    pub fn from_env() -> DomainResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load settings through an arbitrary key lookup (unset keys keep their default).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> DomainResult<Self> {
        let mut settings = Self::default();

        match lookup(MAX_PRICELIST_DEPTH_VAR) {
            Some(raw) => {
                settings.pricing.max_pricelist_depth = raw.trim().parse().map_err(|e| {
                    DomainError::validation(format!("{MAX_PRICELIST_DEPTH_VAR}={raw:?}: {e}"))
                })?;
            }
            None => tracing::debug!(
                default = settings.pricing.max_pricelist_depth,
                "{MAX_PRICELIST_DEPTH_VAR} not set; using default"
            ),
        }

        match lookup(CURRENCY_ROUNDING_VAR) {
            Some(raw) => {
                let rounding: f64 = raw.trim().parse().map_err(|e| {
                    DomainError::validation(format!("{CURRENCY_ROUNDING_VAR}={raw:?}: {e}"))
                })?;
                if rounding <= 0.0 {
                    return Err(DomainError::validation(format!(
                        "{CURRENCY_ROUNDING_VAR} must be positive, got {rounding}"
                    )));
                }
                settings.currency_rounding = rounding;
            }
            None => tracing::debug!(
                default = settings.currency_rounding,
                "{CURRENCY_ROUNDING_VAR} not set; using default"
            ),
        }

        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn unset_keys_keep_defaults() {
        let settings = CatalogSettings::from_lookup(lookup(&[])).unwrap();
        assert_eq!(settings, CatalogSettings::default());
        assert_eq!(settings.pricing.max_pricelist_depth, 8);
    }

    #[test]
    fn reads_overrides() {
        let settings = CatalogSettings::from_lookup(lookup(&[
            (MAX_PRICELIST_DEPTH_VAR, " 3 "),
            (CURRENCY_ROUNDING_VAR, "0.05"),
        ]))
        .unwrap();
        assert_eq!(settings.pricing.max_pricelist_depth, 3);
        assert_eq!(settings.currency_rounding, 0.05);
    }

    #[test]
    fn rejects_malformed_values() {
        let err = CatalogSettings::from_lookup(lookup(&[(MAX_PRICELIST_DEPTH_VAR, "deep")])).unwrap_err();
        match err {
            DomainError::Validation(msg) => assert!(msg.contains(MAX_PRICELIST_DEPTH_VAR)),
            _ => panic!("Expected Validation error"),
        }

        let err = CatalogSettings::from_lookup(lookup(&[(CURRENCY_ROUNDING_VAR, "0")])).unwrap_err();
        match err {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for zero rounding"),
        }
    }
}
