//! Currency codes and the conversion seam.
//!
//! Exchange rates live outside the catalog; the catalog only needs to move an
//! amount from one currency into another, optionally rounded to the target
//! currency's precision.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use pricebook_core::{DomainError, DomainResult, round_to_step};

use crate::config::CatalogSettings;

/// ISO 4217 currency code (e.g. "USD", "EUR").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// External currency/rate service.
pub trait CurrencyConverter {
    /// Convert `amount` from `from` into `to`, rounding to the target
    /// currency's precision when `round` is set.
    fn convert(&self, amount: f64, from: &CurrencyCode, to: &CurrencyCode, round: bool) -> DomainResult<f64>;
}

impl<T: CurrencyConverter + ?Sized> CurrencyConverter for &T {
    fn convert(&self, amount: f64, from: &CurrencyCode, to: &CurrencyCode, round: bool) -> DomainResult<f64> {
        (**self).convert(amount, from, to, round)
    }
}

/// Static rate table: every rate is expressed against one implicit base
/// currency (`1 base = rate × currency`).
#[derive(Debug, Clone)]
pub struct RateTable {
    rates: HashMap<CurrencyCode, f64>,
    rounding: HashMap<CurrencyCode, f64>,
    default_rounding: f64,
}

impl RateTable {
    pub fn new(default_rounding: f64) -> Self {
        Self {
            rates: HashMap::new(),
            rounding: HashMap::new(),
            default_rounding,
        }
    }

    /// Empty table rounding to the configured currency step.
    pub fn from_settings(settings: &CatalogSettings) -> Self {
        Self::new(settings.currency_rounding)
    }

    pub fn with_rate(mut self, code: CurrencyCode, rate: f64) -> Self {
        self.rates.insert(code, rate);
        self
    }

    pub fn with_rounding(mut self, code: CurrencyCode, rounding: f64) -> Self {
        self.rounding.insert(code, rounding);
        self
    }

    fn rate(&self, code: &CurrencyCode) -> DomainResult<f64> {
        match self.rates.get(code) {
            Some(rate) if *rate > 0.0 => Ok(*rate),
            Some(_) => Err(DomainError::invariant(format!("rate of {code} must be positive"))),
            None => Err(DomainError::not_found(format!("rate for currency {code}"))),
        }
    }

    fn rounding_of(&self, code: &CurrencyCode) -> f64 {
        self.rounding.get(code).copied().unwrap_or(self.default_rounding)
    }
}

impl CurrencyConverter for RateTable {
    fn convert(&self, amount: f64, from: &CurrencyCode, to: &CurrencyCode, round: bool) -> DomainResult<f64> {
        let converted = if from == to {
            amount
        } else {
            amount / self.rate(from)? * self.rate(to)?
        };
        if round {
            Ok(round_to_step(converted, self.rounding_of(to)))
        } else {
            Ok(converted)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> RateTable {
        RateTable::new(0.01)
            .with_rate(CurrencyCode::new("EUR"), 1.0)
            .with_rate(CurrencyCode::new("USD"), 1.2)
            .with_rate(CurrencyCode::new("JPY"), 160.0)
            .with_rounding(CurrencyCode::new("JPY"), 1.0)
    }

    #[test]
    fn codes_are_normalized() {
        assert_eq!(CurrencyCode::new("eur"), CurrencyCode::new("EUR"));
        assert_eq!(CurrencyCode::new("usd").to_string(), "USD");
    }

    #[test]
    fn converts_through_base_rates() {
        let rates = table();
        let usd = rates
            .convert(10.0, &CurrencyCode::new("EUR"), &CurrencyCode::new("USD"), false)
            .unwrap();
        assert!((usd - 12.0).abs() < 1e-9);

        let eur = rates
            .convert(12.0, &CurrencyCode::new("USD"), &CurrencyCode::new("EUR"), false)
            .unwrap();
        assert!((eur - 10.0).abs() < 1e-9);
    }

    #[test]
    fn rounds_to_target_precision_when_asked() {
        let rates = table();
        let jpy = rates
            .convert(1.234, &CurrencyCode::new("EUR"), &CurrencyCode::new("JPY"), true)
            .unwrap();
        assert_eq!(jpy, 197.0);

        let raw = rates
            .convert(1.234, &CurrencyCode::new("EUR"), &CurrencyCode::new("JPY"), false)
            .unwrap();
        assert!((raw - 197.44).abs() < 1e-9);
    }

    #[test]
    fn same_currency_needs_no_rate() {
        let rates = RateTable::new(0.01);
        let chf = CurrencyCode::new("CHF");
        let rounded = rates.convert(3.333, &chf, &chf, true).unwrap();
        assert!((rounded - 3.33).abs() < 1e-9);
    }

    #[test]
    fn configured_rounding_applies_to_currencies_without_precision() {
        let settings = CatalogSettings::from_lookup(|key| {
            (key == crate::config::CURRENCY_ROUNDING_VAR).then(|| "0.05".to_string())
        })
        .unwrap();
        let rates = RateTable::from_settings(&settings)
            .with_rate(CurrencyCode::new("EUR"), 1.0)
            .with_rate(CurrencyCode::new("USD"), 1.2);

        let usd = rates
            .convert(10.0, &CurrencyCode::new("EUR"), &CurrencyCode::new("USD"), true)
            .unwrap();
        assert!((usd - 12.0).abs() < 1e-9);
        let usd = rates
            .convert(1.03, &CurrencyCode::new("EUR"), &CurrencyCode::new("USD"), true)
            .unwrap();
        // 1.236 rounds to 1.25 on a 0.05 step, 1.24 with the default 0.01.
        assert!((usd - 1.25).abs() < 1e-9);

        let defaults = RateTable::from_settings(&CatalogSettings::default())
            .with_rate(CurrencyCode::new("EUR"), 1.0)
            .with_rate(CurrencyCode::new("USD"), 1.2);
        let usd = defaults
            .convert(1.03, &CurrencyCode::new("EUR"), &CurrencyCode::new("USD"), true)
            .unwrap();
        assert!((usd - 1.24).abs() < 1e-9);
    }

    #[test]
    fn unknown_currency_is_not_found() {
        let err = table()
            .convert(1.0, &CurrencyCode::new("EUR"), &CurrencyCode::new("GBP"), false)
            .unwrap_err();
        match err {
            DomainError::NotFound(_) => {}
            _ => panic!("Expected NotFound error for unknown currency"),
        }
    }
}
