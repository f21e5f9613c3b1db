use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::EquipFinanceError;
use crate::types::{Money, Rate};
use crate::EquipFinanceResult;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A tier in the lending rate table: invoice amounts in
/// `[min_amount, max_amount]` price at `annual_rate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateBand {
    pub min_amount: Money,
    pub max_amount: Money,
    /// Annual nominal rate as a decimal fraction (0.1165 = 11.65% p.a.).
    pub annual_rate: Rate,
    #[serde(default = "default_is_active")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_from: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_to: Option<NaiveDate>,
}

fn default_is_active() -> bool {
    true
}

impl RateBand {
    /// Whether `amount` falls inside this band, boundaries included.
    pub fn contains(&self, amount: Money) -> bool {
        amount >= self.min_amount && amount <= self.max_amount
    }

    /// Whether this band applies on `as_of`: active, and inside its
    /// effective window (open-ended where a boundary date is absent).
    pub fn is_effective(&self, as_of: NaiveDate) -> bool {
        if !self.is_active {
            return false;
        }
        if let Some(from) = self.effective_from {
            if from > as_of {
                return false;
            }
        }
        if let Some(to) = self.effective_to {
            if to < as_of {
                return false;
            }
        }
        true
    }
}

/// Where rate bands come from.
///
/// Calculators accept any implementation, so a caller can wire bands to a
/// database, a config service, or a fixture. Implementations return their
/// raw candidate set; effectiveness filtering, ordering, and the fallback to
/// the built-in tiers happen in [`load_bands`].
pub trait RateBandSource {
    fn bands_as_of(&self, as_of: NaiveDate) -> EquipFinanceResult<Vec<RateBand>>;
}

/// Band source backed by the built-in tier table.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultRateBands;

impl RateBandSource for DefaultRateBands {
    fn bands_as_of(&self, _as_of: NaiveDate) -> EquipFinanceResult<Vec<RateBand>> {
        Ok(default_rate_bands())
    }
}

/// A fixed in-memory band set, for tests and for callers that snapshot
/// bands out of an external store.
#[derive(Debug, Clone, Default)]
pub struct StaticBands(pub Vec<RateBand>);

impl RateBandSource for StaticBands {
    fn bands_as_of(&self, _as_of: NaiveDate) -> EquipFinanceResult<Vec<RateBand>> {
        Ok(self.0.clone())
    }
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// The built-in lending tiers, used whenever no external source is
/// configured or the configured source yields nothing usable.
pub fn default_rate_bands() -> Vec<RateBand> {
    vec![
        tier(dec!(5000), dec!(20000), dec!(0.1595)),
        tier(dec!(20000.01), dec!(75000), dec!(0.1165)),
        tier(dec!(75000.01), dec!(150000), dec!(0.1070)),
        tier(dec!(150000.01), dec!(250000), dec!(0.1030)),
        tier(dec!(250000.01), dec!(500000), dec!(0.0995)),
    ]
}

/// Load the bands in force on `as_of` from `source`, falling back to the
/// built-in tiers (with a warning) when the source fails or no band is
/// effective. The result is sorted by `min_amount` and never empty.
pub fn load_bands(
    source: &dyn RateBandSource,
    as_of: NaiveDate,
    warnings: &mut Vec<String>,
) -> Vec<RateBand> {
    let candidates = match source.bands_as_of(as_of) {
        Ok(bands) => bands,
        Err(err) => {
            warnings.push(format!(
                "Failed to load rate bands ({err}); using built-in defaults"
            ));
            return default_rate_bands();
        }
    };

    let mut effective: Vec<RateBand> = candidates
        .into_iter()
        .filter(|band| band.is_effective(as_of))
        .collect();

    if effective.is_empty() {
        warnings.push(format!(
            "No rate bands effective as of {as_of}; using built-in defaults"
        ));
        return default_rate_bands();
    }

    effective.sort_by(|a, b| a.min_amount.cmp(&b.min_amount));
    effective
}

/// Annual rate for `amount`, or an error naming the covered range when no
/// band contains it.
pub fn applicable_rate(bands: &[RateBand], amount: Money) -> EquipFinanceResult<Rate> {
    match applicable_band(bands, amount) {
        Some(band) => Ok(band.annual_rate),
        None => Err(EquipFinanceError::AmountOutsideBands {
            amount,
            lower: bands.first().map(|b| b.min_amount).unwrap_or(Decimal::ZERO),
            upper: bands.last().map(|b| b.max_amount).unwrap_or(Decimal::ZERO),
        }),
    }
}

/// First band containing `amount`, if any.
pub fn applicable_band(bands: &[RateBand], amount: Money) -> Option<RateBand> {
    bands.iter().find(|band| band.contains(amount)).cloned()
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn tier(min_amount: Money, max_amount: Money, annual_rate: Rate) -> RateBand {
    RateBand {
        min_amount,
        max_amount,
        annual_rate,
        is_active: true,
        effective_from: None,
        effective_to: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn june_2025() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()
    }

    #[test]
    fn test_default_bands_cover_lending_range_in_order() {
        let bands = default_rate_bands();
        assert_eq!(bands.len(), 5);
        assert_eq!(bands.first().unwrap().min_amount, dec!(5000));
        assert_eq!(bands.last().unwrap().max_amount, dec!(500000));
        for pair in bands.windows(2) {
            assert!(pair[0].max_amount < pair[1].min_amount);
        }
        assert!(bands.iter().all(|b| b.is_active));
    }

    #[test]
    fn test_applicable_rate_tier_boundaries() {
        let bands = default_rate_bands();
        assert_eq!(applicable_rate(&bands, dec!(5000)).unwrap(), dec!(0.1595));
        assert_eq!(applicable_rate(&bands, dec!(20000)).unwrap(), dec!(0.1595));
        assert_eq!(applicable_rate(&bands, dec!(20000.01)).unwrap(), dec!(0.1165));
        assert_eq!(applicable_rate(&bands, dec!(75000.01)).unwrap(), dec!(0.1070));
        assert_eq!(applicable_rate(&bands, dec!(150000.01)).unwrap(), dec!(0.1030));
        assert_eq!(applicable_rate(&bands, dec!(250000.01)).unwrap(), dec!(0.0995));
        assert_eq!(applicable_rate(&bands, dec!(500000)).unwrap(), dec!(0.0995));
    }

    #[test]
    fn test_applicable_rate_outside_bands() {
        let bands = default_rate_bands();

        let err = applicable_rate(&bands, dec!(4999.99)).unwrap_err();
        match err {
            EquipFinanceError::AmountOutsideBands { amount, lower, upper } => {
                assert_eq!(amount, dec!(4999.99));
                assert_eq!(lower, dec!(5000));
                assert_eq!(upper, dec!(500000));
            }
            other => panic!("Expected AmountOutsideBands, got {other:?}"),
        }

        assert!(applicable_rate(&bands, dec!(500000.01)).is_err());
        // Amounts inside a sub-cent gap between adjacent tiers match nothing
        assert!(applicable_rate(&bands, dec!(20000.005)).is_err());
    }

    #[test]
    fn test_applicable_band_attaches_full_tier() {
        let bands = default_rate_bands();
        let band = applicable_band(&bands, dec!(50000)).unwrap();
        assert_eq!(band.annual_rate, dec!(0.1165));
        assert_eq!(band.min_amount, dec!(20000.01));
        assert_eq!(band.max_amount, dec!(75000));
        assert!(applicable_band(&bands, dec!(750000)).is_none());
    }

    #[test]
    fn test_load_bands_falls_back_when_source_fails() {
        struct FailingSource;
        impl RateBandSource for FailingSource {
            fn bands_as_of(&self, _as_of: NaiveDate) -> EquipFinanceResult<Vec<RateBand>> {
                Err(EquipFinanceError::BandSourceUnavailable(
                    "connection refused".to_string(),
                ))
            }
        }

        let mut warnings = Vec::new();
        let bands = load_bands(&FailingSource, june_2025(), &mut warnings);

        assert_eq!(bands, default_rate_bands());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("built-in defaults"));
    }

    #[test]
    fn test_load_bands_falls_back_when_nothing_effective() {
        let mut inactive = tier(dec!(5000), dec!(500000), dec!(0.12));
        inactive.is_active = false;
        let source = StaticBands(vec![inactive]);

        let mut warnings = Vec::new();
        let bands = load_bands(&source, june_2025(), &mut warnings);

        assert_eq!(bands, default_rate_bands());
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("No rate bands effective"));
    }

    #[test]
    fn test_load_bands_filters_by_effective_window() {
        let mut expired = tier(dec!(5000), dec!(100000), dec!(0.20));
        expired.effective_to = Some(NaiveDate::from_ymd_opt(2025, 1, 31).unwrap());

        let mut future = tier(dec!(5000), dec!(100000), dec!(0.08));
        future.effective_from = Some(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap());

        let mut current = tier(dec!(5000), dec!(100000), dec!(0.11));
        current.effective_from = Some(NaiveDate::from_ymd_opt(2025, 2, 1).unwrap());
        current.effective_to = Some(NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());

        let source = StaticBands(vec![expired, future, current]);

        let mut warnings = Vec::new();
        let bands = load_bands(&source, june_2025(), &mut warnings);

        assert!(warnings.is_empty());
        assert_eq!(bands.len(), 1);
        assert_eq!(bands[0].annual_rate, dec!(0.11));
    }

    #[test]
    fn test_load_bands_sorts_by_min_amount() {
        let source = StaticBands(vec![
            tier(dec!(100000.01), dec!(500000), dec!(0.10)),
            tier(dec!(5000), dec!(50000), dec!(0.15)),
            tier(dec!(50000.01), dec!(100000), dec!(0.12)),
        ]);

        let mut warnings = Vec::new();
        let bands = load_bands(&source, june_2025(), &mut warnings);

        assert!(warnings.is_empty());
        let mins: Vec<Money> = bands.iter().map(|b| b.min_amount).collect();
        assert_eq!(mins, vec![dec!(5000), dec!(50000.01), dec!(100000.01)]);
    }

    #[test]
    fn test_band_effective_window_boundaries_inclusive() {
        let mut band = tier(dec!(5000), dec!(100000), dec!(0.11));
        band.effective_from = Some(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
        band.effective_to = Some(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap());

        assert!(band.is_effective(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()));
        assert!(band.is_effective(NaiveDate::from_ymd_opt(2025, 6, 30).unwrap()));
        assert!(!band.is_effective(NaiveDate::from_ymd_opt(2025, 5, 31).unwrap()));
        assert!(!band.is_effective(NaiveDate::from_ymd_opt(2025, 7, 1).unwrap()));
    }

    #[test]
    fn test_band_deserializes_with_minimal_fields() {
        let band: RateBand = serde_json::from_str(
            r#"{"min_amount": "5000", "max_amount": "20000", "annual_rate": "0.1595"}"#,
        )
        .unwrap();

        assert!(band.is_active);
        assert_eq!(band.effective_from, None);
        assert_eq!(band.annual_rate, dec!(0.1595));
    }
}
