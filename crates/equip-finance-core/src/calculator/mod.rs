use chrono::Utc;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::EquipFinanceError;
use crate::policy::LendingPolicy;
use crate::rate_bands::{self, RateBand, RateBandSource};
use crate::types::Money;
use crate::EquipFinanceResult;

pub mod loan_amount;
pub mod payment;
pub mod rate;

/// Round a currency amount to cents, midpoints away from zero.
pub(crate) fn round_currency(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Round a rate to four decimal places (basis-point precision).
pub(crate) fn round_rate(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
}

pub(crate) fn validate_invoice_amount(
    policy: &LendingPolicy,
    amount: Money,
) -> EquipFinanceResult<()> {
    if !policy.is_valid_invoice_amount(amount) {
        return Err(EquipFinanceError::InvalidInput {
            field: "invoice_amount".to_string(),
            reason: format!(
                "Invoice amount must be between ${} and ${}",
                policy.min_loan_amount, policy.max_loan_amount
            ),
        });
    }
    Ok(())
}

pub(crate) fn validate_term(policy: &LendingPolicy, term_months: u32) -> EquipFinanceResult<()> {
    if !policy.is_valid_term(term_months) {
        let terms: Vec<String> = policy
            .available_terms
            .iter()
            .map(|t| t.to_string())
            .collect();
        return Err(EquipFinanceError::InvalidInput {
            field: "term_months".to_string(),
            reason: format!("Term must be one of {} months", terms.join(", ")),
        });
    }
    Ok(())
}

/// Bands in force today, with the built-in fallback on source failure.
pub(crate) fn current_bands(
    source: &dyn RateBandSource,
    warnings: &mut Vec<String>,
) -> Vec<RateBand> {
    rate_bands::load_bands(source, Utc::now().date_naive(), warnings)
}
