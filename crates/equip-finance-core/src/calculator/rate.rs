use std::time::Instant;

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{current_bands, round_currency, round_rate, validate_invoice_amount, validate_term};
use crate::policy::LendingPolicy;
use crate::rate_bands::{self, RateBandSource};
use crate::time_value::{self, RateSolution};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::EquipFinanceResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Input for an effective-rate calculation: what rate does a quoted payment
/// imply for a given invoice?
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateInput {
    /// Equipment invoice amount being financed
    pub invoice_amount: Money,
    /// The payment the customer wants to make each month
    pub desired_payment: Money,
    /// Term in months (24, 36, 48 or 60 under the standard policy)
    pub term_months: u32,
    /// Fee financed on top of the invoice; policy default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_fee: Option<Money>,
    /// Residual due with the final payment; policy default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balloon_amount: Option<Money>,
}

/// The effective rate implied by a desired payment, against the standard
/// banded rate for the same invoice.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateOutput {
    pub invoice_amount: Money,
    pub application_fee: Money,
    pub amount_financed: Money,
    pub term_months: u32,
    pub desired_payment: Money,
    /// Implied annual rate, at basis-point precision
    pub effective_annual_rate: Rate,
    pub effective_monthly_rate: Rate,
    /// Banded rate the invoice would normally price at
    pub standard_annual_rate: Rate,
    /// Effective minus standard; positive means paying above the band
    pub rate_difference: Rate,
    /// False when the search exhausted its budget; the rates above are then
    /// best-effort figures
    pub converged: bool,
    pub balloon_amount: Money,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Solve for the effective annual rate a desired monthly payment implies,
/// seeded from the standard banded rate for the invoice.
pub fn calculate_rate(
    input: &RateInput,
    source: &dyn RateBandSource,
    policy: &LendingPolicy,
) -> EquipFinanceResult<ComputationOutput<RateOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input, policy)?;

    let bands = current_bands(source, &mut warnings);
    let standard_annual_rate = rate_bands::applicable_rate(&bands, input.invoice_amount)?;

    let application_fee = input
        .application_fee
        .unwrap_or(policy.default_application_fee);
    let balloon_amount = input.balloon_amount.unwrap_or(policy.default_balloon);
    let amount_financed = input.invoice_amount + application_fee;
    let guess = standard_annual_rate / dec!(12);

    // -- Rate search ----------------------------------------------------------
    let solution = time_value::solve_rate(
        input.term_months,
        -input.desired_payment,
        amount_financed,
        balloon_amount,
        policy.payment_timing,
        guess,
    );

    let converged = solution.converged();
    if let RateSolution::DidNotConverge { residual, .. } = &solution {
        warnings.push(format!(
            "Rate search did not converge; returning best-effort rate (residual ${} against the financed amount)",
            round_currency(*residual)
        ));
    }

    let effective_monthly_rate = solution.rate();
    let effective_annual_rate = effective_monthly_rate * dec!(12);

    let output = RateOutput {
        invoice_amount: input.invoice_amount,
        application_fee,
        amount_financed,
        term_months: input.term_months,
        desired_payment: input.desired_payment,
        effective_annual_rate: round_rate(effective_annual_rate),
        effective_monthly_rate: round_rate(effective_monthly_rate),
        standard_annual_rate,
        rate_difference: round_rate(effective_annual_rate - standard_annual_rate),
        converged,
        balloon_amount,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "initial_guess_monthly": guess.to_string(),
        "standard_annual_rate": standard_annual_rate.to_string(),
        "payment_timing": policy.payment_timing,
    });

    Ok(with_metadata(
        "Implied Rate (Newton-Raphson on present value)",
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn validate_input(input: &RateInput, policy: &LendingPolicy) -> EquipFinanceResult<()> {
    validate_invoice_amount(policy, input.invoice_amount)?;
    validate_term(policy, input.term_months)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
