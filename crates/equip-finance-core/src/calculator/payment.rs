use std::time::Instant;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{current_bands, round_currency, round_rate, validate_invoice_amount, validate_term};
use crate::policy::LendingPolicy;
use crate::rate_bands::{self, RateBand, RateBandSource};
use crate::time_value::{self, PaymentTiming};
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::EquipFinanceResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Input for a repayment quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentInput {
    /// Equipment invoice amount being financed
    pub invoice_amount: Money,
    /// Term in months (24, 36, 48 or 60 under the standard policy)
    pub term_months: u32,
    /// Fee financed on top of the invoice; policy default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_fee: Option<Money>,
    /// Residual due with the final payment; policy default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balloon_amount: Option<Money>,
}

/// A repayment quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentOutput {
    pub invoice_amount: Money,
    pub application_fee: Money,
    /// Invoice plus financed fee; the principal the payments amortise
    pub amount_financed: Money,
    pub term_months: u32,
    /// Annual rate from the applicable band
    pub annual_rate: Rate,
    /// Annual rate / 12, at basis-point precision
    pub monthly_rate: Rate,
    /// Per-month repayment, rounded to cents
    pub monthly_payment: Money,
    /// Rounded payment x term, plus the balloon
    pub total_payable: Money,
    /// Total payable less the amount financed
    pub total_interest: Money,
    pub balloon_amount: Money,
    /// The band that priced this quote
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_band: Option<RateBand>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Quote the fixed monthly repayment for an invoice under the banded rate
/// table, with the application fee financed into the principal.
pub fn calculate_payment(
    input: &PaymentInput,
    source: &dyn RateBandSource,
    policy: &LendingPolicy,
) -> EquipFinanceResult<ComputationOutput<PaymentOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input, policy)?;

    let bands = current_bands(source, &mut warnings);
    let annual_rate = rate_bands::applicable_rate(&bands, input.invoice_amount)?;

    let application_fee = input
        .application_fee
        .unwrap_or(policy.default_application_fee);
    let balloon_amount = input.balloon_amount.unwrap_or(policy.default_balloon);
    let amount_financed = input.invoice_amount + application_fee;
    let monthly_rate = annual_rate / dec!(12);

    // -- Repayment ------------------------------------------------------------
    let raw_payment = time_value::pmt(
        monthly_rate,
        input.term_months,
        -amount_financed,
        balloon_amount,
        policy.payment_timing,
    )?;
    let monthly_payment = round_currency(raw_payment);

    // Totals accrue over the rounded payment actually collected each month
    let total_payable =
        round_currency(monthly_payment * Decimal::from(input.term_months) + balloon_amount);
    let total_interest = round_currency(total_payable - amount_financed);

    let rate_band = rate_bands::applicable_band(&bands, input.invoice_amount);

    let output = PaymentOutput {
        invoice_amount: input.invoice_amount,
        application_fee,
        amount_financed,
        term_months: input.term_months,
        annual_rate,
        monthly_rate: round_rate(monthly_rate),
        monthly_payment,
        total_payable,
        total_interest,
        balloon_amount,
        rate_band,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "annual_rate": annual_rate.to_string(),
        "payment_timing": policy.payment_timing,
        "fee_financed": true,
    });

    Ok(with_metadata(
        methodology(policy.payment_timing),
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn methodology(timing: PaymentTiming) -> &'static str {
    match timing {
        PaymentTiming::Advance => "Amortised Repayment (payments in advance)",
        PaymentTiming::Arrears => "Amortised Repayment (payments in arrears)",
    }
}

fn validate_input(input: &PaymentInput, policy: &LendingPolicy) -> EquipFinanceResult<()> {
    validate_invoice_amount(policy, input.invoice_amount)?;
    validate_term(policy, input.term_months)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
