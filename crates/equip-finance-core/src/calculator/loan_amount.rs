use std::time::Instant;

use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use super::{current_bands, round_currency, round_rate, validate_term};
use crate::error::EquipFinanceError;
use crate::policy::LendingPolicy;
use crate::rate_bands::{self, RateBand, RateBandSource};
use crate::time_value;
use crate::types::{with_metadata, ComputationOutput, Money, Rate};
use crate::EquipFinanceResult;

// ---------------------------------------------------------------------------
// Input / Output types
// ---------------------------------------------------------------------------

/// Input for loan sizing: how much equipment does a monthly budget buy?
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAmountInput {
    /// The payment the customer can afford each month
    pub desired_payment: Money,
    /// Term in months (24, 36, 48 or 60 under the standard policy)
    pub term_months: u32,
    /// Price at this annual rate instead of searching the bands
    #[serde(skip_serializing_if = "Option::is_none")]
    pub annual_rate: Option<Rate>,
    /// Fee financed on top of the invoice; policy default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub application_fee: Option<Money>,
    /// Residual due with the final payment; policy default when absent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub balloon_amount: Option<Money>,
}

/// The largest invoice a desired payment supports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanAmountOutput {
    pub desired_payment: Money,
    pub term_months: u32,
    /// Annual rate the sizing was priced at
    pub annual_rate: Rate,
    pub monthly_rate: Rate,
    /// Largest invoice amount within policy, rounded to cents
    pub max_invoice_amount: Money,
    pub application_fee: Money,
    pub amount_financed: Money,
    pub balloon_amount: Money,
    /// The band the sized amount prices in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate_band: Option<RateBand>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Size the maximum invoice amount a desired monthly payment supports.
///
/// With an explicit `annual_rate` this is a single present-value pricing.
/// Otherwise each band is tried at its own rate and a candidate only counts
/// when it lands inside the band that priced it; the highest such candidate
/// wins. The result is clamped into the policy's lending range.
pub fn calculate_loan_amount(
    input: &LoanAmountInput,
    source: &dyn RateBandSource,
    policy: &LendingPolicy,
) -> EquipFinanceResult<ComputationOutput<LoanAmountOutput>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_term(policy, input.term_months)?;

    let application_fee = input
        .application_fee
        .unwrap_or(policy.default_application_fee);
    let balloon_amount = input.balloon_amount.unwrap_or(policy.default_balloon);

    let bands = current_bands(source, &mut warnings);

    // -- Candidate sizing -----------------------------------------------------
    let (candidate, annual_rate, mut rate_band) = match input.annual_rate {
        Some(annual_rate) => {
            let invoice = size_invoice(
                annual_rate,
                input.term_months,
                input.desired_payment,
                balloon_amount,
                application_fee,
                policy,
            )?;
            (invoice, annual_rate, None)
        }
        None => band_search(
            &bands,
            input.term_months,
            input.desired_payment,
            balloon_amount,
            application_fee,
            policy,
        )?,
    };

    // -- Policy clamp ---------------------------------------------------------
    let clamped = if candidate < policy.min_loan_amount {
        warnings.push(format!(
            "Sized invoice amount ${} is below the policy minimum; clamped to ${}",
            round_currency(candidate),
            policy.min_loan_amount
        ));
        policy.min_loan_amount
    } else if candidate > policy.max_loan_amount {
        warnings.push(format!(
            "Sized invoice amount ${} is above the policy maximum; clamped to ${}",
            round_currency(candidate),
            policy.max_loan_amount
        ));
        policy.max_loan_amount
    } else {
        candidate
    };

    let max_invoice_amount = round_currency(clamped);
    let amount_financed = round_currency(max_invoice_amount + application_fee);

    if rate_band.is_none() {
        rate_band = rate_bands::applicable_band(&bands, max_invoice_amount);
    }

    let output = LoanAmountOutput {
        desired_payment: input.desired_payment,
        term_months: input.term_months,
        annual_rate,
        monthly_rate: round_rate(annual_rate / dec!(12)),
        max_invoice_amount,
        application_fee,
        amount_financed,
        balloon_amount,
        rate_band,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    let assumptions = serde_json::json!({
        "search": if input.annual_rate.is_some() { "explicit_rate" } else { "band_search" },
        "application_fee": application_fee.to_string(),
        "payment_timing": policy.payment_timing,
    });

    Ok(with_metadata(
        methodology(input.annual_rate.is_some()),
        &assumptions,
        warnings,
        elapsed,
        output,
    ))
}

// ---------------------------------------------------------------------------
// Internal helpers
// ---------------------------------------------------------------------------

fn methodology(explicit_rate: bool) -> &'static str {
    if explicit_rate {
        "Loan Sizing (explicit rate)"
    } else {
        "Loan Sizing (rate-band search)"
    }
}

/// Invoice amount supportable by `desired_payment` at `annual_rate`: the
/// present value of the payment stream, less the financed fee.
fn size_invoice(
    annual_rate: Rate,
    term_months: u32,
    desired_payment: Money,
    balloon_amount: Money,
    application_fee: Money,
    policy: &LendingPolicy,
) -> EquipFinanceResult<Money> {
    let monthly_rate = annual_rate / dec!(12);
    let gross = time_value::pv(
        monthly_rate,
        term_months,
        -desired_payment,
        balloon_amount,
        policy.payment_timing,
    )?;
    Ok(gross - application_fee)
}

/// Try every band at its own rate and keep the largest candidate that lands
/// back inside the band that priced it.
fn band_search(
    bands: &[RateBand],
    term_months: u32,
    desired_payment: Money,
    balloon_amount: Money,
    application_fee: Money,
    policy: &LendingPolicy,
) -> EquipFinanceResult<(Money, Rate, Option<RateBand>)> {
    let mut best: Option<(Money, Rate, RateBand)> = None;

    for band in bands {
        let candidate = size_invoice(
            band.annual_rate,
            term_months,
            desired_payment,
            balloon_amount,
            application_fee,
            policy,
        )?;

        if !band.contains(candidate) {
            continue;
        }
        let is_better = match &best {
            Some((current, _, _)) => candidate > *current,
            None => true,
        };
        if is_better {
            best = Some((candidate, band.annual_rate, band.clone()));
        }
    }

    match best {
        Some((candidate, annual_rate, band)) => Ok((candidate, annual_rate, Some(band))),
        None => Err(EquipFinanceError::NoViableLoanAmount),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
