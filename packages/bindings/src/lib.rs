use napi::Result as NapiResult;
use napi_derive::napi;

use equip_finance_core::policy::LendingPolicy;
use equip_finance_core::rate_bands::{DefaultRateBands, RateBand, RateBandSource, StaticBands};

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

/// Band source for a call: a JSON array of bands snapshotted by the caller,
/// or the built-in tier table when absent.
fn band_source(bands_json: Option<&str>) -> NapiResult<Box<dyn RateBandSource>> {
    match bands_json {
        Some(json) => {
            let bands: Vec<RateBand> = serde_json::from_str(json).map_err(to_napi_error)?;
            Ok(Box::new(StaticBands(bands)))
        }
        None => Ok(Box::new(DefaultRateBands)),
    }
}

// ---------------------------------------------------------------------------
// Calculator
// ---------------------------------------------------------------------------

#[napi]
pub fn calculate_payment(input_json: String, bands_json: Option<String>) -> NapiResult<String> {
    let input: equip_finance_core::calculator::payment::PaymentInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let source = band_source(bands_json.as_deref())?;
    let output = equip_finance_core::calculator::payment::calculate_payment(
        &input,
        source.as_ref(),
        &LendingPolicy::standard(),
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_rate(input_json: String, bands_json: Option<String>) -> NapiResult<String> {
    let input: equip_finance_core::calculator::rate::RateInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let source = band_source(bands_json.as_deref())?;
    let output = equip_finance_core::calculator::rate::calculate_rate(
        &input,
        source.as_ref(),
        &LendingPolicy::standard(),
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn calculate_loan_amount(input_json: String, bands_json: Option<String>) -> NapiResult<String> {
    let input: equip_finance_core::calculator::loan_amount::LoanAmountInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let source = band_source(bands_json.as_deref())?;
    let output = equip_finance_core::calculator::loan_amount::calculate_loan_amount(
        &input,
        source.as_ref(),
        &LendingPolicy::standard(),
    )
    .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

// ---------------------------------------------------------------------------
// Rate bands
// ---------------------------------------------------------------------------

#[napi]
pub fn default_rate_bands() -> NapiResult<String> {
    serde_json::to_string(&equip_finance_core::rate_bands::default_rate_bands())
        .map_err(to_napi_error)
}

#[napi]
pub fn lending_policy() -> NapiResult<String> {
    serde_json::to_string(&LendingPolicy::standard()).map_err(to_napi_error)
}
