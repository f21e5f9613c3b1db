use chrono::{NaiveDate, Utc};
use clap::Args;
use colored::Colorize;
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde_json::Value;

use equip_finance_core::rate_bands::{self, RateBand};

use crate::commands::band_source;

/// Arguments for listing rate bands
#[derive(Args)]
pub struct BandsArgs {
    /// Path to a JSON or YAML rate-band file (built-in bands when absent)
    #[arg(long)]
    pub bands: Option<String>,

    /// List the bands in force on this date (YYYY-MM-DD) instead of today
    #[arg(long)]
    pub as_of: Option<NaiveDate>,
}

pub fn run_bands(args: BandsArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let source = band_source(args.bands.as_deref())?;
    let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());

    let mut warnings: Vec<String> = Vec::new();
    let bands = rate_bands::load_bands(source.as_ref(), as_of, &mut warnings);

    for warning in &warnings {
        eprintln!("{}: {}", "warning".yellow().bold(), warning);
    }

    let rows: Vec<Value> = bands.iter().map(band_row).collect();
    Ok(Value::Array(rows))
}

fn band_row(band: &RateBand) -> Value {
    serde_json::json!({
        "min_amount": band.min_amount.to_string(),
        "max_amount": band.max_amount.to_string(),
        "annual_rate": band.annual_rate.to_string(),
        "range": format!(
            "{} - {}",
            format_currency(band.min_amount),
            format_currency(band.max_amount)
        ),
        "rate": format_percentage(band.annual_rate),
        "effective": effective_window(band),
    })
}

fn effective_window(band: &RateBand) -> String {
    match (band.effective_from, band.effective_to) {
        (None, None) => "always".to_string(),
        (Some(from), None) => format!("from {from}"),
        (None, Some(to)) => format!("until {to}"),
        (Some(from), Some(to)) => format!("{from} to {to}"),
    }
}

/// Format an amount as "$12,345.67".
fn format_currency(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let sign = if rounded.is_sign_negative() { "-" } else { "" };
    let text = format!("{:.2}", rounded.abs());
    let (whole, cents) = text.split_once('.').unwrap_or((text.as_str(), "00"));
    format!("{sign}${}.{cents}", group_thousands(whole))
}

/// Format a rate fraction as a percentage, "0.1595" -> "15.95%".
fn format_percentage(rate: Decimal) -> String {
    format!("{:.2}%", rate * dec!(100))
}

fn group_thousands(digits: &str) -> String {
    let bytes = digits.as_bytes();
    let mut out = String::with_capacity(bytes.len() + bytes.len() / 3);
    for (i, b) in bytes.iter().enumerate() {
        if i > 0 && (bytes.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*b as char);
    }
    out
}
