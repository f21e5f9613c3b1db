use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use equip_finance_core::calculator::loan_amount::{self, LoanAmountInput};
use equip_finance_core::calculator::payment::{self, PaymentInput};
use equip_finance_core::calculator::rate::{self, RateInput};
use equip_finance_core::policy::LendingPolicy;

use crate::commands::band_source;
use crate::input;

/// Arguments for a repayment quote
#[derive(Args)]
pub struct PaymentArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Equipment invoice amount
    #[arg(long, alias = "amount")]
    pub invoice_amount: Option<Decimal>,

    /// Term in months (24, 36, 48 or 60)
    #[arg(long, alias = "term")]
    pub term_months: Option<u32>,

    /// Application fee financed on top of the invoice (product default when omitted)
    #[arg(long, alias = "fee")]
    pub application_fee: Option<Decimal>,

    /// Balloon due with the final payment
    #[arg(long, alias = "balloon")]
    pub balloon_amount: Option<Decimal>,

    /// Path to a JSON or YAML rate-band file (built-in bands when absent)
    #[arg(long)]
    pub bands: Option<String>,
}

/// Arguments for solving the implied rate
#[derive(Args)]
pub struct RateArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Equipment invoice amount
    #[arg(long, alias = "amount")]
    pub invoice_amount: Option<Decimal>,

    /// Desired monthly payment
    #[arg(long, alias = "payment")]
    pub desired_payment: Option<Decimal>,

    /// Term in months (24, 36, 48 or 60)
    #[arg(long, alias = "term")]
    pub term_months: Option<u32>,

    /// Application fee financed on top of the invoice (product default when omitted)
    #[arg(long, alias = "fee")]
    pub application_fee: Option<Decimal>,

    /// Balloon due with the final payment
    #[arg(long, alias = "balloon")]
    pub balloon_amount: Option<Decimal>,

    /// Path to a JSON or YAML rate-band file (built-in bands when absent)
    #[arg(long)]
    pub bands: Option<String>,
}

/// Arguments for loan sizing
#[derive(Args)]
pub struct LoanAmountArgs {
    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Desired monthly payment
    #[arg(long, alias = "payment")]
    pub desired_payment: Option<Decimal>,

    /// Term in months (24, 36, 48 or 60)
    #[arg(long, alias = "term")]
    pub term_months: Option<u32>,

    /// Price at this annual rate (e.g. 0.1070) instead of searching the bands
    #[arg(long, alias = "rate")]
    pub annual_rate: Option<Decimal>,

    /// Application fee financed on top of the invoice (product default when omitted)
    #[arg(long, alias = "fee")]
    pub application_fee: Option<Decimal>,

    /// Balloon due with the final payment
    #[arg(long, alias = "balloon")]
    pub balloon_amount: Option<Decimal>,

    /// Path to a JSON or YAML rate-band file (built-in bands when absent)
    #[arg(long)]
    pub bands: Option<String>,
}

pub fn run_payment(args: PaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let quote_input: PaymentInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(parsed) = input::stdin::read_stdin()? {
        parsed
    } else {
        PaymentInput {
            invoice_amount: args
                .invoice_amount
                .ok_or("--invoice-amount is required (or provide --input)")?,
            term_months: args
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
            application_fee: args.application_fee,
            balloon_amount: args.balloon_amount,
        }
    };

    let source = band_source(args.bands.as_deref())?;
    let result =
        payment::calculate_payment(&quote_input, source.as_ref(), &LendingPolicy::standard())?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_rate(args: RateArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let rate_input: RateInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(parsed) = input::stdin::read_stdin()? {
        parsed
    } else {
        RateInput {
            invoice_amount: args
                .invoice_amount
                .ok_or("--invoice-amount is required (or provide --input)")?,
            desired_payment: args
                .desired_payment
                .ok_or("--desired-payment is required (or provide --input)")?,
            term_months: args
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
            application_fee: args.application_fee,
            balloon_amount: args.balloon_amount,
        }
    };

    let source = band_source(args.bands.as_deref())?;
    let result = rate::calculate_rate(&rate_input, source.as_ref(), &LendingPolicy::standard())?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_loan_amount(args: LoanAmountArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let sizing_input: LoanAmountInput = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(parsed) = input::stdin::read_stdin()? {
        parsed
    } else {
        LoanAmountInput {
            desired_payment: args
                .desired_payment
                .ok_or("--desired-payment is required (or provide --input)")?,
            term_months: args
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
            annual_rate: args.annual_rate,
            application_fee: args.application_fee,
            balloon_amount: args.balloon_amount,
        }
    };

    let source = band_source(args.bands.as_deref())?;
    let result = loan_amount::calculate_loan_amount(
        &sizing_input,
        source.as_ref(),
        &LendingPolicy::standard(),
    )?;
    Ok(serde_json::to_value(result)?)
}
