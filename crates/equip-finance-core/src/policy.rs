use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::time_value::PaymentTiming;
use crate::types::Money;

/// Commercial parameters of the equipment finance product.
///
/// Plain data: calculators read it and never mutate it. Use
/// [`LendingPolicy::standard`] for the standard product, or deserialize a
/// custom policy for what-if runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LendingPolicy {
    pub min_loan_amount: Money,
    pub max_loan_amount: Money,
    pub available_terms: Vec<u32>,
    pub default_application_fee: Money,
    pub default_balloon: Money,
    pub payment_timing: PaymentTiming,
}

impl LendingPolicy {
    /// The standard product: invoices from $10,000 to $500,000, terms of
    /// 2 to 5 years, a $495.00 application fee, no balloon, payments in
    /// advance.
    pub fn standard() -> Self {
        LendingPolicy {
            min_loan_amount: dec!(10000),
            max_loan_amount: dec!(500000),
            available_terms: vec![24, 36, 48, 60],
            default_application_fee: dec!(495.00),
            default_balloon: Decimal::ZERO,
            payment_timing: PaymentTiming::Advance,
        }
    }

    pub fn is_valid_invoice_amount(&self, amount: Money) -> bool {
        amount >= self.min_loan_amount && amount <= self.max_loan_amount
    }

    pub fn is_valid_term(&self, term_months: u32) -> bool {
        self.available_terms.contains(&term_months)
    }
}

impl Default for LendingPolicy {
    fn default() -> Self {
        LendingPolicy::standard()
    }
}
