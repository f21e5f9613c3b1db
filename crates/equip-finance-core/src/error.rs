use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EquipFinanceError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Invoice amount ${amount} is outside the configured rate bands (${lower} - ${upper})")]
    AmountOutsideBands {
        amount: Decimal,
        lower: Decimal,
        upper: Decimal,
    },

    #[error("Could not find a valid loan amount for the desired payment")]
    NoViableLoanAmount,

    #[error("Rate band source unavailable: {0}")]
    BandSourceUnavailable(String),

    #[error("Division by zero in {context}")]
    DivisionByZero { context: String },
}
