pub mod calculator;
pub mod error;
pub mod policy;
pub mod rate_bands;
pub mod time_value;
pub mod types;

pub use error::EquipFinanceError;
pub use types::*;

/// Standard result type for all equip-finance operations
pub type EquipFinanceResult<T> = Result<T, EquipFinanceError>;
