pub mod amortization;
pub mod calculators;
pub mod error;
pub mod loan_math;
pub mod registry;
pub mod types;
pub mod validation;

pub use error::MortgageError;
pub use types::*;

/// Standard result type for all mortgage calculations
pub type MortgageResult<T> = Result<T, MortgageError>;
