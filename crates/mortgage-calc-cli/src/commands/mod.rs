pub mod affordability;
pub mod compare;
pub mod monthly_payment;
pub mod refinance;
pub mod run;

/// Error for a flag that must be present when no JSON request is given.
pub(crate) fn required(flag: &str) -> String {
    format!("--{flag} is required (or provide --input / stdin JSON)")
}
