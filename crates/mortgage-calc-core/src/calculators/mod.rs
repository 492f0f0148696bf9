pub mod affordability;
pub mod loan_comparison;
pub mod monthly_payment;
pub mod refinance;

pub use affordability::{calculate_affordability, AffordabilityInput, AffordabilityOutput};
pub use loan_comparison::{compare_loans, LoanComparisonInput, LoanComparisonOutput, LoanOffer};
pub use monthly_payment::{calculate_monthly_payment, MonthlyPaymentInput, MonthlyPaymentOutput};
pub use refinance::{analyze_refinance, RefinanceInput, RefinanceOutput};
