//! Request validation.
//!
//! Every calculator runs its validator before doing any arithmetic and
//! rejects the request with the complete list of failures, not just the
//! first one.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::calculators::affordability::AffordabilityInput;
use crate::calculators::loan_comparison::{LoanComparisonInput, LoanOffer};
use crate::calculators::monthly_payment::MonthlyPaymentInput;
use crate::calculators::refinance::{CurrentLoanInput, RefinanceInput, RefinanceLoanInput, TaxRates};
use crate::error::MortgageError;
use crate::loan_math::MONTHS_PER_YEAR;
use crate::MortgageResult;

/// A single rule violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationFailure {
    /// Dotted path of the offending field, e.g. `current_loan.term_years`.
    pub field: String,
    pub message: String,
}

/// Inclusive range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: Decimal,
    pub max: Decimal,
}

pub const INTEREST_RATE: Bounds = Bounds { min: dec!(1), max: dec!(25) };
pub const PMI_RATE: Bounds = Bounds { min: dec!(0), max: dec!(10) };
pub const HOME_VALUE: Bounds = Bounds { min: dec!(25_000), max: dec!(10_000_000) };
pub const ANNUAL_TAXES: Bounds = Bounds { min: dec!(0), max: dec!(200_000) };
pub const ANNUAL_INSURANCE: Bounds = Bounds { min: dec!(200), max: dec!(50_000) };
pub const MONTHLY_INCOME: Bounds = Bounds { min: dec!(0), max: dec!(200_000) };
pub const DOWN_PAYMENT: Bounds = Bounds { min: dec!(0), max: dec!(95) };
pub const FRONT_RATIO: Bounds = Bounds { min: dec!(5), max: dec!(60) };
pub const BACK_RATIO: Bounds = Bounds { min: dec!(5), max: dec!(80) };
pub const POINTS: Bounds = Bounds { min: dec!(0), max: dec!(3) };
pub const ORIGINATION_FEES: Bounds = Bounds { min: dec!(0), max: dec!(5) };
pub const CLOSING_COSTS: Bounds = Bounds { min: dec!(500), max: dec!(100_000) };
pub const STATE_TAX_RATE: Bounds = Bounds { min: dec!(0), max: dec!(15) };
pub const FEDERAL_TAX_RATE: Bounds = Bounds { min: dec!(0), max: dec!(50) };

pub const MIN_LOAN_AMOUNT: Decimal = dec!(30_000);
pub const MIN_TERM_YEARS: u32 = 1;
pub const MAX_TERM_YEARS: u32 = 40;
pub const MAX_MONTHS_PAID: u32 = 480;
pub const MAX_YEARS_BEFORE_SALE: u32 = 30;
pub const COMPARED_LOANS: usize = 2;

/// Turn a failure list into a result.
pub fn ensure_valid(failures: Vec<ValidationFailure>) -> MortgageResult<()> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(MortgageError::ValidationFailed(failures))
    }
}

struct Rules {
    prefix: String,
    failures: Vec<ValidationFailure>,
}

impl Rules {
    fn new() -> Self {
        Rules {
            prefix: String::new(),
            failures: Vec::new(),
        }
    }

    fn nested(&mut self, prefix: &str, check: impl FnOnce(&mut Rules)) {
        let mut inner = Rules {
            prefix: self.path(prefix),
            failures: Vec::new(),
        };
        check(&mut inner);
        self.failures.append(&mut inner.failures);
    }

    fn path(&self, field: &str) -> String {
        if self.prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", self.prefix, field)
        }
    }

    fn fail(&mut self, field: &str, message: String) {
        let field = self.path(field);
        self.failures.push(ValidationFailure { field, message });
    }

    fn between(&mut self, field: &str, value: Decimal, bounds: Bounds) {
        if value < bounds.min || value > bounds.max {
            self.fail(
                field,
                format!("The value must be between {} and {}.", bounds.min, bounds.max),
            );
        }
    }

    fn between_u32(&mut self, field: &str, value: u32, min: u32, max: u32) {
        if value < min || value > max {
            self.fail(field, format!("The value must be between {min} and {max}."));
        }
    }

    fn at_least(&mut self, field: &str, value: Decimal, min: Decimal) {
        if value < min {
            self.fail(field, format!("The value must be at least {min}."));
        }
    }

    fn greater_than(&mut self, field: &str, value: Decimal, other: Decimal, other_field: &str) {
        if value <= other {
            self.fail(field, format!("The value must be greater than {other_field}."));
        }
    }

    fn less_than(&mut self, field: &str, value: Decimal, other: Decimal, other_field: &str) {
        if value >= other {
            self.fail(field, format!("The value must be less than {other_field}."));
        }
    }

    fn term(&mut self, field: &str, value: u32) {
        self.between_u32(field, value, MIN_TERM_YEARS, MAX_TERM_YEARS);
    }

    fn finish(self) -> Vec<ValidationFailure> {
        self.failures
    }
}

pub fn validate_affordability(input: &AffordabilityInput) -> Vec<ValidationFailure> {
    let mut rules = Rules::new();
    rules.between("monthly_income", input.monthly_income, MONTHLY_INCOME);
    rules.greater_than(
        "monthly_income",
        input.monthly_income,
        input.monthly_expenses,
        "monthly_expenses",
    );
    rules.at_least("monthly_expenses", input.monthly_expenses, Decimal::ZERO);
    rules.between("down_payment", input.down_payment, DOWN_PAYMENT);
    rules.between("interest_rate", input.interest_rate, INTEREST_RATE);
    rules.term("term_years", input.term_years);
    rules.between("pmi_rate", input.pmi_rate, PMI_RATE);
    rules.between("front_ratio", input.front_ratio, FRONT_RATIO);
    rules.between("back_ratio", input.back_ratio, BACK_RATIO);
    rules.between("annual_taxes", input.annual_taxes, ANNUAL_TAXES);
    rules.between("annual_insurance", input.annual_insurance, ANNUAL_INSURANCE);
    rules.finish()
}

pub fn validate_monthly_payment(input: &MonthlyPaymentInput) -> Vec<ValidationFailure> {
    let mut rules = Rules::new();
    rules.at_least("loan_amount", input.loan_amount, MIN_LOAN_AMOUNT);
    rules.between("home_value", input.home_value, HOME_VALUE);
    rules.greater_than("home_value", input.home_value, input.loan_amount, "loan_amount");
    rules.between("interest_rate", input.interest_rate, INTEREST_RATE);
    rules.term("term_years", input.term_years);
    rules.between("annual_taxes", input.annual_taxes, ANNUAL_TAXES);
    rules.less_than("annual_taxes", input.annual_taxes, input.loan_amount, "loan_amount");
    rules.between("annual_insurance", input.annual_insurance, ANNUAL_INSURANCE);
    rules.less_than(
        "annual_insurance",
        input.annual_insurance,
        input.loan_amount,
        "loan_amount",
    );
    rules.between("pmi_rate", input.pmi_rate, PMI_RATE);
    rules.finish()
}

fn loan_offer_rules(rules: &mut Rules, offer: &LoanOffer) {
    rules.between("interest_rate", offer.interest_rate, INTEREST_RATE);
    rules.term("term_years", offer.term_years);
    rules.between("points", offer.points, POINTS);
    rules.between("origination_fees", offer.origination_fees, ORIGINATION_FEES);
    rules.between("closing_costs", offer.closing_costs, CLOSING_COSTS);
    rules.between("home_value", offer.home_value, HOME_VALUE);
    rules.between("pmi_rate", offer.pmi_rate, PMI_RATE);
}

pub fn validate_loan_comparison(input: &LoanComparisonInput) -> Vec<ValidationFailure> {
    let mut rules = Rules::new();
    rules.at_least("loan_amount", input.loan_amount, MIN_LOAN_AMOUNT);
    if input.loans.len() != COMPARED_LOANS {
        rules.fail(
            "loans",
            format!("Exactly {COMPARED_LOANS} loans are required for comparison."),
        );
    }
    for (i, offer) in input.loans.iter().enumerate() {
        rules.nested(&format!("loans[{i}]"), |r| loan_offer_rules(r, offer));
    }
    rules.finish()
}

fn current_loan_rules(rules: &mut Rules, loan: &CurrentLoanInput) {
    rules.at_least("original_amount", loan.original_amount, MIN_LOAN_AMOUNT);
    rules.between("interest_rate", loan.interest_rate, INTEREST_RATE);
    rules.term("term_years", loan.term_years);
    rules.between("pmi_rate", loan.pmi_rate, PMI_RATE);
    rules.between_u32("months_paid", loan.months_paid, 0, MAX_MONTHS_PAID);
    let term_months = loan.term_years.saturating_mul(MONTHS_PER_YEAR);
    if loan.months_paid >= term_months {
        rules.fail(
            "months_paid",
            format!("The value must be less than {term_months}."),
        );
    }
}

fn refinance_loan_rules(rules: &mut Rules, loan: &RefinanceLoanInput) {
    rules.between("interest_rate", loan.interest_rate, INTEREST_RATE);
    rules.term("term_years", loan.term_years);
    rules.between("pmi_rate", loan.pmi_rate, PMI_RATE);
    rules.between("points", loan.points, POINTS);
    rules.between("origination_fees", loan.origination_fees, ORIGINATION_FEES);
    rules.between("closing_costs", loan.closing_costs, CLOSING_COSTS);
    rules.between_u32(
        "years_before_sale",
        loan.years_before_sale,
        0,
        MAX_YEARS_BEFORE_SALE,
    );
}

fn tax_rate_rules(rules: &mut Rules, rates: &TaxRates) {
    rules.between("state_tax_rate", rates.state_tax_rate, STATE_TAX_RATE);
    rules.between("federal_tax_rate", rates.federal_tax_rate, FEDERAL_TAX_RATE);
}

pub fn validate_refinance(input: &RefinanceInput) -> Vec<ValidationFailure> {
    let mut rules = Rules::new();
    rules.between("home_value", input.home_value, HOME_VALUE);
    rules.nested("current_loan", |r| current_loan_rules(r, &input.current_loan));
    rules.nested("refinance_loan", |r| refinance_loan_rules(r, &input.refinance_loan));
    rules.nested("tax_rates", |r| tax_rate_rules(r, &input.tax_rates));
    rules.finish()
}
