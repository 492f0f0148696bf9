//! How much house an income supports.
//!
//! The binding constraint is the tighter of the front-end ratio (housing cost
//! over gross income) and the back-end ratio (housing cost plus other debt
//! over gross income). The affordable principal-and-interest budget is
//! inverted into a loan amount and grossed up by the down payment.

use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{build_amortization, Amortization};
use crate::error::MortgageError;
use crate::loan_math::{
    has_pmi, loan_to_value, monthly_principal_from_payment, pmi_annual_amount,
    round_down_to_hundred, to_dollars, MONTHS_PER_YEAR,
};
use crate::types::{resolve_start_date, with_metadata, ComputationOutput, Money, Percent};
use crate::validation::{ensure_valid, validate_affordability};
use crate::MortgageResult;

const HUNDRED: Decimal = dec!(100);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AffordabilityInput {
    /// Gross monthly income.
    pub monthly_income: Money,
    /// Recurring monthly debt payments other than housing.
    pub monthly_expenses: Money,
    /// Down payment as a percentage of the purchase price.
    pub down_payment: Percent,
    pub interest_rate: Percent,
    pub term_years: u32,
    #[serde(default)]
    pub pmi_rate: Percent,
    /// Maximum housing cost as a percentage of income.
    pub front_ratio: Percent,
    /// Maximum housing cost plus expenses as a percentage of income.
    pub back_ratio: Percent,
    pub annual_taxes: Money,
    pub annual_insurance: Money,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Which debt-to-income limit capped the payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BindingRatio {
    Front,
    Back,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffordabilityOutput {
    pub monthly_principal_and_interest: Money,
    pub monthly_taxes: Money,
    pub monthly_insurance: Money,
    pub monthly_pmi: Money,
    pub monthly_total: Money,
    pub monthly_income: Money,
    pub monthly_expenses: Money,
    pub actual_front_ratio: Percent,
    pub actual_back_ratio: Percent,
    pub binding_ratio: BindingRatio,
    pub loan_amount: Money,
    pub down_payment: Money,
    pub home_value: Money,
    pub amortization: Amortization,
}

/// Maximum affordable home price for the given income, debts and ratios.
pub fn calculate_affordability(
    input: &AffordabilityInput,
) -> MortgageResult<ComputationOutput<AffordabilityOutput>> {
    let start = Instant::now();
    ensure_valid(validate_affordability(input))?;

    let start_date = resolve_start_date(input.start_date);
    let (output, warnings) = compute_affordability(input, start_date)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Debt-to-income affordability (front/back-end ratios, single PMI refinement)",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Purchase price and down payment that a loan amount implies.
fn price_for_loan(loan_amount: Money, down_payment_pct: Percent) -> MortgageResult<(Money, Money)> {
    let financed = Decimal::ONE - down_payment_pct / HUNDRED;
    if financed <= Decimal::ZERO {
        return Err(MortgageError::DivisionByZero {
            context: "home value (down payment covers the full price)".into(),
        });
    }
    let home_value = loan_amount / financed;
    Ok((home_value, home_value - loan_amount))
}

fn compute_affordability(
    input: &AffordabilityInput,
    start_date: NaiveDate,
) -> MortgageResult<(AffordabilityOutput, Vec<String>)> {
    let mut warnings: Vec<String> = Vec::new();
    let months = Decimal::from(MONTHS_PER_YEAR);

    let monthly_taxes = input.annual_taxes / months;
    let monthly_insurance = input.annual_insurance / months;

    let max_front = input.front_ratio * input.monthly_income / HUNDRED;
    let max_back = input.back_ratio * input.monthly_income / HUNDRED - input.monthly_expenses;
    let (max_monthly_payment, binding_ratio) = if max_back < max_front {
        (max_back, BindingRatio::Back)
    } else {
        (max_front, BindingRatio::Front)
    };
    debug!(
        "affordability: {binding_ratio:?} ratio binds at {} per month",
        to_dollars(max_monthly_payment)
    );

    let mut max_pi = max_monthly_payment - monthly_taxes - monthly_insurance;
    if max_pi <= Decimal::ZERO {
        return Err(MortgageError::FinancialImpossibility(format!(
            "A housing budget of {} per month does not cover taxes and insurance of {}",
            to_dollars(max_monthly_payment),
            to_dollars(monthly_taxes + monthly_insurance)
        )));
    }

    let mut loan_amount =
        monthly_principal_from_payment(max_pi, input.interest_rate, input.term_years)?;
    let (mut home_value, mut down_payment) = price_for_loan(loan_amount, input.down_payment)?;

    let ltv = loan_to_value(loan_amount, home_value)?;
    let monthly_pmi = if has_pmi(ltv, input.pmi_rate)? {
        pmi_annual_amount(loan_amount, input.pmi_rate) / months
    } else {
        Decimal::ZERO
    };

    // One refinement pass: PMI is priced on the first-pass loan.
    if monthly_pmi > Decimal::ZERO {
        max_pi -= monthly_pmi;
        if max_pi <= Decimal::ZERO {
            return Err(MortgageError::FinancialImpossibility(
                "PMI consumes the entire principal-and-interest budget".into(),
            ));
        }
        debug!(
            "affordability: PMI of {} per month at {}% LTV, re-sizing loan",
            to_dollars(monthly_pmi),
            ltv.round_dp(2)
        );
        loan_amount = monthly_principal_from_payment(max_pi, input.interest_rate, input.term_years)?;
        (home_value, down_payment) = price_for_loan(loan_amount, input.down_payment)?;
    }

    loan_amount = round_down_to_hundred(loan_amount);
    down_payment = round_down_to_hundred(down_payment);
    home_value = loan_amount + down_payment;

    if loan_amount.is_zero() {
        let msg = "Affordable loan rounds down to zero".to_string();
        warn!("affordability: {msg}");
        warnings.push(msg);
    }

    let amortization = build_amortization(
        loan_amount,
        input.interest_rate,
        input.term_years * MONTHS_PER_YEAR,
        start_date,
        home_value,
        input.pmi_rate,
    )?;

    let monthly_total = max_pi + monthly_taxes + monthly_insurance + monthly_pmi;
    let actual_front_ratio = HUNDRED * monthly_total / input.monthly_income;
    let actual_back_ratio =
        HUNDRED * (monthly_total + input.monthly_expenses) / input.monthly_income;

    if amortization.months_with_pmi > 0 {
        warnings.push(format!(
            "PMI is charged for the first {} months of the loan",
            amortization.months_with_pmi
        ));
    }

    let output = AffordabilityOutput {
        monthly_principal_and_interest: to_dollars(max_pi),
        monthly_taxes: to_dollars(monthly_taxes),
        monthly_insurance: to_dollars(monthly_insurance),
        monthly_pmi: to_dollars(monthly_pmi),
        monthly_total: to_dollars(monthly_total),
        monthly_income: input.monthly_income,
        monthly_expenses: input.monthly_expenses,
        actual_front_ratio: actual_front_ratio.round_dp(2),
        actual_back_ratio: actual_back_ratio.round_dp(2),
        binding_ratio,
        loan_amount,
        down_payment,
        home_value,
        amortization,
    };

    Ok((output, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn jan_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn base_input() -> AffordabilityInput {
        AffordabilityInput {
            monthly_income: dec!(8000),
            monthly_expenses: dec!(1000),
            down_payment: dec!(20),
            interest_rate: dec!(6),
            term_years: 30,
            pmi_rate: Decimal::ZERO,
            front_ratio: dec!(28),
            back_ratio: dec!(36),
            annual_taxes: dec!(2700),
            annual_insurance: dec!(2400),
            start_date: Some(jan_first()),
        }
    }

    #[test]
    fn test_back_ratio_binds_without_pmi() {
        let out = calculate_affordability(&base_input()).unwrap().result;

        assert_eq!(out.binding_ratio, BindingRatio::Back);
        assert_eq!(out.monthly_principal_and_interest, dec!(1455.00));
        assert_eq!(out.monthly_taxes, dec!(225.00));
        assert_eq!(out.monthly_insurance, dec!(200.00));
        assert_eq!(out.monthly_pmi, Decimal::ZERO);
        assert_eq!(out.monthly_total, dec!(1880.00));
        // Unrounded: loan 242,681.80, down 60,670.45, home 303,352.25.
        assert_eq!(out.loan_amount, dec!(242_600));
        assert_eq!(out.down_payment, dec!(60_600));
        assert_eq!(out.home_value, dec!(303_200));
        assert_eq!(out.actual_front_ratio, dec!(23.50));
        assert_eq!(out.actual_back_ratio, dec!(36.00));
        assert_eq!(out.amortization.principal, dec!(242_600));
        assert_eq!(out.amortization.periods, 360);
        assert_eq!(out.amortization.months_with_pmi, 0);
    }

    #[test]
    fn test_pmi_refinement_shrinks_loan() {
        let input = AffordabilityInput {
            monthly_income: dec!(10_000),
            monthly_expenses: dec!(2000),
            down_payment: dec!(10),
            interest_rate: dec!(5),
            pmi_rate: dec!(1),
            annual_taxes: dec!(6000),
            annual_insurance: dec!(2400),
            ..base_input()
        };
        let output = calculate_affordability(&input).unwrap();
        let out = &output.result;

        assert_eq!(out.binding_ratio, BindingRatio::Back);
        assert_eq!(out.monthly_pmi, dec!(139.71));
        assert_eq!(out.monthly_principal_and_interest, dec!(760.29));
        assert_eq!(out.loan_amount, dec!(141_600));
        assert_eq!(out.down_payment, dec!(15_700));
        assert_eq!(out.home_value, dec!(157_300));
        assert_eq!(out.actual_front_ratio, dec!(16.00));
        assert_eq!(out.actual_back_ratio, dec!(36.00));
        assert!(out.amortization.months_with_pmi > 0);
        assert!(!output.warnings.is_empty());
    }

    #[test]
    fn test_front_ratio_binds_when_no_other_debt() {
        let input = AffordabilityInput {
            monthly_expenses: Decimal::ZERO,
            ..base_input()
        };
        let out = calculate_affordability(&input).unwrap().result;
        assert_eq!(out.binding_ratio, BindingRatio::Front);
        assert_eq!(out.actual_front_ratio, dec!(28.00));
    }

    #[test]
    fn test_taxes_exceeding_budget_is_impossible() {
        let input = AffordabilityInput {
            monthly_income: dec!(2000),
            monthly_expenses: dec!(500),
            annual_taxes: dec!(12_000),
            ..base_input()
        };
        let err = calculate_affordability(&input).unwrap_err();
        assert!(matches!(err, MortgageError::FinancialImpossibility(_)));
    }

    #[test]
    fn test_invalid_request_rejected_before_math() {
        let input = AffordabilityInput {
            interest_rate: dec!(0),
            ..base_input()
        };
        match calculate_affordability(&input).unwrap_err() {
            MortgageError::ValidationFailed(failures) => {
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].field, "interest_rate");
            }
            other => panic!("Expected ValidationFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_home_value_is_loan_plus_down_payment() {
        let out = calculate_affordability(&base_input()).unwrap().result;
        assert_eq!(out.home_value, out.loan_amount + out.down_payment);
        assert!(out.loan_amount % dec!(100) == Decimal::ZERO);
        assert!(out.down_payment % dec!(100) == Decimal::ZERO);
    }
}
