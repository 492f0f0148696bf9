//! Full monthly housing payment: principal and interest, escrowed taxes and
//! insurance, and PMI while the loan-to-value stays high.

use chrono::NaiveDate;
use log::debug;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{build_amortization, Amortization};
use crate::loan_math::{
    has_pmi, loan_to_value, monthly_payment, pmi_annual_amount, to_dollars, MONTHS_PER_YEAR,
    PMI_LTV_THRESHOLD,
};
use crate::types::{resolve_start_date, with_metadata, ComputationOutput, Money, Percent};
use crate::validation::{ensure_valid, validate_monthly_payment};
use crate::MortgageResult;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthlyPaymentInput {
    pub loan_amount: Money,
    pub home_value: Money,
    #[serde(default)]
    pub pmi_rate: Percent,
    pub annual_taxes: Money,
    pub annual_insurance: Money,
    pub interest_rate: Percent,
    pub term_years: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPaymentOutput {
    /// Principal and interest plus taxes, insurance and PMI.
    pub monthly_payment: Money,
    pub monthly_principal_and_interest: Money,
    pub monthly_taxes: Money,
    pub monthly_insurance: Money,
    pub loan_to_value: Percent,
    pub monthly_pmi: Money,
    pub total_pmi: Money,
    /// Date of the last payment that carries PMI.
    pub pmi_removal_date: Option<NaiveDate>,
    pub amortization: Amortization,
}

pub fn calculate_monthly_payment(
    input: &MonthlyPaymentInput,
) -> MortgageResult<ComputationOutput<MonthlyPaymentOutput>> {
    let start = Instant::now();
    ensure_valid(validate_monthly_payment(input))?;

    let start_date = resolve_start_date(input.start_date);
    let (output, warnings) = compute_monthly_payment(input, start_date)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Level-payment amortization with escrow and LTV-based PMI",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn compute_monthly_payment(
    input: &MonthlyPaymentInput,
    start_date: NaiveDate,
) -> MortgageResult<(MonthlyPaymentOutput, Vec<String>)> {
    let mut warnings: Vec<String> = Vec::new();
    let months = Decimal::from(MONTHS_PER_YEAR);

    let ltv = loan_to_value(input.loan_amount, input.home_value)?;
    let monthly_pmi = if has_pmi(ltv, input.pmi_rate)? {
        pmi_annual_amount(input.loan_amount, input.pmi_rate) / months
    } else {
        Decimal::ZERO
    };
    let monthly_taxes = input.annual_taxes / months;
    let monthly_insurance = input.annual_insurance / months;
    let principal_and_interest =
        monthly_payment(input.loan_amount, input.interest_rate, input.term_years)?;

    let mut amortization = build_amortization(
        input.loan_amount,
        input.interest_rate,
        input.term_years * MONTHS_PER_YEAR,
        start_date,
        input.home_value,
        input.pmi_rate,
    )?;

    // PMI column follows the rounded balance and stays on through exactly 80% LTV.
    let tagged_pmi = to_dollars(monthly_pmi);
    let home_value = input.home_value;
    amortization.retag_pmi(|period| {
        let period_ltv = loan_to_value(period.balance, home_value)?;
        Ok(if period_ltv >= PMI_LTV_THRESHOLD {
            tagged_pmi
        } else {
            Decimal::ZERO
        })
    })?;

    let pmi_removal_date = amortization.last_pmi_date();
    if let Some(date) = pmi_removal_date {
        debug!(
            "monthly payment: PMI {} for {} months",
            tagged_pmi, amortization.months_with_pmi
        );
        warnings.push(format!(
            "PMI of {} per month is charged through {}",
            tagged_pmi, date
        ));
    }

    let output = MonthlyPaymentOutput {
        monthly_payment: to_dollars(
            principal_and_interest + monthly_taxes + monthly_insurance + monthly_pmi,
        ),
        monthly_principal_and_interest: to_dollars(principal_and_interest),
        monthly_taxes: to_dollars(monthly_taxes),
        monthly_insurance: to_dollars(monthly_insurance),
        loan_to_value: ltv.round_dp(2),
        monthly_pmi: tagged_pmi,
        total_pmi: amortization.total_pmi(),
        pmi_removal_date,
        amortization,
    };

    Ok((output, warnings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MortgageError;
    use rust_decimal_macros::dec;

    fn jan_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn base_input() -> MonthlyPaymentInput {
        MonthlyPaymentInput {
            loan_amount: dec!(280_000),
            home_value: dec!(350_000),
            pmi_rate: dec!(1),
            annual_taxes: dec!(3000),
            annual_insurance: dec!(1500),
            interest_rate: dec!(6.5),
            term_years: 30,
            start_date: Some(jan_first()),
        }
    }

    #[test]
    fn test_no_pmi_at_eighty_percent() {
        let output = calculate_monthly_payment(&base_input()).unwrap();
        let out = &output.result;

        assert_eq!(out.monthly_payment, dec!(2144.79));
        assert_eq!(out.monthly_principal_and_interest, dec!(1769.79));
        assert_eq!(out.monthly_taxes, dec!(250.00));
        assert_eq!(out.monthly_insurance, dec!(125.00));
        assert_eq!(out.loan_to_value, dec!(80.00));
        assert_eq!(out.monthly_pmi, Decimal::ZERO);
        assert_eq!(out.amortization.months_with_pmi, 0);
        assert_eq!(out.pmi_removal_date, None);
        assert!(output.warnings.is_empty());
    }

    #[test]
    fn test_pmi_until_ltv_reaches_eighty() {
        let input = MonthlyPaymentInput {
            loan_amount: dec!(300_000),
            ..base_input()
        };
        let out = calculate_monthly_payment(&input).unwrap().result;

        assert_eq!(out.monthly_payment, dec!(2521.20));
        assert_eq!(out.monthly_principal_and_interest, dec!(1896.20));
        assert_eq!(out.monthly_pmi, dec!(250.00));
        assert_eq!(out.loan_to_value, dec!(85.71));
        assert_eq!(out.amortization.months_with_pmi, 62);
        assert_eq!(out.total_pmi, dec!(15_500));
        assert_eq!(
            out.pmi_removal_date,
            Some(NaiveDate::from_ymd_opt(2030, 2, 1).unwrap())
        );
        assert!(out.amortization.schedule[62..].iter().all(|p| p.pmi.is_zero()));
    }

    #[test]
    fn test_zero_pmi_rate_never_charges() {
        let input = MonthlyPaymentInput {
            loan_amount: dec!(300_000),
            pmi_rate: Decimal::ZERO,
            ..base_input()
        };
        let out = calculate_monthly_payment(&input).unwrap().result;
        assert_eq!(out.monthly_pmi, Decimal::ZERO);
        assert_eq!(out.amortization.months_with_pmi, 0);
        assert_eq!(out.monthly_payment, dec!(2271.20));
    }

    #[test]
    fn test_pmi_above_ten_percent_rejected() {
        let input = MonthlyPaymentInput {
            pmi_rate: dec!(11),
            ..base_input()
        };
        match calculate_monthly_payment(&input).unwrap_err() {
            MortgageError::ValidationFailed(failures) => {
                assert_eq!(failures[0].field, "pmi_rate");
            }
            other => panic!("Expected ValidationFailed, got {other:?}"),
        }
    }
}
