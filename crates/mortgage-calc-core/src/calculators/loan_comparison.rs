//! Side-by-side cost of competing loan offers for the same principal.

use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{build_amortization, Amortization};
use crate::error::MortgageError;
use crate::loan_math::{monthly_payment, origination_fees, points, to_dollars, MONTHS_PER_YEAR};
use crate::types::{resolve_start_date, with_metadata, ComputationOutput, Money, Percent};
use crate::validation::{ensure_valid, validate_loan_comparison};
use crate::MortgageResult;

/// One lender's quote.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanOffer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub interest_rate: Percent,
    pub term_years: u32,
    /// Discount points as a percentage of the loan amount.
    pub points: Percent,
    /// Origination fee as a percentage of the loan amount.
    pub origination_fees: Percent,
    /// Flat closing costs in dollars.
    pub closing_costs: Money,
    pub home_value: Money,
    #[serde(default)]
    pub pmi_rate: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanComparisonInput {
    pub loan_amount: Money,
    pub loans: Vec<LoanOffer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanOfferResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub interest_rate: Percent,
    pub term_years: u32,
    pub points: Money,
    pub origination_fees: Money,
    pub closing_costs: Money,
    /// Points, origination and flat closing costs combined.
    pub total_closing_costs: Money,
    pub monthly_principal_and_interest: Money,
    pub amortization: Amortization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanComparisonOutput {
    pub loan_amount: Money,
    pub loans: Vec<LoanOfferResult>,
    /// Lifetime payments of the dearest offer less those of the cheapest.
    pub total_savings: Money,
    pub cheapest_offer: usize,
    pub most_expensive_offer: usize,
}

pub fn compare_loans(
    input: &LoanComparisonInput,
) -> MortgageResult<ComputationOutput<LoanComparisonOutput>> {
    let start = Instant::now();
    ensure_valid(validate_loan_comparison(input))?;

    let start_date = resolve_start_date(input.start_date);
    let output = compare_offers(input.loan_amount, &input.loans, start_date)?;

    let mut warnings = Vec::new();
    if output.total_savings.is_zero() {
        warnings.push("All offers cost the same over their lifetime".to_string());
    }

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Lifetime payment comparison of level-payment offers",
        input,
        warnings,
        elapsed,
        output,
    ))
}

/// Evaluate and rank any number of offers; the request-level validator
/// limits user requests to a pair.
pub fn compare_offers(
    loan_amount: Money,
    offers: &[LoanOffer],
    start_date: NaiveDate,
) -> MortgageResult<LoanComparisonOutput> {
    if offers.is_empty() {
        return Err(MortgageError::InsufficientData(
            "At least one loan offer is required".into(),
        ));
    }

    let loans = offers
        .iter()
        .map(|offer| evaluate_offer(loan_amount, offer, start_date))
        .collect::<MortgageResult<Vec<_>>>()?;

    let (cheapest_offer, cheapest) = loans
        .iter()
        .enumerate()
        .min_by_key(|(_, l)| l.amortization.total_payment)
        .ok_or_else(|| MortgageError::InsufficientData("No offers to rank".into()))?;
    let (most_expensive_offer, most_expensive) = loans
        .iter()
        .enumerate()
        .max_by_key(|(_, l)| l.amortization.total_payment)
        .ok_or_else(|| MortgageError::InsufficientData("No offers to rank".into()))?;

    let total_savings =
        most_expensive.amortization.total_payment - cheapest.amortization.total_payment;
    debug!(
        "loan comparison: offer {cheapest_offer} is cheapest, offer {most_expensive_offer} dearest, spread {total_savings}"
    );

    Ok(LoanComparisonOutput {
        loan_amount,
        loans,
        total_savings,
        cheapest_offer,
        most_expensive_offer,
    })
}

fn evaluate_offer(
    loan_amount: Money,
    offer: &LoanOffer,
    start_date: NaiveDate,
) -> MortgageResult<LoanOfferResult> {
    let points_cost = points(loan_amount, offer.points)?;
    let origination_cost = origination_fees(loan_amount, offer.origination_fees)?;
    let principal_and_interest =
        monthly_payment(loan_amount, offer.interest_rate, offer.term_years)?;

    let amortization = build_amortization(
        loan_amount,
        offer.interest_rate,
        offer.term_years * MONTHS_PER_YEAR,
        start_date,
        offer.home_value,
        offer.pmi_rate,
    )?;

    Ok(LoanOfferResult {
        label: offer.label.clone(),
        interest_rate: offer.interest_rate,
        term_years: offer.term_years,
        points: to_dollars(points_cost),
        origination_fees: to_dollars(origination_cost),
        closing_costs: to_dollars(offer.closing_costs),
        total_closing_costs: to_dollars(offer.closing_costs + points_cost + origination_cost),
        monthly_principal_and_interest: to_dollars(principal_and_interest),
        amortization,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;

    fn assert_close(actual: Decimal, expected: Decimal, tol: Decimal, msg: &str) {
        let diff = (actual - expected).abs();
        assert!(
            diff <= tol,
            "{}: expected ~{}, got {} (diff = {})",
            msg,
            expected,
            actual,
            diff
        );
    }

    fn jan_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn offer(rate: Decimal) -> LoanOffer {
        LoanOffer {
            label: None,
            interest_rate: rate,
            term_years: 30,
            points: dec!(1),
            origination_fees: dec!(0.5),
            closing_costs: dec!(3000),
            home_value: dec!(250_000),
            pmi_rate: Decimal::ZERO,
        }
    }

    #[test]
    fn test_lower_rate_is_cheaper() {
        let input = LoanComparisonInput {
            loan_amount: dec!(200_000),
            loans: vec![offer(dec!(5)), offer(dec!(4))],
            start_date: Some(jan_first()),
        };
        let out = compare_loans(&input).unwrap().result;

        assert_eq!(out.loans[0].monthly_principal_and_interest, dec!(1073.64));
        assert_eq!(out.loans[1].monthly_principal_and_interest, dec!(954.83));
        assert_close(
            out.loans[0].amortization.total_payment,
            dec!(386_511.57),
            dec!(0.01),
            "5% total payment",
        );
        assert_close(
            out.loans[1].amortization.total_payment,
            dec!(343_739.01),
            dec!(0.01),
            "4% total payment",
        );
        assert_close(out.total_savings, dec!(42_772.56), dec!(0.02), "savings");
        assert_eq!(out.cheapest_offer, 1);
        assert_eq!(out.most_expensive_offer, 0);
    }

    #[test]
    fn test_closing_costs_are_itemised() {
        let input = LoanComparisonInput {
            loan_amount: dec!(200_000),
            loans: vec![offer(dec!(5)), offer(dec!(4))],
            start_date: Some(jan_first()),
        };
        let out = compare_loans(&input).unwrap().result;
        let first = &out.loans[0];
        assert_eq!(first.points, dec!(2000.00));
        assert_eq!(first.origination_fees, dec!(1000.00));
        assert_eq!(first.total_closing_costs, dec!(6000.00));
    }

    #[test]
    fn test_identical_offers_save_nothing() {
        let input = LoanComparisonInput {
            loan_amount: dec!(200_000),
            loans: vec![offer(dec!(5)), offer(dec!(5))],
            start_date: Some(jan_first()),
        };
        let output = compare_loans(&input).unwrap();
        assert_eq!(output.result.total_savings, Decimal::ZERO);
        assert_eq!(output.warnings.len(), 1);
    }

    #[test]
    fn test_ranks_more_than_two_offers() {
        let offers = vec![offer(dec!(6)), offer(dec!(4.5)), offer(dec!(7)), offer(dec!(5))];
        let out = compare_offers(dec!(200_000), &offers, jan_first()).unwrap();

        assert_eq!(out.loans.len(), 4);
        assert_eq!(out.cheapest_offer, 1);
        assert_eq!(out.most_expensive_offer, 2);
        assert!(out.total_savings > Decimal::ZERO);
        for loan in &out.loans {
            let total = loan.amortization.total_payment;
            assert!(total >= out.loans[out.cheapest_offer].amortization.total_payment);
            assert!(total <= out.loans[out.most_expensive_offer].amortization.total_payment);
        }
    }

    #[test]
    fn test_no_offers_is_insufficient_data() {
        let err = compare_offers(dec!(200_000), &[], jan_first()).unwrap_err();
        assert!(matches!(err, MortgageError::InsufficientData(_)));
    }
}
