//! Refinance break-even over a holding period.
//!
//! Compares keeping the current loan against refinancing its remaining
//! balance, up to the month the home is sold. Mortgage interest is treated
//! as deductible at the combined state and federal rate, so lower interest
//! also means a smaller deduction. The equity left at sale is part of the
//! comparison: a longer refinance term pays down less principal.

use chrono::NaiveDate;
use log::{debug, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::amortization::{build_amortization, sub_months, Amortization};
use crate::loan_math::{
    loan_to_value, monthly_payment, origination_fees, points, to_dollars, MONTHS_PER_YEAR,
};
use crate::types::{resolve_start_date, with_metadata, ComputationOutput, Money, Percent};
use crate::validation::{ensure_valid, validate_refinance};
use crate::MortgageResult;

const HUNDRED: Decimal = dec!(100);

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentLoanInput {
    pub original_amount: Money,
    pub interest_rate: Percent,
    pub term_years: u32,
    #[serde(default)]
    pub pmi_rate: Percent,
    /// Payments already made on the loan.
    pub months_paid: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceLoanInput {
    pub interest_rate: Percent,
    pub term_years: u32,
    #[serde(default)]
    pub pmi_rate: Percent,
    pub points: Percent,
    pub origination_fees: Percent,
    pub closing_costs: Money,
    /// Holding period before the home is sold.
    pub years_before_sale: u32,
}

/// Marginal income tax rates, in percent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaxRates {
    pub state_tax_rate: Percent,
    pub federal_tax_rate: Percent,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefinanceInput {
    pub home_value: Money,
    pub current_loan: CurrentLoanInput,
    pub refinance_loan: RefinanceLoanInput,
    pub tax_rates: TaxRates,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentLoanBreakdown {
    pub loan_amount: Money,
    pub monthly_payment: Money,
    /// Payments made during the holding period.
    pub total_monthly_payments: Money,
    /// Balance today, before refinancing.
    pub remaining_balance: Money,
    pub balance_at_sale: Money,
    pub interest_paid: Money,
    pub tax_savings: Money,
    pub amortization: Amortization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinancedLoanBreakdown {
    pub loan_amount: Money,
    pub monthly_payment: Money,
    pub total_monthly_payments: Money,
    pub balance_at_sale: Money,
    pub interest_paid: Money,
    pub tax_savings: Money,
    pub points: Money,
    pub origination_fees: Money,
    pub amortization: Amortization,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinanceOutput {
    pub current_loan: CurrentLoanBreakdown,
    pub refinance_loan: RefinancedLoanBreakdown,
    pub months_before_sale: u32,
    /// Payment reduction accumulated over the holding period.
    pub monthly_payment_savings: Money,
    /// Deduction given up by paying less interest.
    pub tax_savings_losses: Money,
    /// Extra balance still owed at sale on the refinanced loan.
    pub balance_losses: Money,
    pub total_losses: Money,
    pub total_closing_costs: Money,
    pub total_benefit: Money,
    pub is_beneficial: bool,
}

pub fn analyze_refinance(
    input: &RefinanceInput,
) -> MortgageResult<ComputationOutput<RefinanceOutput>> {
    let start = Instant::now();
    ensure_valid(validate_refinance(input))?;

    let start_date = resolve_start_date(input.start_date);
    let (output, warnings) = compute_refinance(input, start_date)?;

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Refinance benefit net of closing costs, lost deductions and equity at sale",
        input,
        warnings,
        elapsed,
        output,
    ))
}

fn compute_refinance(
    input: &RefinanceInput,
    start_date: NaiveDate,
) -> MortgageResult<(RefinanceOutput, Vec<String>)> {
    let mut warnings: Vec<String> = Vec::new();
    let current = &input.current_loan;
    let refi = &input.refinance_loan;

    let tax_rate = (input.tax_rates.state_tax_rate + input.tax_rates.federal_tax_rate) / HUNDRED;
    let months_before_sale = refi.years_before_sale * MONTHS_PER_YEAR;
    let window = Decimal::from(months_before_sale);
    let sale_month = current.months_paid + months_before_sale;
    debug!(
        "refinance: {} months paid, selling after {} more",
        current.months_paid, months_before_sale
    );

    // Current loan, originated `months_paid` months ago.
    let current_payment =
        monthly_payment(current.original_amount, current.interest_rate, current.term_years)?;
    let current_amortization = build_amortization(
        current.original_amount,
        current.interest_rate,
        current.term_years * MONTHS_PER_YEAR,
        sub_months(start_date, current.months_paid)?,
        input.home_value,
        current.pmi_rate,
    )?;
    let remaining_balance = current_amortization.balance_after(current.months_paid);
    let current_interest = current_amortization.interest_between(current.months_paid, sale_month);
    let current_balance_at_sale = current_amortization.balance_after(sale_month);
    let current_tax_savings = current_interest * tax_rate;

    // Refinance of the remaining balance, starting today.
    let points_cost = points(remaining_balance, refi.points)?;
    let origination_cost = origination_fees(remaining_balance, refi.origination_fees)?;
    let refi_payment = monthly_payment(remaining_balance, refi.interest_rate, refi.term_years)?;
    let refi_amortization = build_amortization(
        remaining_balance,
        refi.interest_rate,
        refi.term_years * MONTHS_PER_YEAR,
        start_date,
        input.home_value,
        refi.pmi_rate,
    )?;
    let refi_interest = refi_amortization.interest_between(0, months_before_sale);
    let refi_balance_at_sale = refi_amortization.balance_after(months_before_sale);
    let refi_tax_savings = refi_interest * tax_rate;

    let monthly_payment_savings = (current_payment - refi_payment) * window;
    let tax_savings_losses = current_tax_savings - refi_tax_savings;
    let balance_losses = refi_balance_at_sale - current_balance_at_sale;
    let total_losses = balance_losses + tax_savings_losses;
    let total_closing_costs = points_cost + origination_cost + refi.closing_costs;
    let total_benefit = monthly_payment_savings - total_losses - total_closing_costs;

    if loan_to_value(remaining_balance, input.home_value)? > HUNDRED {
        let msg = format!(
            "Remaining balance {} exceeds the home value {}",
            remaining_balance, input.home_value
        );
        warn!("refinance: {msg}");
        warnings.push(msg);
    }
    if months_before_sale == 0 {
        warnings.push(
            "Holding period is zero; only closing costs affect the result".to_string(),
        );
    }
    if total_benefit <= Decimal::ZERO {
        let msg = format!(
            "Refinancing is not beneficial over {} years: net cost {}",
            refi.years_before_sale,
            to_dollars(-total_benefit)
        );
        warn!("refinance: {msg}");
        warnings.push(msg);
    }

    let output = RefinanceOutput {
        current_loan: CurrentLoanBreakdown {
            loan_amount: to_dollars(current.original_amount),
            monthly_payment: to_dollars(current_payment),
            total_monthly_payments: to_dollars(current_payment * window),
            remaining_balance,
            balance_at_sale: current_balance_at_sale,
            interest_paid: current_interest,
            tax_savings: to_dollars(current_tax_savings),
            amortization: current_amortization,
        },
        refinance_loan: RefinancedLoanBreakdown {
            loan_amount: remaining_balance,
            monthly_payment: to_dollars(refi_payment),
            total_monthly_payments: to_dollars(refi_payment * window),
            balance_at_sale: refi_balance_at_sale,
            interest_paid: refi_interest,
            tax_savings: to_dollars(refi_tax_savings),
            points: to_dollars(points_cost),
            origination_fees: to_dollars(origination_cost),
            amortization: refi_amortization,
        },
        months_before_sale,
        monthly_payment_savings: to_dollars(monthly_payment_savings),
        tax_savings_losses: to_dollars(tax_savings_losses),
        balance_losses: to_dollars(balance_losses),
        total_losses: to_dollars(total_losses),
        total_closing_costs: to_dollars(total_closing_costs),
        total_benefit: to_dollars(total_benefit),
        is_beneficial: total_benefit > Decimal::ZERO,
    };

    Ok((output, warnings))
}
