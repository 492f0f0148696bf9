use chrono::NaiveDate;
use mortgage_calc_core::calculators::refinance::{
    analyze_refinance, CurrentLoanInput, RefinanceInput, RefinanceLoanInput, TaxRates,
};
use mortgage_calc_core::MortgageError;
use pretty_assertions::assert_eq;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn request(refi_rate: Decimal, years_before_sale: u32) -> RefinanceInput {
    RefinanceInput {
        home_value: dec!(400_000),
        current_loan: CurrentLoanInput {
            original_amount: dec!(200_000),
            interest_rate: dec!(5),
            term_years: 30,
            pmi_rate: dec!(0.5),
            months_paid: 24,
        },
        refinance_loan: RefinanceLoanInput {
            interest_rate: refi_rate,
            term_years: 30,
            pmi_rate: Decimal::ZERO,
            points: dec!(1),
            origination_fees: dec!(1.1),
            closing_costs: dec!(3000),
            years_before_sale,
        },
        tax_rates: TaxRates {
            state_tax_rate: dec!(5),
            federal_tax_rate: dec!(36),
        },
        start_date: NaiveDate::from_ymd_opt(2025, 1, 1),
    }
}

#[test]
fn test_net_figures_are_consistent() {
    let out = analyze_refinance(&request(dec!(4.5), 5)).unwrap().result;

    assert_eq!(out.months_before_sale, 60);
    assert_eq!(out.total_losses, out.balance_losses + out.tax_savings_losses);
    let benefit = out.monthly_payment_savings - out.total_losses - out.total_closing_costs;
    assert!((benefit - out.total_benefit).abs() <= dec!(0.02));
    assert_eq!(
        out.total_closing_costs,
        out.refinance_loan.points + out.refinance_loan.origination_fees + dec!(3000)
    );
}

#[test]
fn test_deep_rate_cut_pays_off() {
    let small = analyze_refinance(&request(dec!(4.5), 10)).unwrap().result;
    let deep = analyze_refinance(&request(dec!(3), 10)).unwrap().result;

    assert!(deep.total_benefit > small.total_benefit);
    assert!(deep.is_beneficial);
    assert!(deep.refinance_loan.monthly_payment < small.refinance_loan.monthly_payment);
}

#[test]
fn test_lower_interest_loses_deduction() {
    let out = analyze_refinance(&request(dec!(3), 5)).unwrap().result;
    assert!(out.refinance_loan.interest_paid < out.current_loan.interest_paid);
    assert!(out.tax_savings_losses > Decimal::ZERO);
}

#[test]
fn test_longer_holding_period_accumulates_savings() {
    let five = analyze_refinance(&request(dec!(3), 5)).unwrap().result;
    let ten = analyze_refinance(&request(dec!(3), 10)).unwrap().result;
    assert!(ten.monthly_payment_savings > five.monthly_payment_savings);
    let approx = ten.refinance_loan.monthly_payment * Decimal::from(120u32);
    assert!((ten.refinance_loan.total_monthly_payments - approx).abs() <= dec!(0.60));
}

#[test]
fn test_months_paid_past_term_rejected() {
    let mut input = request(dec!(4.5), 5);
    input.current_loan.months_paid = 360;
    match analyze_refinance(&input).unwrap_err() {
        MortgageError::ValidationFailed(failures) => {
            assert_eq!(failures.len(), 1);
            assert_eq!(failures[0].field, "current_loan.months_paid");
        }
        other => panic!("Expected ValidationFailed, got {other:?}"),
    }
}

#[test]
fn test_refinance_is_idempotent() {
    let input = request(dec!(4), 7);
    let a = analyze_refinance(&input).unwrap();
    let b = analyze_refinance(&input).unwrap();
    assert_eq!(a.result, b.result);
}
