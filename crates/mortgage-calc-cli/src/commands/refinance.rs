use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use mortgage_calc_core::calculators::refinance::{
    self, CurrentLoanInput, RefinanceInput, RefinanceLoanInput, TaxRates,
};

use super::required;
use crate::input;

/// Arguments for the refinance analysis
#[derive(Args)]
pub struct RefinanceArgs {
    #[arg(long)]
    pub home_value: Option<Decimal>,

    /// Original amount of the current loan
    #[arg(long)]
    pub original_amount: Option<Decimal>,

    /// Current loan interest rate in percent
    #[arg(long)]
    pub current_rate: Option<Decimal>,

    #[arg(long, default_value = "30")]
    pub current_term: u32,

    #[arg(long, default_value = "0")]
    pub current_pmi_rate: Decimal,

    /// Payments already made on the current loan
    #[arg(long, default_value = "0")]
    pub months_paid: u32,

    /// Refinance interest rate in percent
    #[arg(long)]
    pub refinance_rate: Option<Decimal>,

    #[arg(long, default_value = "30")]
    pub refinance_term: u32,

    #[arg(long, default_value = "0")]
    pub refinance_pmi_rate: Decimal,

    /// Discount points in percent of the refinanced balance
    #[arg(long, default_value = "0")]
    pub points: Decimal,

    /// Origination fee in percent of the refinanced balance
    #[arg(long, default_value = "0")]
    pub origination_fees: Decimal,

    #[arg(long)]
    pub closing_costs: Option<Decimal>,

    /// Years until the home is sold
    #[arg(long)]
    pub years_before_sale: Option<u32>,

    #[arg(long, default_value = "0")]
    pub state_tax_rate: Decimal,

    #[arg(long, default_value = "0")]
    pub federal_tax_rate: Decimal,

    /// Date of the refinance (defaults to today)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_refinance(args: RefinanceArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: RefinanceInput = match input::read_request(args.input.as_deref())? {
        Some(request) => request,
        None => RefinanceInput {
            home_value: args.home_value.ok_or_else(|| required("home-value"))?,
            current_loan: CurrentLoanInput {
                original_amount: args
                    .original_amount
                    .ok_or_else(|| required("original-amount"))?,
                interest_rate: args.current_rate.ok_or_else(|| required("current-rate"))?,
                term_years: args.current_term,
                pmi_rate: args.current_pmi_rate,
                months_paid: args.months_paid,
            },
            refinance_loan: RefinanceLoanInput {
                interest_rate: args
                    .refinance_rate
                    .ok_or_else(|| required("refinance-rate"))?,
                term_years: args.refinance_term,
                pmi_rate: args.refinance_pmi_rate,
                points: args.points,
                origination_fees: args.origination_fees,
                closing_costs: args.closing_costs.ok_or_else(|| required("closing-costs"))?,
                years_before_sale: args
                    .years_before_sale
                    .ok_or_else(|| required("years-before-sale"))?,
            },
            tax_rates: TaxRates {
                state_tax_rate: args.state_tax_rate,
                federal_tax_rate: args.federal_tax_rate,
            },
            start_date: args.start_date,
        },
    };

    let result = refinance::analyze_refinance(&request)?;
    Ok(serde_json::to_value(result)?)
}
