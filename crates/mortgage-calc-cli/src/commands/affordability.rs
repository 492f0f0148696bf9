use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::Value;

use mortgage_calc_core::calculators::affordability::{self, AffordabilityInput};

use super::required;
use crate::input;

/// Arguments for the affordability calculator
#[derive(Args)]
pub struct AffordabilityArgs {
    /// Gross monthly income
    #[arg(long)]
    pub monthly_income: Option<Decimal>,

    /// Monthly debt payments other than housing
    #[arg(long, default_value = "0")]
    pub monthly_expenses: Decimal,

    /// Down payment as a percentage of the price (e.g. 20)
    #[arg(long, default_value = "20")]
    pub down_payment: Decimal,

    /// Annual interest rate in percent (e.g. 6.5)
    #[arg(long)]
    pub interest_rate: Option<Decimal>,

    /// Loan term in years
    #[arg(long, default_value = "30")]
    pub term_years: u32,

    /// Annual PMI rate in percent
    #[arg(long, default_value = "0")]
    pub pmi_rate: Decimal,

    /// Front-end (housing) ratio in percent
    #[arg(long, default_value = "28")]
    pub front_ratio: Decimal,

    /// Back-end (total debt) ratio in percent
    #[arg(long, default_value = "36")]
    pub back_ratio: Decimal,

    #[arg(long)]
    pub annual_taxes: Option<Decimal>,

    #[arg(long)]
    pub annual_insurance: Option<Decimal>,

    /// First payment date (defaults to today)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_affordability(args: AffordabilityArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: AffordabilityInput = match input::read_request(args.input.as_deref())? {
        Some(request) => request,
        None => AffordabilityInput {
            monthly_income: args.monthly_income.ok_or_else(|| required("monthly-income"))?,
            monthly_expenses: args.monthly_expenses,
            down_payment: args.down_payment,
            interest_rate: args.interest_rate.ok_or_else(|| required("interest-rate"))?,
            term_years: args.term_years,
            pmi_rate: args.pmi_rate,
            front_ratio: args.front_ratio,
            back_ratio: args.back_ratio,
            annual_taxes: args.annual_taxes.unwrap_or(Decimal::ZERO),
            annual_insurance: args.annual_insurance.unwrap_or(dec!(1200)),
            start_date: args.start_date,
        },
    };

    let result = affordability::calculate_affordability(&request)?;
    Ok(serde_json::to_value(result)?)
}
