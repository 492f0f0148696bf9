use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use mortgage_calc_core::calculators::monthly_payment::{self, MonthlyPaymentInput};

use super::required;
use crate::input;

/// Arguments for the monthly payment calculator
#[derive(Args)]
pub struct MonthlyPaymentArgs {
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    #[arg(long)]
    pub home_value: Option<Decimal>,

    /// Annual interest rate in percent (e.g. 6.5)
    #[arg(long)]
    pub interest_rate: Option<Decimal>,

    #[arg(long, default_value = "30")]
    pub term_years: u32,

    /// Annual PMI rate in percent, charged while LTV is above 80%
    #[arg(long, default_value = "0")]
    pub pmi_rate: Decimal,

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

pub fn run_monthly_payment(args: MonthlyPaymentArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: MonthlyPaymentInput = match input::read_request(args.input.as_deref())? {
        Some(request) => request,
        None => MonthlyPaymentInput {
            loan_amount: args.loan_amount.ok_or_else(|| required("loan-amount"))?,
            home_value: args.home_value.ok_or_else(|| required("home-value"))?,
            pmi_rate: args.pmi_rate,
            annual_taxes: args.annual_taxes.ok_or_else(|| required("annual-taxes"))?,
            annual_insurance: args
                .annual_insurance
                .ok_or_else(|| required("annual-insurance"))?,
            interest_rate: args.interest_rate.ok_or_else(|| required("interest-rate"))?,
            term_years: args.term_years,
            start_date: args.start_date,
        },
    };

    let result = monthly_payment::calculate_monthly_payment(&request)?;
    Ok(serde_json::to_value(result)?)
}
