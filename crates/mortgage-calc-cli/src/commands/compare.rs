use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use mortgage_calc_core::calculators::loan_comparison::{
    self, LoanComparisonInput, LoanOffer,
};

use super::required;
use crate::input;

/// Arguments for comparing two loan offers
#[derive(Args)]
pub struct CompareArgs {
    #[arg(long)]
    pub loan_amount: Option<Decimal>,

    /// Home value used for each offer's PMI test
    #[arg(long)]
    pub home_value: Option<Decimal>,

    #[arg(long, default_value = "0")]
    pub pmi_rate: Decimal,

    /// Offer A interest rate in percent
    #[arg(long)]
    pub rate_a: Option<Decimal>,

    #[arg(long, default_value = "30")]
    pub term_a: u32,

    /// Offer A discount points in percent
    #[arg(long, default_value = "0")]
    pub points_a: Decimal,

    /// Offer A origination fee in percent
    #[arg(long, default_value = "0")]
    pub fees_a: Decimal,

    /// Offer A flat closing costs
    #[arg(long, default_value = "500")]
    pub closing_a: Decimal,

    /// Offer B interest rate in percent
    #[arg(long)]
    pub rate_b: Option<Decimal>,

    #[arg(long, default_value = "30")]
    pub term_b: u32,

    #[arg(long, default_value = "0")]
    pub points_b: Decimal,

    #[arg(long, default_value = "0")]
    pub fees_b: Decimal,

    #[arg(long, default_value = "500")]
    pub closing_b: Decimal,

    /// First payment date (defaults to today)
    #[arg(long)]
    pub start_date: Option<NaiveDate>,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_compare(args: CompareArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: LoanComparisonInput = match input::read_request(args.input.as_deref())? {
        Some(request) => request,
        None => {
            let home_value = args.home_value.ok_or_else(|| required("home-value"))?;
            let offer_a = LoanOffer {
                label: Some("A".into()),
                interest_rate: args.rate_a.ok_or_else(|| required("rate-a"))?,
                term_years: args.term_a,
                points: args.points_a,
                origination_fees: args.fees_a,
                closing_costs: args.closing_a,
                home_value,
                pmi_rate: args.pmi_rate,
            };
            let offer_b = LoanOffer {
                label: Some("B".into()),
                interest_rate: args.rate_b.ok_or_else(|| required("rate-b"))?,
                term_years: args.term_b,
                points: args.points_b,
                origination_fees: args.fees_b,
                closing_costs: args.closing_b,
                home_value,
                pmi_rate: args.pmi_rate,
            };
            LoanComparisonInput {
                loan_amount: args.loan_amount.ok_or_else(|| required("loan-amount"))?,
                loans: vec![offer_a, offer_b],
                start_date: args.start_date,
            }
        }
    };

    let result = loan_comparison::compare_loans(&request)?;
    Ok(serde_json::to_value(result)?)
}
