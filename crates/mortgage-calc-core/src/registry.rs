//! Calculator lookup by name.
//!
//! Hosts that only see JSON (the CLI `run` command, the Node bindings) pick a
//! calculator by its snake_case name and hand over the raw request body.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::calculators::{
    analyze_refinance, calculate_affordability, calculate_monthly_payment, compare_loans,
    AffordabilityInput, AffordabilityOutput, LoanComparisonInput, LoanComparisonOutput,
    MonthlyPaymentInput, MonthlyPaymentOutput, RefinanceInput, RefinanceOutput,
};
use crate::error::MortgageError;
use crate::types::ComputationOutput;
use crate::MortgageResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CalculatorKind {
    Affordability,
    MonthlyPayment,
    LoanComparison,
    Refinance,
}

impl CalculatorKind {
    pub const ALL: [CalculatorKind; 4] = [
        CalculatorKind::Affordability,
        CalculatorKind::MonthlyPayment,
        CalculatorKind::LoanComparison,
        CalculatorKind::Refinance,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CalculatorKind::Affordability => "affordability",
            CalculatorKind::MonthlyPayment => "monthly_payment",
            CalculatorKind::LoanComparison => "loan_comparison",
            CalculatorKind::Refinance => "refinance",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CalculatorKind::Affordability => "Maximum home price supported by income and debts",
            CalculatorKind::MonthlyPayment => "Monthly payment with taxes, insurance and PMI",
            CalculatorKind::LoanComparison => "Lifetime cost of two competing loan offers",
            CalculatorKind::Refinance => "Net benefit of refinancing before a planned sale",
        }
    }
}

impl fmt::Display for CalculatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for CalculatorKind {
    type Err = MortgageError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace('-', "_");
        CalculatorKind::ALL
            .into_iter()
            .find(|kind| kind.name() == normalized)
            .ok_or_else(|| MortgageError::UnknownCalculator(s.to_string()))
    }
}

/// A request for any calculator: `{"calculator": "...", "input": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "calculator", content = "input", rename_all = "snake_case")]
pub enum CalculatorRequest {
    Affordability(AffordabilityInput),
    MonthlyPayment(MonthlyPaymentInput),
    LoanComparison(LoanComparisonInput),
    Refinance(RefinanceInput),
}

impl CalculatorRequest {
    pub fn kind(&self) -> CalculatorKind {
        match self {
            CalculatorRequest::Affordability(_) => CalculatorKind::Affordability,
            CalculatorRequest::MonthlyPayment(_) => CalculatorKind::MonthlyPayment,
            CalculatorRequest::LoanComparison(_) => CalculatorKind::LoanComparison,
            CalculatorRequest::Refinance(_) => CalculatorKind::Refinance,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "calculator", content = "output", rename_all = "snake_case")]
pub enum CalculatorResponse {
    Affordability(ComputationOutput<AffordabilityOutput>),
    MonthlyPayment(ComputationOutput<MonthlyPaymentOutput>),
    LoanComparison(ComputationOutput<LoanComparisonOutput>),
    Refinance(ComputationOutput<RefinanceOutput>),
}

/// Run whichever calculator the request names.
pub fn calculate(request: &CalculatorRequest) -> MortgageResult<CalculatorResponse> {
    debug!("dispatching {} request", request.kind());
    Ok(match request {
        CalculatorRequest::Affordability(input) => {
            CalculatorResponse::Affordability(calculate_affordability(input)?)
        }
        CalculatorRequest::MonthlyPayment(input) => {
            CalculatorResponse::MonthlyPayment(calculate_monthly_payment(input)?)
        }
        CalculatorRequest::LoanComparison(input) => {
            CalculatorResponse::LoanComparison(compare_loans(input)?)
        }
        CalculatorRequest::Refinance(input) => {
            CalculatorResponse::Refinance(analyze_refinance(input)?)
        }
    })
}

/// JSON-in, JSON-out handler.
pub type Handler = fn(Value) -> MortgageResult<Value>;

fn json_handler<I, O>(
    run: fn(&I) -> MortgageResult<ComputationOutput<O>>,
    body: Value,
) -> MortgageResult<Value>
where
    I: for<'de> Deserialize<'de>,
    O: Serialize,
{
    let input: I = serde_json::from_value(body)?;
    let output = run(&input)?;
    Ok(serde_json::to_value(output)?)
}

fn affordability_handler(body: Value) -> MortgageResult<Value> {
    json_handler(calculate_affordability, body)
}

fn monthly_payment_handler(body: Value) -> MortgageResult<Value> {
    json_handler(calculate_monthly_payment, body)
}

fn loan_comparison_handler(body: Value) -> MortgageResult<Value> {
    json_handler(compare_loans, body)
}

fn refinance_handler(body: Value) -> MortgageResult<Value> {
    json_handler(analyze_refinance, body)
}

/// Name-to-handler table, built once by the host.
#[derive(Debug, Clone)]
pub struct CalculatorRegistry {
    handlers: BTreeMap<CalculatorKind, Handler>,
}

impl Default for CalculatorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CalculatorRegistry {
    pub fn new() -> Self {
        let mut handlers: BTreeMap<CalculatorKind, Handler> = BTreeMap::new();
        handlers.insert(CalculatorKind::Affordability, affordability_handler);
        handlers.insert(CalculatorKind::MonthlyPayment, monthly_payment_handler);
        handlers.insert(CalculatorKind::LoanComparison, loan_comparison_handler);
        handlers.insert(CalculatorKind::Refinance, refinance_handler);
        CalculatorRegistry { handlers }
    }

    pub fn get(&self, kind: CalculatorKind) -> Option<Handler> {
        self.handlers.get(&kind).copied()
    }

    pub fn kinds(&self) -> impl Iterator<Item = CalculatorKind> + '_ {
        self.handlers.keys().copied()
    }

    pub fn dispatch(&self, kind: CalculatorKind, body: Value) -> MortgageResult<Value> {
        let handler = self
            .get(kind)
            .ok_or_else(|| MortgageError::UnknownCalculator(kind.to_string()))?;
        handler(body)
    }

    pub fn dispatch_by_name(&self, name: &str, body: Value) -> MortgageResult<Value> {
        let kind: CalculatorKind = name.parse()?;
        self.dispatch(kind, body)
    }
}
