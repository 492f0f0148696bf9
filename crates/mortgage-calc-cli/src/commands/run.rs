use clap::Args;
use serde_json::{json, Value};

use mortgage_calc_core::registry::{CalculatorKind, CalculatorRegistry};

use crate::input;

/// Arguments for running a calculator by name on a JSON request
#[derive(Args)]
pub struct RunArgs {
    /// Calculator name (e.g. monthly-payment, loan_comparison)
    #[arg(long)]
    pub calculator: String,

    /// Path to JSON input file (stdin is read when omitted)
    #[arg(long)]
    pub input: Option<String>,
}

pub fn run_calculator(args: RunArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let body: Value = input::read_request(args.input.as_deref())?
        .ok_or("--input <file.json> or stdin required for run")?;
    let registry = CalculatorRegistry::new();
    Ok(registry.dispatch_by_name(&args.calculator, body)?)
}

pub fn run_list() -> Result<Value, Box<dyn std::error::Error>> {
    let registry = CalculatorRegistry::new();
    let calculators: Vec<Value> = registry
        .kinds()
        .map(|kind: CalculatorKind| {
            json!({
                "name": kind.name(),
                "description": kind.description(),
            })
        })
        .collect();
    Ok(Value::Array(calculators))
}
