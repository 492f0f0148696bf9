use napi::Result as NapiResult;
use napi_derive::napi;

use mortgage_calc_core::calculators as calc;
use mortgage_calc_core::registry::CalculatorRegistry;

/// Convert any Display error into a napi::Error.
fn to_napi_error(e: impl std::fmt::Display) -> napi::Error {
    napi::Error::from_reason(e.to_string())
}

#[napi]
pub fn affordability(input_json: String) -> NapiResult<String> {
    let input: calc::affordability::AffordabilityInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = calc::affordability::calculate_affordability(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn monthly_payment(input_json: String) -> NapiResult<String> {
    let input: calc::monthly_payment::MonthlyPaymentInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = calc::monthly_payment::calculate_monthly_payment(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn compare_loans(input_json: String) -> NapiResult<String> {
    let input: calc::loan_comparison::LoanComparisonInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = calc::loan_comparison::compare_loans(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

#[napi]
pub fn refinance(input_json: String) -> NapiResult<String> {
    let input: calc::refinance::RefinanceInput =
        serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = calc::refinance::analyze_refinance(&input).map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}

/// Run a calculator by name, e.g. `calculate("monthly-payment", json)`.
#[napi]
pub fn calculate(calculator: String, input_json: String) -> NapiResult<String> {
    let body: serde_json::Value = serde_json::from_str(&input_json).map_err(to_napi_error)?;
    let output = CalculatorRegistry::new()
        .dispatch_by_name(&calculator, body)
        .map_err(to_napi_error)?;
    serde_json::to_string(&output).map_err(to_napi_error)
}
