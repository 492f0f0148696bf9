use mortgage_calc_core::registry::{calculate, CalculatorKind, CalculatorRegistry, CalculatorRequest};
use mortgage_calc_core::MortgageError;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};

fn affordability_body() -> Value {
    json!({
        "monthly_income": 8000,
        "monthly_expenses": 1000,
        "down_payment": 20,
        "interest_rate": 6,
        "term_years": 30,
        "front_ratio": 28,
        "back_ratio": 36,
        "annual_taxes": 2700,
        "annual_insurance": 2400,
        "start_date": "2025-01-01"
    })
}

fn refinance_body() -> Value {
    json!({
        "home_value": "400000",
        "current_loan": {
            "original_amount": "200000",
            "interest_rate": "5",
            "term_years": 30,
            "pmi_rate": "0.5",
            "months_paid": 24
        },
        "refinance_loan": {
            "interest_rate": "4.5",
            "term_years": 30,
            "points": "1",
            "origination_fees": "1.1",
            "closing_costs": "3000",
            "years_before_sale": 5
        },
        "tax_rates": { "state_tax_rate": "5", "federal_tax_rate": "36" },
        "start_date": "2025-01-01"
    })
}

#[test]
fn test_numeric_json_accepted_and_pmi_defaults_to_zero() {
    let registry = CalculatorRegistry::new();
    let value = registry
        .dispatch(CalculatorKind::Affordability, affordability_body())
        .unwrap();
    assert_eq!(value["result"]["home_value"], json!("303200"));
    assert_eq!(value["result"]["binding_ratio"], json!("back"));
    assert_eq!(value["result"]["monthly_pmi"], json!("0"));
}

#[test]
fn test_registry_matches_direct_dispatch() {
    let registry = CalculatorRegistry::new();
    let by_name = registry
        .dispatch_by_name("refinance", refinance_body())
        .unwrap();

    let request: CalculatorRequest = serde_json::from_value(json!({
        "calculator": "refinance",
        "input": refinance_body()
    }))
    .unwrap();
    let direct = serde_json::to_value(calculate(&request).unwrap()).unwrap();

    assert_eq!(direct["calculator"], json!("refinance"));
    assert_eq!(by_name["result"], direct["output"]["result"]);
}

#[test]
fn test_validation_failures_survive_dispatch() {
    let mut body = affordability_body();
    body["term_years"] = json!(45);
    body["front_ratio"] = json!(2);

    let err = CalculatorRegistry::new()
        .dispatch_by_name("affordability", body)
        .unwrap_err();
    match err {
        MortgageError::ValidationFailed(failures) => {
            let fields: Vec<_> = failures.into_iter().map(|f| f.field).collect();
            assert_eq!(fields, vec!["term_years".to_string(), "front_ratio".to_string()]);
        }
        other => panic!("Expected ValidationFailed, got {other:?}"),
    }
}

#[test]
fn test_unknown_tag_rejected() {
    let parsed = serde_json::from_value::<CalculatorRequest>(json!({
        "calculator": "reverse_mortgage",
        "input": {}
    }));
    assert!(parsed.is_err());
}
