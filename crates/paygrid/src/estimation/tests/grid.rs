use serde_json::{json, Value};

use super::common::*;
use crate::estimation::{
    default_grid_base, EnumerationLimits, GridEngine, GridSpec, JobTitle, PredictionError,
    PredictionService,
};

fn engine() -> GridEngine {
    GridEngine::new(PredictionService::heuristic())
}

fn spec(value: Value) -> GridSpec {
    GridSpec::from_json(&value).expect("grid spec parses")
}

fn salaries(rows: &[serde_json::Map<String, Value>]) -> Vec<i64> {
    rows.iter()
        .map(|row| row["salary_usd"].as_i64().expect("integral salary"))
        .collect()
}

#[test]
fn one_row_per_company_size() {
    let outcome = engine()
        .grid(
            &spec(json!({ "company_size": ["S", "M", "L", "XL"] })),
            &default_grid_base(),
            &EnumerationLimits::default(),
        )
        .expect("grid succeeds");

    assert_eq!(outcome.rows.len(), 4);
    assert!(!outcome.partial);
    let sizes: Vec<&str> = outcome
        .rows
        .iter()
        .map(|row| row["company_size"].as_str().unwrap_or_default())
        .collect();
    assert_eq!(sizes, vec!["S", "M", "L", "XL"]);
    assert_eq!(salaries(&outcome.rows), vec![122_400, 126_000, 129_600, 132_000]);
}

#[test]
fn rows_follow_declared_key_order() {
    let outcome = engine()
        .grid(
            &spec(json!({
                "experience_level": ["Entry", "Senior"],
                "job_title": ["Data Analyst", "AI Architect"],
            })),
            &default_grid_base(),
            &EnumerationLimits::default(),
        )
        .expect("grid succeeds");

    let combos: Vec<(String, String)> = outcome
        .rows
        .iter()
        .map(|row| {
            (
                row["experience_level"].as_str().unwrap_or_default().to_string(),
                row["job_title"].as_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    assert_eq!(
        combos,
        vec![
            ("Entry".to_string(), "Data Analyst".to_string()),
            ("Entry".to_string(), "AI Architect".to_string()),
            ("Senior".to_string(), "Data Analyst".to_string()),
            ("Senior".to_string(), "AI Architect".to_string()),
        ]
    );
    assert_eq!(salaries(&outcome.rows), vec![85_500, 135_000, 123_500, 195_000]);

    let keys: Vec<&str> = outcome.rows[0].keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["experience_level", "job_title", "salary_usd"]);
}

#[test]
fn supplied_values_are_echoed_verbatim() {
    let outcome = engine()
        .grid(
            &spec(json!({ "company_size": ["xl"], "remote_ratio": ["50"] })),
            &default_grid_base(),
            &EnumerationLimits::default(),
        )
        .expect("grid succeeds");

    assert_eq!(
        Value::Object(outcome.rows[0].clone()),
        json!({ "company_size": "xl", "remote_ratio": "50", "salary_usd": 134_400 })
    );
}

#[test]
fn empty_axis_yields_no_rows() {
    let outcome = engine()
        .grid(
            &spec(json!({ "company_size": ["S", "M"], "experience_level": [] })),
            &default_grid_base(),
            &EnumerationLimits::default(),
        )
        .expect("empty grid is not an error");
    assert!(outcome.rows.is_empty());
}

#[test]
fn empty_spec_scores_the_base_once() {
    let outcome = engine()
        .grid(
            &spec(json!({})),
            &default_grid_base(),
            &EnumerationLimits::default(),
        )
        .expect("grid succeeds");

    assert_eq!(outcome.rows.len(), 1);
    assert_eq!(Value::Object(outcome.rows[0].clone()), json!({ "salary_usd": 126_000 }));
}

#[test]
fn one_invalid_combination_fails_the_grid() {
    let err = engine()
        .grid(
            &spec(json!({ "years_experience": [1, "abc", 5] })),
            &default_grid_base(),
            &EnumerationLimits::default(),
        )
        .expect_err("non-numeric years fail");
    assert!(matches!(err, PredictionError::Validation { field, .. } if field == "years_experience"));
}

#[test]
fn scorer_failure_is_atomic() {
    let err = GridEngine::new(failing_service(JobTitle::NlpEngineer))
        .grid(
            &spec(json!({ "job_title": ["Data Analyst", "NLP Engineer", "AI Architect"] })),
            &default_grid_base(),
            &EnumerationLimits::default(),
        )
        .expect_err("one failing combination fails the grid");
    assert_eq!(
        err,
        PredictionError::Inference("no coefficients for NLP Engineer".to_string())
    );
}

#[test]
fn oversized_grid_is_rejected() {
    let limits = EnumerationLimits {
        max_combinations: 10,
        ..EnumerationLimits::default()
    };
    let err = engine()
        .grid(
            &spec(json!({
                "company_size": ["S", "M", "L", "XL"],
                "experience_level": ["Entry", "Mid", "Senior"],
            })),
            &default_grid_base(),
            &limits,
        )
        .expect_err("12 combinations exceed 10");
    assert_eq!(
        err,
        PredictionError::TooManyCombinations {
            requested: 12,
            limit: 10
        }
    );
}
