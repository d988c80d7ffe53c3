use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::response::Response;
use serde_json::{Map, Value};

use crate::estimation::scoring::{
    heuristic_salary, LoadedModel, ModelProvider, NumericCoefficients, RegressionModel,
};
use crate::estimation::{
    AttributeRecord, CancellationToken, JobTitle, PredictionError, PredictionService,
    SalaryEstimator, SalaryQueries,
};

pub(super) fn payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object payload, got {other}"),
    }
}

pub(super) fn estimate(value: Value) -> f64 {
    PredictionService::heuristic()
        .score_payload(&payload(value))
        .expect("heuristic scores every valid payload")
}

/// Flat-rate model: 100k plus 10k for senior roles.
pub(super) fn linear_model() -> LoadedModel {
    let mut categorical = std::collections::BTreeMap::new();
    categorical.insert(
        "experience_level".to_string(),
        [("Senior".to_string(), 10_000.0)].into_iter().collect(),
    );

    LoadedModel {
        name: "LinearBaseline".to_string(),
        model: RegressionModel {
            name: Some("LinearBaseline".to_string()),
            label: "salary_usd".to_string(),
            trained_at: None,
            intercept: 100_000.0,
            numeric: NumericCoefficients::default(),
            categorical,
            clip_min: None,
            clip_max: None,
        },
        leaderboard: Vec::new(),
    }
}

pub(super) fn trained_queries() -> SalaryQueries {
    SalaryQueries::with_trained_model(Arc::new(ModelProvider::preloaded(linear_model())))
}

/// Fails whenever the record carries the given title.
pub(super) struct FailingEstimator {
    pub(super) poisoned: JobTitle,
}

impl SalaryEstimator for FailingEstimator {
    fn source(&self) -> String {
        "flaky-model".to_string()
    }

    fn estimate(&self, record: &AttributeRecord) -> Result<f64, PredictionError> {
        if record.job_title == self.poisoned {
            return Err(PredictionError::Inference(format!(
                "no coefficients for {}",
                record.job_title.label()
            )));
        }
        Ok(heuristic_salary(record))
    }
}

pub(super) fn failing_service(poisoned: JobTitle) -> PredictionService {
    PredictionService::new(Arc::new(FailingEstimator { poisoned }))
}

/// Heuristic scorer that trips a cancellation token after a fixed number of calls.
#[cfg_attr(feature = "parallel", allow(dead_code))]
pub(super) struct CancellingEstimator {
    pub(super) token: CancellationToken,
    pub(super) after: usize,
    pub(super) calls: AtomicUsize,
}

impl SalaryEstimator for CancellingEstimator {
    fn source(&self) -> String {
        "mock".to_string()
    }

    fn estimate(&self, record: &AttributeRecord) -> Result<f64, PredictionError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) + 1 >= self.after {
            self.token.cancel();
        }
        Ok(heuristic_salary(record))
    }
}

#[cfg_attr(feature = "parallel", allow(dead_code))]
pub(super) fn cancelling_service(token: CancellationToken, after: usize) -> PredictionService {
    PredictionService::new(Arc::new(CancellingEstimator {
        token,
        after,
        calls: AtomicUsize::new(0),
    }))
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
