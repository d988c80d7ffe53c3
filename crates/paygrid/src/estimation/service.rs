use std::sync::Arc;

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::error::PredictionError;
use super::record::AttributeRecord;
use super::scoring::{HeuristicEstimator, SalaryEstimator};

/// Normalizes payloads and delegates to the configured scorer.
#[derive(Clone)]
pub struct PredictionService {
    estimator: Arc<dyn SalaryEstimator>,
}

/// Successful estimate together with the strategy that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub salary_usd: f64,
    pub source: String,
}

/// Failed estimate, tagged with the strategy that was asked for it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreFailure {
    pub error: PredictionError,
    pub source: String,
}

impl ScoreFailure {
    pub fn message(&self) -> String {
        self.error.to_string()
    }
}

impl PredictionService {
    pub fn new(estimator: Arc<dyn SalaryEstimator>) -> Self {
        Self { estimator }
    }

    pub fn heuristic() -> Self {
        Self::new(Arc::new(HeuristicEstimator))
    }

    pub fn source(&self) -> String {
        self.estimator.source()
    }

    /// Scores a loose payload. Never panics; every failure is tagged.
    pub fn score(&self, payload: &Map<String, Value>) -> Result<Prediction, ScoreFailure> {
        match self.score_payload(payload) {
            Ok(salary_usd) => {
                let source = self.source();
                debug!(%source, salary_usd, "salary estimated");
                Ok(Prediction { salary_usd, source })
            }
            Err(error) => {
                let source = self.source();
                warn!(%source, %error, "salary estimate failed");
                Err(ScoreFailure { error, source })
            }
        }
    }

    pub fn score_payload(&self, payload: &Map<String, Value>) -> Result<f64, PredictionError> {
        let record = AttributeRecord::from_payload(payload)?;
        self.score_record(&record)
    }

    pub fn score_record(&self, record: &AttributeRecord) -> Result<f64, PredictionError> {
        self.estimator.estimate(record)
    }
}

impl std::fmt::Debug for PredictionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PredictionService")
            .field("source", &self.source())
            .finish()
    }
}
