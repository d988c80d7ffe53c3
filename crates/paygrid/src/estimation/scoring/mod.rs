//! Interchangeable salary scorers.
//!
//! Both strategies share one contract: a pure mapping from an
//! [`AttributeRecord`] to a salary, with failures reported as
//! [`PredictionError`] rather than panics.

mod heuristic;
mod leaderboard;
mod model;

use std::path::PathBuf;

use super::error::PredictionError;
use super::record::AttributeRecord;

pub use heuristic::{heuristic_salary, round_to_hundreds, HeuristicEstimator, DEFAULT_BASE_SALARY};
pub use leaderboard::{read_leaderboard, LeaderboardEntry};
pub use model::{
    LoadedModel, ModelLoadError, ModelProvider, NumericCoefficients, RegressionModel,
    TrainedModelEstimator, LEADERBOARD_FILE, MANIFEST_FILE,
};

/// Source tag reported for the closed-form heuristic.
pub const MOCK_SOURCE: &str = "mock";

/// Scoring strategy consulted by the prediction service.
pub trait SalaryEstimator: Send + Sync {
    /// Tag identifying which strategy produced (or failed to produce) an estimate.
    fn source(&self) -> String;

    fn estimate(&self, record: &AttributeRecord) -> Result<f64, PredictionError>;
}

/// Strategy selection made once, when the service is wired up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EstimatorKind {
    Heuristic,
    TrainedModel { artifact_dir: PathBuf },
}
