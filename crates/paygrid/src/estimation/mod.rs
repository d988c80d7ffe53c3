//! Prediction and query core.
//!
//! Data flows one way: a loose payload is normalized into an
//! [`AttributeRecord`], a [`SalaryEstimator`] scores it, and the
//! [`InverseSearchEngine`] and [`GridEngine`] repeat that over generated
//! records. [`SalaryQueries`] shapes every outcome into the tagged response
//! objects consumed by callers.

pub mod enumerate;
pub mod error;
pub mod grid;
pub mod queries;
pub mod record;
pub mod router;
pub mod scoring;
pub mod search;
pub mod service;

#[cfg(test)]
mod tests;

pub use enumerate::{CancellationToken, EnumerationLimits, DEFAULT_MAX_COMBINATIONS};
pub use error::{ErrorKind, PredictionError};
pub use grid::{default_grid_base, GridAxis, GridEngine, GridOutcome, GridSpec};
pub use queries::{
    GridResponse, InverseSearchResponse, ModelInfoResponse, PredictResponse, QueryLimits,
    QueryOptions, ResponseStatus, SalaryQueries,
};
pub use record::{
    AttributeField, AttributeRecord, Categorical, CompanySize, Currency, EducationLevel,
    EmploymentType, ExperienceLevel, Industry, JobTitle, Location, REMOTE_RATIO_STEPS,
};
pub use router::salary_router;
pub use scoring::{
    EstimatorKind, HeuristicEstimator, ModelProvider, SalaryEstimator, TrainedModelEstimator,
    MOCK_SOURCE,
};
pub use search::{InverseSearchEngine, SearchConstraints, SearchOutcome, SearchRow};
pub use service::{Prediction, PredictionService, ScoreFailure};
