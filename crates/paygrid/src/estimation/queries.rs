//! Response-shaped entry points for callers outside the crate.
//!
//! Nothing here returns `Err` or panics: every failure is folded into a
//! response with `status: "error"`, the error message and its [`ErrorKind`].

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use super::enumerate::{CancellationToken, EnumerationLimits, DEFAULT_MAX_COMBINATIONS};
use super::error::{ErrorKind, PredictionError};
use super::grid::{GridEngine, GridSpec};
use super::record::serialize_number;
use super::scoring::{
    EstimatorKind, HeuristicEstimator, LeaderboardEntry, ModelProvider, TrainedModelEstimator,
};
use super::search::{InverseSearchEngine, SearchConstraints, SearchRow};
use super::service::PredictionService;
use crate::config::EstimationConfig;

/// Rows returned by inverse search when the caller does not ask for a count.
pub const DEFAULT_TOP_N: usize = 10;

const UNCONFIGURED_SOURCE: &str = "unconfigured";

/// Bounds applied to every enumeration issued through [`SalaryQueries`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryLimits {
    pub default_top_n: usize,
    pub max_combinations: usize,
    pub search_timeout: Option<Duration>,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            default_top_n: DEFAULT_TOP_N,
            max_combinations: DEFAULT_MAX_COMBINATIONS,
            search_timeout: None,
        }
    }
}

/// Per-call controls for the enumerating queries.
#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    /// Overrides the deadline derived from [`QueryLimits::search_timeout`].
    pub cancel: Option<CancellationToken>,
    pub allow_partial: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictResponse {
    pub status: ResponseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prediction: Option<SalaryPrediction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub meta: PredictMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SalaryPrediction {
    #[serde(serialize_with = "serialize_number")]
    pub salary_usd: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictMeta {
    pub source: String,
    pub use_mock_flag: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InverseSearchResponse {
    pub status: ResponseStatus,
    pub solutions: Vec<SearchRow>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub meta: InverseSearchMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InverseSearchMeta {
    pub source: String,
    #[serde(serialize_with = "serialize_number")]
    pub target_salary: f64,
    pub use_mock_flag: bool,
    pub candidate_count: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridResponse {
    pub status: ResponseStatus,
    pub rows: Vec<Map<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub meta: GridMeta,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GridMeta {
    pub source: String,
    pub use_mock_flag: bool,
    pub grid_size: usize,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub partial: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelInfoResponse {
    pub status: ResponseStatus,
    /// Scorer used when a request does not say `use_mock`.
    pub default_source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<ModelDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelDetails {
    pub name: String,
    pub label: String,
    pub trained_at: Option<DateTime<Utc>>,
    pub artifact_dir: PathBuf,
    pub leaderboard: Vec<LeaderboardEntry>,
}

/// The three salary queries plus model introspection, over a heuristic
/// scorer and an optional trained model.
#[derive(Debug, Clone)]
pub struct SalaryQueries {
    heuristic: PredictionService,
    trained: Option<PredictionService>,
    provider: Option<Arc<ModelProvider>>,
    limits: QueryLimits,
}

impl SalaryQueries {
    pub fn heuristic_only() -> Self {
        Self {
            heuristic: PredictionService::new(Arc::new(HeuristicEstimator)),
            trained: None,
            provider: None,
            limits: QueryLimits::default(),
        }
    }

    pub fn with_trained_model(provider: Arc<ModelProvider>) -> Self {
        let estimator = TrainedModelEstimator::new(Arc::clone(&provider));
        Self {
            trained: Some(PredictionService::new(Arc::new(estimator))),
            provider: Some(provider),
            ..Self::heuristic_only()
        }
    }

    pub fn from_kind(kind: &EstimatorKind) -> Self {
        match kind {
            EstimatorKind::Heuristic => Self::heuristic_only(),
            EstimatorKind::TrainedModel { artifact_dir } => {
                Self::with_trained_model(Arc::new(ModelProvider::new(artifact_dir.clone())))
            }
        }
    }

    pub fn from_config(config: &EstimationConfig) -> Self {
        Self::from_kind(&config.estimator_kind()).with_limits(config.query_limits())
    }

    pub fn with_limits(mut self, limits: QueryLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &QueryLimits {
        &self.limits
    }

    pub fn model_provider(&self) -> Option<&Arc<ModelProvider>> {
        self.provider.as_ref()
    }

    /// `use_mock` value applied when a caller leaves it out.
    pub fn default_use_mock(&self) -> bool {
        self.trained.is_none()
    }

    pub fn predict_salary(&self, payload: &Map<String, Value>, use_mock: bool) -> PredictResponse {
        let scored = self
            .service(use_mock)
            .map_err(|error| (error, UNCONFIGURED_SOURCE.to_string()))
            .and_then(|service| {
                service
                    .score(payload)
                    .map_err(|failure| (failure.error, failure.source))
            });

        match scored {
            Ok(prediction) => PredictResponse {
                status: ResponseStatus::Ok,
                prediction: Some(SalaryPrediction {
                    salary_usd: prediction.salary_usd,
                }),
                error: None,
                error_kind: None,
                meta: PredictMeta {
                    source: prediction.source,
                    use_mock_flag: use_mock,
                },
            },
            Err((error, source)) => PredictResponse {
                status: ResponseStatus::Error,
                prediction: None,
                error: Some(error.to_string()),
                error_kind: Some(error.kind()),
                meta: PredictMeta {
                    source,
                    use_mock_flag: use_mock,
                },
            },
        }
    }

    pub fn inverse_salary_search(
        &self,
        target_salary: f64,
        constraints: Option<&Value>,
        use_mock: bool,
        top_n: Option<usize>,
    ) -> InverseSearchResponse {
        self.inverse_salary_search_with(
            target_salary,
            constraints,
            use_mock,
            top_n,
            &QueryOptions::default(),
        )
    }

    pub fn inverse_salary_search_with(
        &self,
        target_salary: f64,
        constraints: Option<&Value>,
        use_mock: bool,
        top_n: Option<usize>,
        options: &QueryOptions,
    ) -> InverseSearchResponse {
        let top_n = top_n.unwrap_or(self.limits.default_top_n);
        let outcome = SearchConstraints::from_json(constraints.unwrap_or(&Value::Null))
            .and_then(|constraints| {
                let service = self.service(use_mock)?;
                InverseSearchEngine::new(service.clone()).search(
                    target_salary,
                    &constraints,
                    top_n,
                    &self.enumeration_limits(options),
                )
            });
        let source = self.source_for(use_mock);

        match outcome {
            Ok(outcome) => InverseSearchResponse {
                status: ResponseStatus::Ok,
                solutions: outcome.rows,
                error: None,
                error_kind: None,
                meta: InverseSearchMeta {
                    source,
                    target_salary,
                    use_mock_flag: use_mock,
                    candidate_count: outcome.candidate_count,
                    partial: outcome.partial,
                },
            },
            Err(error) => {
                warn!(%error, target_salary, "inverse search failed");
                InverseSearchResponse {
                    status: ResponseStatus::Error,
                    solutions: Vec::new(),
                    error: Some(error.to_string()),
                    error_kind: Some(error.kind()),
                    meta: InverseSearchMeta {
                        source,
                        target_salary,
                        use_mock_flag: use_mock,
                        candidate_count: 0,
                        partial: false,
                    },
                }
            }
        }
    }

    pub fn salary_grid(
        &self,
        grid_spec: &Value,
        base_payload: &Map<String, Value>,
        use_mock: bool,
    ) -> GridResponse {
        self.salary_grid_with(grid_spec, base_payload, use_mock, &QueryOptions::default())
    }

    pub fn salary_grid_with(
        &self,
        grid_spec: &Value,
        base_payload: &Map<String, Value>,
        use_mock: bool,
        options: &QueryOptions,
    ) -> GridResponse {
        let outcome = GridSpec::from_json(grid_spec).and_then(|spec| {
            let service = self.service(use_mock)?;
            GridEngine::new(service.clone()).grid(
                &spec,
                base_payload,
                &self.enumeration_limits(options),
            )
        });
        let source = self.source_for(use_mock);

        match outcome {
            Ok(outcome) => GridResponse {
                status: ResponseStatus::Ok,
                meta: GridMeta {
                    source,
                    use_mock_flag: use_mock,
                    grid_size: outcome.rows.len(),
                    partial: outcome.partial,
                },
                rows: outcome.rows,
                error: None,
                error_kind: None,
            },
            Err(error) => {
                warn!(%error, "salary grid failed");
                GridResponse {
                    status: ResponseStatus::Error,
                    rows: Vec::new(),
                    error: Some(error.to_string()),
                    error_kind: Some(error.kind()),
                    meta: GridMeta {
                        source,
                        use_mock_flag: use_mock,
                        grid_size: 0,
                        partial: false,
                    },
                }
            }
        }
    }

    /// Describes the trained model, loading it if needed. Without one the
    /// response reports the heuristic as the default source.
    pub fn model_info(&self) -> ModelInfoResponse {
        let default_source = self.source_for(self.default_use_mock());
        let Some(provider) = &self.provider else {
            return ModelInfoResponse {
                status: ResponseStatus::Ok,
                default_source,
                model: None,
                error: None,
                error_kind: None,
            };
        };

        match provider.get() {
            Ok(loaded) => ModelInfoResponse {
                status: ResponseStatus::Ok,
                default_source: loaded.name.clone(),
                model: Some(ModelDetails {
                    name: loaded.name.clone(),
                    label: loaded.model.label.clone(),
                    trained_at: loaded.model.trained_at,
                    artifact_dir: provider.artifact_dir().to_path_buf(),
                    leaderboard: loaded.leaderboard.clone(),
                }),
                error: None,
                error_kind: None,
            },
            Err(err) => {
                let error = PredictionError::ModelUnavailable(err.to_string());
                ModelInfoResponse {
                    status: ResponseStatus::Error,
                    default_source,
                    model: None,
                    error: Some(error.to_string()),
                    error_kind: Some(error.kind()),
                }
            }
        }
    }

    fn service(&self, use_mock: bool) -> Result<&PredictionService, PredictionError> {
        if use_mock {
            return Ok(&self.heuristic);
        }
        self.trained.as_ref().ok_or_else(|| {
            PredictionError::ModelUnavailable("no trained model is configured".to_string())
        })
    }

    fn source_for(&self, use_mock: bool) -> String {
        self.service(use_mock)
            .map_or_else(|_| UNCONFIGURED_SOURCE.to_string(), PredictionService::source)
    }

    fn enumeration_limits(&self, options: &QueryOptions) -> EnumerationLimits {
        EnumerationLimits {
            max_combinations: self.limits.max_combinations,
            cancel: options
                .cancel
                .clone()
                .or_else(|| self.limits.search_timeout.map(CancellationToken::with_timeout)),
            allow_partial: options.allow_partial,
        }
    }
}

impl Default for SalaryQueries {
    fn default() -> Self {
        Self::heuristic_only()
    }
}
