use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::leaderboard::{read_leaderboard, LeaderboardEntry};
use super::SalaryEstimator;
use crate::estimation::error::PredictionError;
use crate::estimation::record::{AttributeField, AttributeRecord};

/// Regression manifest inside the artifact directory.
pub const MANIFEST_FILE: &str = "model.json";
/// Optional leaderboard written by the training job next to the manifest.
pub const LEADERBOARD_FILE: &str = "models.csv";

const FALLBACK_MODEL_NAME: &str = "trained-model";

/// Linear regression over the attribute record, as exported by training.
///
/// Categorical weights are keyed by field name and then by the label the
/// record emits; categories missing from a table contribute nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RegressionModel {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_label")]
    pub label: String,
    #[serde(default)]
    pub trained_at: Option<DateTime<Utc>>,
    pub intercept: f64,
    #[serde(default)]
    pub numeric: NumericCoefficients,
    #[serde(default)]
    pub categorical: BTreeMap<String, BTreeMap<String, f64>>,
    #[serde(default)]
    pub clip_min: Option<f64>,
    #[serde(default)]
    pub clip_max: Option<f64>,
}

fn default_label() -> String {
    "salary_usd".to_string()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NumericCoefficients {
    pub years_experience: f64,
    pub remote_ratio: f64,
    pub benefits_score: f64,
    pub skills_count: f64,
}

impl RegressionModel {
    pub fn predict(&self, record: &AttributeRecord) -> f64 {
        let numeric = &self.numeric;
        let mut prediction = self.intercept
            + numeric.years_experience * record.years_experience as f64
            + numeric.remote_ratio * record.remote_ratio
            + numeric.benefits_score * record.benefits_score
            + numeric.skills_count * record.skills_count() as f64;

        for (key, weights) in &self.categorical {
            let label = AttributeField::from_key(key)
                .and_then(|field| record.categorical_label(field));
            if let Some(weight) = label.and_then(|label| weights.get(label)) {
                prediction += weight;
            }
        }

        if let Some(min) = self.clip_min {
            prediction = prediction.max(min);
        }
        if let Some(max) = self.clip_max {
            prediction = prediction.min(max);
        }
        prediction
    }

    fn validate(&self) -> Result<(), ModelLoadError> {
        for key in self.categorical.keys() {
            let categorical =
                AttributeField::from_key(key).is_some_and(AttributeField::is_categorical);
            if !categorical {
                return Err(ModelLoadError::UnknownFeature(key.clone()));
            }
        }
        Ok(())
    }
}

/// A manifest plus the metadata resolved while loading it.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedModel {
    pub name: String,
    pub model: RegressionModel,
    pub leaderboard: Vec<LeaderboardEntry>,
}

impl LoadedModel {
    pub fn load(artifact_dir: &Path) -> Result<Self, ModelLoadError> {
        if !artifact_dir.is_dir() {
            return Err(ModelLoadError::MissingArtifact {
                path: artifact_dir.to_path_buf(),
            });
        }

        let manifest_path = artifact_dir.join(MANIFEST_FILE);
        if !manifest_path.is_file() {
            return Err(ModelLoadError::MissingArtifact {
                path: manifest_path,
            });
        }

        let file = File::open(&manifest_path).map_err(|source| ModelLoadError::Io {
            path: manifest_path.clone(),
            source,
        })?;
        let model: RegressionModel = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| ModelLoadError::Manifest {
                path: manifest_path.clone(),
                source,
            })?;
        model.validate()?;

        let leaderboard_path = artifact_dir.join(LEADERBOARD_FILE);
        let leaderboard = if leaderboard_path.is_file() {
            let file = File::open(&leaderboard_path).map_err(|source| ModelLoadError::Io {
                path: leaderboard_path.clone(),
                source,
            })?;
            read_leaderboard(file).map_err(|source| ModelLoadError::Leaderboard {
                path: leaderboard_path,
                source,
            })?
        } else {
            Vec::new()
        };

        let name = model
            .name
            .clone()
            .or_else(|| leaderboard.first().map(|entry| entry.model.clone()))
            .unwrap_or_else(|| FALLBACK_MODEL_NAME.to_string());

        Ok(Self {
            name,
            model,
            leaderboard,
        })
    }
}

/// Owns the trained-model handle: loaded on first use, then frozen for the
/// life of the provider. Failed loads are not cached, so a later call can
/// pick up an artifact that appeared in the meantime.
#[derive(Debug)]
pub struct ModelProvider {
    artifact_dir: PathBuf,
    loaded: OnceLock<Arc<LoadedModel>>,
}

impl ModelProvider {
    pub fn new(artifact_dir: impl Into<PathBuf>) -> Self {
        Self {
            artifact_dir: artifact_dir.into(),
            loaded: OnceLock::new(),
        }
    }

    /// Provider around an already-built model, bypassing the filesystem.
    pub fn preloaded(model: LoadedModel) -> Self {
        let loaded = OnceLock::new();
        let _ = loaded.set(Arc::new(model));
        Self {
            artifact_dir: PathBuf::new(),
            loaded,
        }
    }

    pub fn artifact_dir(&self) -> &Path {
        &self.artifact_dir
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.get().is_some()
    }

    /// Returns the cached model, loading it if this is the first successful call.
    ///
    /// Concurrent first callers may each read the artifact; the first one to
    /// finish wins and the others drop their copy.
    pub fn get(&self) -> Result<Arc<LoadedModel>, ModelLoadError> {
        if let Some(loaded) = self.loaded.get() {
            return Ok(Arc::clone(loaded));
        }

        let candidate = match LoadedModel::load(&self.artifact_dir) {
            Ok(model) => Arc::new(model),
            Err(err) => {
                warn!(
                    artifact_dir = %self.artifact_dir.display(),
                    error = %err,
                    "trained model unavailable"
                );
                return Err(err);
            }
        };

        let loaded = self.loaded.get_or_init(|| {
            info!(
                model = %candidate.name,
                artifact_dir = %self.artifact_dir.display(),
                trained_at = ?candidate.model.trained_at,
                leaderboard_rows = candidate.leaderboard.len(),
                "trained model loaded"
            );
            Arc::clone(&candidate)
        });
        Ok(Arc::clone(loaded))
    }
}

/// Scorer backed by a [`ModelProvider`].
#[derive(Debug, Clone)]
pub struct TrainedModelEstimator {
    provider: Arc<ModelProvider>,
}

impl TrainedModelEstimator {
    pub fn new(provider: Arc<ModelProvider>) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &Arc<ModelProvider> {
        &self.provider
    }
}

impl SalaryEstimator for TrainedModelEstimator {
    fn source(&self) -> String {
        match self.provider.loaded.get() {
            Some(loaded) => loaded.name.clone(),
            None => FALLBACK_MODEL_NAME.to_string(),
        }
    }

    fn estimate(&self, record: &AttributeRecord) -> Result<f64, PredictionError> {
        let loaded = self
            .provider
            .get()
            .map_err(|err| PredictionError::ModelUnavailable(err.to_string()))?;

        let prediction = loaded.model.predict(record);
        if prediction.is_finite() {
            Ok(prediction)
        } else {
            Err(PredictionError::Inference(format!(
                "model `{}` produced a non-finite prediction",
                loaded.name
            )))
        }
    }
}

/// Reasons a trained-model artifact could not be brought into memory.
#[derive(Debug, thiserror::Error)]
pub enum ModelLoadError {
    #[error("model artifact not found at {}", .path.display())]
    MissingArtifact { path: PathBuf },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid model manifest {}: {source}", .path.display())]
    Manifest {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid leaderboard {}: {source}", .path.display())]
    Leaderboard { path: PathBuf, source: csv::Error },
    #[error("manifest references unsupported categorical feature `{0}`")]
    UnknownFeature(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::record::{CompanySize, ExperienceLevel, JobTitle};
    use serde_json::json;

    fn manifest() -> RegressionModel {
        serde_json::from_value(json!({
            "name": "LinearBaseline",
            "intercept": 50000.0,
            "numeric": { "years_experience": 2000.0, "skills_count": 500.0 },
            "categorical": {
                "job_title": { "AI Architect": 40000.0 },
                "experience_level": { "Senior": 15000.0 },
                "company_size": { "XL": 5000.0 }
            }
        }))
        .expect("manifest deserializes")
    }

    #[test]
    fn prediction_sums_intercept_numeric_and_categorical_terms() {
        let model = manifest();
        let record = AttributeRecord {
            job_title: JobTitle::AiArchitect,
            experience_level: ExperienceLevel::Senior,
            company_size: CompanySize::ExtraLarge,
            years_experience: 5,
            required_skills: ["Rust", "SQL"].into_iter().map(str::to_string).collect(),
            ..AttributeRecord::default()
        };

        assert_eq!(model.predict(&record), 50000.0 + 10000.0 + 1000.0 + 60000.0);
    }

    #[test]
    fn unseen_categories_contribute_nothing() {
        let model = manifest();
        let record = AttributeRecord {
            job_title: JobTitle::Other("Robot Herder".to_string()),
            ..AttributeRecord::default()
        };

        assert_eq!(model.predict(&record), 50000.0);
    }

    #[test]
    fn clipping_bounds_the_prediction() {
        let mut model = manifest();
        model.clip_max = Some(55000.0);
        let record = AttributeRecord {
            years_experience: 30,
            ..AttributeRecord::default()
        };
        assert_eq!(model.predict(&record), 55000.0);
    }

    #[test]
    fn validation_rejects_numeric_fields_in_categorical_tables() {
        let mut model = manifest();
        model
            .categorical
            .insert("remote_ratio".to_string(), BTreeMap::new());
        assert!(matches!(
            model.validate(),
            Err(ModelLoadError::UnknownFeature(feature)) if feature == "remote_ratio"
        ));
    }

    #[test]
    fn preloaded_provider_reports_its_name() {
        let provider = Arc::new(ModelProvider::preloaded(LoadedModel {
            name: "LinearBaseline".to_string(),
            model: manifest(),
            leaderboard: Vec::new(),
        }));
        let estimator = TrainedModelEstimator::new(provider);

        assert_eq!(estimator.source(), "LinearBaseline");
        let salary = estimator
            .estimate(&AttributeRecord::default())
            .expect("preloaded model scores");
        assert_eq!(salary, 50000.0);
    }

    #[test]
    fn missing_directory_is_model_unavailable() {
        let estimator = TrainedModelEstimator::new(Arc::new(ModelProvider::new(
            std::env::temp_dir().join("paygrid-no-such-model-dir"),
        )));

        let err = estimator
            .estimate(&AttributeRecord::default())
            .expect_err("missing artifact fails");
        assert!(matches!(err, PredictionError::ModelUnavailable(_)));
        assert_eq!(estimator.source(), "trained-model");
    }
}
