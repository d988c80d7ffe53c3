use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::enumerate::{combination_count, index_combinations, score_all, EnumerationLimits};
use super::error::PredictionError;
use super::record::{
    coerce_real, coerce_string, serialize_number, AttributeRecord, Categorical, CompanySize,
    ExperienceLevel, JobTitle, REMOTE_RATIO_STEPS,
};
use super::service::PredictionService;

const SEARCH_FIELDS: [&str; 4] = ["job_title", "experience_level", "company_size", "remote_ratio"];

/// Allowed values per searchable field. `None` means the full canonical
/// domain of that field.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchConstraints {
    pub job_title: Option<Vec<JobTitle>>,
    pub experience_level: Option<Vec<ExperienceLevel>>,
    pub company_size: Option<Vec<CompanySize>>,
    pub remote_ratio: Option<Vec<f64>>,
}

impl SearchConstraints {
    /// Accepts `null` or an object keyed by searchable field. A `null` or
    /// empty list leaves that field unconstrained.
    ///
    /// Stricter than [`AttributeRecord::from_payload`]:
    /// an unrecognized experience level or company size is rejected here
    /// instead of falling back to its default.
    pub fn from_json(value: &Value) -> Result<Self, PredictionError> {
        let object = match value {
            Value::Null => return Ok(Self::default()),
            Value::Object(object) => object,
            other => {
                return Err(PredictionError::validation(
                    "constraints",
                    format!("expected an object, got {other}"),
                ))
            }
        };

        if let Some(unknown) = object.keys().find(|key| !SEARCH_FIELDS.contains(&key.as_str())) {
            return Err(PredictionError::validation(
                unknown.as_str(),
                "not a searchable field",
            ));
        }

        Ok(Self {
            job_title: allowed(object, "job_title", title)?,
            experience_level: allowed(object, "experience_level", label::<ExperienceLevel>)?,
            company_size: allowed(object, "company_size", label::<CompanySize>)?,
            remote_ratio: allowed(object, "remote_ratio", coerce_real)?,
        })
    }

    fn job_titles(&self) -> Vec<JobTitle> {
        self.job_title
            .clone()
            .unwrap_or_else(|| JobTitle::KNOWN.to_vec())
    }

    fn experience_levels(&self) -> Vec<ExperienceLevel> {
        domain(&self.experience_level)
    }

    fn company_sizes(&self) -> Vec<CompanySize> {
        domain(&self.company_size)
    }

    fn remote_ratios(&self) -> Vec<f64> {
        self.remote_ratio
            .clone()
            .unwrap_or_else(|| REMOTE_RATIO_STEPS.to_vec())
    }
}

fn domain<T: Categorical>(allowed: &Option<Vec<T>>) -> Vec<T> {
    allowed.clone().unwrap_or_else(|| T::ALL.to_vec())
}

fn allowed<T, F>(
    object: &Map<String, Value>,
    key: &str,
    parse: F,
) -> Result<Option<Vec<T>>, PredictionError>
where
    F: Fn(&str, &Value) -> Result<T, PredictionError>,
{
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Array(items)) if items.is_empty() => Ok(None),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| parse(key, item))
            .collect::<Result<_, _>>()
            .map(Some),
        Some(other) => Err(PredictionError::validation(
            key,
            format!("expected a list of values, got {other}"),
        )),
    }
}

fn label<T: Categorical>(field: &str, value: &Value) -> Result<T, PredictionError> {
    coerce_string(value)
        .and_then(|raw| T::from_label(&raw))
        .ok_or_else(|| {
            let expected: Vec<&str> = T::ALL.iter().map(|item| item.label()).collect();
            PredictionError::validation(
                field,
                format!("unknown value {value}, expected one of {}", expected.join(", ")),
            )
        })
}

fn title(field: &str, value: &Value) -> Result<JobTitle, PredictionError> {
    coerce_string(value)
        .map(|raw| JobTitle::parse(&raw))
        .ok_or_else(|| PredictionError::validation(field, format!("expected a label, got {value}")))
}

/// One candidate configuration and its distance from the target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchRow {
    pub job_title: JobTitle,
    pub experience_level: ExperienceLevel,
    pub company_size: CompanySize,
    #[serde(serialize_with = "serialize_number")]
    pub remote_ratio: f64,
    #[serde(serialize_with = "serialize_number")]
    pub salary_usd: f64,
    #[serde(serialize_with = "serialize_number")]
    pub diff_from_target: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// Closest rows first; equal distances keep enumeration order.
    pub rows: Vec<SearchRow>,
    /// Size of the candidate pool before truncation.
    pub candidate_count: usize,
    pub partial: bool,
}

/// Exhaustive search for attribute combinations scoring near a target.
#[derive(Debug, Clone)]
pub struct InverseSearchEngine {
    service: PredictionService,
}

impl InverseSearchEngine {
    pub fn new(service: PredictionService) -> Self {
        Self { service }
    }

    pub fn search(
        &self,
        target: f64,
        constraints: &SearchConstraints,
        top_n: usize,
        limits: &EnumerationLimits,
    ) -> Result<SearchOutcome, PredictionError> {
        if !target.is_finite() {
            return Err(PredictionError::validation(
                "target_salary",
                format!("expected a finite number, got {target}"),
            ));
        }

        let titles = constraints.job_titles();
        let levels = constraints.experience_levels();
        let sizes = constraints.company_sizes();
        let ratios = constraints.remote_ratios();

        let axes = [titles.len(), levels.len(), sizes.len(), ratios.len()];
        let candidate_count = combination_count(&axes);
        limits.ensure_within(candidate_count)?;
        debug!(
            target,
            candidate_count,
            source = %self.service.source(),
            "inverse search started"
        );

        let baseline = AttributeRecord::search_baseline();
        let scored = score_all(index_combinations(&axes), limits, |index| {
            let record = AttributeRecord {
                job_title: titles[index[0]].clone(),
                experience_level: levels[index[1]],
                company_size: sizes[index[2]],
                remote_ratio: ratios[index[3]],
                ..baseline.clone()
            };
            let salary_usd = self.service.score_record(&record)?;
            Ok(SearchRow {
                job_title: record.job_title,
                experience_level: record.experience_level,
                company_size: record.company_size,
                remote_ratio: record.remote_ratio,
                salary_usd,
                diff_from_target: (salary_usd - target).abs(),
            })
        })?;

        let mut rows = scored.rows;
        rows.sort_by(|left, right| left.diff_from_target.total_cmp(&right.diff_from_target));
        rows.truncate(top_n);

        info!(
            target,
            candidate_count,
            returned = rows.len(),
            partial = scored.partial,
            "inverse search finished"
        );

        Ok(SearchOutcome {
            rows,
            candidate_count,
            partial: scored.partial,
        })
    }
}
