use serde_json::{Map, Value};
use tracing::{debug, info};

use super::enumerate::{combination_count, index_combinations, score_all, EnumerationLimits};
use super::error::PredictionError;
use super::record::{json_number, AttributeField, AttributeRecord};
use super::service::PredictionService;

/// Fixed attributes applied under every grid combination unless the caller
/// supplies its own base.
pub fn default_grid_base() -> Map<String, Value> {
    let mut base = Map::new();
    base.insert(AttributeField::EmploymentType.key().into(), "FT".into());
    base.insert(AttributeField::EducationRequired.key().into(), "Master".into());
    base.insert(AttributeField::CompanyLocation.key().into(), "US".into());
    base.insert(AttributeField::BenefitsScore.key().into(), Value::from(7.5_f64));
    base.insert(AttributeField::SalaryCurrency.key().into(), "USD".into());
    base
}

/// Values to try for one field, passed to the record factory as supplied.
#[derive(Debug, Clone, PartialEq)]
pub struct GridAxis {
    pub field: AttributeField,
    pub values: Vec<Value>,
}

/// Axes in declaration order; the last axis varies fastest.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridSpec {
    axes: Vec<GridAxis>,
}

impl GridSpec {
    pub fn new(axes: Vec<GridAxis>) -> Result<Self, PredictionError> {
        for (position, axis) in axes.iter().enumerate() {
            if axes[..position].iter().any(|seen| seen.field == axis.field) {
                return Err(PredictionError::validation(
                    axis.field.key(),
                    "declared more than once",
                ));
            }
        }
        Ok(Self { axes })
    }

    /// Builds axes from a JSON object, keeping the object's key order.
    pub fn from_json(value: &Value) -> Result<Self, PredictionError> {
        let Value::Object(object) = value else {
            return Err(PredictionError::validation(
                "grid_spec",
                format!("expected an object, got {value}"),
            ));
        };

        let axes = object
            .iter()
            .map(|(key, values)| {
                let field = AttributeField::from_key(key)
                    .ok_or_else(|| PredictionError::validation(key.as_str(), "unknown field"))?;
                match values {
                    Value::Array(values) => Ok(GridAxis {
                        field,
                        values: values.clone(),
                    }),
                    other => Err(PredictionError::validation(
                        key.as_str(),
                        format!("expected a list of values, got {other}"),
                    )),
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(axes)
    }

    pub fn axes(&self) -> &[GridAxis] {
        &self.axes
    }

    pub fn combination_count(&self) -> usize {
        combination_count(&self.axis_lengths())
    }

    fn axis_lengths(&self) -> Vec<usize> {
        self.axes.iter().map(|axis| axis.values.len()).collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridOutcome {
    /// Varying fields as supplied, then `salary_usd`, in enumeration order.
    pub rows: Vec<Map<String, Value>>,
    pub partial: bool,
}

/// Scores the full cross-product of a [`GridSpec`] over a fixed base.
#[derive(Debug, Clone)]
pub struct GridEngine {
    service: PredictionService,
}

impl GridEngine {
    pub fn new(service: PredictionService) -> Self {
        Self { service }
    }

    pub fn grid(
        &self,
        spec: &GridSpec,
        base: &Map<String, Value>,
        limits: &EnumerationLimits,
    ) -> Result<GridOutcome, PredictionError> {
        let lengths = spec.axis_lengths();
        let total = combination_count(&lengths);
        limits.ensure_within(total)?;
        debug!(
            axes = spec.axes.len(),
            total,
            source = %self.service.source(),
            "grid started"
        );

        let scored = score_all(index_combinations(&lengths), limits, |index| {
            let mut payload = base.clone();
            let mut row = Map::new();
            for (axis, &position) in spec.axes.iter().zip(&index) {
                let value = axis.values[position].clone();
                payload.insert(axis.field.key().to_string(), value.clone());
                row.insert(axis.field.key().to_string(), value);
            }

            let record = AttributeRecord::from_payload(&payload)?;
            let salary_usd = self.service.score_record(&record)?;
            row.insert("salary_usd".to_string(), json_number(salary_usd));
            Ok(row)
        })?;

        info!(rows = scored.rows.len(), partial = scored.partial, "grid finished");
        Ok(GridOutcome {
            rows: scored.rows,
            partial: scored.partial,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn axes_keep_declaration_order() {
        let spec = GridSpec::from_json(&json!({
            "experience_level": ["Entry", "Senior"],
            "company_size": ["S", "M", "L"],
            "job_title": ["Data Analyst"],
        }))
        .expect("spec parses");

        let fields: Vec<_> = spec.axes().iter().map(|axis| axis.field).collect();
        assert_eq!(
            fields,
            vec![
                AttributeField::ExperienceLevel,
                AttributeField::CompanySize,
                AttributeField::JobTitle,
            ]
        );
        assert_eq!(spec.combination_count(), 6);
    }

    #[test]
    fn unknown_fields_and_scalars_are_rejected() {
        let unknown = GridSpec::from_json(&json!({ "bonus": [1, 2] })).expect_err("unknown field");
        assert_eq!(unknown, PredictionError::validation("bonus", "unknown field"));

        let scalar =
            GridSpec::from_json(&json!({ "company_size": "XL" })).expect_err("scalar axis");
        assert!(matches!(scalar, PredictionError::Validation { field, .. } if field == "company_size"));

        assert!(GridSpec::from_json(&json!(["company_size"])).is_err());
    }

    #[test]
    fn duplicate_axes_are_rejected() {
        let axis = GridAxis {
            field: AttributeField::CompanySize,
            values: vec![json!("S")],
        };
        let err = GridSpec::new(vec![axis.clone(), axis]).expect_err("duplicate axis");
        assert!(matches!(err, PredictionError::Validation { field, .. } if field == "company_size"));
    }

    #[test]
    fn default_base_matches_form_defaults() {
        let base = default_grid_base();
        assert_eq!(Value::Object(base.clone()), json!({
            "employment_type": "FT",
            "education_required": "Master",
            "company_location": "US",
            "benefits_score": 7.5,
            "salary_currency": "USD",
        }));

        let record = AttributeRecord::from_payload(&base).expect("base is a valid payload");
        assert_eq!(record.education_required, crate::estimation::EducationLevel::Master);
    }
}
