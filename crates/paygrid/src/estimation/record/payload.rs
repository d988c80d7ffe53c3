use std::collections::BTreeSet;

use serde_json::{Map, Value};
use tracing::debug;

use super::domain::{AttributeField, AttributeRecord, Categorical, JobTitle};
use crate::estimation::error::PredictionError;

impl AttributeRecord {
    /// Validating factory for loosely typed payloads.
    ///
    /// Absent, `null` and unrecognized enum values fall back to the documented
    /// defaults. Only numeric fields that cannot be coerced and malformed
    /// skill lists are rejected. Keys outside [`AttributeField`] are ignored.
    pub fn from_payload(payload: &Map<String, Value>) -> Result<Self, PredictionError> {
        let defaults = AttributeRecord::default();
        let lookup = move |field: AttributeField| payload.get(field.key()).filter(|v| !v.is_null());

        Ok(Self {
            job_title: match lookup(AttributeField::JobTitle) {
                Some(value) => coerce_string(value)
                    .map(|raw| JobTitle::parse(&raw))
                    .unwrap_or(defaults.job_title),
                None => defaults.job_title,
            },
            experience_level: categorical(AttributeField::ExperienceLevel, lookup),
            employment_type: categorical(AttributeField::EmploymentType, lookup),
            years_experience: match lookup(AttributeField::YearsExperience) {
                Some(value) => coerce_integer(AttributeField::YearsExperience, value)?,
                None => defaults.years_experience,
            },
            education_required: categorical(AttributeField::EducationRequired, lookup),
            company_location: categorical(AttributeField::CompanyLocation, lookup),
            employee_residence: categorical(AttributeField::EmployeeResidence, lookup),
            company_size: categorical(AttributeField::CompanySize, lookup),
            remote_ratio: match lookup(AttributeField::RemoteRatio) {
                Some(value) => coerce_real(AttributeField::RemoteRatio.key(), value)?,
                None => defaults.remote_ratio,
            },
            benefits_score: match lookup(AttributeField::BenefitsScore) {
                Some(value) => coerce_real(AttributeField::BenefitsScore.key(), value)?,
                None => defaults.benefits_score,
            },
            industry: categorical(AttributeField::Industry, lookup),
            required_skills: match lookup(AttributeField::RequiredSkills) {
                Some(value) => skill_set(value)?,
                None => defaults.required_skills,
            },
            salary_currency: categorical(AttributeField::SalaryCurrency, lookup),
        })
    }
}

fn categorical<'a, T, F>(key: AttributeField, field: F) -> T
where
    T: Categorical,
    F: Fn(AttributeField) -> Option<&'a Value>,
{
    let Some(value) = field(key) else {
        return T::default();
    };

    match coerce_string(value).and_then(|raw| T::from_label(&raw)) {
        Some(parsed) => parsed,
        None => {
            let fallback = T::default();
            debug!(
                field = key.key(),
                %value,
                fallback = fallback.label(),
                "unrecognized label, using default"
            );
            fallback
        }
    }
}

/// Text form of a scalar JSON value; `None` for arrays, objects and null.
pub(crate) fn coerce_string(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => Some(raw.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Accepts JSON numbers and numeric-looking strings; the result is finite.
pub(crate) fn coerce_real(field: &str, value: &Value) -> Result<f64, PredictionError> {
    let parsed = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };

    match parsed {
        Some(number) if number.is_finite() => Ok(number),
        _ => Err(PredictionError::validation(
            field,
            format!("expected a number, got {value}"),
        )),
    }
}

fn coerce_integer(field: AttributeField, value: &Value) -> Result<i64, PredictionError> {
    if let Some(whole) = value.as_i64() {
        return Ok(whole);
    }

    let number = coerce_real(field.key(), value)?;
    if number.fract() == 0.0 && number.abs() < i64::MAX as f64 {
        Ok(number as i64)
    } else {
        Err(PredictionError::validation(
            field.key(),
            format!("expected a whole number, got {value}"),
        ))
    }
}

fn skill_set(value: &Value) -> Result<BTreeSet<String>, PredictionError> {
    let field = AttributeField::RequiredSkills.key();
    let items: Vec<String> = match value {
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(skill) => Ok(skill.clone()),
                other => Err(PredictionError::validation(
                    field,
                    format!("skills must be strings, got {other}"),
                )),
            })
            .collect::<Result<_, _>>()?,
        Value::String(joined) => joined.split(',').map(str::to_string).collect(),
        other => {
            return Err(PredictionError::validation(
                field,
                format!("expected a list of skills, got {other}"),
            ))
        }
    };

    Ok(items
        .into_iter()
        .map(|skill| skill.trim().to_string())
        .filter(|skill| !skill.is_empty())
        .collect())
}

/// JSON form of a computed figure: whole values become integers.
pub(crate) fn json_number(value: f64) -> Value {
    if value.fract() == 0.0 && value.abs() < 9.0e15 {
        Value::from(value as i64)
    } else {
        serde_json::Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

pub(crate) fn serialize_number<S: serde::Serializer>(
    value: &f64,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serde::Serialize::serialize(&json_number(*value), serializer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimation::record::{
        CompanySize, Currency, EducationLevel, ExperienceLevel, Location,
    };
    use serde_json::json;

    fn payload(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object payload, got {other}"),
        }
    }

    #[test]
    fn empty_payload_yields_documented_defaults() {
        let record = AttributeRecord::from_payload(&Map::new()).expect("defaults apply");
        assert_eq!(record, AttributeRecord::default());
        assert_eq!(record.job_title, JobTitle::AiSpecialist);
        assert_eq!(record.experience_level, ExperienceLevel::Mid);
        assert_eq!(record.education_required, EducationLevel::Bachelor);
        assert_eq!(record.company_size, CompanySize::Medium);
        assert_eq!(record.benefits_score, 7.5);
    }

    #[test]
    fn numeric_strings_are_coerced() {
        let record = AttributeRecord::from_payload(&payload(json!({
            "years_experience": " 7 ",
            "remote_ratio": "50",
            "benefits_score": "8.25",
        })))
        .expect("numeric strings coerce");

        assert_eq!(record.years_experience, 7);
        assert_eq!(record.remote_ratio, 50.0);
        assert_eq!(record.benefits_score, 8.25);
    }

    #[test]
    fn non_numeric_years_experience_is_rejected() {
        let err = AttributeRecord::from_payload(&payload(json!({ "years_experience": "lots" })))
            .expect_err("non-numeric years rejected");

        match err {
            PredictionError::Validation { field, .. } => assert_eq!(field, "years_experience"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn fractional_years_experience_is_rejected() {
        let err = AttributeRecord::from_payload(&payload(json!({ "years_experience": 2.5 })))
            .expect_err("fractional years rejected");
        assert!(matches!(err, PredictionError::Validation { .. }));

        let record = AttributeRecord::from_payload(&payload(json!({ "years_experience": 4.0 })))
            .expect("integral float accepted");
        assert_eq!(record.years_experience, 4);
    }

    #[test]
    fn boolean_remote_ratio_is_rejected() {
        let err = AttributeRecord::from_payload(&payload(json!({ "remote_ratio": true })))
            .expect_err("bool is not a number");
        assert_eq!(err.kind(), crate::estimation::ErrorKind::ValidationError);
    }

    #[test]
    fn unrecognized_labels_fall_back() {
        let record = AttributeRecord::from_payload(&payload(json!({
            "experience_level": "Wizard",
            "company_size": 3,
            "company_location": ["US"],
            "salary_currency": "EUR",
            "education_required": null,
        })))
        .expect("fallbacks never fail");

        assert_eq!(record.experience_level, ExperienceLevel::Mid);
        assert_eq!(record.company_size, CompanySize::Medium);
        assert_eq!(record.company_location, Location::UnitedStates);
        assert_eq!(record.salary_currency, Currency::Usd);
        assert_eq!(record.education_required, EducationLevel::Bachelor);
    }

    #[test]
    fn skills_collapse_into_a_set() {
        let record = AttributeRecord::from_payload(&payload(json!({
            "required_skills": ["Python", " SQL", "Python", ""],
        })))
        .expect("skills list accepted");
        assert_eq!(record.skills_count(), 2);

        let record = AttributeRecord::from_payload(&payload(json!({
            "required_skills": "AWS, GCP ,Azure,",
        })))
        .expect("comma separated skills accepted");
        assert_eq!(record.skills_count(), 3);
        assert!(record.required_skills.contains("GCP"));
    }

    #[test]
    fn malformed_skills_are_rejected() {
        let err = AttributeRecord::from_payload(&payload(json!({ "required_skills": [1, 2] })))
            .expect_err("numeric skills rejected");
        assert!(matches!(err, PredictionError::Validation { .. }));
    }

    #[test]
    fn extra_keys_are_ignored_and_payload_form_round_trips() {
        let mut raw = payload(json!({
            "job_title": "Data Analyst",
            "experience_level": "Lead",
            "company_name": "Unknown",
            "job_description_length": 0,
        }));
        let record = AttributeRecord::from_payload(&raw).expect("extra keys ignored");
        assert_eq!(record.job_title, JobTitle::DataAnalyst);

        raw = record.to_payload();
        let again = AttributeRecord::from_payload(&raw).expect("payload form parses");
        assert_eq!(again, record);
    }
}
