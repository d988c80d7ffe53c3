use super::{SalaryEstimator, MOCK_SOURCE};
use crate::estimation::error::PredictionError;
use crate::estimation::record::{
    AttributeRecord, CompanySize, EducationLevel, ExperienceLevel, JobTitle,
};

/// Base salary for titles without a dedicated entry.
pub const DEFAULT_BASE_SALARY: f64 = 120_000.0;

const SKILL_STEP: f64 = 0.01;
const SKILL_CAP: f64 = 0.08;
const BENEFITS_PIVOT: f64 = 7.5;
const BENEFITS_STEP: f64 = 0.01;

/// Closed-form scorer used when no trained model is in play.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicEstimator;

impl SalaryEstimator for HeuristicEstimator {
    fn source(&self) -> String {
        MOCK_SOURCE.to_string()
    }

    fn estimate(&self, record: &AttributeRecord) -> Result<f64, PredictionError> {
        let salary = heuristic_salary(record);
        if salary.is_finite() {
            Ok(salary)
        } else {
            Err(PredictionError::Inference(
                "heuristic produced a non-finite salary".to_string(),
            ))
        }
    }
}

/// `base * (1 + adjustments)`, rounded to the nearest hundred.
///
/// The adjustments are summed left to right in a fixed order so results are
/// reproducible to the last bit.
pub fn heuristic_salary(record: &AttributeRecord) -> f64 {
    let base = base_salary(&record.job_title);
    let multiplier = 1.0
        + experience_boost(record.experience_level)
        + remote_adjustment(record.remote_ratio)
        + education_adjustment(record.education_required)
        + size_adjustment(record.company_size)
        + skills_adjustment(record.skills_count())
        + benefits_adjustment(record.benefits_score);

    round_to_hundreds(base * multiplier)
}

/// Rounds half-to-even at the hundreds: 101_650 becomes 101_600, 158_750 becomes 158_800.
pub fn round_to_hundreds(value: f64) -> f64 {
    (value / 100.0).round_ties_even() * 100.0
}

fn base_salary(title: &JobTitle) -> f64 {
    match title {
        JobTitle::AiResearchScientist => 155_000.0,
        JobTitle::AiSoftwareEngineer => 135_000.0,
        JobTitle::AiSpecialist => 120_000.0,
        JobTitle::NlpEngineer => 140_000.0,
        JobTitle::AiConsultant => 125_000.0,
        JobTitle::AiArchitect => 150_000.0,
        JobTitle::PrincipalDataScientist => 165_000.0,
        JobTitle::DataAnalyst => 95_000.0,
        JobTitle::Other(_) => DEFAULT_BASE_SALARY,
    }
}

// Lead sits below Principal.
fn experience_boost(level: ExperienceLevel) -> f64 {
    match level {
        ExperienceLevel::Entry => -0.15,
        ExperienceLevel::Mid => 0.0,
        ExperienceLevel::Senior => 0.25,
        ExperienceLevel::Principal => 0.45,
        ExperienceLevel::Lead => 0.4,
    }
}

fn remote_adjustment(remote_ratio: f64) -> f64 {
    if remote_ratio >= 80.0 {
        0.05
    } else if remote_ratio >= 50.0 {
        0.02
    } else {
        0.0
    }
}

fn education_adjustment(education: EducationLevel) -> f64 {
    match education {
        EducationLevel::NoDegree => -0.05,
        EducationLevel::Bachelor => 0.0,
        EducationLevel::Master => 0.05,
        EducationLevel::Doctorate => 0.12,
    }
}

fn size_adjustment(size: CompanySize) -> f64 {
    match size {
        CompanySize::Small => -0.03,
        CompanySize::Medium => 0.0,
        CompanySize::Large => 0.03,
        CompanySize::ExtraLarge => 0.05,
    }
}

fn skills_adjustment(skills: usize) -> f64 {
    (skills as f64 * SKILL_STEP).min(SKILL_CAP)
}

fn benefits_adjustment(benefits_score: f64) -> f64 {
    (benefits_score - BENEFITS_PIVOT) * BENEFITS_STEP
}
