mod domain;
mod payload;

pub use domain::{
    AttributeField, AttributeRecord, Categorical, CompanySize, Currency, EducationLevel,
    EmploymentType, ExperienceLevel, Industry, JobTitle, Location, REMOTE_RATIO_STEPS,
};
pub(crate) use payload::{coerce_real, coerce_string, json_number, serialize_number};
