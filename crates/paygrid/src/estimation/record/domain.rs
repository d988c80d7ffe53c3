use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// Remote-work percentages offered when a search leaves `remote_ratio` open.
pub const REMOTE_RATIO_STEPS: [f64; 3] = [0.0, 50.0, 100.0];

/// Closed label set with a documented baseline for absent or unknown input.
pub trait Categorical: Copy + Default + 'static {
    const ALL: &'static [Self];

    fn label(self) -> &'static str;

    /// Case-insensitive lookup against [`Categorical::label`].
    fn from_label(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.label().eq_ignore_ascii_case(raw))
    }

    /// Lookup that never fails, falling back to the baseline value.
    fn parse_or_default(raw: &str) -> Self {
        Self::from_label(raw).unwrap_or_default()
    }
}

/// Role names with a dedicated base salary; anything else is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum JobTitle {
    AiResearchScientist,
    AiSoftwareEngineer,
    #[default]
    AiSpecialist,
    NlpEngineer,
    AiConsultant,
    AiArchitect,
    PrincipalDataScientist,
    DataAnalyst,
    Other(String),
}

impl JobTitle {
    pub const KNOWN: [JobTitle; 8] = [
        JobTitle::AiResearchScientist,
        JobTitle::AiSoftwareEngineer,
        JobTitle::AiSpecialist,
        JobTitle::NlpEngineer,
        JobTitle::AiConsultant,
        JobTitle::AiArchitect,
        JobTitle::PrincipalDataScientist,
        JobTitle::DataAnalyst,
    ];

    pub fn label(&self) -> &str {
        match self {
            JobTitle::AiResearchScientist => "AI Research Scientist",
            JobTitle::AiSoftwareEngineer => "AI Software Engineer",
            JobTitle::AiSpecialist => "AI Specialist",
            JobTitle::NlpEngineer => "NLP Engineer",
            JobTitle::AiConsultant => "AI Consultant",
            JobTitle::AiArchitect => "AI Architect",
            JobTitle::PrincipalDataScientist => "Principal Data Scientist",
            JobTitle::DataAnalyst => "Data Analyst",
            JobTitle::Other(title) => title,
        }
    }

    /// Blank input maps to the default title; unknown input to [`JobTitle::Other`].
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return JobTitle::default();
        }

        Self::KNOWN
            .into_iter()
            .find(|known| known.label().eq_ignore_ascii_case(raw))
            .unwrap_or_else(|| JobTitle::Other(raw.to_string()))
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, JobTitle::Other(_))
    }
}

impl Serialize for JobTitle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for JobTitle {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(JobTitle::parse(&raw))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ExperienceLevel {
    Entry,
    #[default]
    Mid,
    Senior,
    Principal,
    Lead,
}

impl Categorical for ExperienceLevel {
    const ALL: &'static [Self] = &[
        ExperienceLevel::Entry,
        ExperienceLevel::Mid,
        ExperienceLevel::Senior,
        ExperienceLevel::Principal,
        ExperienceLevel::Lead,
    ];

    fn label(self) -> &'static str {
        match self {
            ExperienceLevel::Entry => "Entry",
            ExperienceLevel::Mid => "Mid",
            ExperienceLevel::Senior => "Senior",
            ExperienceLevel::Principal => "Principal",
            ExperienceLevel::Lead => "Lead",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EmploymentType {
    #[default]
    #[serde(rename = "FT")]
    FullTime,
    #[serde(rename = "PT")]
    PartTime,
    Contract,
    Intern,
}

impl Categorical for EmploymentType {
    const ALL: &'static [Self] = &[
        EmploymentType::FullTime,
        EmploymentType::PartTime,
        EmploymentType::Contract,
        EmploymentType::Intern,
    ];

    fn label(self) -> &'static str {
        match self {
            EmploymentType::FullTime => "FT",
            EmploymentType::PartTime => "PT",
            EmploymentType::Contract => "Contract",
            EmploymentType::Intern => "Intern",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EducationLevel {
    #[serde(rename = "None")]
    NoDegree,
    #[default]
    Bachelor,
    Master,
    #[serde(rename = "PhD")]
    Doctorate,
}

impl Categorical for EducationLevel {
    const ALL: &'static [Self] = &[
        EducationLevel::NoDegree,
        EducationLevel::Bachelor,
        EducationLevel::Master,
        EducationLevel::Doctorate,
    ];

    fn label(self) -> &'static str {
        match self {
            EducationLevel::NoDegree => "None",
            EducationLevel::Bachelor => "Bachelor",
            EducationLevel::Master => "Master",
            EducationLevel::Doctorate => "PhD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CompanySize {
    #[serde(rename = "S")]
    Small,
    #[default]
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Large,
    #[serde(rename = "XL")]
    ExtraLarge,
}

impl Categorical for CompanySize {
    const ALL: &'static [Self] = &[
        CompanySize::Small,
        CompanySize::Medium,
        CompanySize::Large,
        CompanySize::ExtraLarge,
    ];

    fn label(self) -> &'static str {
        match self {
            CompanySize::Small => "S",
            CompanySize::Medium => "M",
            CompanySize::Large => "L",
            CompanySize::ExtraLarge => "XL",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Location {
    #[default]
    #[serde(rename = "US")]
    UnitedStates,
    #[serde(rename = "PL")]
    Poland,
    #[serde(rename = "UK")]
    UnitedKingdom,
    #[serde(rename = "DE")]
    Germany,
    #[serde(rename = "FR")]
    France,
    #[serde(rename = "CA")]
    Canada,
    #[serde(rename = "IN")]
    India,
    Remote,
}

impl Categorical for Location {
    const ALL: &'static [Self] = &[
        Location::UnitedStates,
        Location::Poland,
        Location::UnitedKingdom,
        Location::Germany,
        Location::France,
        Location::Canada,
        Location::India,
        Location::Remote,
    ];

    fn label(self) -> &'static str {
        match self {
            Location::UnitedStates => "US",
            Location::Poland => "PL",
            Location::UnitedKingdom => "UK",
            Location::Germany => "DE",
            Location::France => "FR",
            Location::Canada => "CA",
            Location::India => "IN",
            Location::Remote => "Remote",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Industry {
    #[default]
    Technology,
    Finance,
    Healthcare,
    Retail,
    Manufacturing,
    Automotive,
    Telecom,
    Education,
    Government,
}

impl Categorical for Industry {
    const ALL: &'static [Self] = &[
        Industry::Technology,
        Industry::Finance,
        Industry::Healthcare,
        Industry::Retail,
        Industry::Manufacturing,
        Industry::Automotive,
        Industry::Telecom,
        Industry::Education,
        Industry::Government,
    ];

    fn label(self) -> &'static str {
        match self {
            Industry::Technology => "Technology",
            Industry::Finance => "Finance",
            Industry::Healthcare => "Healthcare",
            Industry::Retail => "Retail",
            Industry::Manufacturing => "Manufacturing",
            Industry::Automotive => "Automotive",
            Industry::Telecom => "Telecom",
            Industry::Education => "Education",
            Industry::Government => "Government",
        }
    }
}

/// Salaries are always reported in a single unit; there is no conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Currency {
    #[default]
    #[serde(rename = "USD")]
    Usd,
}

impl Categorical for Currency {
    const ALL: &'static [Self] = &[Currency::Usd];

    fn label(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
        }
    }
}

/// Payload keys understood by the record factory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttributeField {
    JobTitle,
    ExperienceLevel,
    EmploymentType,
    YearsExperience,
    EducationRequired,
    CompanyLocation,
    EmployeeResidence,
    CompanySize,
    RemoteRatio,
    BenefitsScore,
    Industry,
    RequiredSkills,
    SalaryCurrency,
}

impl AttributeField {
    pub const ALL: [AttributeField; 13] = [
        AttributeField::JobTitle,
        AttributeField::ExperienceLevel,
        AttributeField::EmploymentType,
        AttributeField::YearsExperience,
        AttributeField::EducationRequired,
        AttributeField::CompanyLocation,
        AttributeField::EmployeeResidence,
        AttributeField::CompanySize,
        AttributeField::RemoteRatio,
        AttributeField::BenefitsScore,
        AttributeField::Industry,
        AttributeField::RequiredSkills,
        AttributeField::SalaryCurrency,
    ];

    pub const fn key(self) -> &'static str {
        match self {
            AttributeField::JobTitle => "job_title",
            AttributeField::ExperienceLevel => "experience_level",
            AttributeField::EmploymentType => "employment_type",
            AttributeField::YearsExperience => "years_experience",
            AttributeField::EducationRequired => "education_required",
            AttributeField::CompanyLocation => "company_location",
            AttributeField::EmployeeResidence => "employee_residence",
            AttributeField::CompanySize => "company_size",
            AttributeField::RemoteRatio => "remote_ratio",
            AttributeField::BenefitsScore => "benefits_score",
            AttributeField::Industry => "industry",
            AttributeField::RequiredSkills => "required_skills",
            AttributeField::SalaryCurrency => "salary_currency",
        }
    }

    /// Enum-valued fields, as opposed to numbers and the skill set.
    pub const fn is_categorical(self) -> bool {
        !matches!(
            self,
            AttributeField::YearsExperience
                | AttributeField::RemoteRatio
                | AttributeField::BenefitsScore
                | AttributeField::RequiredSkills
        )
    }

    pub fn from_key(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL.into_iter().find(|field| field.key() == raw)
    }
}

/// Normalized job attributes. Built once per request or combination and
/// only ever read by the scorers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttributeRecord {
    pub job_title: JobTitle,
    pub experience_level: ExperienceLevel,
    pub employment_type: EmploymentType,
    pub years_experience: i64,
    pub education_required: EducationLevel,
    pub company_location: Location,
    pub employee_residence: Location,
    pub company_size: CompanySize,
    pub remote_ratio: f64,
    pub benefits_score: f64,
    pub industry: Industry,
    pub required_skills: BTreeSet<String>,
    pub salary_currency: Currency,
}

impl Default for AttributeRecord {
    fn default() -> Self {
        Self {
            job_title: JobTitle::default(),
            experience_level: ExperienceLevel::default(),
            employment_type: EmploymentType::default(),
            years_experience: 0,
            education_required: EducationLevel::default(),
            company_location: Location::default(),
            employee_residence: Location::default(),
            company_size: CompanySize::default(),
            remote_ratio: 0.0,
            benefits_score: 7.5,
            industry: Industry::default(),
            required_skills: BTreeSet::new(),
            salary_currency: Currency::default(),
        }
    }
}

impl AttributeRecord {
    /// Fixed attributes shared by every inverse-search candidate.
    pub fn search_baseline() -> Self {
        Self {
            employment_type: EmploymentType::FullTime,
            years_experience: 3,
            education_required: EducationLevel::Master,
            company_location: Location::UnitedStates,
            employee_residence: Location::UnitedStates,
            benefits_score: 7.5,
            industry: Industry::Technology,
            required_skills: ["Python", "SQL"].into_iter().map(str::to_string).collect(),
            salary_currency: Currency::Usd,
            ..Self::default()
        }
    }

    pub fn skills_count(&self) -> usize {
        self.required_skills.len()
    }

    /// Label of an enum-valued field, `None` for numeric and set fields.
    pub fn categorical_label(&self, field: AttributeField) -> Option<&str> {
        let label = match field {
            AttributeField::JobTitle => return Some(self.job_title.label()),
            AttributeField::ExperienceLevel => self.experience_level.label(),
            AttributeField::EmploymentType => self.employment_type.label(),
            AttributeField::EducationRequired => self.education_required.label(),
            AttributeField::CompanyLocation => self.company_location.label(),
            AttributeField::EmployeeResidence => self.employee_residence.label(),
            AttributeField::CompanySize => self.company_size.label(),
            AttributeField::Industry => self.industry.label(),
            AttributeField::SalaryCurrency => self.salary_currency.label(),
            AttributeField::YearsExperience
            | AttributeField::RemoteRatio
            | AttributeField::BenefitsScore
            | AttributeField::RequiredSkills => return None,
        };
        Some(label)
    }

    /// Loose payload form, accepted back by [`AttributeRecord::from_payload`].
    pub fn to_payload(&self) -> Map<String, Value> {
        match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_match_case_insensitively() {
        assert_eq!(
            ExperienceLevel::from_label(" senior "),
            Some(ExperienceLevel::Senior)
        );
        assert_eq!(CompanySize::from_label("xl"), Some(CompanySize::ExtraLarge));
        assert_eq!(EducationLevel::from_label("phd"), Some(EducationLevel::Doctorate));
        assert_eq!(Location::from_label("Mars"), None);
        assert_eq!(Industry::parse_or_default("Mining"), Industry::Technology);
    }

    #[test]
    fn unknown_job_titles_are_kept() {
        assert_eq!(JobTitle::parse("nlp engineer"), JobTitle::NlpEngineer);
        assert_eq!(
            JobTitle::parse("Prompt Whisperer"),
            JobTitle::Other("Prompt Whisperer".to_string())
        );
        assert_eq!(JobTitle::parse("   "), JobTitle::AiSpecialist);
    }

    #[test]
    fn attribute_field_keys_round_trip() {
        for field in AttributeField::ALL {
            assert_eq!(AttributeField::from_key(field.key()), Some(field));
        }
        assert_eq!(AttributeField::from_key("company_name"), None);
    }

    #[test]
    fn payload_form_uses_labels() {
        let payload = AttributeRecord::search_baseline().to_payload();
        assert_eq!(payload["job_title"], "AI Specialist");
        assert_eq!(payload["education_required"], "Master");
        assert_eq!(payload["employment_type"], "FT");
        assert_eq!(payload["required_skills"], serde_json::json!(["Python", "SQL"]));
        assert_eq!(payload.len(), AttributeField::ALL.len());
    }
}
