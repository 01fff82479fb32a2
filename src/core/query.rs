//! User queries.
//!
//! A query is the free-text question or case description plus optional
//! structured patient fields. Queries are ephemeral: one per user request.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PromptError;

/// What the user is asking for. Selects the directive appended to the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    /// Free-form question.
    #[default]
    General,
    /// Structured analysis of a case study.
    CaseStudy,
    /// Differential diagnosis for presenting symptoms.
    DifferentialDiagnosis,
    /// Evidence-based treatment planning.
    TreatmentPlanning,
    /// Screening and assessment instruments.
    AssessmentTools,
    /// DSM-5-TR diagnostic criteria.
    Dsm5Criteria,
    /// Study notes and summaries on a topic.
    StudyNotes,
}

impl QueryKind {
    /// All kinds, in menu order.
    pub const ALL: [Self; 7] = [
        Self::General,
        Self::CaseStudy,
        Self::DifferentialDiagnosis,
        Self::TreatmentPlanning,
        Self::AssessmentTools,
        Self::Dsm5Criteria,
        Self::StudyNotes,
    ];

    /// Canonical CLI name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::CaseStudy => "case-study",
            Self::DifferentialDiagnosis => "differential",
            Self::TreatmentPlanning => "treatment",
            Self::AssessmentTools => "assessment",
            Self::Dsm5Criteria => "dsm5",
            Self::StudyNotes => "study-notes",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::General => "General Question",
            Self::CaseStudy => "Case Study Analysis",
            Self::DifferentialDiagnosis => "Differential Diagnosis",
            Self::TreatmentPlanning => "Treatment Planning",
            Self::AssessmentTools => "Assessment Tools",
            Self::Dsm5Criteria => "DSM-5 Criteria",
            Self::StudyNotes => "Study Notes",
        }
    }
}

impl FromStr for QueryKind {
    type Err = PromptError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "general" | "general-question" | "question" => Ok(Self::General),
            "case-study" | "case" | "case-study-analysis" => Ok(Self::CaseStudy),
            "differential" | "differential-diagnosis" => Ok(Self::DifferentialDiagnosis),
            "treatment" | "treatment-planning" => Ok(Self::TreatmentPlanning),
            "assessment" | "assessment-tools" => Ok(Self::AssessmentTools),
            "dsm5" | "dsm-5" | "dsm5-criteria" | "dsm-5-criteria" => Ok(Self::Dsm5Criteria),
            "study-notes" | "notes" => Ok(Self::StudyNotes),
            _ => Err(PromptError::UnknownKind {
                name: s.to_string(),
            }),
        }
    }
}

impl fmt::Display for QueryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single user request.
///
/// # Examples
///
/// ```
/// use casewise::core::{Query, QueryKind};
///
/// let query = Query::new("Persistent sadness for three months")
///     .kind(QueryKind::CaseStudy)
///     .age(14);
/// assert!(query.has_patient_info());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Query {
    /// Question or case description.
    pub text: String,

    /// Kind of analysis requested.
    #[serde(default)]
    pub kind: QueryKind,

    /// Patient age in years.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u8>,

    /// Patient gender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,

    /// Additional context (family history, prior diagnoses, medications).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Query {
    /// Creates a general query.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Self::default()
        }
    }

    /// Sets the query kind.
    #[must_use]
    pub const fn kind(mut self, kind: QueryKind) -> Self {
        self.kind = kind;
        self
    }

    /// Sets the patient age.
    #[must_use]
    pub const fn age(mut self, age: u8) -> Self {
        self.age = Some(age);
        self
    }

    /// Sets the patient gender. Blank values are ignored.
    #[must_use]
    pub fn gender(mut self, gender: impl Into<String>) -> Self {
        self.gender = non_blank(gender.into());
        self
    }

    /// Sets the additional context. Blank values are ignored.
    #[must_use]
    pub fn context(mut self, context: impl Into<String>) -> Self {
        self.context = non_blank(context.into());
        self
    }

    /// Returns `true` if the query text is blank after trimming.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Returns `true` if any structured patient field is set.
    #[must_use]
    pub const fn has_patient_info(&self) -> bool {
        self.age.is_some() || self.gender.is_some() || self.context.is_some()
    }
}

fn non_blank(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}
