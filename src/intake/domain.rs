use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identifier wrapper for persisted applications (assigned by the store).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier wrapper for case studies.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CaseStudyId(pub String);

impl fmt::Display for CaseStudyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The six functional areas an applicant can choose from.
///
/// Serialized with the exact labels the `applications` table stores, so the
/// wire format matches what the review tooling expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Competency {
    #[serde(rename = "Digital Transformation Area")]
    DigitalTransformation,
    #[serde(rename = "Human Development Area")]
    HumanDevelopment,
    #[serde(rename = "Process & Optimization Area")]
    ProcessOptimization,
    #[serde(rename = "Brand & Communication Area")]
    BrandCommunication,
    #[serde(rename = "Insight & Impact Area")]
    InsightImpact,
    #[serde(rename = "Compliance & Governance Area")]
    ComplianceGovernance,
}

impl Competency {
    pub const ALL: [Competency; 6] = [
        Competency::DigitalTransformation,
        Competency::HumanDevelopment,
        Competency::ProcessOptimization,
        Competency::BrandCommunication,
        Competency::InsightImpact,
        Competency::ComplianceGovernance,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            Competency::DigitalTransformation => "Digital Transformation Area",
            Competency::HumanDevelopment => "Human Development Area",
            Competency::ProcessOptimization => "Process & Optimization Area",
            Competency::BrandCommunication => "Brand & Communication Area",
            Competency::InsightImpact => "Insight & Impact Area",
            Competency::ComplianceGovernance => "Compliance & Governance Area",
        }
    }

    /// Short blurb shown on the competency selection cards.
    pub const fn description(self) -> &'static str {
        match self {
            Competency::DigitalTransformation => {
                "Lead the digital transformation of the organization to extend program reach."
            }
            Competency::HumanDevelopment => {
                "Grow people and build an organizational culture that sustains itself."
            }
            Competency::ProcessOptimization => {
                "Design and optimize operational processes to maximize program impact."
            }
            Competency::BrandCommunication => {
                "Build brand awareness and communication strategies that widen the mission."
            }
            Competency::InsightImpact => {
                "Analyze data and measure impact for evidence-based decisions."
            }
            Competency::ComplianceGovernance => {
                "Keep governance sound and programs compliant for the long run."
            }
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Competency::ALL
            .into_iter()
            .find(|competency| competency.label() == label)
    }
}

impl fmt::Display for Competency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Review workflow status for a submitted application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApplicationStatus {
    #[default]
    New,
    Reviewed,
    Interview,
    Accepted,
    Rejected,
}

impl ApplicationStatus {
    pub const ALL: [ApplicationStatus; 5] = [
        ApplicationStatus::New,
        ApplicationStatus::Reviewed,
        ApplicationStatus::Interview,
        ApplicationStatus::Accepted,
        ApplicationStatus::Rejected,
    ];

    pub const fn label(self) -> &'static str {
        match self {
            ApplicationStatus::New => "new",
            ApplicationStatus::Reviewed => "reviewed",
            ApplicationStatus::Interview => "interview",
            ApplicationStatus::Accepted => "accepted",
            ApplicationStatus::Rejected => "rejected",
        }
    }
}

impl FromStr for ApplicationStatus {
    type Err = UnknownStatus;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ApplicationStatus::ALL
            .into_iter()
            .find(|status| status.label() == value)
            .ok_or_else(|| UnknownStatus(value.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown application status: {0}")]
pub struct UnknownStatus(pub String);

/// Coarse marker distinguishing the first registration pass from the
/// case-study pass. The public form always submits the second stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum ApplicationStage {
    Initial,
    CaseStudy,
}

impl From<ApplicationStage> for u8 {
    fn from(stage: ApplicationStage) -> Self {
        match stage {
            ApplicationStage::Initial => 1,
            ApplicationStage::CaseStudy => 2,
        }
    }
}

impl TryFrom<u8> for ApplicationStage {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(ApplicationStage::Initial),
            2 => Ok(ApplicationStage::CaseStudy),
            other => Err(format!("application stage must be 1 or 2, got {other}")),
        }
    }
}

/// Work-style assessment answers, each on a 0-4 scale where 0 means the
/// applicant has not picked an option yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AssessmentScores {
    pub leadership_style: u8,
    pub collaboration_preference: u8,
    pub problem_solving_approach: u8,
    pub communication_style: u8,
    pub learning_orientation: u8,
    pub stress_management: u8,
    pub innovation_mindset: u8,
    pub empathy_level: u8,
}

/// Human-readable label for an assessment score used by the review views.
pub const fn score_label(score: u8) -> &'static str {
    match score {
        0 => "not selected",
        1 => "low",
        2 => "moderate",
        3 => "high",
        4 => "very high",
        _ => "unknown",
    }
}

/// Externally authored case study prompt; read-only for the form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseStudy {
    pub id: CaseStudyId,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    pub title: String,
    pub description: String,
    /// Competency label this prompt targets, or `"General"` for everyone.
    pub competency: String,
    pub scenario: String,
    #[serde(default)]
    pub questions: Vec<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

fn default_true() -> bool {
    true
}

/// Label used by case studies that apply to every applicant.
pub const GENERAL_AUDIENCE: &str = "General";

impl CaseStudy {
    /// Whether this prompt is mandatory for an applicant with the given
    /// primary competency. A missing selection leaves only the general
    /// prompts mandatory.
    pub fn applies_to(&self, primary: Option<Competency>) -> bool {
        if self.competency == GENERAL_AUDIENCE {
            return true;
        }
        primary.is_some_and(|competency| self.competency == competency.label())
    }
}

/// One free-text answer to a case study, keyed by the prompt it answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseStudyResponse {
    pub case_id: CaseStudyId,
    pub response: String,
}

/// In-progress application record held by the form controller. Field writes
/// are never validated here; validation happens at step transitions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationDraft {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: Option<NaiveDate>,
    pub motivation: String,
    pub previous_volunteer_experience: String,
    pub primary_competency: Option<Competency>,
    pub secondary_competency: Option<Competency>,
    #[serde(flatten)]
    pub scores: AssessmentScores,
}

/// Fully composed row as stored in the `applications` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: ApplicationId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub motivation: String,
    #[serde(default)]
    pub previous_volunteer_experience: String,
    pub primary_competency: Competency,
    #[serde(default)]
    pub secondary_competency: Option<Competency>,
    #[serde(flatten)]
    pub scores: AssessmentScores,
    #[serde(default)]
    pub case_study_responses: Vec<CaseStudyResponse>,
    #[serde(default)]
    pub portfolio_path: Option<String>,
    #[serde(default)]
    pub cv_path: Option<String>,
    pub status: ApplicationStatus,
    pub stage: ApplicationStage,
    #[serde(default)]
    pub flagged: bool,
    #[serde(default)]
    pub admin_notes: String,
}

/// Insert payload for a new application; identity and timestamps are
/// assigned by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewApplication {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub birth_date: NaiveDate,
    pub motivation: String,
    pub previous_volunteer_experience: String,
    pub primary_competency: Competency,
    pub secondary_competency: Option<Competency>,
    #[serde(flatten)]
    pub scores: AssessmentScores,
    pub case_study_responses: Vec<CaseStudyResponse>,
    pub portfolio_path: Option<String>,
    pub cv_path: Option<String>,
    pub status: ApplicationStatus,
    pub stage: ApplicationStage,
    pub flagged: bool,
    pub admin_notes: String,
}

/// Hard limit on uploaded document size.
pub const MAX_DOCUMENT_BYTES: usize = 5 * 1024 * 1024;

/// A document the applicant attached to the form. Construction enforces the
/// PDF-only and size rules, so any attached document is safe to upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachedDocument {
    file_name: String,
    bytes: Vec<u8>,
}

impl AttachedDocument {
    pub fn new(
        file_name: impl Into<String>,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<Self, DocumentError> {
        let parsed: mime::Mime = content_type
            .parse()
            .map_err(|_| DocumentError::NotPdf {
                content_type: content_type.to_string(),
            })?;
        if parsed != mime::APPLICATION_PDF {
            return Err(DocumentError::NotPdf {
                content_type: content_type.to_string(),
            });
        }
        if bytes.len() > MAX_DOCUMENT_BYTES {
            return Err(DocumentError::TooLarge {
                size_bytes: bytes.len(),
            });
        }
        Ok(Self {
            file_name: file_name.into(),
            bytes,
        })
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size_bytes(&self) -> usize {
        self.bytes.len()
    }

    pub fn content_type(&self) -> mime::Mime {
        mime::APPLICATION_PDF
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Rejections raised when attaching a document, before any upload happens.
#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("only PDF documents are accepted (got {content_type})")]
    NotPdf { content_type: String },
    #[error("document exceeds the {MAX_DOCUMENT_BYTES} byte limit ({size_bytes} bytes)")]
    TooLarge { size_bytes: usize },
}
