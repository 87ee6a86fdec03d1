//! The public registration flow: domain model, the six-step form controller
//! and its validators, the document policy table, and the submission
//! pipeline that hands a finished form to the remote stores.

pub mod domain;
pub mod form;
pub mod requirements;
pub mod router;
pub mod steps;
pub mod submission;

#[cfg(test)]
mod tests;

pub use domain::{
    score_label, Application, ApplicationDraft, ApplicationId, ApplicationStage,
    ApplicationStatus, AssessmentScores, AttachedDocument, CaseStudy, CaseStudyId,
    CaseStudyResponse, Competency, DocumentError, NewApplication, GENERAL_AUDIENCE,
    MAX_DOCUMENT_BYTES,
};
pub use form::{RegistrationForm, StepBlocked};
pub use requirements::FileRequirements;
pub use router::{intake_router, IntakeService, SubmissionRequest};
pub use steps::{FormStep, MIN_CASE_RESPONSE_CHARS, MIN_MOTIVATION_CHARS};
pub use submission::{
    DocumentSlot, SubmissionError, SubmissionPipeline, SubmissionReceipt, CONFIRMATION_PATH,
    CV_BUCKET, PORTFOLIO_BUCKET,
};
