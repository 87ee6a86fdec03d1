use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::backend::{ApplicationStore, ObjectStore, StorageError, StoreError};

use super::domain::{
    ApplicationStage, ApplicationStatus, AttachedDocument, NewApplication,
};
use super::form::{RegistrationForm, StepBlocked};
use super::steps::FormStep;

/// Bucket holding applicant portfolios.
pub const PORTFOLIO_BUCKET: &str = "portfolios";

/// Bucket holding applicant CVs.
pub const CV_BUCKET: &str = "cvs";

/// Client-side route the confirmation view lives on.
pub const CONFIRMATION_PATH: &str = "/thank-you-final";

/// Which document slot an upload belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSlot {
    Portfolio,
    Cv,
}

impl DocumentSlot {
    pub const fn bucket(self) -> &'static str {
        match self {
            DocumentSlot::Portfolio => PORTFOLIO_BUCKET,
            DocumentSlot::Cv => CV_BUCKET,
        }
    }
}

impl fmt::Display for DocumentSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentSlot::Portfolio => f.write_str("portfolio"),
            DocumentSlot::Cv => f.write_str("cv"),
        }
    }
}

/// Outcome handed to the confirmation view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionReceipt {
    /// Display name carried into the thank-you page.
    pub applicant_name: String,
    pub portfolio_path: Option<String>,
    pub cv_path: Option<String>,
}

/// Failures along the submission sequence. Uploads that succeeded before the
/// failing stage are not retracted.
#[derive(Debug, thiserror::Error)]
pub enum SubmissionError {
    #[error(transparent)]
    Incomplete(#[from] StepBlocked),
    #[error("failed to upload {slot}: {source}")]
    Upload {
        slot: DocumentSlot,
        source: StorageError,
    },
    #[error("failed to save application: {0}")]
    Store(#[from] StoreError),
}

/// Sequential upload-then-insert flow behind the final form step.
///
/// Not retryable and without compensation: a failure after an upload leaves
/// the object orphaned, and a re-submission uploads again under a fresh
/// attempt id.
pub struct SubmissionPipeline<S, O> {
    applications: Arc<S>,
    objects: Arc<O>,
}

impl<S, O> SubmissionPipeline<S, O>
where
    S: ApplicationStore,
    O: ObjectStore,
{
    pub fn new(applications: Arc<S>, objects: Arc<O>) -> Self {
        Self {
            applications,
            objects,
        }
    }

    /// Validate every step, upload attachments, then insert the one composed
    /// row. The first failing step or remote call aborts the whole flow.
    pub async fn submit(
        &self,
        form: RegistrationForm,
    ) -> Result<SubmissionReceipt, SubmissionError> {
        if let Some(step) = form.first_incomplete_step() {
            return Err(StepBlocked { step }.into());
        }

        // Namespace object paths per attempt; retried submissions get a new
        // prefix rather than overwriting earlier uploads.
        let attempt_id = Utc::now().timestamp_millis();

        let (draft, responses, portfolio, cv) = form.into_parts();

        let portfolio_path = match portfolio {
            Some(document) => Some(
                self.upload(DocumentSlot::Portfolio, attempt_id, &document)
                    .await?,
            ),
            None => None,
        };

        let cv_path = match cv {
            Some(document) => Some(self.upload(DocumentSlot::Cv, attempt_id, &document).await?),
            None => None,
        };

        let primary_competency = draft.primary_competency.ok_or(StepBlocked {
            step: FormStep::Competency,
        })?;
        let birth_date = draft.birth_date.ok_or(StepBlocked {
            step: FormStep::PersonalData,
        })?;
        let secondary_competency = draft
            .secondary_competency
            .filter(|secondary| *secondary != primary_competency);

        let applicant_name = draft.full_name.clone();
        let record = NewApplication {
            full_name: draft.full_name,
            email: draft.email,
            phone: draft.phone,
            birth_date,
            motivation: draft.motivation,
            previous_volunteer_experience: draft.previous_volunteer_experience,
            primary_competency,
            secondary_competency,
            scores: draft.scores,
            case_study_responses: responses,
            portfolio_path: portfolio_path.clone(),
            cv_path: cv_path.clone(),
            status: ApplicationStatus::New,
            stage: ApplicationStage::CaseStudy,
            flagged: false,
            admin_notes: String::new(),
        };

        if let Err(error) = self.applications.insert(record).await {
            warn!(%error, "application insert failed after uploads");
            return Err(error.into());
        }

        info!(
            applicant = %applicant_name,
            portfolio = portfolio_path.is_some(),
            cv = cv_path.is_some(),
            "application submitted"
        );

        Ok(SubmissionReceipt {
            applicant_name,
            portfolio_path,
            cv_path,
        })
    }

    async fn upload(
        &self,
        slot: DocumentSlot,
        attempt_id: i64,
        document: &AttachedDocument,
    ) -> Result<String, SubmissionError> {
        let path = format!("public/{attempt_id}-{}", document.file_name());
        self.objects
            .upload(slot.bucket(), &path, document)
            .await
            .map_err(|source| SubmissionError::Upload { slot, source })?;
        Ok(path)
    }
}
