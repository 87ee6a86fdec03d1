use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use crate::backend::{ApplicationStore, CaseStudyStore, ObjectStore};

use super::domain::{
    ApplicationDraft, AttachedDocument, CaseStudyResponse, Competency, DocumentError,
};
use super::form::RegistrationForm;
use super::requirements::FileRequirements;
use super::submission::{SubmissionError, SubmissionPipeline, CONFIRMATION_PATH};

/// Public intake surface: case studies, the competency catalog, and the
/// one-shot submission endpoint.
pub struct IntakeService<S, O, C> {
    pipeline: SubmissionPipeline<S, O>,
    case_studies: Arc<C>,
}

impl<S, O, C> IntakeService<S, O, C>
where
    S: ApplicationStore,
    O: ObjectStore,
    C: CaseStudyStore,
{
    pub fn new(pipeline: SubmissionPipeline<S, O>, case_studies: Arc<C>) -> Self {
        Self {
            pipeline,
            case_studies,
        }
    }
}

pub fn intake_router<S, O, C>(service: Arc<IntakeService<S, O, C>>) -> Router
where
    S: ApplicationStore + 'static,
    O: ObjectStore + 'static,
    C: CaseStudyStore + 'static,
{
    Router::new()
        .route("/api/v1/case-studies", get(case_studies_handler::<S, O, C>))
        .route("/api/v1/competencies", get(competencies_handler))
        .route("/api/v1/applications", post(submit_handler::<S, O, C>))
        .with_state(service)
}

/// Base64-encoded PDF attached to a submission.
#[derive(Debug, Deserialize)]
pub struct DocumentPayload {
    pub file_name: String,
    pub content_type: String,
    pub data: String,
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentRejected {
    #[error("document is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
    #[error(transparent)]
    Document(#[from] DocumentError),
}

impl DocumentPayload {
    fn decode(self) -> Result<AttachedDocument, DocumentRejected> {
        let bytes = BASE64.decode(self.data.as_bytes())?;
        Ok(AttachedDocument::new(
            self.file_name,
            &self.content_type,
            bytes,
        )?)
    }
}

/// Wire form of a completed application: the draft fields flattened, the
/// case-study answers, and the optional documents.
#[derive(Debug, Deserialize)]
pub struct SubmissionRequest {
    #[serde(flatten)]
    pub draft: ApplicationDraft,
    #[serde(default)]
    pub case_study_responses: Vec<CaseStudyResponse>,
    #[serde(default)]
    pub portfolio: Option<DocumentPayload>,
    #[serde(default)]
    pub cv: Option<DocumentPayload>,
}

#[derive(Debug, Serialize)]
pub struct SubmissionResponse {
    pub status: &'static str,
    pub applicant_name: String,
    pub confirmation_path: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct CompetencyView {
    name: &'static str,
    description: &'static str,
    file_requirements: FileRequirements,
}

pub(crate) async fn case_studies_handler<S, O, C>(
    State(service): State<Arc<IntakeService<S, O, C>>>,
) -> Response
where
    S: ApplicationStore + 'static,
    O: ObjectStore + 'static,
    C: CaseStudyStore + 'static,
{
    match service.case_studies.active().await {
        Ok(studies) => (StatusCode::OK, Json(studies)).into_response(),
        Err(error) => {
            let payload = json!({ "error": format!("failed to load case studies: {error}") });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn competencies_handler() -> Json<Vec<CompetencyView>> {
    let catalog = Competency::ALL
        .into_iter()
        .map(|competency| CompetencyView {
            name: competency.label(),
            description: competency.description(),
            file_requirements: FileRequirements::for_competency(competency),
        })
        .collect();
    Json(catalog)
}

pub(crate) async fn submit_handler<S, O, C>(
    State(service): State<Arc<IntakeService<S, O, C>>>,
    Json(request): Json<SubmissionRequest>,
) -> Response
where
    S: ApplicationStore + 'static,
    O: ObjectStore + 'static,
    C: CaseStudyStore + 'static,
{
    // The mandatory case-study set comes from whatever is loaded right now;
    // a fetch failure leaves it empty rather than blocking the applicant.
    let case_studies = match service.case_studies.active().await {
        Ok(studies) => studies,
        Err(error) => {
            warn!(%error, "case studies unavailable during submission");
            Vec::new()
        }
    };

    let mut form = RegistrationForm::new(case_studies);
    *form.draft_mut() = request.draft;
    for response in request.case_study_responses {
        form.record_response(response.case_id, response.response);
    }

    if let Some(payload) = request.portfolio {
        match payload.decode() {
            Ok(document) => form.attach_portfolio(document),
            Err(error) => return document_rejected(error),
        }
    }
    if let Some(payload) = request.cv {
        match payload.decode() {
            Ok(document) => form.attach_cv(document),
            Err(error) => return document_rejected(error),
        }
    }

    match service.pipeline.submit(form).await {
        Ok(receipt) => {
            let body = SubmissionResponse {
                status: "submitted",
                applicant_name: receipt.applicant_name,
                confirmation_path: CONFIRMATION_PATH,
            };
            (StatusCode::CREATED, Json(body)).into_response()
        }
        Err(SubmissionError::Incomplete(blocked)) => {
            let payload = json!({
                "error": blocked.to_string(),
                "step": blocked.step.number(),
            });
            (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
        }
        Err(error) => {
            warn!(%error, "submission aborted");
            let payload = json!({ "error": error.to_string() });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
    }
}

fn document_rejected(error: DocumentRejected) -> Response {
    let payload = json!({ "error": error.to_string() });
    (StatusCode::UNPROCESSABLE_ENTITY, Json(payload)).into_response()
}
