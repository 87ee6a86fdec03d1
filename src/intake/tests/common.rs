use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::backend::memory::{sample_case_studies, InMemoryApplicationStore, InMemoryObjectStore};
use crate::backend::{ApplicationStore, StoreError};
use crate::intake::domain::{
    Application, ApplicationId, ApplicationStatus, AttachedDocument, CaseStudy, Competency,
    NewApplication,
};
use crate::intake::form::RegistrationForm;
use crate::intake::submission::SubmissionPipeline;

/// The built-in catalog: one general prompt plus one aimed at
/// Brand & Communication.
pub(super) fn catalog() -> Vec<CaseStudy> {
    sample_case_studies()
}

pub(super) fn long_text(chars: usize) -> String {
    "x".repeat(chars)
}

pub(super) fn pdf(name: &str) -> AttachedDocument {
    AttachedDocument::new(name, "application/pdf", b"%PDF-1.4 test".to_vec())
        .expect("valid test document")
}

/// Form with every step satisfied for a Brand & Communication applicant:
/// portfolio attached, both catalog prompts answered.
pub(super) fn complete_form() -> RegistrationForm {
    let mut form = RegistrationForm::new(catalog());
    fill_personal_data(&mut form);
    form.draft_mut().motivation = long_text(60);
    form.draft_mut().primary_competency = Some(Competency::BrandCommunication);
    fill_assessment(&mut form);
    form.attach_portfolio(pdf("portfolio.pdf"));
    answer_relevant_case_studies(&mut form);
    form
}

pub(super) fn fill_personal_data(form: &mut RegistrationForm) {
    let draft = form.draft_mut();
    draft.full_name = "Dewi Lestari".to_string();
    draft.email = "dewi@example.org".to_string();
    draft.phone = "081234567890".to_string();
    draft.birth_date = NaiveDate::from_ymd_opt(1998, 3, 14);
}

pub(super) fn fill_assessment(form: &mut RegistrationForm) {
    let scores = &mut form.draft_mut().scores;
    scores.leadership_style = 2;
    scores.problem_solving_approach = 3;
    scores.communication_style = 4;
}

pub(super) fn answer_relevant_case_studies(form: &mut RegistrationForm) {
    let relevant: Vec<_> = form
        .relevant_case_studies()
        .iter()
        .map(|case_study| case_study.id.clone())
        .collect();
    for case_id in relevant {
        form.record_response(case_id, long_text(120));
    }
}

pub(super) fn build_pipeline() -> (
    SubmissionPipeline<InMemoryApplicationStore, InMemoryObjectStore>,
    Arc<InMemoryApplicationStore>,
    Arc<InMemoryObjectStore>,
) {
    let applications = Arc::new(InMemoryApplicationStore::new());
    let objects = Arc::new(InMemoryObjectStore::new());
    let pipeline = SubmissionPipeline::new(applications.clone(), objects.clone());
    (pipeline, applications, objects)
}

/// Table store that refuses everything, for pipeline failure paths.
pub(super) struct UnavailableApplicationStore;

#[async_trait]
impl ApplicationStore for UnavailableApplicationStore {
    async fn insert(&self, _application: NewApplication) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn list_all(&self) -> Result<Vec<Application>, StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn update_status(
        &self,
        _id: &ApplicationId,
        _status: ApplicationStatus,
    ) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn update_notes(&self, _id: &ApplicationId, _notes: &str) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }

    async fn set_flagged(&self, _id: &ApplicationId, _flagged: bool) -> Result<(), StoreError> {
        Err(StoreError::Unavailable("database offline".to_string()))
    }
}
