use std::collections::BTreeMap;

use super::domain::{
    ApplicationDraft, AttachedDocument, CaseStudy, CaseStudyId, CaseStudyResponse,
};
use super::requirements::FileRequirements;
use super::steps::{self, FormStep};

/// In-memory controller for the six-step registration flow.
///
/// Holds the draft record, the case studies loaded for this session, the
/// applicant's answers, and any attached documents. Step transitions are the
/// only place validation happens; field writes go through unchecked.
#[derive(Debug, Clone)]
pub struct RegistrationForm {
    draft: ApplicationDraft,
    case_studies: Vec<CaseStudy>,
    responses: BTreeMap<CaseStudyId, String>,
    portfolio: Option<AttachedDocument>,
    cv: Option<AttachedDocument>,
    step: FormStep,
}

/// Raised by `advance` when the current step's validator fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("step {} ({}) is incomplete", .step.number(), .step.label())]
pub struct StepBlocked {
    pub step: FormStep,
}

impl RegistrationForm {
    /// Start a fresh session on step 1 with the case studies fetched for it.
    pub fn new(case_studies: Vec<CaseStudy>) -> Self {
        Self {
            draft: ApplicationDraft::default(),
            case_studies,
            responses: BTreeMap::new(),
            portfolio: None,
            cv: None,
            step: FormStep::PersonalData,
        }
    }

    pub fn current_step(&self) -> FormStep {
        self.step
    }

    pub fn draft(&self) -> &ApplicationDraft {
        &self.draft
    }

    /// Mutable access to the draft; writes are deliberately unvalidated.
    pub fn draft_mut(&mut self) -> &mut ApplicationDraft {
        &mut self.draft
    }

    pub fn case_studies(&self) -> &[CaseStudy] {
        &self.case_studies
    }

    /// Case studies the current competency selection makes mandatory.
    pub fn relevant_case_studies(&self) -> Vec<&CaseStudy> {
        self.case_studies
            .iter()
            .filter(|case_study| case_study.applies_to(self.draft.primary_competency))
            .collect()
    }

    /// Store or overwrite an answer. Answers are kept even when a later
    /// competency change makes their case study irrelevant.
    pub fn record_response(&mut self, case_id: CaseStudyId, response: impl Into<String>) {
        self.responses.insert(case_id, response.into());
    }

    pub fn response(&self, case_id: &CaseStudyId) -> Option<&str> {
        self.responses.get(case_id).map(String::as_str)
    }

    pub fn attach_portfolio(&mut self, document: AttachedDocument) {
        self.portfolio = Some(document);
    }

    pub fn attach_cv(&mut self, document: AttachedDocument) {
        self.cv = Some(document);
    }

    pub fn clear_portfolio(&mut self) {
        self.portfolio = None;
    }

    pub fn clear_cv(&mut self) {
        self.cv = None;
    }

    pub fn portfolio(&self) -> Option<&AttachedDocument> {
        self.portfolio.as_ref()
    }

    pub fn cv(&self) -> Option<&AttachedDocument> {
        self.cv.as_ref()
    }

    /// Document policy for the currently selected competency.
    pub fn file_requirements(&self) -> FileRequirements {
        match self.draft.primary_competency {
            Some(primary) => FileRequirements::for_competency(primary),
            None => FileRequirements::unselected(),
        }
    }

    /// Run one step's validator against the current state.
    pub fn step_complete(&self, step: FormStep) -> bool {
        match step {
            FormStep::PersonalData => steps::personal_data_complete(&self.draft),
            FormStep::Motivation => steps::motivation_complete(&self.draft),
            FormStep::Competency => steps::competency_complete(&self.draft),
            FormStep::Assessment => steps::assessment_complete(&self.draft.scores),
            FormStep::Documents => steps::documents_complete(
                self.file_requirements(),
                self.portfolio.is_some(),
                self.cv.is_some(),
            ),
            FormStep::CaseStudies => steps::case_studies_complete(
                &self.case_studies,
                self.draft.primary_competency,
                &self.responses,
            ),
        }
    }

    /// The first incomplete step, checked in form order; `None` when the
    /// whole record is ready to submit.
    pub fn first_incomplete_step(&self) -> Option<FormStep> {
        FormStep::ALL
            .into_iter()
            .find(|step| !self.step_complete(*step))
    }

    /// Move forward one step, gated by the current step's validator. The
    /// index is capped at the last step; state is untouched on failure.
    pub fn advance(&mut self) -> Result<FormStep, StepBlocked> {
        if !self.step_complete(self.step) {
            return Err(StepBlocked { step: self.step });
        }
        if let Some(next) = self.step.next() {
            self.step = next;
        }
        Ok(self.step)
    }

    /// Move back one step, unconditionally, with step 1 as the floor.
    pub fn retreat(&mut self) -> FormStep {
        if let Some(previous) = self.step.previous() {
            self.step = previous;
        }
        self.step
    }

    /// Tear the session apart for submission: draft, answers in key order,
    /// and the attachments. Stale answers for no-longer-relevant case
    /// studies are included on purpose.
    pub fn into_parts(
        self,
    ) -> (
        ApplicationDraft,
        Vec<CaseStudyResponse>,
        Option<AttachedDocument>,
        Option<AttachedDocument>,
    ) {
        let responses = self
            .responses
            .into_iter()
            .map(|(case_id, response)| CaseStudyResponse { case_id, response })
            .collect();
        (self.draft, responses, self.portfolio, self.cv)
    }
}
