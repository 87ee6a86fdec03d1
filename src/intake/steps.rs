use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use super::domain::{ApplicationDraft, AssessmentScores, CaseStudy, CaseStudyId, Competency};
use super::requirements::FileRequirements;

/// Minimum motivation length before the motivation step lets go.
pub const MIN_MOTIVATION_CHARS: usize = 50;

/// Minimum answer length for each mandatory case study.
pub const MIN_CASE_RESPONSE_CHARS: usize = 100;

/// The six sections of the registration form, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormStep {
    PersonalData,
    Motivation,
    Competency,
    Assessment,
    Documents,
    CaseStudies,
}

impl FormStep {
    pub const ALL: [FormStep; 6] = [
        FormStep::PersonalData,
        FormStep::Motivation,
        FormStep::Competency,
        FormStep::Assessment,
        FormStep::Documents,
        FormStep::CaseStudies,
    ];

    pub const TOTAL: u8 = 6;

    pub const fn number(self) -> u8 {
        match self {
            FormStep::PersonalData => 1,
            FormStep::Motivation => 2,
            FormStep::Competency => 3,
            FormStep::Assessment => 4,
            FormStep::Documents => 5,
            FormStep::CaseStudies => 6,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            FormStep::PersonalData => "personal data",
            FormStep::Motivation => "motivation",
            FormStep::Competency => "competency",
            FormStep::Assessment => "assessment",
            FormStep::Documents => "documents",
            FormStep::CaseStudies => "case studies",
        }
    }

    pub fn next(self) -> Option<FormStep> {
        let index = self.number() as usize;
        FormStep::ALL.get(index).copied()
    }

    pub fn previous(self) -> Option<FormStep> {
        let index = self.number() as usize;
        index.checked_sub(2).and_then(|i| FormStep::ALL.get(i).copied())
    }
}

impl fmt::Display for FormStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Step 1: all four identity fields present.
pub fn personal_data_complete(draft: &ApplicationDraft) -> bool {
    !draft.full_name.trim().is_empty()
        && !draft.email.trim().is_empty()
        && !draft.phone.trim().is_empty()
        && draft.birth_date.is_some()
}

/// Step 2: motivation present and long enough once trimmed.
pub fn motivation_complete(draft: &ApplicationDraft) -> bool {
    draft.motivation.trim().chars().count() >= MIN_MOTIVATION_CHARS
}

/// Step 3: a primary competency has been chosen.
pub fn competency_complete(draft: &ApplicationDraft) -> bool {
    draft.primary_competency.is_some()
}

/// Step 4: the three mandatory work-style answers are picked (non-zero).
pub fn assessment_complete(scores: &AssessmentScores) -> bool {
    scores.leadership_style != 0
        && scores.problem_solving_approach != 0
        && scores.communication_style != 0
}

/// Step 5: every required document slot holds an attachment. Optional slots
/// impose nothing.
pub fn documents_complete(
    requirements: FileRequirements,
    has_portfolio: bool,
    has_cv: bool,
) -> bool {
    if requirements.portfolio_required && !has_portfolio {
        return false;
    }
    if requirements.cv_required && !has_cv {
        return false;
    }
    true
}

/// Step 6: every loaded case study aimed at the chosen competency (or at
/// everyone) has a long-enough answer. The mandatory set tracks the current
/// competency selection, so changing it after answers were written changes
/// what is required.
pub fn case_studies_complete(
    case_studies: &[CaseStudy],
    primary: Option<Competency>,
    responses: &BTreeMap<CaseStudyId, String>,
) -> bool {
    case_studies
        .iter()
        .filter(|case_study| case_study.applies_to(primary))
        .all(|case_study| {
            responses
                .get(&case_study.id)
                .is_some_and(|response| response.trim().chars().count() >= MIN_CASE_RESPONSE_CHARS)
        })
}
