use std::collections::BTreeMap;

use super::common::*;
use crate::intake::domain::{ApplicationDraft, AssessmentScores, CaseStudyId, Competency};
use crate::intake::requirements::FileRequirements;
use crate::intake::steps::{
    assessment_complete, case_studies_complete, competency_complete, documents_complete,
    motivation_complete, personal_data_complete, FormStep, MIN_CASE_RESPONSE_CHARS,
    MIN_MOTIVATION_CHARS,
};

#[test]
fn steps_are_numbered_one_through_six_in_order() {
    let numbers: Vec<_> = FormStep::ALL.iter().map(|step| step.number()).collect();
    assert_eq!(numbers, [1, 2, 3, 4, 5, 6]);
    assert_eq!(FormStep::TOTAL, 6);
    assert_eq!(FormStep::PersonalData.previous(), None);
    assert_eq!(FormStep::CaseStudies.next(), None);
    assert_eq!(FormStep::Motivation.previous(), Some(FormStep::PersonalData));
}

#[test]
fn personal_data_needs_all_four_fields() {
    let mut draft = ApplicationDraft {
        full_name: "Dewi".to_string(),
        email: "dewi@example.org".to_string(),
        phone: "0812".to_string(),
        birth_date: chrono::NaiveDate::from_ymd_opt(1998, 3, 14),
        ..ApplicationDraft::default()
    };
    assert!(personal_data_complete(&draft));

    draft.phone = "   ".to_string();
    assert!(!personal_data_complete(&draft));

    draft.phone = "0812".to_string();
    draft.birth_date = None;
    assert!(!personal_data_complete(&draft));
}

#[test]
fn motivation_passes_at_exactly_the_minimum_length() {
    let mut draft = ApplicationDraft::default();

    draft.motivation = long_text(MIN_MOTIVATION_CHARS - 1);
    assert!(!motivation_complete(&draft));

    draft.motivation = long_text(MIN_MOTIVATION_CHARS);
    assert!(motivation_complete(&draft));

    // Surrounding whitespace does not count toward the minimum.
    draft.motivation = format!("  {}  ", long_text(MIN_MOTIVATION_CHARS - 1));
    assert!(!motivation_complete(&draft));
}

#[test]
fn competency_step_needs_a_primary_selection() {
    let mut draft = ApplicationDraft::default();
    assert!(!competency_complete(&draft));
    draft.primary_competency = Some(Competency::InsightImpact);
    assert!(competency_complete(&draft));
}

#[test]
fn assessment_needs_the_three_mandatory_answers() {
    let mut scores = AssessmentScores {
        leadership_style: 1,
        problem_solving_approach: 2,
        communication_style: 3,
        ..AssessmentScores::default()
    };
    assert!(assessment_complete(&scores));

    scores.communication_style = 0;
    assert!(!assessment_complete(&scores));

    // The optional five never gate the step.
    scores.communication_style = 3;
    scores.empathy_level = 0;
    scores.stress_management = 0;
    assert!(assessment_complete(&scores));
}

#[test]
fn documents_follow_the_policy_table() {
    let brand = FileRequirements::for_competency(Competency::BrandCommunication);
    assert!(!documents_complete(brand, false, false));
    assert!(documents_complete(brand, true, false));

    let human = FileRequirements::for_competency(Competency::HumanDevelopment);
    assert!(!documents_complete(human, true, false));
    assert!(documents_complete(human, false, true));

    let process = FileRequirements::for_competency(Competency::ProcessOptimization);
    assert!(documents_complete(process, false, false));
}

#[test]
fn case_study_answers_pass_at_exactly_the_minimum_length() {
    let catalog = catalog();
    let general_id = CaseStudyId("sample-outreach".to_string());
    let mut responses = BTreeMap::new();

    responses.insert(general_id.clone(), long_text(MIN_CASE_RESPONSE_CHARS - 1));
    assert!(!case_studies_complete(&catalog, None, &responses));

    responses.insert(general_id, long_text(MIN_CASE_RESPONSE_CHARS));
    assert!(case_studies_complete(&catalog, None, &responses));
}

#[test]
fn changing_competency_changes_the_required_subset() {
    let catalog = catalog();
    let mut responses = BTreeMap::new();
    responses.insert(
        CaseStudyId("sample-outreach".to_string()),
        long_text(MIN_CASE_RESPONSE_CHARS),
    );

    // Only the general prompt is answered: fine for Insight & Impact, not
    // for Brand & Communication, which adds its own prompt.
    assert!(case_studies_complete(
        &catalog,
        Some(Competency::InsightImpact),
        &responses
    ));
    assert!(!case_studies_complete(
        &catalog,
        Some(Competency::BrandCommunication),
        &responses
    ));

    responses.insert(
        CaseStudyId("sample-campaign".to_string()),
        long_text(MIN_CASE_RESPONSE_CHARS),
    );
    assert!(case_studies_complete(
        &catalog,
        Some(Competency::BrandCommunication),
        &responses
    ));
}
