use serde::Serialize;

use super::domain::Competency;

/// Document expectations for a chosen primary competency.
///
/// `portfolio_optional` is the display-only complement: true exactly when
/// neither required slot applies, never an independent input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FileRequirements {
    pub portfolio_required: bool,
    pub cv_required: bool,
    pub portfolio_optional: bool,
}

impl FileRequirements {
    /// Fixed policy table; not configurable at runtime.
    pub fn for_competency(primary: Competency) -> Self {
        let portfolio_required = primary == Competency::BrandCommunication;
        let cv_required = matches!(
            primary,
            Competency::HumanDevelopment | Competency::DigitalTransformation
        );
        Self {
            portfolio_required,
            cv_required,
            portfolio_optional: !portfolio_required && !cv_required,
        }
    }

    /// Requirements before a competency has been chosen: nothing mandatory.
    pub fn unselected() -> Self {
        Self {
            portfolio_required: false,
            cv_required: false,
            portfolio_optional: true,
        }
    }
}
