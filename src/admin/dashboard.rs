use std::collections::BTreeMap;

use serde::Serialize;

use crate::intake::domain::{Application, ApplicationStatus, Competency};

/// Aggregate counts over the full fetched set. Only values that actually
/// occur get a key, so the maps double as "which values exist" listings for
/// the filter dropdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_competency: BTreeMap<String, usize>,
}

impl DashboardStats {
    pub fn tally(applications: &[Application]) -> Self {
        let mut by_status = BTreeMap::new();
        let mut by_competency = BTreeMap::new();
        for application in applications {
            *by_status
                .entry(application.status.label().to_string())
                .or_insert(0) += 1;
            *by_competency
                .entry(application.primary_competency.label().to_string())
                .or_insert(0) += 1;
        }
        Self {
            total: applications.len(),
            by_status,
            by_competency,
        }
    }

    /// Applications still waiting on a reviewer: the new plus the reviewed.
    pub fn awaiting_review(&self) -> usize {
        self.by_status.get("new").copied().unwrap_or(0)
            + self.by_status.get("reviewed").copied().unwrap_or(0)
    }
}

/// Three independent predicates over the fetched set. Each defaults to off
/// ("all" / empty search), in which case it matches everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ApplicationFilter {
    pub search: String,
    pub status: Option<ApplicationStatus>,
    pub competency: Option<Competency>,
}

impl ApplicationFilter {
    fn matches(&self, application: &Application) -> bool {
        if !self.search.is_empty() {
            let needle = self.search.to_lowercase();
            let name_hit = application.full_name.to_lowercase().contains(&needle);
            let email_hit = application.email.to_lowercase().contains(&needle);
            if !name_hit && !email_hit {
                return false;
            }
        }
        if let Some(status) = self.status {
            if application.status != status {
                return false;
            }
        }
        if let Some(competency) = self.competency {
            if application.primary_competency != competency {
                return false;
            }
        }
        true
    }
}

/// Intersection of the filter's predicates, order preserved from the source
/// fetch (newest first).
pub fn filter_applications<'a>(
    applications: &'a [Application],
    filter: &ApplicationFilter,
) -> Vec<&'a Application> {
    applications
        .iter()
        .filter(|application| filter.matches(application))
        .collect()
}
