//! In-process backend doubles backing tests, the CLI walkthrough, and a
//! `serve` run without platform credentials.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::intake::domain::{
    Application, ApplicationId, ApplicationStatus, AttachedDocument, CaseStudy, CaseStudyId,
    NewApplication, GENERAL_AUDIENCE,
};

use super::{
    AdminUser, ApplicationStore, AuthError, Authenticator, CaseStudyStore, ObjectStore,
    StorageError, StoreError,
};

/// Applications kept in a vector, newest first, like the remote table's
/// default ordering.
#[derive(Default)]
pub struct InMemoryApplicationStore {
    rows: Mutex<Vec<Application>>,
}

impl InMemoryApplicationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().expect("application store poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ApplicationStore for InMemoryApplicationStore {
    async fn insert(&self, application: NewApplication) -> Result<(), StoreError> {
        let now = Utc::now();
        let row = Application {
            id: ApplicationId(Uuid::new_v4().to_string()),
            created_at: now,
            updated_at: now,
            full_name: application.full_name,
            email: application.email,
            phone: application.phone,
            birth_date: application.birth_date,
            motivation: application.motivation,
            previous_volunteer_experience: application.previous_volunteer_experience,
            primary_competency: application.primary_competency,
            secondary_competency: application.secondary_competency,
            scores: application.scores,
            case_study_responses: application.case_study_responses,
            portfolio_path: application.portfolio_path,
            cv_path: application.cv_path,
            status: application.status,
            stage: application.stage,
            flagged: application.flagged,
            admin_notes: application.admin_notes,
        };
        let mut rows = self.rows.lock().expect("application store poisoned");
        rows.insert(0, row);
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Application>, StoreError> {
        let rows = self.rows.lock().expect("application store poisoned");
        Ok(rows.clone())
    }

    async fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), StoreError> {
        self.mutate(id, |row| row.status = status)
    }

    async fn update_notes(&self, id: &ApplicationId, notes: &str) -> Result<(), StoreError> {
        self.mutate(id, |row| row.admin_notes = notes.to_string())
    }

    async fn set_flagged(&self, id: &ApplicationId, flagged: bool) -> Result<(), StoreError> {
        self.mutate(id, |row| row.flagged = flagged)
    }
}

impl InMemoryApplicationStore {
    fn mutate(
        &self,
        id: &ApplicationId,
        apply: impl FnOnce(&mut Application),
    ) -> Result<(), StoreError> {
        let mut rows = self.rows.lock().expect("application store poisoned");
        let row = rows
            .iter_mut()
            .find(|row| row.id == *id)
            .ok_or(StoreError::NotFound)?;
        apply(row);
        row.updated_at = Utc::now();
        Ok(())
    }
}

/// Fixed case-study catalog, handed in at construction.
#[derive(Default)]
pub struct InMemoryCaseStudyStore {
    studies: Vec<CaseStudy>,
}

impl InMemoryCaseStudyStore {
    pub fn new(studies: Vec<CaseStudy>) -> Self {
        Self { studies }
    }

    /// The built-in catalog used by the demo walkthrough and by `serve` when
    /// no backend is configured.
    pub fn with_sample_catalog() -> Self {
        Self::new(sample_case_studies())
    }
}

#[async_trait]
impl CaseStudyStore for InMemoryCaseStudyStore {
    async fn active(&self) -> Result<Vec<CaseStudy>, StoreError> {
        Ok(self
            .studies
            .iter()
            .filter(|study| study.is_active)
            .cloned()
            .collect())
    }
}

/// Objects kept as `(bucket, path) -> bytes`.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn object_count(&self) -> usize {
        self.objects.lock().expect("object store poisoned").len()
    }

    pub fn paths_in(&self, bucket: &str) -> Vec<String> {
        let objects = self.objects.lock().expect("object store poisoned");
        objects
            .keys()
            .filter(|(stored_bucket, _)| stored_bucket == bucket)
            .map(|(_, path)| path.clone())
            .collect()
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        document: &AttachedDocument,
    ) -> Result<(), StorageError> {
        let mut objects = self.objects.lock().expect("object store poisoned");
        objects.insert(
            (bucket.to_string(), path.to_string()),
            document.bytes().to_vec(),
        );
        Ok(())
    }

    fn public_url(&self, _bucket: &str, _path: &str) -> Result<String, StorageError> {
        Err(StorageError::PublicUrlUnsupported)
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        let objects = self.objects.lock().expect("object store poisoned");
        objects
            .get(&(bucket.to_string(), path.to_string()))
            .cloned()
            .ok_or(StorageError::NotFound)
    }
}

/// Credential list for local sign-in; supports marking an address as
/// unconfirmed so the classification paths can be exercised.
#[derive(Default)]
pub struct InMemoryAuthenticator {
    users: HashMap<String, String>,
    unconfirmed: Vec<String>,
}

impl InMemoryAuthenticator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, email: impl Into<String>, password: impl Into<String>) -> Self {
        self.users.insert(email.into(), password.into());
        self
    }

    pub fn with_unconfirmed_user(
        mut self,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        let email = email.into();
        self.unconfirmed.push(email.clone());
        self.users.insert(email, password.into());
        self
    }
}

#[async_trait]
impl Authenticator for InMemoryAuthenticator {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AdminUser, AuthError> {
        match self.users.get(email) {
            Some(expected) if expected == password => {
                if self.unconfirmed.iter().any(|entry| entry == email) {
                    return Err(AuthError::EmailNotConfirmed);
                }
                Ok(AdminUser {
                    email: email.to_string(),
                    access_token: None,
                })
            }
            _ => Err(AuthError::InvalidCredentials),
        }
    }

    async fn sign_out(&self, _access_token: &str) -> Result<(), AuthError> {
        Ok(())
    }
}

/// Built-in prompts so a credential-less run still has a working step six.
pub fn sample_case_studies() -> Vec<CaseStudy> {
    vec![
        CaseStudy {
            id: CaseStudyId("sample-outreach".to_string()),
            created_at: None,
            title: "Community outreach week".to_string(),
            description: "Plan a one-week outreach push with three volunteers.".to_string(),
            competency: GENERAL_AUDIENCE.to_string(),
            scenario: "A district asks for help announcing a new literacy program, \
                       but only gives you five working days of lead time."
                .to_string(),
            questions: vec![
                "How would you prioritize the five days?".to_string(),
                "What would you drop first if a volunteer falls ill?".to_string(),
            ],
            is_active: true,
        },
        CaseStudy {
            id: CaseStudyId("sample-campaign".to_string()),
            created_at: None,
            title: "Rebuilding a stale campaign".to_string(),
            description: "Diagnose why a donation campaign stopped converting.".to_string(),
            competency: "Brand & Communication Area".to_string(),
            scenario: "Engagement dropped to a third of last year's numbers after \
                       a messaging refresh that tested well internally."
                .to_string(),
            questions: vec!["Which signals would you look at first?".to_string()],
            is_active: true,
        },
    ]
}
