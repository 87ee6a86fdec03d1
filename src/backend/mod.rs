//! Consumed surface of the external backend platform.
//!
//! The service never owns persistence, authentication, or file storage; it
//! talks to them through these traits. `supabase` is the HTTP adapter used in
//! production, `memory` the in-process double used by tests and the default
//! demo configuration.

pub mod memory;
pub mod supabase;

use async_trait::async_trait;

use crate::intake::domain::{
    Application, ApplicationId, ApplicationStatus, AttachedDocument, CaseStudy, NewApplication,
};

/// Row-level access to the `applications` table.
#[async_trait]
pub trait ApplicationStore: Send + Sync {
    /// Insert one composed row. The store assigns identity and timestamps.
    async fn insert(&self, application: NewApplication) -> Result<(), StoreError>;

    /// Every row, newest first.
    async fn list_all(&self) -> Result<Vec<Application>, StoreError>;

    async fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), StoreError>;

    async fn update_notes(&self, id: &ApplicationId, notes: &str) -> Result<(), StoreError>;

    async fn set_flagged(&self, id: &ApplicationId, flagged: bool) -> Result<(), StoreError>;
}

/// Read access to the `case_studies` table.
#[async_trait]
pub trait CaseStudyStore: Send + Sync {
    /// Active case studies, newest first.
    async fn active(&self) -> Result<Vec<CaseStudy>, StoreError>;
}

/// Named-bucket object storage for applicant documents.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        document: &AttachedDocument,
    ) -> Result<(), StorageError>;

    /// Public URL for an object, if the store exposes one.
    fn public_url(&self, bucket: &str, path: &str) -> Result<String, StorageError>;

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StorageError>;
}

/// Password sign-in against the platform's auth service.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AdminUser, AuthError>;

    /// Revoke an upstream access token. Local sessions are handled by the
    /// caller; this only tells the platform.
    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;
}

/// A successfully authenticated reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminUser {
    pub email: String,
    /// Platform-issued token, absent for in-process authenticators.
    pub access_token: Option<String>,
}

/// Table store failures, surfaced to users with the underlying cause.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,
    #[error("store rejected the request: {0}")]
    Rejected(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Object storage failures.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("object not found")]
    NotFound,
    #[error("storage rejected the request: {0}")]
    Rejected(String),
    #[error("object storage unavailable: {0}")]
    Unavailable(String),
    #[error("store does not expose public URLs")]
    PublicUrlUnsupported,
}

/// Sign-in failures, classified into the three user-facing buckets plus
/// transport trouble.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid login credentials")]
    InvalidCredentials,
    #[error("email not confirmed")]
    EmailNotConfirmed,
    #[error("sign-in rejected: {0}")]
    Rejected(String),
    #[error("authentication service unavailable: {0}")]
    Unavailable(String),
}

impl AuthError {
    /// The message shown to the person at the login form. Exactly three
    /// variants reach users; everything unexpected collapses to the generic
    /// one.
    pub fn user_message(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "Email or password is incorrect",
            AuthError::EmailNotConfirmed => "Email address has not been confirmed",
            AuthError::Rejected(_) | AuthError::Unavailable(_) => {
                "Sign-in failed, please try again"
            }
        }
    }
}
