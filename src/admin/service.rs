use std::sync::{Arc, Mutex};

use tracing::warn;

use crate::backend::{ApplicationStore, ObjectStore, StorageError, StoreError};
use crate::intake::domain::{Application, ApplicationId, ApplicationStatus};
use crate::intake::submission::{CV_BUCKET, PORTFOLIO_BUCKET};

use super::dashboard::{filter_applications, ApplicationFilter, DashboardStats};

/// Stats plus the filtered view, recomputed from a fresh fetch.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DashboardOverview {
    pub stats: DashboardStats,
    pub applications: Vec<Application>,
}

/// How a stored document should be handed to the reviewer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentFetch {
    /// The store exposes a public URL; send the reviewer there.
    Redirect(String),
    /// No public access; the bytes were pulled directly.
    Bytes(Vec<u8>),
}

#[derive(Debug, thiserror::Error)]
pub enum AdminError {
    #[error("application not found")]
    UnknownApplication,
    #[error("unknown document bucket: {0}")]
    UnknownBucket(String),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("document unavailable: {0}")]
    Storage(#[from] StorageError),
    #[error("failed to build export: {0}")]
    Export(String),
}

/// Review-side operations over the fetched application set.
///
/// Holds the last fetched snapshot; every mutation goes to the remote store
/// first and touches the snapshot only after the remote call succeeded. A
/// failed remote call leaves local state exactly as it was.
pub struct AdminService<S, O> {
    applications: Arc<S>,
    objects: Arc<O>,
    snapshot: Mutex<Vec<Application>>,
}

impl<S, O> AdminService<S, O>
where
    S: ApplicationStore,
    O: ObjectStore,
{
    pub fn new(applications: Arc<S>, objects: Arc<O>) -> Self {
        Self {
            applications,
            objects,
            snapshot: Mutex::new(Vec::new()),
        }
    }

    /// Pull the full set, newest first, and replace the snapshot with it.
    pub async fn refresh(&self) -> Result<Vec<Application>, StoreError> {
        let rows = self.applications.list_all().await?;
        let mut snapshot = self.snapshot.lock().expect("snapshot poisoned");
        *snapshot = rows.clone();
        Ok(rows)
    }

    pub fn snapshot(&self) -> Vec<Application> {
        self.snapshot.lock().expect("snapshot poisoned").clone()
    }

    /// Stats over the whole set plus the filter intersection, both derived
    /// from a fresh fetch.
    pub async fn overview(
        &self,
        filter: &ApplicationFilter,
    ) -> Result<DashboardOverview, StoreError> {
        let rows = self.refresh().await?;
        let stats = DashboardStats::tally(&rows);
        let applications = filter_applications(&rows, filter)
            .into_iter()
            .cloned()
            .collect();
        Ok(DashboardOverview {
            stats,
            applications,
        })
    }

    pub async fn set_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), AdminError> {
        self.applications.update_status(id, status).await?;
        self.apply_locally(id, |row| row.status = status);
        Ok(())
    }

    pub async fn update_notes(&self, id: &ApplicationId, notes: &str) -> Result<(), AdminError> {
        self.applications.update_notes(id, notes).await?;
        self.apply_locally(id, |row| row.admin_notes = notes.to_string());
        Ok(())
    }

    /// Flip the attention flag, returning the new value.
    pub async fn toggle_flag(&self, id: &ApplicationId) -> Result<bool, AdminError> {
        let current = match self.lookup_flag(id) {
            Some(flag) => flag,
            None => {
                let rows = self.refresh().await?;
                rows.iter()
                    .find(|row| row.id == *id)
                    .map(|row| row.flagged)
                    .ok_or(AdminError::UnknownApplication)?
            }
        };
        let next = !current;
        self.applications.set_flagged(id, next).await?;
        self.apply_locally(id, |row| row.flagged = next);
        Ok(next)
    }

    /// CSV rendering of the full set for offline review.
    pub async fn export_csv(&self) -> Result<Vec<u8>, AdminError> {
        let rows = self.refresh().await?;
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer
            .write_record([
                "id",
                "created_at",
                "full_name",
                "email",
                "phone",
                "primary_competency",
                "secondary_competency",
                "status",
                "stage",
                "flagged",
            ])
            .map_err(|error| AdminError::Export(error.to_string()))?;
        for row in &rows {
            let record = [
                row.id.0.clone(),
                row.created_at.to_rfc3339(),
                row.full_name.clone(),
                row.email.clone(),
                row.phone.clone(),
                row.primary_competency.label().to_string(),
                row.secondary_competency
                    .map(|competency| competency.label())
                    .unwrap_or("")
                    .to_string(),
                row.status.label().to_string(),
                u8::from(row.stage).to_string(),
                row.flagged.to_string(),
            ];
            writer
                .write_record(&record)
                .map_err(|error| AdminError::Export(error.to_string()))?;
        }
        writer
            .into_inner()
            .map_err(|error| AdminError::Export(error.to_string()))
    }

    /// Fetch a stored document: public URL when the store has one, direct
    /// download otherwise.
    pub async fn document(&self, bucket: &str, path: &str) -> Result<DocumentFetch, AdminError> {
        if bucket != PORTFOLIO_BUCKET && bucket != CV_BUCKET {
            return Err(AdminError::UnknownBucket(bucket.to_string()));
        }
        match self.objects.public_url(bucket, path) {
            Ok(url) => Ok(DocumentFetch::Redirect(url)),
            Err(error) => {
                warn!(%error, bucket, path, "no public url, falling back to direct download");
                let bytes = self.objects.download(bucket, path).await?;
                Ok(DocumentFetch::Bytes(bytes))
            }
        }
    }

    fn lookup_flag(&self, id: &ApplicationId) -> Option<bool> {
        let snapshot = self.snapshot.lock().expect("snapshot poisoned");
        snapshot.iter().find(|row| row.id == *id).map(|row| row.flagged)
    }

    fn apply_locally(&self, id: &ApplicationId, apply: impl FnOnce(&mut Application)) {
        let mut snapshot = self.snapshot.lock().expect("snapshot poisoned");
        if let Some(row) = snapshot.iter_mut().find(|row| row.id == *id) {
            apply(row);
        }
    }
}
