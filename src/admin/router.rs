use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, patch, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::auth::AdminSession;
use crate::backend::{ApplicationStore, ObjectStore};
use crate::intake::domain::{ApplicationId, ApplicationStatus, Competency};

use super::dashboard::ApplicationFilter;
use super::service::{AdminError, AdminService, DocumentFetch};

/// Router for the gated review surface. Every handler demands an
/// `AdminSession`; the session store itself is provided as a request
/// extension by the server assembly.
pub fn admin_router<S, O>(service: Arc<AdminService<S, O>>) -> Router
where
    S: ApplicationStore + 'static,
    O: ObjectStore + 'static,
{
    Router::new()
        .route("/api/v1/admin/applications", get(list_handler::<S, O>))
        .route(
            "/api/v1/admin/applications/export",
            get(export_handler::<S, O>),
        )
        .route(
            "/api/v1/admin/applications/:id/status",
            patch(status_handler::<S, O>),
        )
        .route(
            "/api/v1/admin/applications/:id/notes",
            patch(notes_handler::<S, O>),
        )
        .route(
            "/api/v1/admin/applications/:id/flag",
            post(flag_handler::<S, O>),
        )
        .route(
            "/api/v1/admin/files/:bucket/*path",
            get(document_handler::<S, O>),
        )
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ListQuery {
    #[serde(default)]
    search: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    competency: Option<String>,
}

impl ListQuery {
    /// `"all"`, absent, and unrecognized values all mean "no filter",
    /// matching the dashboard dropdown defaults.
    fn into_filter(self) -> ApplicationFilter {
        let status = self
            .status
            .as_deref()
            .filter(|value| *value != "all")
            .and_then(|value| value.parse::<ApplicationStatus>().ok());
        let competency = self
            .competency
            .as_deref()
            .filter(|value| *value != "all")
            .and_then(Competency::from_label);
        ApplicationFilter {
            search: self.search.unwrap_or_default(),
            status,
            competency,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusChange {
    status: ApplicationStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NotesChange {
    notes: String,
}

fn error_response(error: AdminError) -> Response {
    use crate::backend::{StorageError, StoreError};

    let status = match &error {
        AdminError::UnknownApplication | AdminError::UnknownBucket(_) => StatusCode::NOT_FOUND,
        AdminError::Store(StoreError::NotFound) | AdminError::Storage(StorageError::NotFound) => {
            StatusCode::NOT_FOUND
        }
        AdminError::Store(_) | AdminError::Storage(_) | AdminError::Export(_) => {
            StatusCode::BAD_GATEWAY
        }
    };
    (status, Json(json!({ "error": error.to_string() }))).into_response()
}

pub(crate) async fn list_handler<S, O>(
    State(service): State<Arc<AdminService<S, O>>>,
    _session: AdminSession,
    Query(query): Query<ListQuery>,
) -> Response
where
    S: ApplicationStore + 'static,
    O: ObjectStore + 'static,
{
    match service.overview(&query.into_filter()).await {
        Ok(overview) => (StatusCode::OK, Json(overview)).into_response(),
        Err(error) => error_response(error.into()),
    }
}

pub(crate) async fn status_handler<S, O>(
    State(service): State<Arc<AdminService<S, O>>>,
    _session: AdminSession,
    Path(id): Path<String>,
    Json(change): Json<StatusChange>,
) -> Response
where
    S: ApplicationStore + 'static,
    O: ObjectStore + 'static,
{
    let id = ApplicationId(id);
    match service.set_status(&id, change.status).await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({ "id": id.0, "status": change.status })),
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn notes_handler<S, O>(
    State(service): State<Arc<AdminService<S, O>>>,
    _session: AdminSession,
    Path(id): Path<String>,
    Json(change): Json<NotesChange>,
) -> Response
where
    S: ApplicationStore + 'static,
    O: ObjectStore + 'static,
{
    let id = ApplicationId(id);
    match service.update_notes(&id, &change.notes).await {
        Ok(()) => (StatusCode::OK, Json(json!({ "id": id.0, "notes": change.notes })))
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn flag_handler<S, O>(
    State(service): State<Arc<AdminService<S, O>>>,
    _session: AdminSession,
    Path(id): Path<String>,
) -> Response
where
    S: ApplicationStore + 'static,
    O: ObjectStore + 'static,
{
    let id = ApplicationId(id);
    match service.toggle_flag(&id).await {
        Ok(flagged) => (StatusCode::OK, Json(json!({ "id": id.0, "flagged": flagged })))
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn export_handler<S, O>(
    State(service): State<Arc<AdminService<S, O>>>,
    _session: AdminSession,
) -> Response
where
    S: ApplicationStore + 'static,
    O: ObjectStore + 'static,
{
    match service.export_csv().await {
        Ok(bytes) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, "text/csv"),
                (
                    header::CONTENT_DISPOSITION,
                    "attachment; filename=\"applications.csv\"",
                ),
            ],
            bytes,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn document_handler<S, O>(
    State(service): State<Arc<AdminService<S, O>>>,
    _session: AdminSession,
    Path((bucket, path)): Path<(String, String)>,
) -> Response
where
    S: ApplicationStore + 'static,
    O: ObjectStore + 'static,
{
    match service.document(&bucket, &path).await {
        Ok(DocumentFetch::Redirect(url)) => Redirect::temporary(&url).into_response(),
        Ok(DocumentFetch::Bytes(bytes)) => (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, mime::APPLICATION_PDF.as_ref()),
                (header::CONTENT_DISPOSITION, "attachment"),
            ],
            bytes,
        )
            .into_response(),
        Err(error) => error_response(error),
    }
}
