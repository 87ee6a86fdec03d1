//! HTTP adapter for the hosted backend platform: PostgREST tables, storage
//! buckets, and password-grant auth, all behind one authenticated client.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Response, StatusCode};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

use crate::intake::domain::{
    Application, ApplicationId, ApplicationStatus, AttachedDocument, CaseStudy, NewApplication,
};

use super::{
    AdminUser, ApplicationStore, AuthError, Authenticator, CaseStudyStore, ObjectStore,
    StorageError, StoreError,
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const APPLICATIONS_TABLE: &str = "applications";
const CASE_STUDIES_TABLE: &str = "case_studies";

/// Raised when the adapter cannot even be constructed.
#[derive(Debug, thiserror::Error)]
pub enum SupabaseInitError {
    #[error("anon key is not a valid header value")]
    InvalidAnonKey,
    #[error("failed to build http client: {0}")]
    Client(#[from] reqwest::Error),
}

/// One client for all four consumed services of the platform.
pub struct SupabaseBackend {
    http: reqwest::Client,
    base_url: String,
}

impl SupabaseBackend {
    pub fn new(url: &str, anon_key: &str) -> Result<Self, SupabaseInitError> {
        let key_value =
            HeaderValue::from_str(anon_key).map_err(|_| SupabaseInitError::InvalidAnonKey)?;
        let bearer = HeaderValue::from_str(&format!("Bearer {anon_key}"))
            .map_err(|_| SupabaseInitError::InvalidAnonKey)?;

        let mut headers = HeaderMap::new();
        headers.insert("apikey", key_value);
        headers.insert(AUTHORIZATION, bearer);

        let http = reqwest::Client::builder()
            .user_agent(concat!("volunteer-intake/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: url.trim_end_matches('/').to_string(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    fn object_url(&self, bucket: &str, path: &str) -> String {
        format!("{}/storage/v1/object/{bucket}/{path}", self.base_url)
    }

    async fn expect_table_success(response: Response) -> Result<Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            Err(StoreError::Unavailable(format!("{status}: {body}")))
        } else if status == StatusCode::NOT_FOUND {
            Err(StoreError::NotFound)
        } else {
            Err(StoreError::Rejected(format!("{status}: {body}")))
        }
    }

    async fn expect_storage_success(response: Response) -> Result<Response, StorageError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        if status.is_server_error() {
            Err(StorageError::Unavailable(format!("{status}: {body}")))
        } else if status == StatusCode::NOT_FOUND {
            Err(StorageError::NotFound)
        } else {
            Err(StorageError::Rejected(format!("{status}: {body}")))
        }
    }

    async fn patch_application(
        &self,
        id: &ApplicationId,
        body: serde_json::Value,
    ) -> Result<(), StoreError> {
        let response = self
            .http
            .patch(self.table_url(APPLICATIONS_TABLE))
            .query(&[("id", format!("eq.{}", id.0))])
            .header("Prefer", "return=minimal")
            .json(&body)
            .send()
            .await
            .map_err(transport_store_error)?;
        Self::expect_table_success(response).await?;
        Ok(())
    }
}

fn transport_store_error(error: reqwest::Error) -> StoreError {
    StoreError::Unavailable(error.to_string())
}

fn transport_storage_error(error: reqwest::Error) -> StorageError {
    StorageError::Unavailable(error.to_string())
}

#[async_trait]
impl ApplicationStore for SupabaseBackend {
    async fn insert(&self, application: NewApplication) -> Result<(), StoreError> {
        let response = self
            .http
            .post(self.table_url(APPLICATIONS_TABLE))
            .header("Prefer", "return=minimal")
            .json(&application)
            .send()
            .await
            .map_err(transport_store_error)?;
        Self::expect_table_success(response).await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Application>, StoreError> {
        let response = self
            .http
            .get(self.table_url(APPLICATIONS_TABLE))
            .query(&[("select", "*"), ("order", "created_at.desc")])
            .send()
            .await
            .map_err(transport_store_error)?;
        let response = Self::expect_table_success(response).await?;
        response
            .json()
            .await
            .map_err(|error| StoreError::Rejected(format!("malformed application rows: {error}")))
    }

    async fn update_status(
        &self,
        id: &ApplicationId,
        status: ApplicationStatus,
    ) -> Result<(), StoreError> {
        self.patch_application(id, json!({ "status": status, "updated_at": Utc::now() }))
            .await
    }

    async fn update_notes(&self, id: &ApplicationId, notes: &str) -> Result<(), StoreError> {
        self.patch_application(id, json!({ "admin_notes": notes, "updated_at": Utc::now() }))
            .await
    }

    async fn set_flagged(&self, id: &ApplicationId, flagged: bool) -> Result<(), StoreError> {
        self.patch_application(id, json!({ "flagged": flagged, "updated_at": Utc::now() }))
            .await
    }
}

#[async_trait]
impl CaseStudyStore for SupabaseBackend {
    async fn active(&self) -> Result<Vec<CaseStudy>, StoreError> {
        let response = self
            .http
            .get(self.table_url(CASE_STUDIES_TABLE))
            .query(&[
                ("select", "*"),
                ("is_active", "eq.true"),
                ("order", "created_at.desc"),
            ])
            .send()
            .await
            .map_err(transport_store_error)?;
        let response = Self::expect_table_success(response).await?;
        response
            .json()
            .await
            .map_err(|error| StoreError::Rejected(format!("malformed case studies: {error}")))
    }
}

#[async_trait]
impl ObjectStore for SupabaseBackend {
    async fn upload(
        &self,
        bucket: &str,
        path: &str,
        document: &AttachedDocument,
    ) -> Result<(), StorageError> {
        let response = self
            .http
            .post(self.object_url(bucket, path))
            .header(CONTENT_TYPE, document.content_type().as_ref())
            .body(document.bytes().to_vec())
            .send()
            .await
            .map_err(transport_storage_error)?;
        Self::expect_storage_success(response).await?;
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> Result<String, StorageError> {
        Ok(format!(
            "{}/storage/v1/object/public/{bucket}/{path}",
            self.base_url
        ))
    }

    async fn download(&self, bucket: &str, path: &str) -> Result<Vec<u8>, StorageError> {
        let response = self
            .http
            .get(self.object_url(bucket, path))
            .send()
            .await
            .map_err(transport_storage_error)?;
        let response = Self::expect_storage_success(response).await?;
        let bytes = response.bytes().await.map_err(transport_storage_error)?;
        Ok(bytes.to_vec())
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    user: Option<TokenUser>,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthFailure {
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    msg: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl AuthFailure {
    fn into_message(self) -> String {
        self.error_description
            .or(self.msg)
            .or(self.message)
            .unwrap_or_else(|| "sign-in failed".to_string())
    }
}

/// Map the platform's failure message onto the three user-facing buckets.
fn classify_auth_failure(message: String) -> AuthError {
    if message.contains("Invalid login credentials") {
        AuthError::InvalidCredentials
    } else if message.contains("Email not confirmed") {
        AuthError::EmailNotConfirmed
    } else {
        AuthError::Rejected(message)
    }
}

#[async_trait]
impl Authenticator for SupabaseBackend {
    async fn sign_in(&self, email: &str, password: &str) -> Result<AdminUser, AuthError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "password")])
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|error| AuthError::Unavailable(error.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let failure = response
                .json::<AuthFailure>()
                .await
                .map(AuthFailure::into_message)
                .unwrap_or_else(|_| format!("sign-in failed with status {status}"));
            return Err(classify_auth_failure(failure));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|error| AuthError::Rejected(format!("malformed token response: {error}")))?;
        let email = token
            .user
            .and_then(|user| user.email)
            .unwrap_or_else(|| email.to_string());

        Ok(AdminUser {
            email,
            access_token: Some(token.access_token),
        })
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let response = self
            .http
            .post(format!("{}/auth/v1/logout", self.base_url))
            .header(AUTHORIZATION, format!("Bearer {access_token}"))
            .send()
            .await
            .map_err(|error| AuthError::Unavailable(error.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(AuthError::Rejected(format!(
                "sign-out failed with status {}",
                response.status()
            )))
        }
    }
}
