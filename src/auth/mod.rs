//! Admin session handling: sign-in/sign-out routes, the in-process session
//! store, and the extractor that gates every admin route.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;
use uuid::Uuid;

use crate::backend::{AdminUser, AuthError, Authenticator};

/// Client-side route of the login view; unauthenticated admin requests are
/// pointed here, carrying the path they came from.
pub const LOGIN_PATH: &str = "/admin-login";

/// Active admin session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub email: String,
    /// Platform-issued token, revoked upstream on logout when present.
    pub upstream_token: Option<String>,
}

/// Token-indexed sessions, held in process for the lifetime of the service.
#[derive(Default)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, user: AdminUser) -> Session {
        let session = Session {
            token: Uuid::new_v4().to_string(),
            email: user.email,
            upstream_token: user.access_token,
        };
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        sessions.insert(session.token.clone(), session.clone());
        session
    }

    pub fn get(&self, token: &str) -> Option<Session> {
        let sessions = self.sessions.lock().expect("session store poisoned");
        sessions.get(token).cloned()
    }

    pub fn revoke(&self, token: &str) -> Option<Session> {
        let mut sessions = self.sessions.lock().expect("session store poisoned");
        sessions.remove(token)
    }
}

/// Extractor proving the request carries a live admin session.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub email: String,
    pub token: String,
}

/// Rejection mirroring the gated-route contract: point the caller at the
/// login view and preserve where they were headed.
#[derive(Debug)]
pub struct AuthRedirect {
    from: String,
}

impl AuthRedirect {
    fn new(from: impl Into<String>) -> Self {
        Self { from: from.into() }
    }
}

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": "admin session required",
            "redirect_to": LOGIN_PATH,
            "from": self.from,
        }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
}

#[axum::async_trait]
impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from = parts.uri.path().to_string();
        let Some(store) = parts.extensions.get::<Arc<SessionStore>>() else {
            return Err(AuthRedirect::new(from));
        };
        let session = bearer_token(parts).and_then(|token| store.get(token));
        match session {
            Some(session) => Ok(AdminSession {
                email: session.email,
                token: session.token,
            }),
            None => Err(AuthRedirect::new(from)),
        }
    }
}

/// Shared state for the sign-in/sign-out routes.
pub struct AuthState<A> {
    pub authenticator: Arc<A>,
    pub sessions: Arc<SessionStore>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub email: String,
}

/// Router exposing `/api/v1/auth/{login,logout}`.
pub fn auth_router<A>(authenticator: Arc<A>, sessions: Arc<SessionStore>) -> Router
where
    A: Authenticator + 'static,
{
    let state = Arc::new(AuthState {
        authenticator,
        sessions,
    });
    Router::new()
        .route("/api/v1/auth/login", post(login_handler::<A>))
        .route("/api/v1/auth/logout", post(logout_handler::<A>))
        .with_state(state)
}

pub(crate) async fn login_handler<A>(
    State(state): State<Arc<AuthState<A>>>,
    Json(request): Json<LoginRequest>,
) -> Response
where
    A: Authenticator + 'static,
{
    if request.email.trim().is_empty() || request.password.is_empty() {
        let payload = json!({ "error": "email and password are required" });
        return (StatusCode::BAD_REQUEST, Json(payload)).into_response();
    }

    match state
        .authenticator
        .sign_in(request.email.trim(), &request.password)
        .await
    {
        Ok(user) => {
            let session = state.sessions.create(user);
            let body = LoginResponse {
                token: session.token,
                email: session.email,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(error @ (AuthError::InvalidCredentials | AuthError::EmailNotConfirmed)) => {
            let payload = json!({ "error": error.user_message() });
            (StatusCode::UNAUTHORIZED, Json(payload)).into_response()
        }
        Err(error) => {
            warn!(%error, "sign-in failed");
            let payload = json!({ "error": error.user_message() });
            (StatusCode::BAD_GATEWAY, Json(payload)).into_response()
        }
    }
}

pub(crate) async fn logout_handler<A>(
    State(state): State<Arc<AuthState<A>>>,
    session: AdminSession,
) -> Response
where
    A: Authenticator + 'static,
{
    let revoked = state.sessions.revoke(&session.token);
    if let Some(upstream_token) = revoked.and_then(|session| session.upstream_token) {
        // Upstream revocation is best effort; the local session is gone
        // either way.
        if let Err(error) = state.authenticator.sign_out(&upstream_token).await {
            warn!(%error, "upstream sign-out failed");
        }
    }
    (StatusCode::OK, Json(json!({ "status": "signed_out" }))).into_response()
}
