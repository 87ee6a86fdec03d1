//! Specifications for the gated review surface: session gating, the
//! filter/stats view, remote-first mutations, export, and document fetches.

mod common {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::body::to_bytes;
    use axum::http::{Request, StatusCode};
    use axum::response::Response;
    use axum::{body::Body, Extension, Router};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use volunteer_intake::admin::{admin_router, AdminService};
    use volunteer_intake::auth::{auth_router, SessionStore};
    use volunteer_intake::backend::memory::{
        InMemoryApplicationStore, InMemoryAuthenticator, InMemoryObjectStore,
    };
    use volunteer_intake::backend::{ApplicationStore, StoreError};
    use volunteer_intake::intake::domain::{
        Application, ApplicationId, ApplicationStage, ApplicationStatus, AssessmentScores,
        Competency, NewApplication,
    };

    pub(super) const ADMIN_EMAIL: &str = "admin@example.org";
    pub(super) const ADMIN_PASSWORD: &str = "correct-horse";

    pub(super) struct TestApp {
        pub(super) router: Router,
        pub(super) applications: Arc<InMemoryApplicationStore>,
        pub(super) objects: Arc<InMemoryObjectStore>,
    }

    pub(super) fn build_app() -> TestApp {
        let applications = Arc::new(InMemoryApplicationStore::new());
        let objects = Arc::new(InMemoryObjectStore::new());
        let service = Arc::new(AdminService::new(applications.clone(), objects.clone()));
        let authenticator = Arc::new(
            InMemoryAuthenticator::new()
                .with_user(ADMIN_EMAIL, ADMIN_PASSWORD)
                .with_unconfirmed_user("pending@example.org", ADMIN_PASSWORD),
        );
        let sessions = Arc::new(SessionStore::new());
        let router = auth_router(authenticator, sessions.clone())
            .merge(admin_router(service))
            .layer(Extension(sessions));
        TestApp {
            router,
            applications,
            objects,
        }
    }

    pub(super) fn new_application(name: &str, email: &str, competency: Competency) -> NewApplication {
        NewApplication {
            full_name: name.to_string(),
            email: email.to_string(),
            phone: "081200000000".to_string(),
            birth_date: chrono::NaiveDate::from_ymd_opt(1997, 6, 2).expect("valid date"),
            motivation: "m".repeat(60),
            previous_volunteer_experience: String::new(),
            primary_competency: competency,
            secondary_competency: None,
            scores: AssessmentScores::default(),
            case_study_responses: Vec::new(),
            portfolio_path: None,
            cv_path: None,
            status: ApplicationStatus::New,
            stage: ApplicationStage::CaseStudy,
            flagged: false,
            admin_notes: String::new(),
        }
    }

    pub(super) async fn seed_applications(store: &InMemoryApplicationStore) -> Vec<Application> {
        store
            .insert(new_application(
                "Adi Nugroho",
                "adi@example.org",
                Competency::HumanDevelopment,
            ))
            .await
            .expect("insert");
        store
            .insert(new_application(
                "Bayu Putra",
                "bayu@example.org",
                Competency::BrandCommunication,
            ))
            .await
            .expect("insert");
        store
            .insert(new_application(
                "Citra Ayu",
                "citra@example.org",
                Competency::BrandCommunication,
            ))
            .await
            .expect("insert");
        store.list_all().await.expect("seeded rows")
    }

    pub(super) async fn login(router: &Router) -> String {
        let response = router
            .clone()
            .oneshot(post_json(
                "/api/v1/auth/login",
                &json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        payload["token"]
            .as_str()
            .expect("session token")
            .to_string()
    }

    pub(super) fn post_json(uri: &str, body: &Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(serde_json::to_vec(body).expect("serialize")))
            .expect("request")
    }

    pub(super) fn authed(method: &str, uri: &str, token: &str, body: Option<&Value>) -> Request<Body> {
        let builder = Request::builder()
            .method(method)
            .uri(uri)
            .header("authorization", format!("Bearer {token}"));
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(body).expect("serialize")))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        }
    }

    pub(super) async fn read_json_body(response: Response) -> Value {
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        serde_json::from_slice(&body).expect("json payload")
    }

    pub(super) async fn read_text_body(response: Response) -> String {
        let body = to_bytes(response.into_body(), 1024 * 1024)
            .await
            .expect("read body");
        String::from_utf8(body.to_vec()).expect("utf8 body")
    }

    /// Store whose reads work but whose mutations always fail, for the
    /// remote-first ordering scenarios.
    pub(super) struct ReadOnlyStore {
        pub(super) inner: InMemoryApplicationStore,
    }

    #[async_trait]
    impl ApplicationStore for ReadOnlyStore {
        async fn insert(&self, application: NewApplication) -> Result<(), StoreError> {
            self.inner.insert(application).await
        }

        async fn list_all(&self) -> Result<Vec<Application>, StoreError> {
            self.inner.list_all().await
        }

        async fn update_status(
            &self,
            _id: &ApplicationId,
            _status: ApplicationStatus,
        ) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("write refused".to_string()))
        }

        async fn update_notes(&self, _id: &ApplicationId, _notes: &str) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("write refused".to_string()))
        }

        async fn set_flagged(
            &self,
            _id: &ApplicationId,
            _flagged: bool,
        ) -> Result<(), StoreError> {
            Err(StoreError::Unavailable("write refused".to_string()))
        }
    }
}

mod gating {
    use super::common::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    #[tokio::test]
    async fn admin_routes_answer_with_a_login_redirect_when_unauthenticated() {
        let app = build_app();
        let response = app
            .router
            .oneshot(
                Request::builder()
                    .uri("/api/v1/admin/applications")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let payload = read_json_body(response).await;
        assert_eq!(payload["redirect_to"], "/admin-login");
        assert_eq!(payload["from"], "/api/v1/admin/applications");
    }

    #[tokio::test]
    async fn unknown_tokens_are_rejected() {
        let app = build_app();
        let response = app
            .router
            .oneshot(authed(
                "GET",
                "/api/v1/admin/applications",
                "not-a-real-token",
                None,
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_failures_map_to_the_three_user_messages() {
        let app = build_app();

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/v1/auth/login",
                &json!({ "email": ADMIN_EMAIL, "password": "wrong" }),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let payload = read_json_body(response).await;
        assert_eq!(payload["error"], "Email or password is incorrect");

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/v1/auth/login",
                &json!({ "email": "pending@example.org", "password": ADMIN_PASSWORD }),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let payload = read_json_body(response).await;
        assert_eq!(payload["error"], "Email address has not been confirmed");

        let response = app
            .router
            .clone()
            .oneshot(post_json(
                "/api/v1/auth/login",
                &json!({ "email": "", "password": "" }),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn logout_revokes_the_session() {
        let app = build_app();
        let token = login(&app.router).await;

        let response = app
            .router
            .clone()
            .oneshot(authed("POST", "/api/v1/auth/logout", &token, None))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .router
            .oneshot(authed("GET", "/api/v1/admin/applications", &token, None))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

mod dashboard {
    use super::common::*;
    use axum::http::StatusCode;
    use serde_json::json;
    use tower::ServiceExt;
    use volunteer_intake::backend::ApplicationStore;

    #[tokio::test]
    async fn list_returns_stats_over_the_full_set_and_the_filtered_view() {
        let app = build_app();
        seed_applications(&app.applications).await;
        let token = login(&app.router).await;

        let response = app
            .router
            .clone()
            .oneshot(authed("GET", "/api/v1/admin/applications", &token, None))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        let payload = read_json_body(response).await;
        assert_eq!(payload["stats"]["total"], 3);
        assert_eq!(payload["stats"]["by_status"]["new"], 3);
        assert_eq!(
            payload["stats"]["by_competency"]["Brand & Communication Area"],
            2
        );
        assert_eq!(payload["applications"].as_array().expect("array").len(), 3);

        // Filtered view narrows; stats still cover everything.
        let response = app
            .router
            .oneshot(authed(
                "GET",
                "/api/v1/admin/applications?search=bayu&competency=Brand%20%26%20Communication%20Area",
                &token,
                None,
            ))
            .await
            .expect("router dispatch");
        let payload = read_json_body(response).await;
        assert_eq!(payload["stats"]["total"], 3);
        let filtered = payload["applications"].as_array().expect("array");
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0]["full_name"], "Bayu Putra");
    }

    #[tokio::test]
    async fn status_and_notes_mutations_reach_the_store() {
        let app = build_app();
        let rows = seed_applications(&app.applications).await;
        let id = rows[0].id.0.clone();
        let token = login(&app.router).await;

        let response = app
            .router
            .clone()
            .oneshot(authed(
                "PATCH",
                &format!("/api/v1/admin/applications/{id}/status"),
                &token,
                Some(&json!({ "status": "interview" })),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .router
            .clone()
            .oneshot(authed(
                "PATCH",
                &format!("/api/v1/admin/applications/{id}/notes"),
                &token,
                Some(&json!({ "notes": "strong portfolio" })),
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);

        let stored = app.applications.list_all().await.expect("rows");
        let row = stored.iter().find(|row| row.id.0 == id).expect("row");
        assert_eq!(row.status.label(), "interview");
        assert_eq!(row.admin_notes, "strong portfolio");
    }

    #[tokio::test]
    async fn flag_toggles_back_and_forth() {
        let app = build_app();
        let rows = seed_applications(&app.applications).await;
        let id = rows[1].id.0.clone();
        let token = login(&app.router).await;

        let uri = format!("/api/v1/admin/applications/{id}/flag");
        let response = app
            .router
            .clone()
            .oneshot(authed("POST", &uri, &token, None))
            .await
            .expect("router dispatch");
        let payload = read_json_body(response).await;
        assert_eq!(payload["flagged"], true);

        let response = app
            .router
            .clone()
            .oneshot(authed("POST", &uri, &token, None))
            .await
            .expect("router dispatch");
        let payload = read_json_body(response).await;
        assert_eq!(payload["flagged"], false);
    }

    #[tokio::test]
    async fn mutating_a_missing_application_is_not_found() {
        let app = build_app();
        seed_applications(&app.applications).await;
        let token = login(&app.router).await;

        let response = app
            .router
            .oneshot(authed(
                "POST",
                "/api/v1/admin/applications/no-such-id/flag",
                &token,
                None,
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn export_renders_csv_with_one_line_per_application() {
        let app = build_app();
        seed_applications(&app.applications).await;
        let token = login(&app.router).await;

        let response = app
            .router
            .oneshot(authed(
                "GET",
                "/api/v1/admin/applications/export",
                &token,
                None,
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .and_then(|value| value.to_str().ok()),
            Some("text/csv")
        );
        let body = read_text_body(response).await;
        let mut lines = body.lines();
        assert!(lines
            .next()
            .expect("header line")
            .starts_with("id,created_at,full_name"));
        assert_eq!(lines.count(), 3);
    }
}

mod mutations_are_remote_first {
    use super::common::*;
    use std::sync::Arc;
    use volunteer_intake::admin::AdminService;
    use volunteer_intake::backend::memory::InMemoryObjectStore;
    use volunteer_intake::intake::domain::ApplicationStatus;

    #[tokio::test]
    async fn a_failed_remote_update_leaves_the_snapshot_untouched() {
        let store = Arc::new(ReadOnlyStore {
            inner: seeded_inner().await,
        });
        let service = AdminService::new(store, Arc::new(InMemoryObjectStore::new()));

        let rows = service.refresh().await.expect("refresh");
        let id = rows[0].id.clone();

        let error = service
            .set_status(&id, ApplicationStatus::Accepted)
            .await
            .expect_err("write refused");
        assert!(error.to_string().contains("write refused"));

        let snapshot = service.snapshot();
        assert_eq!(snapshot[0].status, ApplicationStatus::New);

        let error = service
            .update_notes(&id, "will not stick")
            .await
            .expect_err("write refused");
        assert!(error.to_string().contains("write refused"));
        assert!(service.snapshot()[0].admin_notes.is_empty());

        service.toggle_flag(&id).await.expect_err("write refused");
        assert!(!service.snapshot()[0].flagged);
    }

    async fn seeded_inner() -> volunteer_intake::backend::memory::InMemoryApplicationStore {
        let inner = volunteer_intake::backend::memory::InMemoryApplicationStore::new();
        seed_applications(&inner).await;
        inner
    }
}

mod documents {
    use super::common::*;
    use axum::http::StatusCode;
    use tower::ServiceExt;
    use volunteer_intake::backend::ObjectStore;
    use volunteer_intake::intake::domain::AttachedDocument;
    use volunteer_intake::intake::PORTFOLIO_BUCKET;

    #[tokio::test]
    async fn downloads_fall_back_to_direct_bytes_without_a_public_url() {
        let app = build_app();
        let document =
            AttachedDocument::new("portfolio.pdf", "application/pdf", b"%PDF-1.4 x".to_vec())
                .expect("valid document");
        app.objects
            .upload(PORTFOLIO_BUCKET, "public/1-portfolio.pdf", &document)
            .await
            .expect("upload");
        let token = login(&app.router).await;

        let response = app
            .router
            .oneshot(authed(
                "GET",
                "/api/v1/admin/files/portfolios/public/1-portfolio.pdf",
                &token,
                None,
            ))
            .await
            .expect("router dispatch");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get("content-type")
                .and_then(|value| value.to_str().ok()),
            Some("application/pdf")
        );
        let body = read_text_body(response).await;
        assert!(body.starts_with("%PDF-1.4"));
    }

    #[tokio::test]
    async fn unknown_buckets_are_refused() {
        let app = build_app();
        let token = login(&app.router).await;

        let response = app
            .router
            .oneshot(authed(
                "GET",
                "/api/v1/admin/files/secrets/anything.pdf",
                &token,
                None,
            ))
            .await
            .expect("router dispatch");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
