use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Extension, Json};
use axum_prometheus::PrometheusMetricLayer;
use clap::{Args, Parser, Subcommand};
use metrics_exporter_prometheus::PrometheusHandle;
use serde_json::json;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};
use volunteer_intake::admin::{admin_router, AdminService};
use volunteer_intake::auth::{auth_router, SessionStore};
use volunteer_intake::backend::memory::{
    InMemoryApplicationStore, InMemoryAuthenticator, InMemoryCaseStudyStore, InMemoryObjectStore,
};
use volunteer_intake::backend::supabase::SupabaseBackend;
use volunteer_intake::backend::{ApplicationStore, Authenticator, CaseStudyStore, ObjectStore};
use volunteer_intake::config::AppConfig;
use volunteer_intake::error::AppError;
use volunteer_intake::intake::domain::{score_label, AttachedDocument, Competency};
use volunteer_intake::intake::{
    intake_router, FormStep, IntakeService, RegistrationForm, SubmissionPipeline,
};
use volunteer_intake::telemetry;

#[derive(Clone)]
struct AppState {
    readiness: Arc<AtomicBool>,
    metrics: Arc<PrometheusHandle>,
}

#[derive(Parser, Debug)]
#[command(
    name = "Volunteer Intake Service",
    about = "Run the volunteer application intake and review service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Walk a sample application through the six-step form for a local demo
    Demo,
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run_cli().await {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

async fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => run_server(args).await,
        Command::Demo => run_demo().await,
    }
}

async fn run_server(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    match config.backend.clone() {
        Some(backend) => {
            let client = Arc::new(SupabaseBackend::new(&backend.url, &backend.anon_key)?);
            serve(
                config,
                client.clone(),
                client.clone(),
                client.clone(),
                client,
            )
            .await
        }
        None => {
            warn!("no backend configured, using the in-memory stores");
            let mut authenticator = InMemoryAuthenticator::new();
            match config.admin_seed.clone() {
                Some(seed) => {
                    authenticator = authenticator.with_user(seed.email, seed.password);
                }
                None => warn!("no admin seed configured, admin login is disabled"),
            }
            serve(
                config,
                Arc::new(InMemoryApplicationStore::new()),
                Arc::new(InMemoryObjectStore::new()),
                Arc::new(InMemoryCaseStudyStore::with_sample_catalog()),
                Arc::new(authenticator),
            )
            .await
        }
    }
}

async fn serve<S, O, C, A>(
    config: AppConfig,
    applications: Arc<S>,
    objects: Arc<O>,
    case_studies: Arc<C>,
    authenticator: Arc<A>,
) -> Result<(), AppError>
where
    S: ApplicationStore + 'static,
    O: ObjectStore + 'static,
    C: CaseStudyStore + 'static,
    A: Authenticator + 'static,
{
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let sessions = Arc::new(SessionStore::new());
    let pipeline = SubmissionPipeline::new(applications.clone(), objects.clone());
    let intake = Arc::new(IntakeService::new(pipeline, case_studies));
    let admin = Arc::new(AdminService::new(applications, objects));

    let app = intake_router(intake)
        .merge(auth_router(authenticator, sessions.clone()))
        .merge(admin_router(admin))
        .route("/health", get(healthcheck))
        .route("/ready", get(readiness_endpoint))
        .route("/metrics", get(metrics_endpoint))
        .layer(Extension(sessions))
        .layer(Extension(state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "volunteer intake service ready");

    axum::serve(listener, app).await?;
    Ok(())
}

async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

/// Stdout walkthrough of the whole flow against the in-memory backend, for
/// demos and quick sanity checks without a platform account.
async fn run_demo() -> Result<(), AppError> {
    let applications = Arc::new(InMemoryApplicationStore::new());
    let objects = Arc::new(InMemoryObjectStore::new());
    let case_study_store = InMemoryCaseStudyStore::with_sample_catalog();
    let case_studies = match case_study_store.active().await {
        Ok(studies) => studies,
        Err(_) => Vec::new(),
    };

    println!("Registration form demo");
    println!("Loaded {} active case studies", case_studies.len());

    let mut form = RegistrationForm::new(case_studies);

    println!("\nStep gates");
    report_advance(&mut form, "empty personal data");

    {
        let draft = form.draft_mut();
        draft.full_name = "Dewi Lestari".to_string();
        draft.email = "dewi@example.org".to_string();
        draft.phone = "081234567890".to_string();
        draft.birth_date = chrono::NaiveDate::from_ymd_opt(1998, 3, 14);
    }
    report_advance(&mut form, "personal data filled");

    form.draft_mut().motivation =
        "I want to help the foundation scale its literacy programs to more \
         districts and bring my campaign experience along."
            .to_string();
    report_advance(&mut form, "motivation written");

    form.draft_mut().primary_competency = Some(Competency::BrandCommunication);
    report_advance(&mut form, "competency chosen");

    {
        let scores = &mut form.draft_mut().scores;
        scores.leadership_style = 2;
        scores.problem_solving_approach = 3;
        scores.communication_style = 4;
    }
    let scores = form.draft().scores;
    println!(
        "Assessment: leadership {}, problem solving {}, communication {}",
        score_label(scores.leadership_style),
        score_label(scores.problem_solving_approach),
        score_label(scores.communication_style)
    );
    report_advance(&mut form, "assessment answered");

    let requirements = form.file_requirements();
    println!(
        "\nDocument policy for {}: portfolio required {}, cv required {}",
        Competency::BrandCommunication,
        requirements.portfolio_required,
        requirements.cv_required
    );
    report_advance(&mut form, "portfolio still missing");

    let portfolio = match AttachedDocument::new(
        "portfolio.pdf",
        "application/pdf",
        b"%PDF-1.4 demo portfolio".to_vec(),
    ) {
        Ok(document) => document,
        Err(error) => {
            println!("demo portfolio rejected: {error}");
            return Ok(());
        }
    };
    form.attach_portfolio(portfolio);
    report_advance(&mut form, "portfolio attached");

    let answer = "The first signal I would look at is which channel lost reach, \
                  then compare message variants against last year's baseline \
                  before rewriting anything."
        .to_string();
    let relevant: Vec<_> = form
        .relevant_case_studies()
        .iter()
        .map(|case_study| case_study.id.clone())
        .collect();
    for case_id in relevant {
        form.record_response(case_id, answer.clone());
    }
    println!(
        "Answered {} relevant case studies",
        form.relevant_case_studies().len()
    );

    let pipeline = SubmissionPipeline::new(applications.clone(), objects.clone());
    match pipeline.submit(form).await {
        Ok(receipt) => {
            println!("\nSubmission accepted for {}", receipt.applicant_name);
            if let Some(path) = receipt.portfolio_path {
                println!("Portfolio stored at {path}");
            }
            println!(
                "Store now holds {} application(s) and {} object(s)",
                applications.len(),
                objects.object_count()
            );
        }
        Err(error) => println!("\nSubmission failed: {error}"),
    }

    Ok(())
}

fn report_advance(form: &mut RegistrationForm, label: &str) {
    let step: FormStep = form.current_step();
    match form.advance() {
        Ok(next) => println!(
            "- step {} ({}) passed, now on step {} [{label}]",
            step.number(),
            step.label(),
            next.number()
        ),
        Err(blocked) => println!("- blocked: {blocked} [{label}]"),
    }
}
