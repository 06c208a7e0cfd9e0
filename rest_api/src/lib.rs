// rest_api/src/lib.rs

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{oneshot, Mutex};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;
use uuid::Uuid;

use anyhow::Context;
use anyhow::Error as AnyhowError;

use lib::{AnalyticsEngine, FairTriageQueue, TriageClassifier, TriageService};
use models::{PatientIntake, RiskLevel, TriageEntry, TriageError};

pub mod config;
pub mod ollama;

pub use crate::config::{load_classifier_config, load_rest_api_config, RestApiConfig};
pub use crate::ollama::OllamaClassifier;

// Define the REST API error enum
#[derive(Debug, Error)]
pub enum RestApiError {
    #[error("validation error: {0}")]
    Validation(#[from] models::ValidationError),
    #[error("patient {0} not found")]
    NotFound(Uuid),
    #[error(transparent)]
    Triage(#[from] TriageError),
    #[error("JSON serialization/deserialization error: {0}")]
    SerdeJson(#[from] serde_json::Error),
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] AnyhowError),
}

// Convert RestApiError into an HTTP response
impl IntoResponse for RestApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            RestApiError::Validation(e) => (StatusCode::BAD_REQUEST, e.to_string()),
            RestApiError::NotFound(id) => {
                (StatusCode::NOT_FOUND, format!("patient {} not found", id))
            }
            RestApiError::Triage(TriageError::Validation(e)) => {
                (StatusCode::BAD_REQUEST, e.to_string())
            }
            RestApiError::Triage(TriageError::DuplicateEntry(id)) => (
                StatusCode::CONFLICT,
                format!("patient {} is already in the queue", id),
            ),
            RestApiError::Triage(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            RestApiError::SerdeJson(e) => (StatusCode::BAD_REQUEST, format!("JSON error: {}", e)),
            RestApiError::Anyhow(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Internal error: {}", e),
            ),
        };

        let body = Json(json!({
            "status": "error",
            "message": error_message,
        }));

        (status, body).into_response()
    }
}

// Shared state for the Axum application. The queue sits behind a single
// mutex: every operation that touches it, and the audit append that goes
// with it, runs under one exclusion boundary. The classifier call happens
// before the lock is taken, never under it.
#[derive(Clone)]
pub struct AppState {
    queue: Arc<Mutex<FairTriageQueue>>,
    service: Arc<TriageService>,
}

impl AppState {
    pub fn new(classifier: Arc<dyn TriageClassifier>) -> Self {
        Self {
            queue: Arc::new(Mutex::new(FairTriageQueue::new())),
            service: Arc::new(TriageService::new(classifier)),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EscalateRequest {
    pub new_risk_level: RiskLevel,
    #[serde(default)]
    pub reason: String,
}

// Handler for POST /api/v1/triage
async fn submit_triage_handler(
    State(state): State<AppState>,
    Json(intake): Json<PatientIntake>,
) -> Result<impl IntoResponse, RestApiError> {
    intake.validate()?;

    let patient_id = Uuid::new_v4();
    let intake_timestamp = Utc::now();
    info!(%patient_id, chief_complaint = %intake.chief_complaint, "triage submission received");

    // Classification (and the local fallback on failure) runs outside the
    // queue lock.
    let decision = state.service.triage(&intake).await;
    let triage_timestamp = Utc::now();

    let entry = TriageEntry::new(
        patient_id,
        intake,
        decision,
        intake_timestamp,
        triage_timestamp,
    );

    let mut queue = state.queue.lock().await;
    queue.add_patient(entry.clone()).map_err(RestApiError::Triage)?;
    info!(%patient_id, risk_level = %entry.triage_decision.risk_level, "patient queued");

    Ok((StatusCode::CREATED, Json(entry)))
}

// Handler for GET /api/v1/queue
async fn list_queue_handler(State(state): State<AppState>) -> Json<Vec<TriageEntry>> {
    let mut queue = state.queue.lock().await;
    Json(queue.ranked_view())
}

// Handler for GET /api/v1/queue/state
async fn queue_state_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut queue = state.queue.lock().await;
    Json(queue.queue_state())
}

// Handler for GET /api/v1/queue/analytics
async fn analytics_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut queue = state.queue.lock().await;
    let snapshot = queue.queue_state();
    let analytics = AnalyticsEngine::compute(&snapshot, queue.lifetime_total());
    Json(analytics)
}

// Handler for POST /api/v1/queue/escalate/:patient_id
async fn escalate_handler(
    State(state): State<AppState>,
    Path(patient_id): Path<Uuid>,
    Json(payload): Json<EscalateRequest>,
) -> Result<Json<TriageEntry>, RestApiError> {
    let mut queue = state.queue.lock().await;
    match queue.escalate_patient(patient_id, payload.new_risk_level, &payload.reason) {
        Some(entry) => Ok(Json(entry)),
        None => Err(RestApiError::NotFound(patient_id)),
    }
}

// Handler for POST /api/v1/queue/mark-seen/:patient_id
async fn mark_seen_handler(
    State(state): State<AppState>,
    Path(patient_id): Path<Uuid>,
) -> Result<Json<TriageEntry>, RestApiError> {
    let mut queue = state.queue.lock().await;
    match queue.mark_seen(patient_id) {
        Some(entry) => Ok(Json(entry)),
        None => Err(RestApiError::NotFound(patient_id)),
    }
}

// Handler for GET /api/v1/queue/health
async fn queue_health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let mut queue = state.queue.lock().await;
    Json(queue.health_check())
}

// Handler for GET /api/v1/audit-log
async fn audit_log_handler(State(state): State<AppState>) -> impl IntoResponse {
    let queue = state.queue.lock().await;
    Json(queue.export_audit_log())
}

// Handler for GET /api/v1/health
async fn health_check_handler() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "status": "ok", "message": "Triage REST API is healthy" })),
    )
}

// Handler for GET /api/v1/version
async fn version_handler() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "version": env!("CARGO_PKG_VERSION"), "api_level": 1 })),
    )
}

pub fn build_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(Any);

    Router::new()
        .route("/api/v1/triage", post(submit_triage_handler))
        .route("/api/v1/queue", get(list_queue_handler))
        .route("/api/v1/queue/state", get(queue_state_handler))
        .route("/api/v1/queue/analytics", get(analytics_handler))
        .route("/api/v1/queue/escalate/:patient_id", post(escalate_handler))
        .route("/api/v1/queue/mark-seen/:patient_id", post(mark_seen_handler))
        .route("/api/v1/queue/health", get(queue_health_handler))
        .route("/api/v1/audit-log", get(audit_log_handler))
        .route("/api/v1/health", get(health_check_handler))
        .route("/api/v1/version", get(version_handler))
        .with_state(state)
        .layer(cors)
}

// Main function to start the REST API server
pub async fn start_server(
    config: RestApiConfig,
    state: AppState,
    shutdown_rx: oneshot::Receiver<()>,
) -> Result<(), AnyhowError> {
    let app = build_router(state);

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| format!("invalid listen address {}:{}", config.host, config.port))?;
    info!("Triage REST API server listening on {}", addr);

    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to address: {}", addr))?;

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            let _ = shutdown_rx.await;
            info!("Received shutdown signal.");
        })
        .await
        .context("REST API server failed to start or run")?;

    info!("Triage REST API server stopped.");
    Ok(())
}
