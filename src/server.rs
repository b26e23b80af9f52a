//! Read-only HTTP API over the workbook.
//!
//! Every request reloads the workbook and, for the aggregation endpoint,
//! re-runs the joined pipeline. Nothing is cached between requests.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tracing::{error, info};

use crate::error::PipelineError;
use crate::metrics::VatRate;
use crate::model::{AggregateBucket, OperationalRecord, SurveyRecord};
use crate::pipeline::{self, PipelineConfig};

/// Shared handler state: where the workbook lives and how to aggregate it.
#[derive(Debug, Clone)]
pub struct AppState {
    workbook: Arc<PathBuf>,
    vat_rate: VatRate,
}

impl AppState {
    pub fn new(workbook: PathBuf, vat_rate: VatRate) -> Self {
        Self {
            workbook: Arc::new(workbook),
            vat_rate,
        }
    }
}

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/survey", get(survey_records))
        .route("/api/operation", get(operational_records))
        .route("/api/dynamic-aggregation", get(dynamic_aggregation))
        .with_state(state)
}

/// Binds `addr` and serves the router until the process is stopped.
pub async fn serve(addr: SocketAddr, state: AppState) -> crate::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, workbook = %state.workbook.display(), "listening");
    axum::serve(listener, build_router(state)).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub version: &'static str,
}

/// GET /health
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// GET /api/survey
pub async fn survey_records(
    State(state): State<AppState>,
) -> Result<Json<Vec<SurveyRecord>>, ApiError> {
    let workbook = Arc::clone(&state.workbook);
    let records = blocking(move || pipeline::load_survey(&workbook)).await?;
    Ok(Json(records))
}

/// GET /api/operation
pub async fn operational_records(
    State(state): State<AppState>,
) -> Result<Json<Vec<OperationalRecord>>, ApiError> {
    let workbook = Arc::clone(&state.workbook);
    let records = blocking(move || pipeline::load_operations(&workbook)).await?;
    Ok(Json(records))
}

/// GET /api/dynamic-aggregation
pub async fn dynamic_aggregation(
    State(state): State<AppState>,
) -> Result<Json<Vec<AggregateBucket>>, ApiError> {
    let workbook = Arc::clone(&state.workbook);
    let config = PipelineConfig {
        vat_rate: state.vat_rate,
        join_operations: true,
    };
    let table = blocking(move || pipeline::run(&workbook, config)).await?;
    Ok(Json(table.buckets))
}

async fn blocking<T, F>(task: F) -> Result<T, ApiError>
where
    F: FnOnce() -> crate::Result<T> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(task).await {
        Ok(result) => result.map_err(ApiError::Pipeline),
        Err(join_error) => Err(ApiError::Worker(join_error.to_string())),
    }
}

/// Error returned by the handlers, rendered as `{"error": kind, "message": text}`.
#[derive(Debug)]
pub enum ApiError {
    Pipeline(PipelineError),
    Worker(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match self {
            ApiError::Pipeline(err) => {
                let status = match &err {
                    PipelineError::SchemaMismatch { .. } | PipelineError::InvalidWorkbook(_) => {
                        StatusCode::UNPROCESSABLE_ENTITY
                    }
                    PipelineError::MissingInput(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.kind(), err.to_string())
            }
            ApiError::Worker(message) => (StatusCode::INTERNAL_SERVER_ERROR, "worker", message),
        };

        if status.is_server_error() {
            error!(kind, %message, "request failed");
        }

        let body = Json(json!({
            "error": kind,
            "message": message,
        }));
        (status, body).into_response()
    }
}
