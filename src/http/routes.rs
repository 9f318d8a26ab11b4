use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::acquisition::AcquisitionStats;
use crate::context::AcquisitionContext;
use crate::error::{ErrorCode, RecordingError, StoreError};
use crate::history::{HistoryComparison, HistoryEntry};
use crate::live::LiveView;
use crate::recording::{MilestoneKind, MilestoneUpdate, RecordingState, RecordingStatus, SessionRecord};
use crate::store::RoastId;

use super::sse;

/// Shared application state for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub context: Arc<AcquisitionContext>,
}

impl HttpState {
    pub fn new(context: Arc<AcquisitionContext>) -> Self {
        Self { context }
    }
}

/// HTTP error variants mapped to JSON responses.
#[derive(Debug)]
pub enum HttpServerError {
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    Internal(String),
}

impl IntoResponse for HttpServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, msg),
            Self::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<RecordingError> for HttpServerError {
    fn from(err: RecordingError) -> Self {
        match err {
            RecordingError::NotRecording | RecordingError::NoSamplesYet { .. } => {
                Self::Conflict(err.message())
            }
            RecordingError::LockPoisoned { .. } => Self::Internal(err.message()),
        }
    }
}

impl From<StoreError> for HttpServerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { .. } => Self::NotFound(err.message()),
            StoreError::InvalidRecord { .. } => Self::BadRequest(err.message()),
            StoreError::Io { .. } | StoreError::Serialization { .. } | StoreError::LockPoisoned => {
                Self::Internal(err.message())
            }
        }
    }
}

/// Health endpoint response payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sensor: String,
    pub recording: RecordingState,
    pub stats: AcquisitionStats,
}

/// Recording toggle request body.
#[derive(Debug, Deserialize)]
pub struct ToggleRequest {
    pub on: bool,
    #[serde(default)]
    pub bean_info: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ForcedStopResponse {
    pub forced_stop: bool,
}

#[derive(Debug, Deserialize)]
pub struct UpdateBeanInfoRequest {
    pub bean_info: Option<String>,
}

/// Query for `/roasts/compare?ids=1,2,3`.
#[derive(Debug, Default, Deserialize)]
pub struct CompareQuery {
    #[serde(default)]
    pub ids: String,
}

/// Build the Axum router with all handlers.
pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/live", get(live))
        .route("/live/stream", get(live_stream))
        .route("/recording", get(recording_status).post(toggle_recording))
        .route("/recording/forced-stop", get(poll_forced_stop))
        .route("/milestones/:kind", post(trigger_milestone))
        .route("/roasts", get(list_roasts))
        .route("/roasts/compare", get(compare_roasts))
        .route(
            "/roasts/:id",
            get(get_roast).patch(update_roast).delete(delete_roast),
        )
        .with_state(state)
}

/// Run the HTTP server until `shutdown` resolves.
pub async fn run_http_server<F>(state: HttpState, addr: SocketAddr, shutdown: F) -> anyhow::Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding HTTP listener on {}", addr))?;
    log::info!("[HTTP] Listening on {}", addr);
    let router = build_router(state);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown)
        .await
        .context("serving HTTP router")?;
    Ok(())
}

pub async fn health(State(state): State<HttpState>) -> Result<Json<HealthResponse>, HttpServerError> {
    let ctx = &state.context;
    Ok(Json(HealthResponse {
        status: "ok",
        sensor: ctx.sensor().name().to_string(),
        recording: ctx.recording_status()?.state,
        stats: ctx.acquisition_stats(),
    }))
}

pub async fn live(State(state): State<HttpState>) -> Result<Json<LiveView>, HttpServerError> {
    Ok(Json(state.context.get_live_series()?))
}

pub async fn live_stream(State(state): State<HttpState>) -> sse::LiveStream {
    sse::live(&state.context)
}

pub async fn recording_status(
    State(state): State<HttpState>,
) -> Result<Json<RecordingStatus>, HttpServerError> {
    Ok(Json(state.context.recording_status()?))
}

pub async fn toggle_recording(
    State(state): State<HttpState>,
    Json(request): Json<ToggleRequest>,
) -> Result<Json<RecordingStatus>, HttpServerError> {
    let status = blocking(&state, move |ctx| {
        Ok(ctx.toggle_recording(request.on, request.bean_info)?)
    })
    .await?;
    Ok(Json(status))
}

pub async fn poll_forced_stop(
    State(state): State<HttpState>,
) -> Result<Json<ForcedStopResponse>, HttpServerError> {
    Ok(Json(ForcedStopResponse {
        forced_stop: state.context.poll_forced_stop()?,
    }))
}

pub async fn trigger_milestone(
    State(state): State<HttpState>,
    Path(kind): Path<String>,
) -> Result<Json<MilestoneUpdate>, HttpServerError> {
    let kind: MilestoneKind = kind.parse().map_err(HttpServerError::BadRequest)?;
    Ok(Json(state.context.trigger_milestone(kind)?))
}

pub async fn list_roasts(
    State(state): State<HttpState>,
) -> Result<Json<Vec<HistoryEntry>>, HttpServerError> {
    let entries = blocking(&state, |ctx| Ok(ctx.list_history()?)).await?;
    Ok(Json(entries))
}

pub async fn compare_roasts(
    State(state): State<HttpState>,
    Query(query): Query<CompareQuery>,
) -> Result<Json<HistoryComparison>, HttpServerError> {
    let ids = parse_ids(&query.ids)?;
    let comparison = blocking(&state, move |ctx| Ok(ctx.compare_roasts(&ids)?)).await?;
    Ok(Json(comparison))
}

pub async fn get_roast(
    State(state): State<HttpState>,
    Path(id): Path<RoastId>,
) -> Result<Json<SessionRecord>, HttpServerError> {
    let record = blocking(&state, move |ctx| Ok(ctx.load_roast(id)?)).await?;
    Ok(Json(record))
}

pub async fn update_roast(
    State(state): State<HttpState>,
    Path(id): Path<RoastId>,
    Json(request): Json<UpdateBeanInfoRequest>,
) -> Result<Json<SessionRecord>, HttpServerError> {
    let record = blocking(&state, move |ctx| {
        ctx.update_bean_info(id, request.bean_info)?;
        Ok(ctx.load_roast(id)?)
    })
    .await?;
    Ok(Json(record))
}

pub async fn delete_roast(
    State(state): State<HttpState>,
    Path(id): Path<RoastId>,
) -> Result<StatusCode, HttpServerError> {
    blocking(&state, move |ctx| Ok(ctx.delete_roast(id)?)).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Run a context call that may touch the store on the blocking pool
async fn blocking<T, F>(state: &HttpState, call: F) -> Result<T, HttpServerError>
where
    F: FnOnce(&AcquisitionContext) -> Result<T, HttpServerError> + Send + 'static,
    T: Send + 'static,
{
    let context = state.context.clone();
    tokio::task::spawn_blocking(move || call(&context))
        .await
        .map_err(|err| HttpServerError::Internal(format!("blocking task failed: {}", err)))?
}

fn parse_ids(raw: &str) -> Result<Vec<RoastId>, HttpServerError> {
    raw.split(',')
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<RoastId>()
                .map_err(|_| HttpServerError::BadRequest(format!("invalid roast id: {}", part)))
        })
        .collect()
}
