use axum::{
    Router,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    middleware::from_fn,
    response::Json,
    routing::{delete, get, post},
};
use heartlyzer_flow::{
    ChatRunner, FIELDS, FieldSpec, FlowError, HttpConnector, InMemoryBackend,
    InMemorySessionStorage, PRINCIPAL_HEADER, ServiceConnector, SessionView, SubmitOutcome,
};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use crate::{
    config::ServiceConfig,
    models::{ChatRequest, ChatResponse, CreateSessionRequest, MessageRequest},
    telemetry::correlation_id_middleware,
};

pub const ANONYMOUS: &str = "anonymous";

type ApiError = (StatusCode, Json<Value>);
type ApiResult<T> = Result<Json<T>, ApiError>;

fn bad_request_error(message: &str) -> ApiError {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": message })))
}

fn flow_error(e: FlowError) -> ApiError {
    let status = match &e {
        FlowError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        FlowError::Busy => StatusCode::CONFLICT,
        FlowError::HistoryIndexOutOfBounds(_) | FlowError::InvalidAnswer { .. } => {
            StatusCode::BAD_REQUEST
        }
        FlowError::Remote(_) | FlowError::Transport(_) => StatusCode::BAD_GATEWAY,
        FlowError::MissingField(_) | FlowError::Serialization(_) | FlowError::StorageError(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        error!(error = %e, %status, "request failed");
    } else {
        warn!(error = %e, %status, "request rejected");
    }

    let body = match &e {
        FlowError::SessionNotFound(id) => json!({ "error": e.to_string(), "session_id": id }),
        _ => json!({ "error": e.to_string() }),
    };
    (status, Json(body))
}

#[derive(Clone)]
pub struct AppState {
    pub runner: ChatRunner,
}

impl AppState {
    pub fn new(runner: ChatRunner) -> Self {
        Self { runner }
    }
}

pub fn create_connector(config: &ServiceConfig) -> Arc<dyn ServiceConnector> {
    match &config.prediction_service_url {
        Some(url) => {
            info!(url = %url, "Using remote prediction service");
            Arc::new(HttpConnector::new(url.clone()))
        }
        None => {
            warn!(
                "PREDICTION_SERVICE_URL not set, using in-memory prediction backend (development mode)"
            );
            Arc::new(InMemoryBackend::development())
        }
    }
}

pub fn create_app(config: &ServiceConfig) -> Router {
    let runner = ChatRunner::with_config(
        Arc::new(InMemorySessionStorage::new()),
        create_connector(config),
        config.orchestrator.clone(),
    );
    build_router(AppState::new(runner))
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/fields", get(list_fields))
        .route("/chat", post(chat))
        .route("/sessions", post(create_session))
        .route("/sessions/{id}", get(get_session))
        .route("/sessions/{id}/messages", post(post_message))
        .route("/sessions/{id}/new-chat", post(new_chat))
        .route("/sessions/{id}/history", delete(clear_history))
        .route("/sessions/{id}/history/refresh", post(refresh_history))
        .route("/sessions/{id}/history/{index}", delete(delete_history_entry))
        .route("/sessions/{id}/history/{index}/select", post(select_history))
        .layer(
            ServiceBuilder::new()
                .layer(from_fn(correlation_id_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(app_state)
}

fn principal_from(headers: &HeaderMap, body: Option<String>) -> String {
    body.filter(|p| !p.trim().is_empty())
        .or_else(|| {
            headers
                .get(PRINCIPAL_HEADER)
                .and_then(|v| v.to_str().ok())
                .filter(|p| !p.trim().is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| ANONYMOUS.to_string())
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_fields() -> Json<&'static [FieldSpec]> {
    Json(FIELDS)
}

async fn chat(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<ChatRequest>,
) -> ApiResult<ChatResponse> {
    if request.content.trim().is_empty() {
        return Err(bad_request_error("content is required"));
    }

    let session_id = match request.session_id {
        Some(id) => state.runner.session(&id).await.map_err(flow_error)?.id,
        None => {
            let principal = principal_from(&headers, request.principal);
            info!(principal = %principal, "Creating new session");
            state
                .runner
                .open_session(&principal)
                .await
                .map_err(flow_error)?
                .id
        }
    };

    submit(&state, &session_id, &request.content).await
}

async fn create_session(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(request): Json<CreateSessionRequest>,
) -> ApiResult<SessionView> {
    let principal = principal_from(&headers, request.principal);
    let session = state
        .runner
        .open_session(&principal)
        .await
        .map_err(flow_error)?;
    view(&state, &session.id).await
}

async fn get_session(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<SessionView> {
    view(&state, &id).await
}

async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<MessageRequest>,
) -> ApiResult<ChatResponse> {
    if request.content.trim().is_empty() {
        return Err(bad_request_error("content is required"));
    }
    submit(&state, &id, &request.content).await
}

async fn new_chat(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<SessionView> {
    state.runner.new_chat(&id).await.map_err(flow_error)?;
    view(&state, &id).await
}

async fn refresh_history(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<SessionView> {
    state.runner.refresh_history(&id).await.map_err(flow_error)?;
    view(&state, &id).await
}

async fn select_history(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
) -> ApiResult<SessionView> {
    state
        .runner
        .select_history(&id, index)
        .await
        .map_err(flow_error)?;
    view(&state, &id).await
}

async fn delete_history_entry(
    State(state): State<AppState>,
    Path((id, index)): Path<(String, usize)>,
) -> ApiResult<SessionView> {
    state
        .runner
        .delete_history(&id, index)
        .await
        .map_err(flow_error)?;
    view(&state, &id).await
}

async fn clear_history(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<SessionView> {
    state.runner.clear_history(&id).await.map_err(flow_error)?;
    view(&state, &id).await
}

async fn view(state: &AppState, id: &str) -> ApiResult<SessionView> {
    state.runner.snapshot(id).await.map(Json).map_err(flow_error)
}

/// Submits one message. Input dropped because an analysis is running is
/// reported as a conflict so clients can tell it was not processed.
async fn submit(state: &AppState, session_id: &str, content: &str) -> ApiResult<ChatResponse> {
    let outcome = state
        .runner
        .submit(session_id, content)
        .await
        .map_err(flow_error)?;
    let session = state.runner.snapshot(session_id).await.map_err(flow_error)?;

    if outcome == SubmitOutcome::Ignored && session.busy {
        return Err(flow_error(FlowError::Busy));
    }

    info!(
        session_id = %session_id,
        position = session.position,
        ?outcome,
        "Message processed"
    );

    Ok(Json(ChatResponse {
        session_id: session_id.to_string(),
        outcome,
        session,
    }))
}
