//! Axum Handlers for the REST API
//!
//! This module contains the logic for handling inbound turns from the host,
//! agent metadata, and the host state store. It uses `utoipa` doc comments to
//! generate OpenAPI documentation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info};
use turn_relay_core::turn::SUPPORTED_LANGUAGES;

use crate::{
    models::{AgentInfo, ErrorResponse, HostState, SetHostStatePayload, TurnPayload, TurnResponse},
    state::AppState,
};

pub enum ApiError {
    BadRequest(String),
    NotFound(String),
    InternalServerError(anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, Json(ErrorResponse { message })).into_response()
            }
            ApiError::NotFound(message) => {
                (StatusCode::NOT_FOUND, Json(ErrorResponse { message })).into_response()
            }
            ApiError::InternalServerError(err) => {
                error!("Internal Server Error: {:?}", err);
                let message = "An internal server error occurred.".to_string();
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse { message }),
                )
                    .into_response()
            }
        }
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::InternalServerError(err.into())
    }
}

/// Process one conversation turn.
///
/// Always answers 200 with something to say: backend failures come back as a
/// spoken apology with `continue_conversation = false`.
#[utoipa::path(
    post,
    path = "/conversation/turns",
    request_body = TurnPayload,
    responses(
        (status = 200, description = "Turn processed", body = TurnResponse),
        (status = 400, description = "Bad request", body = ErrorResponse)
    )
)]
pub async fn process_turn(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<TurnPayload>,
) -> Result<Json<TurnResponse>, ApiError> {
    if payload.language.trim().is_empty() {
        return Err(ApiError::BadRequest("language is required".to_string()));
    }
    let request = payload.into_request();
    let result = state.agent.process(&request).await;
    Ok(Json(TurnResponse::new(result, request.turn_id)))
}

/// Describe the conversation agent.
#[utoipa::path(
    get,
    path = "/agent",
    responses(
        (status = 200, description = "Agent description", body = AgentInfo)
    )
)]
pub async fn agent_info(State(state): State<Arc<AppState>>) -> Json<AgentInfo> {
    let settings = state.agent.settings();
    Json(AgentInfo {
        name: settings.display_name(),
        unique_id: settings.agent_id.clone(),
        supported_languages: SUPPORTED_LANGUAGES.iter().map(|l| l.to_string()).collect(),
    })
}

/// Read a host state value.
#[utoipa::path(
    get,
    path = "/states/{key}",
    responses(
        (status = 200, description = "Current value", body = HostState),
        (status = 404, description = "Key not set", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("key" = String, Path, description = "State key, e.g. input_text.backend_host")
    )
)]
pub async fn get_host_state(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<HostState>, ApiError> {
    let value = state
        .host_states
        .get(&key)?
        .ok_or_else(|| ApiError::NotFound(format!("State '{}' not set", key)))?;
    Ok(Json(HostState { key, value }))
}

/// Publish a host state value.
#[utoipa::path(
    put,
    path = "/states/{key}",
    request_body = SetHostStatePayload,
    responses(
        (status = 200, description = "Value stored", body = HostState),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    params(
        ("key" = String, Path, description = "State key, e.g. input_text.backend_host")
    )
)]
pub async fn set_host_state(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
    Json(payload): Json<SetHostStatePayload>,
) -> Result<Json<HostState>, ApiError> {
    let previous = state.host_states.set(&key, payload.value.clone())?;
    info!(%key, value = %payload.value, ?previous, "Host state updated");
    Ok(Json(HostState {
        key,
        value: payload.value,
    }))
}

/// Clear a host state value.
#[utoipa::path(
    delete,
    path = "/states/{key}",
    responses(
        (status = 204, description = "Value cleared"),
        (status = 404, description = "Key not set", body = ErrorResponse)
    ),
    params(
        ("key" = String, Path, description = "State key")
    )
)]
pub async fn clear_host_state(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .host_states
        .remove(&key)?
        .ok_or_else(|| ApiError::NotFound(format!("State '{}' not set", key)))?;
    Ok(StatusCode::NO_CONTENT)
}
