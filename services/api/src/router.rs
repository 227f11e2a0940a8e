//! Axum Router Configuration
//!
//! This module defines the complete HTTP routing for the application and the
//! OpenAPI document describing it.

use crate::{
    handlers,
    models::{AgentInfo, ErrorResponse, HostState, SetHostStatePayload, TurnPayload, TurnResponse},
    state::AppState,
};

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::process_turn,
        handlers::agent_info,
        handlers::get_host_state,
        handlers::set_host_state,
        handlers::clear_host_state,
    ),
    components(
        schemas(TurnPayload, TurnResponse, AgentInfo, HostState, SetHostStatePayload, ErrorResponse)
    ),
    tags(
        (name = "Turn Relay API", description = "Voice turn relay between the host platform and the conversation backend")
    )
)]
pub struct ApiDoc;

/// Creates the main Axum router for the application.
pub fn create_router(app_state: Arc<AppState>) -> Router {
    Router::new()
        .route("/conversation/turns", post(handlers::process_turn))
        .route("/agent", get(handlers::agent_info))
        .route(
            "/states/{key}",
            get(handlers::get_host_state)
                .put(handlers::set_host_state)
                .delete(handlers::clear_host_state),
        )
        .route(
            "/api-docs/openapi.json",
            get(|| async { axum::Json(ApiDoc::openapi()) }),
        )
        .with_state(app_state)
}
