//! Turn Relay API Library Crate
//!
//! This library contains the host-facing side of the relay: configuration,
//! the application state, the host state store and host service bindings,
//! API handlers, and routing. The binaries are thin wrappers around it.

pub mod config;
pub mod handlers;
pub mod host_services;
pub mod host_state;
pub mod models;
pub mod router;
pub mod state;

use std::sync::Arc;
use turn_relay_core::{ConversationAgent, HttpBackendClient, SideEffectPort, side_effects::LogOnlySideEffects};

/// Wires the conversation agent and shared state from configuration.
pub fn build_state(config: config::Config) -> anyhow::Result<Arc<state::AppState>> {
    let host_states = Arc::new(host_state::HostStateStore::new());
    let side_effects: Arc<dyn SideEffectPort> = match &config.host_services {
        Some(host) => {
            tracing::info!(api_url = %host.api_url, "Using host service API for speech and alerts");
            Arc::new(host_services::HostServicePort::new(host.clone())?)
        }
        None => {
            tracing::info!("No host service API configured; side effects are logged only");
            Arc::new(LogOnlySideEffects)
        }
    };
    let agent = ConversationAgent::new(
        config.agent_settings(),
        host_states.clone(),
        Arc::new(HttpBackendClient::new()?),
        side_effects,
    );
    Ok(Arc::new(state::AppState {
        agent: Arc::new(agent),
        host_states,
        config: Arc::new(config),
    }))
}
