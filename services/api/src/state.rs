//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the conversation
//! agent and the host state store shared by all handlers.

use crate::{config::Config, host_state::HostStateStore};
use std::sync::Arc;
use turn_relay_core::ConversationAgent;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub agent: Arc<ConversationAgent>,
    pub host_states: Arc<HostStateStore>,
    pub config: Arc<Config>,
}
