//! Conversation Agent
//!
//! The turn boundary. One call to [`ConversationAgent::process`] resolves the
//! backend, sends the utterance, routes the response and returns the result
//! the host should speak. Backend failures never escape as errors: they become
//! a fixed apology that ends the session.
//!
//! The agent holds no per-conversation state. Concurrent turns share only
//! immutable configuration and the injected capabilities.

use crate::{
    backend::{ClientError, ConversationBackend, DEFAULT_TIMEOUT},
    endpoint::{DEFAULT_PORT, DynamicEndpointSource, Endpoint, EndpointResolver},
    protocol::{ConversationRequest, HealthInfo},
    router::ResponseRouter,
    side_effects::SideEffectPort,
    turn::{SessionContext, TurnRequest, TurnResult},
};
use std::{sync::Arc, time::Duration};
use tracing::{Instrument, error, info, info_span};

/// Prefix of the agent's unique id.
pub const AGENT_DOMAIN: &str = "turn_relay";

/// Static settings for an agent instance.
#[derive(Debug, Clone)]
pub struct AgentSettings {
    /// Statically configured backend host. Empty means "dynamic only".
    pub configured_host: String,
    pub port: u16,
    pub timeout: Duration,
    /// Unique id reported to the backend in `ha_context.agent_id`.
    pub agent_id: String,
}

impl AgentSettings {
    pub fn for_entry(entry_id: &str) -> Self {
        Self {
            configured_host: String::new(),
            port: DEFAULT_PORT,
            timeout: DEFAULT_TIMEOUT,
            agent_id: format!("{AGENT_DOMAIN}_{entry_id}"),
        }
    }

    /// Human-readable name, as shown by the host.
    pub fn display_name(&self) -> String {
        if self.configured_host.trim().is_empty() {
            format!("Turn relay (Dynamic IP:{})", self.port)
        } else {
            format!("Turn relay ({}:{})", self.configured_host.trim(), self.port)
        }
    }
}

/// Outcome of a successful setup validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedBackend {
    pub title: String,
    pub version: String,
    pub endpoint: Endpoint,
}

pub struct ConversationAgent {
    settings: AgentSettings,
    resolver: EndpointResolver,
    backend: Arc<dyn ConversationBackend>,
    router: ResponseRouter,
}

impl ConversationAgent {
    pub fn new(
        settings: AgentSettings,
        source: Arc<dyn DynamicEndpointSource>,
        backend: Arc<dyn ConversationBackend>,
        side_effects: Arc<dyn SideEffectPort>,
    ) -> Self {
        let mode = if settings.configured_host.trim().is_empty() {
            "dynamic"
        } else {
            "configured"
        };
        info!(agent_id = %settings.agent_id, mode, "Initialized conversation agent");
        Self {
            settings,
            resolver: EndpointResolver::new(source),
            backend,
            router: ResponseRouter::new(side_effects),
        }
    }

    pub fn settings(&self) -> &AgentSettings {
        &self.settings
    }

    /// Processes one turn. Always yields a result.
    pub async fn process(&self, request: &TurnRequest) -> TurnResult {
        let session = SessionContext::for_turn(request);
        let span = info_span!(
            "turn",
            turn_id = %request.turn_id,
            session_id = %session.session_id
        );
        async {
            info!(
                text = %request.text,
                device_id = request.device_id.as_deref().unwrap_or(""),
                language = %request.language,
                "New conversation request"
            );
            match self.exchange(request, &session).await {
                Ok(result) => result,
                Err(e) => {
                    error!(error = %e, "Backend call failed");
                    TurnResult::apology(e.apology())
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn exchange(
        &self,
        request: &TurnRequest,
        session: &SessionContext,
    ) -> Result<TurnResult, ClientError> {
        let endpoint = self
            .resolver
            .resolve(&self.settings.configured_host, Some(self.settings.port));
        info!(url = %endpoint.conversation_url(), "Using backend endpoint");

        let body = ConversationRequest::new(request, session, &self.settings.agent_id);
        let payload = self
            .backend
            .send(&endpoint, &body, self.settings.timeout)
            .await?;
        Ok(self.router.route(&payload).await)
    }

    /// Checks that a backend answers its health probe before the agent is used.
    ///
    /// Uses the setup priority (explicit host first) and the default timeout.
    pub async fn validate_backend(&self) -> Result<ValidatedBackend, ClientError> {
        self.validate_backend_with(DEFAULT_TIMEOUT).await
    }

    /// Same as [`Self::validate_backend`], bounded by `timeout`.
    pub async fn validate_backend_with(
        &self,
        timeout: Duration,
    ) -> Result<ValidatedBackend, ClientError> {
        let endpoint = self
            .resolver
            .resolve_for_setup(&self.settings.configured_host, Some(self.settings.port));
        let HealthInfo { version } = self.backend.health(&endpoint, timeout).await?;
        Ok(ValidatedBackend {
            title: format!("Turn relay ({endpoint})"),
            version,
            endpoint,
        })
    }
}
