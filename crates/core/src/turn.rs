//! Per-turn data carried between the host and the backend.
//!
//! Nothing in here outlives a single request/response cycle: a `TurnRequest`
//! is built once per inbound utterance, a `SessionContext` is derived from it
//! for the outbound call, and a `TurnResult` is handed back to the host.

/// Tag prefixed onto the host's conversation id to form the backend session id.
pub const SESSION_PREFIX: &str = "voice_";

/// Spoken when a result would otherwise carry no speech at all.
pub const SAFETY_SPEECH: &str = "Sorry, I'm having trouble speaking right now.";

/// Languages the relay advertises to the host.
pub const SUPPORTED_LANGUAGES: &[&str] = &["en", "en-US", "en-GB"];

/// One inbound voice utterance, as handed over by the host platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnRequest {
    pub text: String,
    /// The host's turn-continuity identifier (its conversation id).
    pub turn_id: String,
    pub device_id: Option<String>,
    pub language: String,
    pub user_id: Option<String>,
    /// ISO 8601 UTC timestamp stamped when the turn was received.
    pub timestamp_utc: String,
}

impl TurnRequest {
    /// Builds a request stamped with the current UTC time.
    pub fn received_now(
        text: impl Into<String>,
        turn_id: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            text: text.into(),
            turn_id: turn_id.into(),
            device_id: None,
            language: language.into(),
            user_id: None,
            timestamp_utc: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_device(mut self, device_id: impl Into<String>) -> Self {
        self.device_id = Some(device_id.into());
        self
    }

    pub fn with_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }
}

/// Context sent alongside the message for the duration of one backend call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub session_id: String,
    pub turn_id: String,
    pub device_id: Option<String>,
    pub language: String,
    pub user_id: Option<String>,
    pub voice_interaction: bool,
}

impl SessionContext {
    pub fn for_turn(request: &TurnRequest) -> Self {
        Self {
            session_id: derive_session_id(&request.turn_id),
            turn_id: request.turn_id.clone(),
            device_id: request.device_id.clone(),
            language: request.language.clone(),
            user_id: request.user_id.clone(),
            voice_interaction: true,
        }
    }
}

/// Derives the backend session id from the host's conversation id.
///
/// The host already tracks multi-turn continuity, so the relay stays stateless
/// and simply namespaces the host's identifier.
pub fn derive_session_id(host_conversation_id: &str) -> String {
    format!("{SESSION_PREFIX}{host_conversation_id}")
}

/// The outward result of a turn.
///
/// `spoken_text` is never empty. It may be a single space when the speech was
/// already dispatched out of band (see [`TurnResult::already_spoken`]).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnResult {
    pub spoken_text: String,
    pub continue_conversation: bool,
}

impl TurnResult {
    /// Builds a result, substituting [`SAFETY_SPEECH`] for blank text.
    pub fn build(spoken_text: impl Into<String>, continue_conversation: bool) -> Self {
        let spoken_text = spoken_text.into();
        let trimmed = spoken_text.trim();
        let spoken_text = if trimmed.is_empty() {
            SAFETY_SPEECH.to_string()
        } else {
            trimmed.to_string()
        };
        Self {
            spoken_text,
            continue_conversation,
        }
    }

    /// A result whose speech was already fired by a side effect.
    ///
    /// Carries a single space so the host has nothing to say twice, and keeps
    /// the session open for the asynchronous follow-up.
    pub fn already_spoken() -> Self {
        Self {
            spoken_text: " ".to_string(),
            continue_conversation: true,
        }
    }

    /// Ends the session with a fixed apology.
    pub fn apology(message: &str) -> Self {
        Self::build(message, false)
    }
}
