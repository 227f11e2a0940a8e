//! Wire format between the relay and the conversation backend.

use crate::turn::{SessionContext, TurnRequest};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// Delay before re-arming when the payload does not say otherwise.
pub const DEFAULT_CONTINUE_DELAY: Duration = Duration::from_secs(3);

/// Longest re-arm delay honoured; larger values are clamped to it.
pub const MAX_CONTINUE_DELAY: Duration = Duration::from_secs(120);

const NESTED_FALLBACK: &str = "I had some trouble with that response.";
const EMPTY_FALLBACK: &str = "I didn't understand that.";
const CUSTOM_DATA_LIMIT: usize = 100;

// --- Outbound ---

/// Body of `POST /api/v1/conversation`.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ConversationRequest {
    pub message: String,
    pub context: RequestContext,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RequestContext {
    pub session_id: String,
    pub conversation_id: String,
    pub device_id: Option<String>,
    pub language: String,
    pub voice_interaction: bool,
    pub timestamp: String,
    pub ha_context: HostContext,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct HostContext {
    pub agent_id: String,
    pub user_id: Option<String>,
}

impl ConversationRequest {
    pub fn new(request: &TurnRequest, session: &SessionContext, agent_id: &str) -> Self {
        Self {
            message: request.text.clone(),
            context: RequestContext {
                session_id: session.session_id.clone(),
                conversation_id: session.turn_id.clone(),
                device_id: session.device_id.clone(),
                language: session.language.clone(),
                voice_interaction: session.voice_interaction,
                timestamp: request.timestamp_utc.clone(),
                ha_context: HostContext {
                    agent_id: agent_id.to_string(),
                    user_id: session.user_id.clone(),
                },
            },
        }
    }
}

// --- Inbound ---

/// The raw decoded response body.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct BackendEnvelope {
    #[serde(default)]
    pub success: bool,
    pub error: Option<String>,
    pub data: Option<ResponsePayload>,
}

/// The `data` object of a successful response.
#[derive(Deserialize, Debug, Clone, Default, PartialEq)]
pub struct ResponsePayload {
    pub response_type: Option<String>,
    pub response: Option<SpeechResponse>,
    pub speech_text: Option<String>,
    pub continue_conversation: Option<bool>,
    /// Kept loose: the backend has been seen sending strings and negatives here.
    pub continue_delay: Option<Value>,
    /// Only logged, so any JSON shape is accepted.
    pub error_details: Option<Value>,
}

/// Body of `GET /health`.
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct HealthInfo {
    #[serde(default = "unknown_version")]
    pub version: String,
}

fn unknown_version() -> String {
    "unknown".to_string()
}

/// The closed set of handling variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Normal,
    ImmediateSpeechWithBackgroundTools,
    Error,
}

impl ResponseType {
    /// Classifies the wire tag. Absent and unrecognised tags are `Normal`.
    pub fn classify(tag: Option<&str>) -> Self {
        match tag {
            Some(
                "immediate_speech_with_background_tools" | "immediateSpeechWithBackgroundTools",
            ) => Self::ImmediateSpeechWithBackgroundTools,
            Some("error") => Self::Error,
            _ => Self::Normal,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::ImmediateSpeechWithBackgroundTools => "immediate_speech_with_background_tools",
            Self::Error => "error",
        }
    }
}

impl ResponsePayload {
    pub fn continues(&self) -> bool {
        self.continue_conversation.unwrap_or(false)
    }

    pub fn response_type(&self) -> ResponseType {
        ResponseType::classify(self.response_type.as_deref())
    }

    /// The re-arm delay, clamped to something sleepable.
    ///
    /// Non-numeric and non-finite values use the default; negatives clamp to
    /// zero and anything above [`MAX_CONTINUE_DELAY`] clamps to it.
    pub fn continue_delay(&self) -> Duration {
        let Some(secs) = self.continue_delay.as_ref().and_then(Value::as_f64) else {
            return DEFAULT_CONTINUE_DELAY;
        };
        if !secs.is_finite() {
            return DEFAULT_CONTINUE_DELAY;
        }
        let secs = secs.clamp(0.0, MAX_CONTINUE_DELAY.as_secs_f64());
        Duration::try_from_secs_f64(secs).unwrap_or(DEFAULT_CONTINUE_DELAY)
    }

    /// Extracts the text to speak from the `response` field.
    pub fn spoken_text(&self) -> String {
        match &self.response {
            Some(response) => response.speech(),
            None => EMPTY_FALLBACK.to_string(),
        }
    }
}

/// The `response` field, which arrives in several shapes.
#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum SpeechResponse {
    Text(String),
    Nested(Map<String, Value>),
    Other(Value),
}

impl SpeechResponse {
    /// Walks the known shapes in priority order and always returns some text.
    ///
    /// Structured responses try `speech.plain.speech`, then `response`, then
    /// `data.custom_data.claude_response` (truncated). Blank results are not
    /// replaced here; [`crate::turn::TurnResult::build`] does that.
    pub fn speech(&self) -> String {
        match self {
            Self::Text(text) if !text.is_empty() => text.clone(),
            Self::Text(_) => EMPTY_FALLBACK.to_string(),
            Self::Nested(map) => nested_speech(map),
            Self::Other(value) if is_falsy(value) => EMPTY_FALLBACK.to_string(),
            Self::Other(value) => value.to_string(),
        }
    }
}

fn nested_speech(map: &Map<String, Value>) -> String {
    let plain = map
        .get("speech")
        .and_then(|s| s.get("plain"))
        .and_then(|p| p.get("speech"))
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty());
    if let Some(text) = plain {
        return text.to_string();
    }

    if let Some(text) = map
        .get("response")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        return text.to_string();
    }

    let custom = map
        .get("data")
        .and_then(|d| d.get("custom_data"))
        .and_then(|c| c.get("claude_response"))
        .map(value_text)
        .unwrap_or_default();
    let custom: String = custom.chars().take(CUSTOM_DATA_LIMIT).collect();
    if !custom.is_empty() {
        return custom;
    }

    NESTED_FALLBACK.to_string()
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
    }
}
