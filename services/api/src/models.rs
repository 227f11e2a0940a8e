//! API Models
//!
//! Request and response bodies of the host-facing HTTP surface, annotated for
//! OpenAPI generation with `utoipa`.

use serde::{Deserialize, Serialize};
use turn_relay_core::{TurnRequest, TurnResult};
use utoipa::ToSchema;
use uuid::Uuid;

/// One voice utterance handed over by the host after speech-to-text.
#[derive(Deserialize, ToSchema, Debug, Clone)]
pub struct TurnPayload {
    #[schema(example = "Turn the lights purple")]
    pub text: String,
    /// The host's conversation id. Generated when absent.
    pub conversation_id: Option<String>,
    pub device_id: Option<String>,
    #[schema(example = "en")]
    pub language: String,
    pub user_id: Option<String>,
}

impl TurnPayload {
    /// Converts the payload into a core request stamped with the receipt time.
    pub fn into_request(self) -> TurnRequest {
        let conversation_id = self
            .conversation_id
            .filter(|id| !id.trim().is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        TurnRequest {
            text: self.text,
            turn_id: conversation_id,
            device_id: self.device_id,
            language: self.language,
            user_id: self.user_id,
            timestamp_utc: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// What the host should say, and whether it should keep listening.
#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct TurnResponse {
    pub speech: String,
    pub continue_conversation: bool,
    pub conversation_id: String,
}

impl TurnResponse {
    pub fn new(result: TurnResult, conversation_id: String) -> Self {
        Self {
            speech: result.spoken_text,
            continue_conversation: result.continue_conversation,
            conversation_id,
        }
    }
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct AgentInfo {
    #[schema(example = "Turn relay (Dynamic IP:4567)")]
    pub name: String,
    #[schema(example = "turn_relay_default")]
    pub unique_id: String,
    pub supported_languages: Vec<String>,
}

#[derive(Serialize, Deserialize, ToSchema, Debug, Clone, PartialEq)]
pub struct HostState {
    #[schema(example = "input_text.backend_host")]
    pub key: String,
    #[schema(example = "192.168.0.42")]
    pub value: String,
}

#[derive(Deserialize, ToSchema, Debug)]
pub struct SetHostStatePayload {
    pub value: String,
}

#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(conversation_id: Option<&str>) -> TurnPayload {
        TurnPayload {
            text: "hello".into(),
            conversation_id: conversation_id.map(str::to_string),
            device_id: Some("satellite".into()),
            language: "en".into(),
            user_id: None,
        }
    }

    #[test]
    fn test_conversation_id_is_kept() {
        let request = payload(Some("01JAB")).into_request();
        assert_eq!(request.turn_id, "01JAB");
        assert_eq!(request.device_id.as_deref(), Some("satellite"));
    }

    #[test]
    fn test_missing_conversation_id_is_generated() {
        let first = payload(None).into_request();
        let second = payload(Some("  ")).into_request();
        assert!(Uuid::parse_str(&first.turn_id).is_ok());
        assert!(Uuid::parse_str(&second.turn_id).is_ok());
        assert_ne!(first.turn_id, second.turn_id);
    }

    #[test]
    fn test_turn_payload_deserialization() {
        let payload: TurnPayload =
            serde_json::from_str(r#"{"text":"hi","language":"en-GB"}"#).unwrap();
        assert_eq!(payload.text, "hi");
        assert_eq!(payload.conversation_id, None);
        assert_eq!(payload.language, "en-GB");
    }

    #[test]
    fn test_turn_response_serialization() {
        let response = TurnResponse::new(TurnResult::build("Hello there", false), "c1".into());
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"speech": "Hello there", "continue_conversation": false, "conversation_id": "c1"})
        );
    }
}
