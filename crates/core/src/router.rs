//! Response Routing
//!
//! A successful backend payload is classified into exactly one [`Handling`]
//! variant, and each variant runs its side-effect protocol to completion
//! before the turn result is returned. Every variant is terminal for the turn.

use crate::{
    protocol::{ResponsePayload, ResponseType},
    side_effects::SideEffectPort,
    turn::TurnResult,
};
use serde_json::Value;
use std::{sync::Arc, time::Duration};
use tracing::{error, info, warn};

/// Speech used for the immediate variant when the backend sends none.
pub const DEFAULT_IMMEDIATE_SPEECH: &str = "On it!";

/// Speech used for the error variant when the backend sends none.
pub const DEFAULT_ERROR_SPEECH: &str = "I encountered an error.";

/// What to do with a classified payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Handling {
    /// Speak the extracted response; re-arm first if the backend wants more.
    Normal {
        speech: String,
        continue_conversation: bool,
        delay: Duration,
    },
    /// Speak now out of band, re-arm, and keep the session open while the
    /// backend finishes its tools.
    ImmediateSpeech { speech: String, delay: Duration },
    /// Speak the backend's error text and end the session.
    Error {
        speech: String,
        details: Option<Value>,
    },
}

impl Handling {
    pub fn classify(payload: &ResponsePayload) -> Self {
        match payload.response_type() {
            ResponseType::Normal => Self::Normal {
                speech: payload.spoken_text(),
                continue_conversation: payload.continues(),
                delay: payload.continue_delay(),
            },
            ResponseType::ImmediateSpeechWithBackgroundTools => Self::ImmediateSpeech {
                speech: payload
                    .speech_text
                    .clone()
                    .unwrap_or_else(|| DEFAULT_IMMEDIATE_SPEECH.to_string()),
                delay: payload.continue_delay(),
            },
            ResponseType::Error => Self::Error {
                speech: payload
                    .speech_text
                    .clone()
                    .unwrap_or_else(|| DEFAULT_ERROR_SPEECH.to_string()),
                details: payload.error_details.clone(),
            },
        }
    }
}

/// Drives the side effects for a classified payload.
#[derive(Clone)]
pub struct ResponseRouter {
    port: Arc<dyn SideEffectPort>,
}

impl ResponseRouter {
    pub fn new(port: Arc<dyn SideEffectPort>) -> Self {
        Self { port }
    }

    /// Classifies the payload and runs its handling to completion.
    pub async fn route(&self, payload: &ResponsePayload) -> TurnResult {
        let handling = Handling::classify(payload);
        info!(response_type = payload.response_type().as_str(), "Processing response");
        self.execute(handling).await
    }

    pub async fn execute(&self, handling: Handling) -> TurnResult {
        match handling {
            Handling::Normal {
                speech,
                continue_conversation,
                delay,
            } => {
                let result = TurnResult::build(speech, continue_conversation);
                if continue_conversation {
                    self.rearm(delay).await;
                }
                info!(
                    speech = %preview(&result.spoken_text),
                    continue_conversation,
                    "Normal response"
                );
                result
            }
            Handling::ImmediateSpeech { speech, delay } => {
                info!(speech = %preview(&speech), "Firing immediate speech for background tools");
                match self.port.speak(&speech, false).await {
                    Ok(()) => info!("Immediate speech dispatched"),
                    Err(e) => error!(error = %e, "Immediate speech failed"),
                }
                self.rearm(delay).await;
                TurnResult::already_spoken()
            }
            Handling::Error { speech, details } => {
                error!(?details, "Backend reported an error");
                TurnResult::build(speech, false)
            }
        }
    }

    /// Waits out the trailing audio, then signals that listening resumed.
    ///
    /// The sleep is a timer, not a blocked thread, so other turns keep running.
    async fn rearm(&self, delay: Duration) {
        info!(delay_secs = delay.as_secs_f64(), "Delaying before re-enabling conversation");
        tokio::time::sleep(delay).await;
        match self.port.play_alert().await {
            Ok(()) => info!("Listening resume sound triggered"),
            Err(e) => warn!(error = %e, "Could not play listening resume sound"),
        }
    }
}

fn preview(text: &str) -> String {
    text.chars().take(50).collect()
}
