//! Host Service Side Effects
//!
//! Backs the core `SideEffectPort` with the host platform's service API:
//! speech goes through the cloud TTS service and the alert is a media file
//! played on the same device.

use crate::config::HostServiceConfig;
use async_trait::async_trait;
use reqwest::{Client, Request};
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, warn};
use turn_relay_core::{SideEffectError, SideEffectPort};

const SERVICE_TIMEOUT: Duration = Duration::from_secs(10);

pub struct HostServicePort {
    client: Client,
    config: HostServiceConfig,
}

impl HostServicePort {
    pub fn new(config: HostServiceConfig) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(SERVICE_TIMEOUT).build()?;
        Ok(Self { client, config })
    }

    fn service_request(
        &self,
        what: &'static str,
        domain: &str,
        service: &str,
        data: &Value,
    ) -> Result<Request, SideEffectError> {
        let url = format!("{}/api/services/{domain}/{service}", self.config.api_url);
        self.client
            .post(url)
            .bearer_auth(&self.config.token)
            .json(data)
            .build()
            .map_err(|e| SideEffectError::Dispatch(what, e.to_string()))
    }

    /// Calls a host service. Non-blocking calls are spawned and only logged.
    async fn call_service(
        &self,
        what: &'static str,
        domain: &str,
        service: &str,
        data: Value,
        blocking: bool,
    ) -> Result<(), SideEffectError> {
        let request = self.service_request(what, domain, service, &data)?;
        debug!(what, domain, service, blocking, "Calling host service");
        if blocking {
            return execute(&self.client, request, what).await;
        }
        let client = self.client.clone();
        tokio::spawn(async move {
            if let Err(e) = execute(&client, request, what).await {
                warn!(error = %e, "Host service call failed");
            }
        });
        Ok(())
    }
}

async fn execute(client: &Client, request: Request, what: &'static str) -> Result<(), SideEffectError> {
    let response = client
        .execute(request)
        .await
        .map_err(|e| SideEffectError::Dispatch(what, e.to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(SideEffectError::Rejected(what, status.as_u16()));
    }
    Ok(())
}

#[async_trait]
impl SideEffectPort for HostServicePort {
    async fn speak(&self, text: &str, blocking: bool) -> Result<(), SideEffectError> {
        let data = json!({
            "entity_id": self.config.media_player_entity,
            "message": text,
            "language": self.config.tts_language,
        });
        self.call_service("speech", "tts", "cloud_say", data, blocking)
            .await
    }

    async fn play_alert(&self) -> Result<(), SideEffectError> {
        let data = json!({
            "entity_id": self.config.media_player_entity,
            "media_content_id": self.config.alert_media_path,
            "media_content_type": "audio/wav",
        });
        self.call_service("alert", "media_player", "play_media", data, false)
            .await
    }
}
