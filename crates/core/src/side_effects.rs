//! Side-Effect Port
//!
//! Speech playback and the listening-resumed alert are host services. The
//! router only sees this narrow capability, so tests can substitute a recorder
//! and the service can back it with whatever the host platform exposes.

use async_trait::async_trait;

/// Failure to hand a side effect to the host. Never fatal to a turn.
#[derive(Debug, thiserror::Error)]
pub enum SideEffectError {
    #[error("Could not dispatch {0}: {1}")]
    Dispatch(&'static str, String),
    #[error("Host rejected {0} with status {1}")]
    Rejected(&'static str, u16),
}

/// Host capabilities the router drives.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SideEffectPort: Send + Sync {
    /// Speaks `text` on the voice device.
    ///
    /// With `blocking == false` the call returns once the request is handed
    /// off, without waiting for playback.
    async fn speak(&self, text: &str, blocking: bool) -> Result<(), SideEffectError>;

    /// Plays the "listening resumed" alert on the voice device.
    async fn play_alert(&self) -> Result<(), SideEffectError>;
}

/// A port that only logs. Used when no host service API is configured.
pub struct LogOnlySideEffects;

#[async_trait]
impl SideEffectPort for LogOnlySideEffects {
    async fn speak(&self, text: &str, blocking: bool) -> Result<(), SideEffectError> {
        tracing::info!(%text, blocking, "speak (no host service configured)");
        Ok(())
    }

    async fn play_alert(&self) -> Result<(), SideEffectError> {
        tracing::info!("play_alert (no host service configured)");
        Ok(())
    }
}
