//! Backend Endpoint Resolution
//!
//! The backend's address can move at runtime (it publishes its own IP into a
//! shared host state store), so the endpoint is recomputed on every turn and
//! never cached. Resolution is a total function: it always yields an endpoint.

use std::fmt;
use tracing::{debug, info, warn};

/// Port used when the configuration does not provide one.
pub const DEFAULT_PORT: u16 = 4567;

/// Last-resort production address of the backend.
pub const FALLBACK_HOST: &str = "192.168.0.99";

/// Path of the conversation endpoint on the backend.
pub const CONVERSATION_PATH: &str = "/api/v1/conversation";

/// Path of the backend health probe.
pub const HEALTH_PATH: &str = "/health";

/// Host state values meaning "nothing has been published".
const UNSET_MARKERS: &[&str] = &["", "unknown", "unavailable"];

/// A resolved backend address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    pub fn conversation_url(&self) -> String {
        format!("{}{}", self.base_url(), CONVERSATION_PATH)
    }

    pub fn health_url(&self) -> String {
        format!("{}{}", self.base_url(), HEALTH_PATH)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Where the backend publishes its current host.
///
/// Implementations read external state fresh on every call. A read failure is
/// reported as an error and treated by the resolver as "no dynamic host".
#[cfg_attr(test, mockall::automock)]
pub trait DynamicEndpointSource: Send + Sync {
    /// Returns the raw published value, if any.
    fn read_host(&self) -> anyhow::Result<Option<String>>;
}

/// A source that never has a published host.
pub struct NoDynamicHost;

impl DynamicEndpointSource for NoDynamicHost {
    fn read_host(&self) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

/// Returns the trimmed host if the value is a usable, published host.
fn usable_host(raw: &str) -> Option<&str> {
    let host = raw.trim();
    if UNSET_MARKERS.contains(&host) {
        None
    } else {
        Some(host)
    }
}

/// Picks the backend address for a request.
///
/// Per-turn priority, first valid wins:
/// 1. the dynamically published host,
/// 2. the statically configured host,
/// 3. [`FALLBACK_HOST`].
///
/// The port always comes from configuration.
pub struct EndpointResolver<S: ?Sized = dyn DynamicEndpointSource> {
    source: std::sync::Arc<S>,
}

impl<S: DynamicEndpointSource + ?Sized> EndpointResolver<S> {
    pub fn new(source: std::sync::Arc<S>) -> Self {
        Self { source }
    }

    /// Reads the dynamic source, logging and swallowing read failures.
    fn dynamic_host(&self) -> Option<String> {
        match self.source.read_host() {
            Ok(Some(raw)) => match usable_host(&raw) {
                Some(host) => Some(host.to_string()),
                None => {
                    info!(value = %raw, "Dynamic host not available or invalid");
                    None
                }
            },
            Ok(None) => {
                info!("Dynamic host not published");
                None
            }
            Err(e) => {
                warn!(error = %e, "Could not read dynamic host");
                None
            }
        }
    }

    /// Resolves the endpoint for one turn.
    pub fn resolve(&self, configured_host: &str, configured_port: Option<u16>) -> Endpoint {
        let port = configured_port.unwrap_or(DEFAULT_PORT);

        if let Some(host) = self.dynamic_host() {
            debug!(%host, "Using dynamic host");
            return Endpoint::new(host, port);
        }

        let configured = configured_host.trim();
        if !configured.is_empty() {
            debug!(host = %configured, "Using configured host");
            return Endpoint::new(configured, port);
        }

        info!(host = FALLBACK_HOST, port, "No host configured and no dynamic host available, using fallback");
        Endpoint::new(FALLBACK_HOST, port)
    }

    /// Resolves the endpoint used to validate a setup.
    ///
    /// During setup an explicitly entered host wins over the published one,
    /// so the operator can point the relay at a specific machine.
    pub fn resolve_for_setup(&self, configured_host: &str, configured_port: Option<u16>) -> Endpoint {
        let port = configured_port.unwrap_or(DEFAULT_PORT);
        let configured = configured_host.trim();
        if !configured.is_empty() {
            info!(host = %configured, "Using explicit host from config");
            return Endpoint::new(configured, port);
        }
        let host = self
            .dynamic_host()
            .unwrap_or_else(|| FALLBACK_HOST.to_string());
        Endpoint::new(host, port)
    }
}
