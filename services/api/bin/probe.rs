//! One-shot setup check: can the relay reach a backend?
//!
//! Resolves the endpoint the way a fresh setup does (explicit host first,
//! then the published host, then the production fallback) and calls the
//! backend's health probe. Exits non-zero when the backend cannot be reached.

use anyhow::Context;
use clap::Parser;
use std::sync::Arc;
use turn_relay_core::{
    AgentSettings, ConversationAgent, DynamicEndpointSource, HttpBackendClient,
    endpoint::{DEFAULT_PORT, NoDynamicHost},
    side_effects::LogOnlySideEffects,
};

#[derive(Parser, Debug)]
#[command(version, about = "Validate the connection to a conversation backend")]
struct Args {
    /// Backend host. Leave empty to use the published host or the fallback.
    #[arg(long, default_value = "")]
    host: String,

    #[arg(long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Host value currently published by the backend, if known.
    #[arg(long)]
    published_host: Option<String>,
}

/// A dynamic source fixed to whatever was passed on the command line.
struct PublishedHost(String);

impl DynamicEndpointSource for PublishedHost {
    fn read_host(&self) -> anyhow::Result<Option<String>> {
        Ok(Some(self.0.clone()))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();
    let mut settings = AgentSettings::for_entry("probe");
    settings.configured_host = args.host;
    settings.port = args.port;

    let source: Arc<dyn DynamicEndpointSource> = match args.published_host {
        Some(host) => Arc::new(PublishedHost(host)),
        None => Arc::new(NoDynamicHost),
    };
    let agent = ConversationAgent::new(
        settings,
        source,
        Arc::new(HttpBackendClient::new()?),
        Arc::new(LogOnlySideEffects),
    );

    let validated = agent
        .validate_backend()
        .await
        .context("Cannot connect to the conversation backend")?;
    println!("{} (version {})", validated.title, validated.version);
    Ok(())
}
