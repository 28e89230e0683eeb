//! shinwa-agent - HTTP Server Entry Point
//!
//! Resolves configuration and starts the HTTP server.

use shinwa_agent::{api, config, Settings};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = config::get_settings()?;

    init_tracing(&settings);

    info!("Starting Shinwa Agent...");
    info!(
        "Loaded configuration: host={} port={} mode={}",
        settings.api_host, settings.api_port, settings.proactive_mode
    );

    api::serve(settings).await
}

/// Initialize logging. `RUST_LOG` takes precedence over the configured level.
fn init_tracing(settings: &Settings) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(settings.log_level.clone()));

    if settings.structured_logging {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}
