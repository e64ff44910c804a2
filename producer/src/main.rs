//! Wikimedia change stream → Kafka bridge.
//!
//! Connects to the Wikimedia recent-changes stream and forwards every
//! change event, verbatim, into the `wikimedia.recentchange` topic of a
//! local broker. Runs for ten minutes, or until interrupted, then drains
//! outstanding deliveries and exits.
//!
//! There are no flags; the deployment constants live in
//! [`BridgeConfig::default`]. Log verbosity follows `RUST_LOG`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use wikibridge_runtime::{BridgeConfig, Supervisor};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,wikibridge=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = BridgeConfig::default();
    tracing::info!(
        brokers = %config.brokers,
        topic = %config.topic,
        source = %config.source_url,
        "Starting wikibridge producer"
    );

    Supervisor::new(config).run().await?;

    tracing::info!("Clean shutdown complete");
    Ok(())
}
