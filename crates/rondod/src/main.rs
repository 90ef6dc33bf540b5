//! rondod — rondo ring-relay daemon.
//!
//! One process per ring member. A node with no registrar configured is the
//! ring's origin: it owns the membership registry and coordinates round
//! trips. Every other node registers with the origin at startup — and
//! cannot run without a successor pointer, so a failed registration is
//! fatal.

use std::sync::Arc;

use anyhow::Result;

use rondo_core::config::RondoConfig;
use rondo_services::RingNode;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load config
    if let Err(e) = RondoConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let config = RondoConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "failed to load config, using defaults");
        RondoConfig::default()
    });

    let node = Arc::new(RingNode::new(&config));
    tracing::info!(
        name = config.node.name,
        uuid = %node.identity().uuid,
        port = config.node.port,
        "rondod starting"
    );

    if config.registrar.is_configured() {
        if let Err(e) = node.register_with_origin().await {
            tracing::error!(
                registrar = %format!("{}:{}", config.registrar.host, config.registrar.port),
                error = %e,
                "startup registration failed, shutting down"
            );
            std::process::exit(1);
        }
    } else {
        tracing::info!("no registrar configured — running as ring origin");
    }

    let serve_node = node.clone();
    tokio::select! {
        result = rondo_api::serve(serve_node, config.node.port) => result?,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
            node.leave_ring().await;
        }
    }

    Ok(())
}
