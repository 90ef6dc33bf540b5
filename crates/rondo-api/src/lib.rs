pub mod handlers;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};

use rondo_services::RingNode;

pub fn router(node: Arc<RingNode>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/register-node", post(handlers::handle_register))
        .route(
            "/relay",
            post(handlers::handle_relay).layer(DefaultBodyLimit::max(16 * 1024 * 1024)),
        )
        .route("/play", post(handlers::handle_play))
        .route("/reconfigure", post(handlers::handle_reconfigure))
        .route("/unregister-node", post(handlers::handle_unregister))
        .route("/status", get(handlers::handle_status))
        .layer(cors)
        .with_state(node)
}

pub async fn serve(node: Arc<RingNode>, port: u16) -> anyhow::Result<()> {
    let app = router(node);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?;
    tracing::info!(port, "ring API listening");
    axum::serve(listener, app).await?;
    Ok(())
}
