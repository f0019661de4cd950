use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::controllers::{health, intent::IntentController, proxy::ProxyController};
use crate::infrastructure::config::Config;

/// Build the application router. Split out from the server start so tests
/// can drive it directly.
pub fn build_router(
    proxy_controller: Arc<ProxyController>,
    intent_controller: Arc<IntentController>,
) -> Router {
    // Proxy routes authenticate via query token; playback devices cannot
    // send headers, so CORS stays permissive here.
    let proxy_routes = Router::new()
        .route("/api/tts_proxy/edge", get(ProxyController::stream))
        .route(
            "/api/tts_proxy/edge/:filename",
            get(ProxyController::stream_named),
        )
        .with_state(proxy_controller)
        .layer(CorsLayer::permissive());

    let intent_routes = Router::new()
        .route(
            "/api/intent/convert_text_to_sound",
            post(IntentController::convert_text_to_sound),
        )
        .route(
            "/api/intent/convert_text_to_file",
            post(IntentController::convert_text_to_file),
        )
        .with_state(intent_controller);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .merge(proxy_routes)
        .merge(intent_routes)
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server with all routes configured
pub async fn start_http_server(
    config: Arc<Config>,
    proxy_controller: Arc<ProxyController>,
    intent_controller: Arc<IntentController>,
) -> Result<(), Box<dyn std::error::Error>> {
    let app = build_router(proxy_controller, intent_controller);

    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app).await?;

    Ok(())
}
