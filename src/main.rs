use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use edge_tts_gateway::controllers::{intent::IntentController, proxy::ProxyController};
use edge_tts_gateway::domain::tts::TtsService;
use edge_tts_gateway::infrastructure::auth::AccessTokens;
use edge_tts_gateway::infrastructure::config::{Config, LogFormat};
use edge_tts_gateway::infrastructure::http::start_http_server;
use edge_tts_gateway::infrastructure::synthesis::EdgeSynthesisClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting Edge TTS gateway on {}:{}",
        config.host,
        config.port
    );

    let config = Arc::new(config);

    // Access tokens live for the whole process; the ephemeral one signs
    // the URLs our own intent responses hand out.
    let access_tokens = Arc::new(AccessTokens::new(&config.access_tokens));
    tracing::info!(
        configured_tokens = config.access_tokens.len(),
        "Access token set created"
    );

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Synthesis client boundary
    let synthesis_client = Arc::new(EdgeSynthesisClient::new());

    // 2. Services
    let tts_service = Arc::new(TtsService::new(
        synthesis_client,
        config.default_language.clone(),
    ));
    tracing::info!(
        default_language = %config.default_language,
        "TTS service ready"
    );

    // 3. Controllers
    let proxy_controller = Arc::new(ProxyController::new(
        tts_service.clone(),
        access_tokens.clone(),
    ));
    let intent_controller = Arc::new(IntentController::new(
        config.clone(),
        access_tokens.clone(),
    ));

    // Start HTTP server with all routes
    start_http_server(config, proxy_controller, intent_controller).await?;

    Ok(())
}

fn init_logging(config: &Config) {
    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "edge_tts_gateway=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "edge_tts_gateway=debug,tower_http=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}
