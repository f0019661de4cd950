//! Router-level tests: the real router and controllers over a stubbed
//! synthesis client.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use futures::{stream, StreamExt};
use http_body_util::BodyExt;
use pretty_assertions::assert_eq;
use tower::util::ServiceExt;

use edge_tts_gateway::controllers::{intent::IntentController, proxy::ProxyController};
use edge_tts_gateway::domain::tts::{SynthesisOptions, TtsService};
use edge_tts_gateway::infrastructure::auth::AccessTokens;
use edge_tts_gateway::infrastructure::config::{Config, Environment, LogFormat};
use edge_tts_gateway::infrastructure::http::build_router;
use edge_tts_gateway::infrastructure::synthesis::{
    AudioChunk, ChunkStream, SynthesisClient, SynthesisError,
};

struct StubClient {
    script: Vec<AudioChunk>,
}

#[async_trait]
impl SynthesisClient for StubClient {
    async fn synthesize(
        &self,
        _text: &str,
        _options: &SynthesisOptions,
    ) -> Result<ChunkStream, SynthesisError> {
        let items: Vec<Result<AudioChunk, SynthesisError>> =
            self.script.iter().cloned().map(Ok).collect();
        Ok(stream::iter(items).boxed())
    }
}

struct TestApp {
    router: Router,
    tokens: Arc<AccessTokens>,
}

fn test_app(script: Vec<AudioChunk>) -> TestApp {
    let config = Arc::new(Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        public_base_url: "http://gateway.test".to_string(),
        default_language: "zh-CN".to_string(),
        access_tokens: vec!["configured-token".to_string()],
        environment: Environment::Development,
        log_format: LogFormat::Pretty,
    });
    let tokens = Arc::new(AccessTokens::new(&config.access_tokens));
    let client = Arc::new(StubClient { script });
    let tts_service = Arc::new(TtsService::new(client, config.default_language.clone()));

    let proxy = Arc::new(ProxyController::new(tts_service, tokens.clone()));
    let intent = Arc::new(IntentController::new(config, tokens.clone()));

    TestApp {
        router: build_router(proxy, intent),
        tokens,
    }
}

fn audio_script() -> Vec<AudioChunk> {
    vec![
        AudioChunk::Audio(b"ID3fake-mp3-bytes".to_vec()),
        AudioChunk::Metadata("word boundary at 0ms".to_string()),
    ]
}

async fn get(router: &Router, uri: &str) -> (StatusCode, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

async fn post_json(router: &Router, uri: &str, json: serde_json::Value) -> (StatusCode, Vec<u8>) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let body = response.into_body().collect().await.unwrap().to_bytes();
    (status, body.to_vec())
}

#[tokio::test]
async fn health_endpoints_respond() {
    let app = test_app(audio_script());
    let (status, _) = get(&app.router, "/health").await;
    assert_eq!(status, StatusCode::OK);
    let (status, body) = get(&app.router, "/health/ready").await;
    assert_eq!(status, StatusCode::OK);
    let ready: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(ready["status"], "ready");
}

#[tokio::test]
async fn proxy_rejects_missing_or_invalid_token() {
    let app = test_app(audio_script());
    let (status, _) = get(&app.router, "/api/tts_proxy/edge?message=hello").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = get(
        &app.router,
        "/api/tts_proxy/edge?token=wrong&message=hello",
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn proxy_rejects_empty_message() {
    let app = test_app(audio_script());
    let (status, _) = get(&app.router, "/api/tts_proxy/edge?token=configured-token").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(
        &app.router,
        "/api/tts_proxy/edge?token=configured-token&message=%20%20",
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn proxy_streams_audio_for_valid_request() {
    let app = test_app(audio_script());
    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/api/tts_proxy/edge?token=configured-token&message=Hello%20there.")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "audio/mpeg"
    );
    let body = response.into_body().collect().await.unwrap().to_bytes();
    assert_eq!(body.as_ref(), b"ID3fake-mp3-bytes");
}

#[tokio::test]
async fn proxy_accepts_the_filename_route() {
    let app = test_app(audio_script());
    let (status, body) = get(
        &app.router,
        "/api/tts_proxy/edge/announcement.mp3?token=configured-token&message=Hello%20there.",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(!body.is_empty());
}

#[tokio::test]
async fn proxy_maps_no_audio_to_500() {
    let app = test_app(vec![AudioChunk::Metadata("nothing to hear".to_string())]);
    let (status, _) = get(
        &app.router,
        "/api/tts_proxy/edge?token=configured-token&message=Hello%20there.",
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn intent_returns_a_tokenized_playback_url() {
    let app = test_app(audio_script());
    let (status, body) = post_json(
        &app.router,
        "/api/intent/convert_text_to_sound",
        serde_json::json!({ "message": "Good\nmorning \u{1F600}", "rate": 10, "volume": -5 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(response["response_type"], "action_done");

    let url = response["speech_slots"]["tts_url"].as_str().unwrap();
    assert!(url.starts_with("http://gateway.test/api/tts_proxy/edge?token="));
    assert!(url.contains(app.tokens.ephemeral()));
    assert!(url.contains("rate=%2B10%25"));
    assert!(url.contains("volume=-5%25"));
    assert!(url.contains("message=Good%20morning"));
    assert!(response["speech_slots"]["notice"]
        .as_str()
        .unwrap()
        .contains("must remain intact"));
}

#[tokio::test]
async fn intent_file_variant_requires_and_uses_filename() {
    let app = test_app(audio_script());
    let (status, _) = post_json(
        &app.router,
        "/api/intent/convert_text_to_file",
        serde_json::json!({ "message": "Hello" }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = post_json(
        &app.router,
        "/api/intent/convert_text_to_file",
        serde_json::json!({ "message": "Hello", "filename": "greeting.mp3" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let response: serde_json::Value = serde_json::from_slice(&body).unwrap();
    let url = response["speech_slots"]["tts_url"].as_str().unwrap();
    assert!(url.contains("/api/tts_proxy/edge/greeting.mp3?"));
}

#[tokio::test]
async fn intent_rejects_out_of_range_prosody() {
    let app = test_app(audio_script());
    let (status, _) = post_json(
        &app.router,
        "/api/intent/convert_text_to_sound",
        serde_json::json!({ "message": "Hello", "rate": 250 }),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
