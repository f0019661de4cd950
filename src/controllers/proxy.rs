use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
};
use futures::{stream, StreamExt};
use serde::Deserialize;
use std::sync::Arc;

use crate::{
    domain::tts::{CallOptions, TtsService},
    error::{AppError, AppResult},
    infrastructure::auth::AccessTokens,
};

/// Query parameters for GET /api/tts_proxy/edge
#[derive(Debug, Deserialize)]
pub struct ProxyQuery {
    pub token: Option<String>,
    pub message: Option<String>,
    pub language: Option<String>,
    pub rate: Option<String>,
    pub volume: Option<String>,
}

/// Relays synthesized audio to playback devices that can only fetch by URL.
pub struct ProxyController {
    tts_service: Arc<TtsService>,
    tokens: Arc<AccessTokens>,
}

impl ProxyController {
    pub fn new(tts_service: Arc<TtsService>, tokens: Arc<AccessTokens>) -> Self {
        Self {
            tts_service,
            tokens,
        }
    }

    /// GET /api/tts_proxy/edge - stream synthesized audio
    pub async fn stream(
        State(controller): State<Arc<ProxyController>>,
        Query(query): Query<ProxyQuery>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        controller.relay(query).await
    }

    /// GET /api/tts_proxy/edge/{filename} - same, the filename only exists
    /// so players that insist on an extension have something to chew on
    pub async fn stream_named(
        State(controller): State<Arc<ProxyController>>,
        Path(_filename): Path<String>,
        Query(query): Query<ProxyQuery>,
    ) -> AppResult<(StatusCode, HeaderMap, Body)> {
        controller.relay(query).await
    }

    async fn relay(&self, query: ProxyQuery) -> AppResult<(StatusCode, HeaderMap, Body)> {
        let token = query.token.unwrap_or_default();
        if !self.tokens.is_valid(&token) {
            return Err(AppError::Unauthorized(
                "missing or invalid access token".to_string(),
            ));
        }

        let message = query
            .message
            .filter(|m| !m.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("message empty".to_string()))?;

        let options = CallOptions {
            rate: Some(restore_plus(
                query.rate.as_deref().unwrap_or(DEFAULT_PROXY_RATE),
            )),
            volume: Some(restore_plus(
                query.volume.as_deref().unwrap_or(DEFAULT_PROXY_VOLUME),
            )),
            ..Default::default()
        };

        let audio = self.tts_service.clone().synthesize_stream(
            stream::once(async move { message }),
            query.language,
            options,
        );
        let mut audio = Box::pin(audio);

        // Await the first chunk before committing to a 200 so that setup
        // failures and "no audio ever produced" still map to their status
        // codes instead of an empty stream.
        let first = match audio.next().await {
            Some(Ok(bytes)) => bytes,
            Some(Err(e)) => return Err(e.into()),
            None => {
                return Err(AppError::SynthesisFailed(
                    "no audio produced".to_string(),
                ))
            }
        };

        let body = Body::from_stream(stream::once(async move { Ok(first) }).chain(audio));

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, "audio/mpeg".parse().unwrap());
        Ok((StatusCode::OK, headers, body))
    }
}

const DEFAULT_PROXY_RATE: &str = "+0%";
const DEFAULT_PROXY_VOLUME: &str = "+10%";

/// Query decoding turns `+10%` into ` 10%`; put the sign back.
fn restore_plus(value: &str) -> String {
    value.replace(' ', "+")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restores_plus_signs_lost_to_query_decoding() {
        assert_eq!(restore_plus(" 10%"), "+10%");
        assert_eq!(restore_plus("-5%"), "-5%");
        assert_eq!(restore_plus("+0%"), "+0%");
    }
}
