use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::{
    error::{AppError, AppResult},
    infrastructure::{auth::AccessTokens, config::Config},
};

/// Slot values for the text-to-sound intents. `rate` and `volume` are
/// signed percentage points, -100..=100.
#[derive(Debug, Deserialize)]
pub struct IntentSlots {
    pub message: String,
    pub rate: Option<i32>,
    pub volume: Option<i32>,
    pub filename: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct IntentResponse {
    pub response_type: String,
    pub speech_slots: SpeechSlots,
}

#[derive(Debug, Serialize)]
pub struct SpeechSlots {
    pub tts_url: String,
    pub notice: String,
}

const NOTICE: &str = "This audio URL must remain intact, no parameters can be discarded; \
    the URL contains sensitive information and is not recommended to appear in any text content.";

/// Translates a spoken message into a tokenized playback URL pointing at
/// the proxy endpoint.
pub struct IntentController {
    config: Arc<Config>,
    tokens: Arc<AccessTokens>,
}

impl IntentController {
    pub fn new(config: Arc<Config>, tokens: Arc<AccessTokens>) -> Self {
        Self { config, tokens }
    }

    /// POST /api/intent/convert_text_to_sound - URL for the plain proxy route
    pub async fn convert_text_to_sound(
        State(controller): State<Arc<IntentController>>,
        Json(slots): Json<IntentSlots>,
    ) -> AppResult<Json<IntentResponse>> {
        controller.respond(slots, None)
    }

    /// POST /api/intent/convert_text_to_file - URL for the filename route,
    /// for players that key the format off the URL path
    pub async fn convert_text_to_file(
        State(controller): State<Arc<IntentController>>,
        Json(slots): Json<IntentSlots>,
    ) -> AppResult<Json<IntentResponse>> {
        let filename = slots
            .filename
            .clone()
            .filter(|f| !f.trim().is_empty())
            .ok_or_else(|| AppError::BadRequest("filename is required".to_string()))?;
        controller.respond(slots, Some(filename))
    }

    fn respond(
        &self,
        slots: IntentSlots,
        filename: Option<String>,
    ) -> AppResult<Json<IntentResponse>> {
        let message = sanitize_message(&slots.message);
        if message.is_empty() {
            return Err(AppError::BadRequest("message empty".to_string()));
        }
        let rate = validated_percent(slots.rate, "rate")?;
        let volume = validated_percent(slots.volume, "volume")?;

        let path = match &filename {
            Some(name) => format!("/api/tts_proxy/edge/{}", urlencoding::encode(name)),
            None => "/api/tts_proxy/edge".to_string(),
        };
        let query = format!(
            "token={}&rate={}&volume={}&message={}",
            urlencoding::encode(self.tokens.ephemeral()),
            urlencoding::encode(&signed_percent(rate)),
            urlencoding::encode(&signed_percent(volume)),
            urlencoding::encode(&message),
        );
        let tts_url = format!("{}{}?{}", self.config.public_base_url, path, query);

        Ok(Json(IntentResponse {
            response_type: "action_done".to_string(),
            speech_slots: SpeechSlots {
                tts_url,
                notice: NOTICE.to_string(),
            },
        }))
    }
}

fn validated_percent(value: Option<i32>, field: &str) -> AppResult<i32> {
    let v = value.unwrap_or(0);
    if !(-100..=100).contains(&v) {
        return Err(AppError::BadRequest(format!(
            "{field} must be between -100 and 100"
        )));
    }
    Ok(v)
}

fn signed_percent(value: i32) -> String {
    if value < 0 {
        format!("{value}%")
    } else {
        format!("+{value}%")
    }
}

/// Flatten line breaks and tabs, then strip carriage returns and emoji.
/// What remains is speakable and safe inside a query string.
fn sanitize_message(message: &str) -> String {
    let flattened = message.replace(['\n', '\t'], " ");
    let pattern = regex::Regex::new(
        "[\\r\u{1F600}-\u{1F64F}\u{1F300}-\u{1F5FF}\u{1F680}-\u{1F6FF}\
         \u{1F1E0}-\u{1F1FF}\u{2702}-\u{27B0}\u{24C2}-\u{1F251}]",
    )
    .unwrap();
    pattern.replace_all(&flattened, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_flattens_whitespace_and_strips_emoji() {
        assert_eq!(
            sanitize_message("Hello\nworld\tagain"),
            "Hello world again"
        );
        assert_eq!(sanitize_message("Nice day \u{1F600}\u{1F680}"), "Nice day");
        assert_eq!(sanitize_message("line\r\nbreak"), "line break");
    }

    #[test]
    fn signed_percent_formats_both_signs() {
        assert_eq!(signed_percent(0), "+0%");
        assert_eq!(signed_percent(15), "+15%");
        assert_eq!(signed_percent(-30), "-30%");
    }

    #[test]
    fn rejects_out_of_range_percentages() {
        assert!(validated_percent(Some(101), "rate").is_err());
        assert!(validated_percent(Some(-101), "volume").is_err());
        assert_eq!(validated_percent(None, "rate").unwrap(), 0);
        assert_eq!(validated_percent(Some(50), "rate").unwrap(), 50);
    }
}
