use futures::StreamExt;
use msedge_tts::tts::stream::{msedge_tts_split, SynthesizedResponse};
use msedge_tts::tts::SpeechConfig;
use tokio_stream::wrappers::ReceiverStream;

use super::{AudioChunk, ChunkStream, SynthesisClient, SynthesisError};
use crate::domain::tts::SynthesisOptions;

/// Edge read-aloud outputs MP3 at this profile.
const AUDIO_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";

/// How many chunks may sit between the websocket reader and the consumer.
/// Keeps the reader demand-driven without stalling it on every chunk.
const CHANNEL_CAPACITY: usize = 8;

/// Synthesis client backed by the `msedge-tts` crate.
///
/// The crate's streaming API is synchronous, so each call drives one
/// websocket session on a blocking task and forwards chunks over a bounded
/// channel. Dropping the returned stream closes the channel, which stops
/// the reader loop and abandons the session.
#[derive(Debug, Default, Clone)]
pub struct EdgeSynthesisClient;

impl EdgeSynthesisClient {
    pub fn new() -> Self {
        Self
    }

    fn speech_config(options: &SynthesisOptions) -> SpeechConfig {
        SpeechConfig {
            voice_name: options.voice.clone(),
            audio_format: AUDIO_FORMAT.to_string(),
            pitch: prosody_value(&options.pitch),
            rate: prosody_value(&options.rate),
            volume: prosody_value(&options.volume),
        }
    }
}

#[async_trait::async_trait]
impl SynthesisClient for EdgeSynthesisClient {
    async fn synthesize(
        &self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<ChunkStream, SynthesisError> {
        let text = text.to_string();
        let config = Self::speech_config(options);
        let (tx, rx) = tokio::sync::mpsc::channel(CHANNEL_CAPACITY);

        tokio::task::spawn_blocking(move || {
            let (mut sender, mut reader) = match msedge_tts_split() {
                Ok(pair) => pair,
                Err(e) => {
                    let _ = tx.blocking_send(Err(SynthesisError::Connect(format!("{e:?}"))));
                    return;
                }
            };
            if let Err(e) = sender.send(&text, &config) {
                let _ = tx.blocking_send(Err(SynthesisError::Transport(format!("{e:?}"))));
                return;
            }
            while reader.can_read() {
                match reader.read() {
                    Ok(Some(SynthesizedResponse::AudioBytes(data))) => {
                        if tx.blocking_send(Ok(AudioChunk::Audio(data.to_vec()))).is_err() {
                            // Consumer went away; stop pulling from the wire.
                            return;
                        }
                    }
                    Ok(Some(SynthesizedResponse::AudioMetadata(meta))) => {
                        if tx
                            .blocking_send(Ok(AudioChunk::Metadata(format!("{meta:?}"))))
                            .is_err()
                        {
                            return;
                        }
                    }
                    Ok(None) => continue,
                    Err(e) => {
                        let _ = tx.blocking_send(Err(SynthesisError::Transport(format!("{e:?}"))));
                        return;
                    }
                }
            }
        });

        Ok(ReceiverStream::new(rx).boxed())
    }
}

/// Parse a prosody string such as `+0Hz`, `-5%` or `+10%` into the signed
/// integer the wire config expects. Unparseable values fall back to 0.
fn prosody_value(s: &str) -> i32 {
    let trimmed = s
        .trim()
        .trim_end_matches("Hz")
        .trim_end_matches('%')
        .trim_start_matches('+');
    trimmed.parse().unwrap_or(0)
}
