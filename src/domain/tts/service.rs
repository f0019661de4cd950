use std::sync::Arc;
use std::time::Instant;

use async_stream::try_stream;
use futures::{Stream, StreamExt};

use super::error::TtsServiceError;
use super::options::{self, CallOptions, SynthesisOptions};
use super::segmenter::StreamSegmenter;
use crate::infrastructure::synthesis::{AudioChunk, SynthesisClient};

/// Drives synthesis calls against the backend client: resolves options,
/// assembles chunked responses into MP3 payloads and exposes a streaming
/// variant for live text input.
pub struct TtsService {
    client: Arc<dyn SynthesisClient>,
    default_language: String,
}

impl TtsService {
    pub fn new(client: Arc<dyn SynthesisClient>, default_language: String) -> Self {
        Self {
            client,
            default_language,
        }
    }

    /// One-shot synthesis: resolve options, run one call to completion and
    /// return the assembled audio.
    pub async fn synthesize(
        &self,
        message: &str,
        language: Option<&str>,
        options: &CallOptions,
    ) -> Result<Vec<u8>, TtsServiceError> {
        let resolved = options::resolve(language, &self.default_language, options);
        self.assemble(message, &resolved).await
    }

    /// Streaming synthesis: segment an incrementally produced text stream
    /// into speakable chunks and yield the audio for each chunk as soon as
    /// it is ready.
    ///
    /// Chunks are synthesized strictly sequentially in arrival order, so
    /// audio comes out in the order the text came in. The stream is
    /// pull-driven: if the consumer stops polling, no further synthesis
    /// calls are issued.
    pub fn synthesize_stream<S>(
        self: Arc<Self>,
        fragments: S,
        language: Option<String>,
        options: CallOptions,
    ) -> impl Stream<Item = Result<Vec<u8>, TtsServiceError>> + Send + 'static
    where
        S: Stream<Item = String> + Send + 'static,
    {
        try_stream! {
            let resolved = options::resolve(language.as_deref(), &self.default_language, &options);
            let mut segmenter = StreamSegmenter::new();
            tokio::pin!(fragments);
            while let Some(fragment) = fragments.next().await {
                for chunk in segmenter.push(&fragment) {
                    let audio = self.assemble(&chunk, &resolved).await?;
                    yield audio;
                }
            }
            if let Some(rest) = segmenter.finish() {
                let audio = self.assemble(&rest, &resolved).await?;
                yield audio;
            }
        }
    }

    /// Run one synthesis call to completion, concatenating audio chunks and
    /// discarding metadata. Fails with [`TtsServiceError::NoAudio`] when the
    /// backend produced zero audio bytes.
    async fn assemble(
        &self,
        message: &str,
        resolved: &SynthesisOptions,
    ) -> Result<Vec<u8>, TtsServiceError> {
        if message.trim().is_empty() {
            return Err(TtsServiceError::Setup("message is empty".to_string()));
        }

        tracing::debug!(
            voice = %resolved.voice,
            language = %resolved.language,
            pitch = %resolved.pitch,
            rate = %resolved.rate,
            volume = %resolved.volume,
            message_chars = message.chars().count(),
            "starting synthesis call"
        );

        let start = Instant::now();
        let mut chunks = self.client.synthesize(message, resolved).await?;

        let mut audio: Vec<u8> = Vec::new();
        let mut metadata_events = 0usize;
        while let Some(chunk) = chunks.next().await {
            match chunk? {
                AudioChunk::Audio(data) => audio.extend_from_slice(&data),
                AudioChunk::Metadata(meta) => {
                    metadata_events += 1;
                    tracing::debug!(metadata = %meta, "synthesis metadata event");
                }
            }
        }

        tracing::debug!(
            latency_ms = start.elapsed().as_millis() as u64,
            audio_size_bytes = audio.len(),
            metadata_events,
            "synthesis call completed"
        );

        if audio.is_empty() {
            tracing::warn!(
                voice = %resolved.voice,
                message_chars = message.chars().count(),
                "backend returned no audio"
            );
            return Err(TtsServiceError::NoAudio {
                message: message.to_string(),
                options: resolved.clone(),
            });
        }
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::synthesis::{ChunkStream, SynthesisError};
    use async_trait::async_trait;
    use futures::stream;
    use std::sync::Mutex;

    /// Stub client that replays a canned chunk script for every call and
    /// records the chunk texts it was asked to synthesize.
    struct StubClient {
        script: Vec<AudioChunk>,
        calls: Mutex<Vec<String>>,
    }

    impl StubClient {
        fn new(script: Vec<AudioChunk>) -> Self {
            Self {
                script,
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl SynthesisClient for StubClient {
        async fn synthesize(
            &self,
            text: &str,
            _options: &SynthesisOptions,
        ) -> Result<ChunkStream, SynthesisError> {
            self.calls.lock().unwrap().push(text.to_string());
            let items: Vec<Result<AudioChunk, SynthesisError>> =
                self.script.iter().cloned().map(Ok).collect();
            Ok(stream::iter(items).boxed())
        }
    }

    fn service(script: Vec<AudioChunk>) -> (Arc<TtsService>, Arc<StubClient>) {
        let client = Arc::new(StubClient::new(script));
        let service = Arc::new(TtsService::new(client.clone(), "zh-CN".to_string()));
        (service, client)
    }

    #[tokio::test]
    async fn assembles_audio_chunks_in_order_and_drops_metadata() {
        let (service, _) = service(vec![
            AudioChunk::Audio(b"AA".to_vec()),
            AudioChunk::Metadata("word boundary".to_string()),
            AudioChunk::Audio(b"BB".to_vec()),
        ]);
        let audio = service
            .synthesize("Hello.", Some("en-US"), &CallOptions::default())
            .await
            .unwrap();
        assert_eq!(audio, b"AABB");
    }

    #[tokio::test]
    async fn zero_audio_chunks_is_an_error_not_empty_success() {
        let (service, _) = service(vec![AudioChunk::Metadata("only metadata".to_string())]);
        let err = service
            .synthesize("Hello.", Some("en-US"), &CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TtsServiceError::NoAudio { .. }));
    }

    #[tokio::test]
    async fn empty_message_is_a_setup_error() {
        let (service, client) = service(vec![AudioChunk::Audio(b"AA".to_vec())]);
        let err = service
            .synthesize("   ", None, &CallOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, TtsServiceError::Setup(_)));
        assert!(client.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn streaming_yields_one_audio_payload_per_segment() {
        let (service, client) = service(vec![AudioChunk::Audio(b"mp3".to_vec())]);
        let fragments = stream::iter(vec![
            "Hello world. This is ".to_string(),
            "a test.".to_string(),
        ]);
        let audio: Vec<_> = service
            .synthesize_stream(fragments, Some("en-US".to_string()), CallOptions::default())
            .collect::<Vec<_>>()
            .await;

        let audio: Vec<Vec<u8>> = audio.into_iter().map(|r| r.unwrap()).collect();
        assert_eq!(audio, vec![b"mp3".to_vec()]);

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), ["Hello world. This is a test."]);
    }

    #[tokio::test]
    async fn streaming_flushes_the_final_partial_buffer() {
        let (service, client) = service(vec![AudioChunk::Audio(b"mp3".to_vec())]);
        let fragments = stream::iter(vec!["Too short to emit".to_string()]);
        let audio: Vec<_> = service
            .synthesize_stream(fragments, None, CallOptions::default())
            .collect::<Vec<_>>()
            .await;
        assert_eq!(audio.len(), 1);
        assert!(audio[0].is_ok());

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls.as_slice(), ["Too short to emit"]);
    }
}
