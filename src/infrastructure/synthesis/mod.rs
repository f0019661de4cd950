pub mod edge;

pub use edge::EdgeSynthesisClient;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::domain::tts::SynthesisOptions;

/// One unit of a backend's streamed response: either raw audio bytes or
/// synthesis metadata (word-boundary timing and the like). Metadata is
/// carried opaquely for diagnostics only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioChunk {
    Audio(Vec<u8>),
    Metadata(String),
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("failed to open synthesis session: {0}")]
    Connect(String),
    #[error("transport error during synthesis: {0}")]
    Transport(String),
}

pub type ChunkStream = BoxStream<'static, Result<AudioChunk, SynthesisError>>;

/// Boundary to the remote speech-synthesis backend.
///
/// Implementations open one session per call and produce the backend's
/// chunk sequence as a lazy stream. Chunks are not fetched ahead of
/// consumer demand beyond a small bounded buffer, and dropping the stream
/// cancels the underlying call.
#[async_trait]
pub trait SynthesisClient: Send + Sync {
    async fn synthesize(
        &self,
        text: &str,
        options: &SynthesisOptions,
    ) -> Result<ChunkStream, SynthesisError>;
}
