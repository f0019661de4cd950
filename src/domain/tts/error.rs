use super::options::SynthesisOptions;
use crate::error::AppError;
use crate::infrastructure::synthesis::SynthesisError;

#[derive(Debug, thiserror::Error)]
pub enum TtsServiceError {
    /// The backend completed the call without producing any audio bytes.
    #[error("no audio produced for voice {} (message {} chars)", options.voice, message.chars().count())]
    NoAudio {
        message: String,
        options: SynthesisOptions,
    },
    #[error("cannot construct synthesis request: {0}")]
    Setup(String),
    #[error("synthesis transport failure: {0}")]
    Transport(String),
}

impl From<SynthesisError> for TtsServiceError {
    fn from(err: SynthesisError) -> Self {
        TtsServiceError::Transport(err.to_string())
    }
}

impl From<TtsServiceError> for AppError {
    fn from(err: TtsServiceError) -> Self {
        match err {
            TtsServiceError::NoAudio { .. } => AppError::SynthesisFailed(err.to_string()),
            TtsServiceError::Setup(msg) => AppError::BadRequest(msg),
            TtsServiceError::Transport(msg) => AppError::ExternalService(msg),
        }
    }
}
