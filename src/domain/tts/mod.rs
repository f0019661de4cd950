pub mod catalog;
pub mod error;
pub mod options;
pub mod segmenter;
pub mod service;

pub use error::TtsServiceError;
pub use options::{CallOptions, SynthesisOptions};
pub use segmenter::StreamSegmenter;
pub use service::TtsService;
