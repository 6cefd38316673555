//! Streaming text-to-speech.
//!
//! [`stream`] defines the synthesis state machine and the [`TtsBackend`]
//! seam. Two backends ship: [`SilenceTts`] (local, deterministic) and
//! [`HttpStreamingTts`] (remote streaming API).

pub mod http;
pub mod silence;
pub mod stream;

use std::sync::Arc;

use crate::config::{TtsConfig, TtsProvider};
use crate::error::Result;

pub use crate::config::AudioEncoding;
pub use http::HttpStreamingTts;
pub use silence::SilenceTts;
pub use stream::{
    AudioChunk, AudioSink, ChannelSink, SinkEvent, SpeechStream, StreamFormat, StreamReport,
    StreamState, SynthesisError, SynthesisRequest, TtsBackend, VoiceConfig, drive_to_completion,
};

/// Build the backend selected by `config.provider`.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be constructed.
pub fn backend_from_config(config: &TtsConfig) -> Result<Arc<dyn TtsBackend>> {
    let backend: Arc<dyn TtsBackend> = match config.provider {
        TtsProvider::Local => Arc::new(SilenceTts::from_config(config)),
        TtsProvider::Http => Arc::new(HttpStreamingTts::new(config)?),
    };
    tracing::info!(provider = backend.provider(), "TTS backend ready");
    Ok(backend)
}
