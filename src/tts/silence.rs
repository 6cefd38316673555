//! Deterministic local synthesis backend.
//!
//! Emits PCM16 silence sized to the text, one chunk per sentence. Stands in
//! for a real engine in development and tests.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use tracing::debug;

use super::stream::{SpeechStream, SynthesisError, TtsBackend};
use crate::config::{AudioEncoding, TtsConfig};

/// Milliseconds of audio produced per character of text.
const MILLIS_PER_CHAR: usize = 60;

/// Local backend producing silence.
#[derive(Debug, Clone, Default)]
pub struct SilenceTts {
    chunk_delay: Duration,
}

impl SilenceTts {
    /// Backend that waits `chunk_delay` before each chunk.
    pub fn new(chunk_delay: Duration) -> Self {
        Self { chunk_delay }
    }

    pub fn from_config(config: &TtsConfig) -> Self {
        Self::new(Duration::from_millis(config.chunk_delay_ms))
    }
}

/// Split text into trimmed, non-empty sentences.
fn sentences(text: &str) -> Vec<&str> {
    text.split_inclusive(['.', '!', '?'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[async_trait]
impl TtsBackend for SilenceTts {
    fn provider(&self) -> &str {
        "local"
    }

    async fn synthesize(&self, stream: &mut SpeechStream) -> Result<(), SynthesisError> {
        let format = stream.voice().format();
        if format.encoding != AudioEncoding::Pcm16 {
            return Err(SynthesisError::init_permanent(format!(
                "local backend only produces pcm16, not {:?}",
                format.encoding
            )));
        }
        stream.initialize(format)?;

        let text = stream.text().to_owned();
        let frame_bytes = usize::from(format.channels) * 2;
        for sentence in sentences(&text) {
            if !self.chunk_delay.is_zero() {
                tokio::time::sleep(self.chunk_delay).await;
            }
            let samples =
                sentence.chars().count() * MILLIS_PER_CHAR * format.sample_rate as usize / 1000;
            debug!(samples, "local synthesis chunk");
            stream.push(Bytes::from(vec![0u8; samples * frame_bytes]))?;
        }
        Ok(())
    }
}
