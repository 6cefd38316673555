//! Speech-to-text seam.
//!
//! No recognizer ships with the crate; callers plug one in through
//! [`Transcriber`] and hand it to the orchestrator for
//! [`process_audio`](crate::orchestrator::Orchestrator::process_audio).

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SpeechError};

/// Largest audio payload accepted for a single transcription (25 MiB).
pub const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// Recognized text with the recognizer's confidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transcript {
    pub text: String,
    /// Confidence in `0.0..=1.0`.
    pub confidence: f32,
}

/// A speech recognizer.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Short recognizer name for logs.
    fn name(&self) -> &str;

    /// Transcribe one encoded audio payload.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Stt`] if recognition fails.
    async fn transcribe(&self, audio: Bytes) -> Result<Transcript>;
}

/// Reject empty payloads and payloads larger than `max_bytes`.
///
/// # Errors
///
/// Returns [`SpeechError::Stt`] describing the rejected payload.
pub fn check_audio_size(audio: &[u8], max_bytes: usize) -> Result<()> {
    if audio.is_empty() {
        return Err(SpeechError::Stt("audio payload is empty".into()));
    }
    if audio.len() > max_bytes {
        return Err(SpeechError::Stt(format!(
            "audio payload too large: {} bytes (max {max_bytes})",
            audio.len()
        )));
    }
    Ok(())
}
