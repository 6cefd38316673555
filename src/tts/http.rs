//! Remote streaming synthesis over HTTP.
//!
//! Posts the text and voice settings as JSON and forwards the response body
//! to the stream chunk by chunk as it arrives.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::{debug, info};

use super::stream::{SpeechStream, SynthesisError, TtsBackend};
use crate::config::TtsConfig;
use crate::error::{Result, SpeechError};

/// Connect timeout for the synthesis endpoint.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP streaming synthesis client.
pub struct HttpStreamingTts {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
    model: String,
}

impl fmt::Debug for HttpStreamingTts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpStreamingTts")
            .field("api_url", &self.api_url)
            .field("model", &self.model)
            .finish()
    }
}

impl HttpStreamingTts {
    /// Build a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Config`] if the HTTP client cannot be built.
    pub fn new(config: &TtsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| SpeechError::Config(format!("cannot build HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
        })
    }

    fn request_body(&self, stream: &SpeechStream) -> serde_json::Value {
        let voice = stream.voice();
        let channel_type = if voice.channels == 1 { "MONO" } else { "STEREO" };
        serde_json::json!({
            "text": stream.text(),
            "voiceId": voice.voice_id,
            "style": voice.style,
            "model": self.model,
            "sampleRate": voice.sample_rate,
            "channelType": channel_type,
            "format": voice.encoding.wire_name(),
        })
    }

    /// Map a non-success status to an init failure.
    fn map_http_error(status: reqwest::StatusCode, body: &str) -> SynthesisError {
        let message = extract_error_message(body);
        match status.as_u16() {
            401 | 403 => SynthesisError::init_permanent(format!(
                "synthesis authentication failed (HTTP {}): {message}",
                status.as_u16()
            )),
            429 => SynthesisError::init(format!("synthesis rate limited: {message}")),
            code if status.is_server_error() => {
                SynthesisError::init(format!("synthesis HTTP {code}: {message}"))
            }
            code => SynthesisError::init_permanent(format!("synthesis HTTP {code}: {message}")),
        }
    }
}

/// Pull `error.message` or `message` out of a JSON error body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .or_else(|| v.get("errorMessage"))
                .or_else(|| v.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl TtsBackend for HttpStreamingTts {
    fn provider(&self) -> &str {
        "http"
    }

    async fn synthesize(
        &self,
        stream: &mut SpeechStream,
    ) -> std::result::Result<(), SynthesisError> {
        let body = self.request_body(stream);
        let response = self
            .client
            .post(&self.api_url)
            .header("api-key", &self.api_key)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| SynthesisError::init(format!("synthesis request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Self::map_http_error(status, &body_text));
        }

        stream.initialize(stream.voice().format())?;
        info!(request_id = stream.request_id(), "synthesis stream opened");

        let mut body = response.bytes_stream();
        while let Some(chunk) = body.next().await {
            let chunk = chunk
                .map_err(|e| SynthesisError::Aborted(format!("synthesis stream broke: {e}")))?;
            debug!(len = chunk.len(), "synthesis chunk received");
            stream.push(chunk)?;
        }
        stream.flush()
    }
}
