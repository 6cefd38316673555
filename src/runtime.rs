//! Runtime events emitted by the orchestrator for observability.
//!
//! Events are small (no audio payloads) so the orchestrator can broadcast
//! them without slowing a turn down. Nobody has to listen.

use tokio::sync::broadcast;

/// What the orchestrator is doing "right now".
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeEvent {
    /// A non-empty utterance was accepted.
    TurnStarted { request_id: String, user_id: String },
    /// The utterance was mapped to an intent.
    IntentResolved { request_id: String, intent: String },
    /// A tool is about to run.
    ToolCall {
        request_id: String,
        name: String,
        input_json: String,
    },
    /// A tool finished.
    ToolResult {
        request_id: String,
        name: String,
        success: bool,
        output_text: String,
    },
    /// The turn was appended to history.
    TurnRecorded {
        request_id: String,
        user_id: String,
        history_len: usize,
    },
    /// Synthesis of the reply started.
    SynthesisStarted { request_id: String, provider: String },
    /// Synthesis reached its terminal state normally.
    SynthesisFinished {
        request_id: String,
        chunks: u64,
        bytes: usize,
    },
    /// Synthesis failed; `code` is the stable error code.
    SynthesisFailed { request_id: String, code: String },
    /// Synthesis was abandoned by cancellation.
    SynthesisCancelled { request_id: String },
}

impl RuntimeEvent {
    /// Request the event belongs to.
    pub fn request_id(&self) -> &str {
        match self {
            Self::TurnStarted { request_id, .. }
            | Self::IntentResolved { request_id, .. }
            | Self::ToolCall { request_id, .. }
            | Self::ToolResult { request_id, .. }
            | Self::TurnRecorded { request_id, .. }
            | Self::SynthesisStarted { request_id, .. }
            | Self::SynthesisFinished { request_id, .. }
            | Self::SynthesisFailed { request_id, .. }
            | Self::SynthesisCancelled { request_id } => request_id,
        }
    }
}

/// Default capacity for a runtime event channel.
pub const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Create a runtime event channel with the default capacity.
pub fn event_channel() -> (
    broadcast::Sender<RuntimeEvent>,
    broadcast::Receiver<RuntimeEvent>,
) {
    broadcast::channel(EVENT_CHANNEL_CAPACITY)
}
