//! Error types for the parley orchestration core.
//!
//! Tool and synthesis failures have their own typed errors
//! ([`ToolError`](crate::tools::ToolError) and
//! [`SynthesisError`](crate::tts::SynthesisError)) and never leave a turn:
//! the orchestrator turns them into a failure reply or a
//! [`SynthesisOutcome`](crate::orchestrator::SynthesisOutcome).
//! [`SpeechError`] covers everything else.

/// Top-level error type for the orchestration core.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    /// Configuration could not be read, parsed or validated.
    #[error("config error: {0}")]
    Config(String),

    /// Conversation history store error.
    #[error("memory error: {0}")]
    Memory(String),

    /// Speech-to-text collaborator error.
    #[error("STT error: {0}")]
    Stt(String),

    /// The serve loop is gone or a turn ended without answering.
    #[error("channel error: {0}")]
    Channel(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, SpeechError>;
