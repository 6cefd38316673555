//! Parley: voice-assistant orchestration core.
//!
//! Takes a transcribed utterance, decides whether it asks for an action or a
//! conversational reply, runs the action, records the turn and streams the
//! reply through a speech synthesis backend:
//! Utterance → Intent → Tool | Reply → History → TTS stream
//!
//! # Architecture
//!
//! - **Intent**: ordered keyword rules map text to a structured [`Intent`]
//! - **Tools**: [`ActionTool`](tools::ActionTool)s looked up in a
//!   [`ToolRegistry`](tools::ToolRegistry)
//! - **Replies**: a configurable [`ReplyPolicy`](reply::ReplyPolicy) answers
//!   everything else
//! - **Memory**: per-user, in-process conversation history
//! - **TTS**: a [`SpeechStream`](tts::SpeechStream) state machine driven by a
//!   [`TtsBackend`](tts::TtsBackend)
//! - **Orchestrator**: composes the above and serves requests

pub mod config;
pub mod emotion;
pub mod error;
pub mod intent;
pub mod logging;
pub mod memory;
pub mod orchestrator;
pub mod reply;
pub mod runtime;
pub mod stt;
pub mod tools;
pub mod tts;

pub use config::ParleyConfig;
pub use error::{Result, SpeechError};
pub use intent::{Intent, IntentResolver};
pub use memory::{ConversationMemory, ConversationStore, ConversationTurn};
pub use orchestrator::{Orchestrator, ProcessResponse, SynthesisOutcome, TurnOutcome, TurnRequest};
pub use runtime::RuntimeEvent;
