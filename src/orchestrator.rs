//! Turn orchestration.
//!
//! The [`Orchestrator`] takes one utterance through the whole pipeline:
//!
//! 1. resolve the intent,
//! 2. run the matching tool or ask the reply policy,
//! 3. record the turn in conversation history,
//! 4. stream the reply through the TTS backend and wait for it to finish.
//!
//! Steps never reorder. History is written before synthesis starts, so a
//! cancelled or failed synthesis still leaves the turn recorded.
//!
//! Callers that want audio as it is produced pass a [`SinkEvent`] sender
//! ([`Orchestrator::handle_with_sink`], [`TurnRequest::with_audio`]). Chunks
//! are theirs once sent; after a cancellation they hold whatever arrived
//! before it, with no `Flush` event.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::{ParleyConfig, TtsConfig};
use crate::emotion::{
    EmotionClassifier, EmotionSignal, KeywordEmotionClassifier, voice_style_for,
};
use crate::error::{Result, SpeechError};
use crate::intent::{Intent, IntentResolver};
use crate::memory::{ConversationMemory, ConversationStore, ConversationTurn};
use crate::reply::{EchoReplyPolicy, ReplyContext, ReplyPolicy, policy_for};
use crate::runtime::RuntimeEvent;
use crate::stt::{MAX_AUDIO_BYTES, Transcriber, Transcript, check_audio_size};
use crate::tools::{
    AlarmSetter, InMemoryCalendar, InMemoryReminders, MeetingScheduler, ToolError, ToolRegistry,
};
use crate::tts::{
    AudioChunk, AudioSink, ChannelSink, SinkEvent, SpeechStream, StreamFormat, SynthesisError,
    SynthesisRequest, TtsBackend, VoiceConfig, backend_from_config, drive_to_completion,
};

/// Audio produced for a completed turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioReference {
    pub request_id: String,
    pub format: StreamFormat,
    pub chunks: u64,
    pub byte_len: usize,
    /// Every chunk of the stream, concatenated in sequence order.
    pub data: Bytes,
}

/// How synthesis of a turn's reply ended.
#[derive(Debug, Clone, PartialEq)]
pub enum SynthesisOutcome {
    Completed(AudioReference),
    Failed(SynthesisError),
    Cancelled,
}

impl SynthesisOutcome {
    pub fn audio(&self) -> Option<&AudioReference> {
        match self {
            Self::Completed(audio) => Some(audio),
            _ => None,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}

/// Everything one handled utterance produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub request_id: String,
    pub intent: Intent,
    /// The turn as recorded in history.
    pub turn: ConversationTurn,
    pub emotion: EmotionSignal,
    /// History length for the user after this turn was recorded.
    pub history_len: usize,
    pub synthesis: SynthesisOutcome,
}

impl TurnOutcome {
    pub fn reply_text(&self) -> &str {
        &self.turn.reply
    }
}

/// Audio summary exposed by [`Orchestrator::process`]; raw bytes are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AudioSummary {
    pub request_id: String,
    pub mime_type: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub chunks: u64,
    pub byte_len: usize,
}

impl From<&AudioReference> for AudioSummary {
    fn from(audio: &AudioReference) -> Self {
        Self {
            request_id: audio.request_id.clone(),
            mime_type: audio.format.mime_type().to_owned(),
            sample_rate: audio.format.sample_rate,
            channels: audio.format.channels,
            chunks: audio.chunks,
            byte_len: audio.byte_len,
        }
    }
}

/// Response shape for a transport wrapping the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcessResponse {
    pub transcript: String,
    pub asr_confidence: f32,
    pub emotion: String,
    pub score: f32,
    pub reply_text: String,
    pub audio: Option<AudioSummary>,
    /// Stable error code when synthesis did not complete.
    pub synthesis_error: Option<String>,
    pub history_len: usize,
}

/// One utterance submitted to [`Orchestrator::serve`].
#[derive(Debug)]
pub struct TurnRequest {
    pub user_id: String,
    pub text: String,
    /// Receives the turn's audio events while synthesis runs.
    pub audio: Option<mpsc::UnboundedSender<SinkEvent>>,
    /// Receives the outcome once the turn finishes.
    pub respond_to: Option<oneshot::Sender<Result<Option<TurnOutcome>>>>,
}

impl TurnRequest {
    pub fn new(user_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            text: text.into(),
            audio: None,
            respond_to: None,
        }
    }

    /// Stream this turn's audio events to `audio` as they are produced.
    pub fn with_audio(mut self, audio: mpsc::UnboundedSender<SinkEvent>) -> Self {
        self.audio = Some(audio);
        self
    }

    /// Request plus the receiver its outcome will be sent to.
    pub fn with_reply(
        user_id: impl Into<String>,
        text: impl Into<String>,
    ) -> (Self, oneshot::Receiver<Result<Option<TurnOutcome>>>) {
        let (tx, rx) = oneshot::channel();
        let mut request = Self::new(user_id, text);
        request.respond_to = Some(tx);
        (request, rx)
    }
}

/// Composes intent resolution, tools, replies, history and synthesis.
///
/// `Send + Sync`; share it behind an `Arc` between workers. Turns for the
/// same user must be serialized by the caller.
pub struct Orchestrator {
    resolver: IntentResolver,
    tools: ToolRegistry,
    store: Arc<dyn ConversationStore>,
    classifier: Arc<dyn EmotionClassifier>,
    reply_policy: Box<dyn ReplyPolicy>,
    tts: Arc<dyn TtsBackend>,
    tts_config: TtsConfig,
    transcriber: Option<Arc<dyn Transcriber>>,
    events: Option<broadcast::Sender<RuntimeEvent>>,
}

impl Orchestrator {
    /// Orchestrator with the keyword resolver, in-memory calendar and
    /// reminders, keyword emotion classifier, echo replies and default voice.
    pub fn new(store: Arc<dyn ConversationStore>, tts: Arc<dyn TtsBackend>) -> Self {
        Self {
            resolver: IntentResolver::new(),
            tools: ToolRegistry::with_default_tools(
                Arc::new(InMemoryCalendar::default()),
                Arc::new(InMemoryReminders::default()),
            ),
            store,
            classifier: Arc::new(KeywordEmotionClassifier),
            reply_policy: Box::new(EchoReplyPolicy),
            tts,
            tts_config: TtsConfig::default(),
            transcriber: None,
            events: None,
        }
    }

    /// Build from configuration: bounded in-memory history, the configured
    /// TTS backend and reply policy.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the TTS backend
    /// cannot be built.
    pub fn from_config(config: &ParleyConfig) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(ConversationMemory::with_max_turns(
            config.memory.max_turns_per_user,
        ));
        let tts = backend_from_config(&config.tts)?;
        Ok(Self::new(store, tts)
            .with_tts_config(config.tts.clone())
            .with_reply_policy(policy_for(config.reply.policy)))
    }

    pub fn with_resolver(mut self, resolver: IntentResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_tools(mut self, tools: ToolRegistry) -> Self {
        self.tools = tools;
        self
    }

    pub fn with_classifier(mut self, classifier: Arc<dyn EmotionClassifier>) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_reply_policy(mut self, policy: Box<dyn ReplyPolicy>) -> Self {
        self.reply_policy = policy;
        self
    }

    /// Voice, format, timeout and style settings for synthesis.
    pub fn with_tts_config(mut self, config: TtsConfig) -> Self {
        self.tts_config = config;
        self
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Broadcast [`RuntimeEvent`]s on `tx`.
    pub fn with_runtime_events(mut self, tx: broadcast::Sender<RuntimeEvent>) -> Self {
        self.events = Some(tx);
        self
    }

    pub fn store(&self) -> &Arc<dyn ConversationStore> {
        &self.store
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    fn emit(&self, event: RuntimeEvent) {
        if let Some(tx) = &self.events {
            let _ = tx.send(event);
        }
    }

    /// Handle one utterance without outside cancellation.
    ///
    /// # Errors
    ///
    /// Returns an error only if the history store fails.
    pub async fn handle(&self, user_id: &str, text: &str) -> Result<Option<TurnOutcome>> {
        self.handle_with_cancel(user_id, text, &CancellationToken::new())
            .await
    }

    /// Handle one utterance. Returns `Ok(None)` for empty or whitespace-only
    /// text, which leaves history untouched and synthesizes nothing.
    ///
    /// Cancelling `cancel` abandons synthesis only; the turn is already
    /// recorded by then.
    ///
    /// # Errors
    ///
    /// Returns an error only if the history store fails. Tool and synthesis
    /// failures are reported inside the [`TurnOutcome`].
    pub async fn handle_with_cancel(
        &self,
        user_id: &str,
        text: &str,
        cancel: &CancellationToken,
    ) -> Result<Option<TurnOutcome>> {
        self.handle_with_sink(user_id, text, None, cancel).await
    }

    /// Like [`handle_with_cancel`](Self::handle_with_cancel), also sending
    /// every [`SinkEvent`] of the reply's stream to `audio` as it happens.
    ///
    /// # Errors
    ///
    /// Returns an error only if the history store fails.
    pub async fn handle_with_sink(
        &self,
        user_id: &str,
        text: &str,
        audio: Option<mpsc::UnboundedSender<SinkEvent>>,
        cancel: &CancellationToken,
    ) -> Result<Option<TurnOutcome>> {
        if text.trim().is_empty() {
            debug!(user_id, "ignoring empty utterance");
            return Ok(None);
        }

        let request_id = uuid::Uuid::new_v4().to_string();
        info!(%request_id, user_id, "turn started");
        self.emit(RuntimeEvent::TurnStarted {
            request_id: request_id.clone(),
            user_id: user_id.to_owned(),
        });

        let intent = self.resolver.resolve(text);
        info!(%request_id, intent = intent.name(), "intent resolved");
        self.emit(RuntimeEvent::IntentResolved {
            request_id: request_id.clone(),
            intent: intent.name().to_owned(),
        });

        let emotion = self.classifier.classify(text);
        let reply = match intent.tool_name() {
            Some(tool) => self.run_tool(&request_id, tool, &intent),
            None => {
                let history_len = self.store.turn_count(user_id)?;
                self.reply_policy.reply(&ReplyContext {
                    transcript: text,
                    emotion: &emotion.label,
                    score: emotion.score,
                    history_len,
                })
            }
        };

        let turn = ConversationTurn::new(text, emotion.label.clone(), reply);
        self.store.append(user_id, turn.clone())?;
        let history_len = self.store.turn_count(user_id)?;
        info!(%request_id, user_id, history_len, "turn recorded");
        self.emit(RuntimeEvent::TurnRecorded {
            request_id: request_id.clone(),
            user_id: user_id.to_owned(),
            history_len,
        });

        let synthesis = self
            .synthesize(&request_id, &turn.reply, &emotion, audio, cancel)
            .await;

        Ok(Some(TurnOutcome {
            request_id,
            intent,
            turn,
            emotion,
            history_len,
            synthesis,
        }))
    }

    fn run_tool(&self, request_id: &str, name: &str, intent: &Intent) -> String {
        let args = intent.arguments();
        info!(request_id, tool = name, "dispatching tool");
        self.emit(RuntimeEvent::ToolCall {
            request_id: request_id.to_owned(),
            name: name.to_owned(),
            input_json: args.to_string(),
        });

        let (success, reply) = match self.tools.execute(name, args) {
            Ok(confirmation) => (true, confirmation),
            Err(err) => {
                warn!(request_id, tool = name, code = err.code(), error = %err, "tool failed");
                (false, failure_reply(name, &err))
            }
        };
        self.emit(RuntimeEvent::ToolResult {
            request_id: request_id.to_owned(),
            name: name.to_owned(),
            success,
            output_text: reply.clone(),
        });
        reply
    }

    fn voice_for(&self, emotion: &EmotionSignal) -> VoiceConfig {
        if self.tts_config.emotion_styles {
            let style = voice_style_for(&emotion.label, &self.tts_config.style);
            self.tts_config.voice_config_with_style(&style)
        } else {
            self.tts_config.voice_config()
        }
    }

    async fn synthesize(
        &self,
        request_id: &str,
        text: &str,
        emotion: &EmotionSignal,
        audio: Option<mpsc::UnboundedSender<SinkEvent>>,
        cancel: &CancellationToken,
    ) -> SynthesisOutcome {
        let request = SynthesisRequest {
            request_id: request_id.to_owned(),
            text: text.to_owned(),
            voice: self.voice_for(emotion),
        };
        let (local, mut rx) = ChannelSink::channel();
        let sink = TurnSink {
            local,
            caller: audio.map(ChannelSink::new),
        };
        let mut stream = SpeechStream::new(request, Box::new(sink));
        let timeout = Duration::from_secs(self.tts_config.timeout_secs);

        info!(request_id, provider = self.tts.provider(), "synthesis started");
        self.emit(RuntimeEvent::SynthesisStarted {
            request_id: request_id.to_owned(),
            provider: self.tts.provider().to_owned(),
        });

        match drive_to_completion(self.tts.as_ref(), &mut stream, cancel, timeout).await {
            Ok(report) => {
                let data = collect_audio(&mut rx, request_id);
                info!(
                    request_id,
                    chunks = report.chunks,
                    bytes = report.bytes,
                    "synthesis finished"
                );
                self.emit(RuntimeEvent::SynthesisFinished {
                    request_id: request_id.to_owned(),
                    chunks: report.chunks,
                    bytes: report.bytes,
                });
                SynthesisOutcome::Completed(AudioReference {
                    request_id: report.request_id,
                    format: report.format,
                    chunks: report.chunks,
                    byte_len: report.bytes,
                    data,
                })
            }
            Err(SynthesisError::Cancelled) => {
                info!(request_id, "synthesis cancelled");
                self.emit(RuntimeEvent::SynthesisCancelled {
                    request_id: request_id.to_owned(),
                });
                SynthesisOutcome::Cancelled
            }
            Err(err) => {
                error!(request_id, code = err.code(), error = %err, "synthesis failed");
                self.emit(RuntimeEvent::SynthesisFailed {
                    request_id: request_id.to_owned(),
                    code: err.code().to_owned(),
                });
                SynthesisOutcome::Failed(err)
            }
        }
    }

    /// Handle typed text and summarise the result.
    ///
    /// # Errors
    ///
    /// Returns an error only if the history store fails.
    pub async fn process(&self, user_id: &str, text: &str) -> Result<Option<ProcessResponse>> {
        let transcript = Transcript {
            text: text.to_owned(),
            confidence: 1.0,
        };
        self.process_transcript(user_id, transcript).await
    }

    /// Transcribe `audio` with the configured transcriber, then handle it.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Stt`] if no transcriber is configured, the
    /// payload is empty or too large, or recognition fails.
    pub async fn process_audio(
        &self,
        user_id: &str,
        audio: Bytes,
    ) -> Result<Option<ProcessResponse>> {
        let transcriber = self
            .transcriber
            .as_ref()
            .ok_or_else(|| SpeechError::Stt("no transcriber configured".into()))?;
        check_audio_size(&audio, MAX_AUDIO_BYTES)?;
        let transcript = transcriber.transcribe(audio).await?;
        debug!(
            user_id,
            transcriber = transcriber.name(),
            confidence = transcript.confidence,
            "audio transcribed"
        );
        self.process_transcript(user_id, transcript).await
    }

    async fn process_transcript(
        &self,
        user_id: &str,
        transcript: Transcript,
    ) -> Result<Option<ProcessResponse>> {
        let Some(outcome) = self.handle(user_id, &transcript.text).await? else {
            return Ok(None);
        };
        let synthesis_error = match &outcome.synthesis {
            SynthesisOutcome::Completed(_) => None,
            SynthesisOutcome::Failed(err) => Some(err.code().to_owned()),
            SynthesisOutcome::Cancelled => Some(SynthesisError::Cancelled.code().to_owned()),
        };
        Ok(Some(ProcessResponse {
            transcript: transcript.text,
            asr_confidence: transcript.confidence,
            emotion: outcome.emotion.label.clone(),
            score: outcome.emotion.score,
            reply_text: outcome.turn.reply.clone(),
            audio: outcome.synthesis.audio().map(AudioSummary::from),
            synthesis_error,
            history_len: outcome.history_len,
        }))
    }

    /// Serve requests one at a time until `requests` closes or `cancel` fires.
    ///
    /// Each request runs in its own task, awaited before the next one is
    /// taken. Failures and panics are logged and the loop keeps going.
    pub async fn serve(
        self: Arc<Self>,
        mut requests: mpsc::Receiver<TurnRequest>,
        cancel: CancellationToken,
    ) {
        info!("serve loop started");
        loop {
            let request = tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                next = requests.recv() => match next {
                    Some(request) => request,
                    None => break,
                },
            };

            let this = Arc::clone(&self);
            let turn_cancel = cancel.child_token();
            let user_id = request.user_id.clone();
            let task = tokio::spawn(async move {
                let TurnRequest {
                    user_id,
                    text,
                    audio,
                    respond_to,
                } = request;
                let result = this
                    .handle_with_sink(&user_id, &text, audio, &turn_cancel)
                    .await;
                if let Err(e) = &result {
                    error!(user_id = %user_id, error = %e, "turn failed");
                }
                if let Some(tx) = respond_to {
                    let _ = tx.send(result);
                }
            });

            if let Err(e) = task.await {
                error!(user_id = %user_id, error = %e, "turn task panicked");
            }
        }
        info!("serve loop stopped");
    }
}

/// Send `request` to a serve loop and wait for its outcome. Any reply
/// channel already set on `request` is replaced.
///
/// # Errors
///
/// Returns [`SpeechError::Channel`] if the serve loop is not running or the
/// turn ended without answering, otherwise the turn's own result.
pub async fn submit(
    requests: &mpsc::Sender<TurnRequest>,
    mut request: TurnRequest,
) -> Result<Option<TurnOutcome>> {
    let (tx, rx) = oneshot::channel();
    request.respond_to = Some(tx);
    requests
        .send(request)
        .await
        .map_err(|_| SpeechError::Channel("serve loop is not running".into()))?;
    rx.await
        .map_err(|_| SpeechError::Channel("turn ended without a reply".into()))?
}

/// Keeps every event for the turn's [`AudioReference`] and forwards a copy to
/// the caller.
struct TurnSink {
    local: ChannelSink,
    caller: Option<ChannelSink>,
}

impl AudioSink for TurnSink {
    fn on_start(&mut self, request_id: &str, format: StreamFormat) {
        if let Some(caller) = &mut self.caller {
            caller.on_start(request_id, format);
        }
        self.local.on_start(request_id, format);
    }

    fn on_chunk(&mut self, chunk: AudioChunk) {
        if let Some(caller) = &mut self.caller {
            caller.on_chunk(chunk.clone());
        }
        self.local.on_chunk(chunk);
    }

    fn on_flush(&mut self, request_id: &str) {
        if let Some(caller) = &mut self.caller {
            caller.on_flush(request_id);
        }
        self.local.on_flush(request_id);
    }
}

/// User-facing text for a failed tool.
fn failure_reply(tool: &str, err: &ToolError) -> String {
    let action = match tool {
        MeetingScheduler::NAME => "schedule the meeting".to_owned(),
        AlarmSetter::NAME => "set the alarm".to_owned(),
        other => format!("run {other}"),
    };
    format!("Sorry, I couldn't {action}: {}", err.message())
}

/// Concatenate the chunks of `request_id` buffered in `rx`.
fn collect_audio(rx: &mut mpsc::UnboundedReceiver<SinkEvent>, request_id: &str) -> Bytes {
    let mut data = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let SinkEvent::Chunk(chunk) = event {
            if chunk.request_id == request_id {
                data.extend_from_slice(&chunk.data);
            }
        }
    }
    Bytes::from(data)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use crate::tts::SilenceTts;

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(
            Arc::new(ConversationMemory::new()),
            Arc::new(SilenceTts::default()),
        )
    }

    #[test]
    fn orchestrator_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Orchestrator>();
    }

    #[test]
    fn failure_reply_names_action() {
        let err = ToolError::Backend("calendar offline".into());
        assert_eq!(
            failure_reply("schedule_meeting", &err),
            "Sorry, I couldn't schedule the meeting: calendar offline"
        );
        assert_eq!(
            failure_reply("set_alarm", &err),
            "Sorry, I couldn't set the alarm: calendar offline"
        );
        assert!(
            failure_reply("order_pizza", &err).starts_with("Sorry, I couldn't run order_pizza")
        );
    }

    #[tokio::test]
    async fn whitespace_utterance_is_ignored() {
        let orch = orchestrator();
        assert!(orch.handle("u", "   \n\t").await.unwrap().is_none());
        assert!(orch.handle("u", "").await.unwrap().is_none());
        assert_eq!(orch.store().turn_count("u").unwrap(), 0);
    }

    #[tokio::test]
    async fn emotion_styles_pick_voice() {
        let orch = orchestrator().with_tts_config(TtsConfig {
            emotion_styles: true,
            ..TtsConfig::default()
        });
        let sad = EmotionSignal {
            label: "sad".into(),
            score: -0.3,
        };
        assert_eq!(orch.voice_for(&sad).style, "soft");
        assert_eq!(
            orch.voice_for(&EmotionSignal::neutral()).style,
            "Conversation"
        );

        let plain = orchestrator();
        assert_eq!(plain.voice_for(&sad).style, "Conversation");
    }

    #[tokio::test]
    async fn runtime_events_follow_turn_order() {
        let (tx, mut rx) = crate::runtime::event_channel();
        let orch = orchestrator().with_runtime_events(tx);
        orch.handle("u", "Set an alarm for 7am").await.unwrap();

        let mut kinds = Vec::new();
        while let Ok(event) = rx.try_recv() {
            kinds.push(match event {
                RuntimeEvent::TurnStarted { .. } => "turn_started",
                RuntimeEvent::IntentResolved { .. } => "intent_resolved",
                RuntimeEvent::ToolCall { .. } => "tool_call",
                RuntimeEvent::ToolResult { .. } => "tool_result",
                RuntimeEvent::TurnRecorded { .. } => "turn_recorded",
                RuntimeEvent::SynthesisStarted { .. } => "synthesis_started",
                RuntimeEvent::SynthesisFinished { .. } => "synthesis_finished",
                RuntimeEvent::SynthesisFailed { .. } => "synthesis_failed",
                RuntimeEvent::SynthesisCancelled { .. } => "synthesis_cancelled",
            });
        }
        assert_eq!(
            kinds,
            vec![
                "turn_started",
                "intent_resolved",
                "tool_call",
                "tool_result",
                "turn_recorded",
                "synthesis_started",
                "synthesis_finished",
            ]
        );
    }

    #[tokio::test]
    async fn process_audio_requires_transcriber() {
        let orch = orchestrator();
        let err = orch
            .process_audio("u", Bytes::from_static(b"RIFF"))
            .await
            .unwrap_err();
        assert!(matches!(err, SpeechError::Stt(_)));
    }

    #[tokio::test]
    async fn submit_without_serve_loop_is_channel_error() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let err = submit(&tx, TurnRequest::new("u", "hi")).await.unwrap_err();
        assert!(matches!(err, SpeechError::Channel(_)));
    }

    #[test]
    fn turn_sink_copies_events_to_caller() {
        let (local, mut local_rx) = ChannelSink::channel();
        let (caller_tx, mut caller_rx) = mpsc::unbounded_channel();
        let mut sink = TurnSink {
            local,
            caller: Some(ChannelSink::new(caller_tx)),
        };
        sink.on_chunk(AudioChunk {
            request_id: "r".into(),
            sequence: 0,
            data: Bytes::from_static(b"ab"),
        });
        sink.on_flush("r");

        for rx in [&mut local_rx, &mut caller_rx] {
            assert!(matches!(rx.try_recv().unwrap(), SinkEvent::Chunk(_)));
            assert!(matches!(rx.try_recv().unwrap(), SinkEvent::Flush { .. }));
        }
    }

    #[tokio::test]
    async fn completed_audio_matches_report() {
        let orch = orchestrator();
        let outcome = orch.handle("u", "Hello there.").await.unwrap().unwrap();
        let audio = outcome.synthesis.audio().unwrap();
        assert_eq!(audio.request_id, outcome.request_id);
        assert_eq!(audio.data.len(), audio.byte_len);
        assert!(audio.chunks > 0);
    }
}
