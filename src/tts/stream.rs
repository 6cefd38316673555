//! Streaming synthesis contract.
//!
//! A [`SpeechStream`] binds one [`SynthesisRequest`] to an [`AudioSink`] and
//! enforces the lifecycle
//! `Created → Initialized → Streaming → Flushed → Closed`, with `Failed` as
//! the error terminal. Backends drive the stream through
//! [`TtsBackend::synthesize`]; [`drive_to_completion`] is the single place a
//! turn waits for audio to finish.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::config::{AudioEncoding, TtsConfig};

/// Stable error codes for synthesis failures.
pub mod error_codes {
    /// The backend could not start the stream (auth, network, bad format).
    pub const SYNTHESIS_INIT_FAILED: &str = "SYNTHESIS_INIT_FAILED";

    /// The stream broke after audio started flowing.
    pub const SYNTHESIS_ABORTED: &str = "SYNTHESIS_ABORTED";

    /// The stream did not finish within the configured timeout.
    pub const SYNTHESIS_TIMEOUT: &str = "SYNTHESIS_TIMEOUT";

    /// The caller cancelled the stream.
    pub const SYNTHESIS_CANCELLED: &str = "SYNTHESIS_CANCELLED";

    /// A stream operation was attempted in the wrong state.
    pub const SYNTHESIS_INVALID_TRANSITION: &str = "SYNTHESIS_INVALID_TRANSITION";
}

/// Errors produced by a synthesis stream.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    /// The backend could not start the stream.
    #[error("[{}] {}", error_codes::SYNTHESIS_INIT_FAILED, .message)]
    Init { message: String, retryable: bool },

    /// The stream broke after audio started flowing.
    #[error("[{}] {}", error_codes::SYNTHESIS_ABORTED, .0)]
    Aborted(String),

    /// The stream did not finish in time.
    #[error(
        "[{}] synthesis did not finish within {:?}",
        error_codes::SYNTHESIS_TIMEOUT,
        .0
    )]
    Timeout(Duration),

    /// The caller cancelled the stream.
    #[error("[{}] synthesis cancelled", error_codes::SYNTHESIS_CANCELLED)]
    Cancelled,

    /// A stream operation was attempted in the wrong state.
    #[error(
        "[{}] cannot {} a stream in state {}",
        error_codes::SYNTHESIS_INVALID_TRANSITION,
        .op,
        .from
    )]
    InvalidTransition {
        from: StreamState,
        op: &'static str,
    },
}

impl SynthesisError {
    /// Retryable initialization failure.
    pub fn init(message: impl Into<String>) -> Self {
        Self::Init {
            message: message.into(),
            retryable: true,
        }
    }

    /// Initialization failure that will not go away on retry.
    pub fn init_permanent(message: impl Into<String>) -> Self {
        Self::Init {
            message: message.into(),
            retryable: false,
        }
    }

    /// Returns the stable error code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Init { .. } => error_codes::SYNTHESIS_INIT_FAILED,
            Self::Aborted(_) => error_codes::SYNTHESIS_ABORTED,
            Self::Timeout(_) => error_codes::SYNTHESIS_TIMEOUT,
            Self::Cancelled => error_codes::SYNTHESIS_CANCELLED,
            Self::InvalidTransition { .. } => error_codes::SYNTHESIS_INVALID_TRANSITION,
        }
    }

    /// Whether the same request may succeed if tried again.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Init { retryable, .. } => *retryable,
            Self::Aborted(_) | Self::Timeout(_) => true,
            Self::Cancelled | Self::InvalidTransition { .. } => false,
        }
    }
}

/// Lifecycle state of a [`SpeechStream`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamState {
    Created,
    Initialized,
    Streaming,
    Flushed,
    Closed,
    Failed,
}

impl StreamState {
    /// `Closed` and `Failed` accept no further operations.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Closed | Self::Failed)
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Created => "created",
            Self::Initialized => "initialized",
            Self::Streaming => "streaming",
            Self::Flushed => "flushed",
            Self::Closed => "closed",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Audio format, fixed for the lifetime of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: u16,
    pub encoding: AudioEncoding,
}

impl StreamFormat {
    pub fn mime_type(&self) -> &'static str {
        self.encoding.mime_type()
    }
}

/// Voice parameters of a synthesis request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceConfig {
    pub sample_rate: u32,
    pub channels: u16,
    pub encoding: AudioEncoding,
    pub voice_id: String,
    pub style: String,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        TtsConfig::default().voice_config()
    }
}

impl VoiceConfig {
    /// The stream format this voice asks for.
    pub fn format(&self) -> StreamFormat {
        StreamFormat {
            sample_rate: self.sample_rate,
            channels: self.channels,
            encoding: self.encoding,
        }
    }
}

/// Text plus voice, ready to hand to a backend. Building one does no I/O.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesisRequest {
    pub request_id: String,
    pub text: String,
    pub voice: VoiceConfig,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>, voice: VoiceConfig) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            text: text.into(),
            voice,
        }
    }
}

/// One buffer of synthesized audio.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioChunk {
    pub request_id: String,
    /// Position within the stream, starting at 0.
    pub sequence: u64,
    pub data: Bytes,
}

/// Consumer of stream output. Chunks are handed over by value.
pub trait AudioSink: Send {
    fn on_start(&mut self, request_id: &str, format: StreamFormat);
    fn on_chunk(&mut self, chunk: AudioChunk);
    fn on_flush(&mut self, request_id: &str);
}

/// Event forwarded by [`ChannelSink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Start {
        request_id: String,
        format: StreamFormat,
    },
    Chunk(AudioChunk),
    Flush {
        request_id: String,
    },
}

/// Sink forwarding every event over an unbounded channel.
///
/// Events sent after the receiver is dropped are discarded.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<SinkEvent>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::UnboundedSender<SinkEvent>) -> Self {
        Self { tx }
    }

    /// Sink plus the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<SinkEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self::new(tx), rx)
    }
}

impl AudioSink for ChannelSink {
    fn on_start(&mut self, request_id: &str, format: StreamFormat) {
        let _ = self.tx.send(SinkEvent::Start {
            request_id: request_id.to_owned(),
            format,
        });
    }

    fn on_chunk(&mut self, chunk: AudioChunk) {
        let _ = self.tx.send(SinkEvent::Chunk(chunk));
    }

    fn on_flush(&mut self, request_id: &str) {
        let _ = self.tx.send(SinkEvent::Flush {
            request_id: request_id.to_owned(),
        });
    }
}

/// A single synthesis stream.
pub struct SpeechStream {
    request: SynthesisRequest,
    sink: Box<dyn AudioSink>,
    state: StreamState,
    format: Option<StreamFormat>,
    next_sequence: u64,
    bytes_emitted: usize,
    failure: Option<String>,
}

impl fmt::Debug for SpeechStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechStream")
            .field("request_id", &self.request.request_id)
            .field("state", &self.state)
            .field("format", &self.format)
            .field("chunks_emitted", &self.next_sequence)
            .field("bytes_emitted", &self.bytes_emitted)
            .finish()
    }
}

impl SpeechStream {
    /// Bind a request to a sink. No I/O happens until a backend runs.
    pub fn new(request: SynthesisRequest, sink: Box<dyn AudioSink>) -> Self {
        Self {
            request,
            sink,
            state: StreamState::Created,
            format: None,
            next_sequence: 0,
            bytes_emitted: 0,
            failure: None,
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request.request_id
    }

    pub fn text(&self) -> &str {
        &self.request.text
    }

    pub fn voice(&self) -> &VoiceConfig {
        &self.request.voice
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    /// Format negotiated by [`initialize`](Self::initialize), if any.
    pub fn format(&self) -> Option<StreamFormat> {
        self.format
    }

    pub fn chunks_emitted(&self) -> u64 {
        self.next_sequence
    }

    pub fn bytes_emitted(&self) -> usize {
        self.bytes_emitted
    }

    /// Reason given to [`fail`](Self::fail), if the stream failed.
    pub fn failure(&self) -> Option<&str> {
        self.failure.as_deref()
    }

    fn invalid(&self, op: &'static str) -> SynthesisError {
        SynthesisError::InvalidTransition {
            from: self.state,
            op,
        }
    }

    /// `Created → Initialized`; announces the format to the sink.
    pub fn initialize(&mut self, format: StreamFormat) -> Result<(), SynthesisError> {
        if self.state != StreamState::Created {
            return Err(self.invalid("initialize"));
        }
        self.sink.on_start(&self.request.request_id, format);
        self.format = Some(format);
        self.state = StreamState::Initialized;
        Ok(())
    }

    /// Emit one chunk. Empty buffers are ignored.
    pub fn push(&mut self, data: Bytes) -> Result<(), SynthesisError> {
        if !matches!(
            self.state,
            StreamState::Initialized | StreamState::Streaming
        ) {
            return Err(self.invalid("push"));
        }
        if data.is_empty() {
            return Ok(());
        }
        self.bytes_emitted += data.len();
        self.sink.on_chunk(AudioChunk {
            request_id: self.request.request_id.clone(),
            sequence: self.next_sequence,
            data,
        });
        self.next_sequence += 1;
        self.state = StreamState::Streaming;
        Ok(())
    }

    /// Signal that no more audio follows.
    pub fn flush(&mut self) -> Result<(), SynthesisError> {
        if !matches!(
            self.state,
            StreamState::Initialized | StreamState::Streaming
        ) {
            return Err(self.invalid("flush"));
        }
        self.sink.on_flush(&self.request.request_id);
        self.state = StreamState::Flushed;
        Ok(())
    }

    /// Move to `Closed`. Idempotent; a failed stream stays failed.
    pub fn close(&mut self) {
        if self.state != StreamState::Failed {
            self.state = StreamState::Closed;
        }
    }

    /// Move a live stream to `Failed`.
    pub fn fail(&mut self, reason: impl Into<String>) -> Result<(), SynthesisError> {
        if self.state.is_terminal() {
            return Err(self.invalid("fail"));
        }
        self.failure = Some(reason.into());
        self.state = StreamState::Failed;
        Ok(())
    }
}

/// Streaming text-to-speech service.
///
/// Implementations call [`SpeechStream::initialize`] once the remote side
/// accepted the request, then [`SpeechStream::push`] per buffer, and may call
/// [`SpeechStream::flush`] at the end.
#[async_trait]
pub trait TtsBackend: Send + Sync {
    /// Short backend name for logs.
    fn provider(&self) -> &str;

    /// Produce audio for `stream`'s text.
    ///
    /// # Errors
    ///
    /// Returns a [`SynthesisError`] when the service cannot start or breaks
    /// mid-stream.
    async fn synthesize(&self, stream: &mut SpeechStream) -> Result<(), SynthesisError>;
}

/// Summary of a completed stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StreamReport {
    pub request_id: String,
    pub format: StreamFormat,
    pub chunks: u64,
    pub bytes: usize,
}

enum Drive {
    Finished(Result<(), SynthesisError>),
    TimedOut,
    Cancelled,
}

/// Run `backend` against `stream` until it is closed, fails, times out or is
/// cancelled.
///
/// On success the stream is flushed (if the backend did not) and closed.
///
/// # Errors
///
/// * [`SynthesisError::Init`] when the backend fails or returns before
///   initializing the stream.
/// * [`SynthesisError::Aborted`] when the backend fails after initializing.
/// * [`SynthesisError::Timeout`] when `timeout` elapses; the stream is failed.
/// * [`SynthesisError::Cancelled`] when `cancel` fires; the stream is closed.
pub async fn drive_to_completion(
    backend: &dyn TtsBackend,
    stream: &mut SpeechStream,
    cancel: &CancellationToken,
    timeout: Duration,
) -> Result<StreamReport, SynthesisError> {
    let outcome = {
        let synthesis = backend.synthesize(stream);
        tokio::select! {
            biased;
            () = cancel.cancelled() => Drive::Cancelled,
            result = tokio::time::timeout(timeout, synthesis) => match result {
                Ok(result) => Drive::Finished(result),
                Err(_) => Drive::TimedOut,
            },
        }
    };

    match outcome {
        Drive::Cancelled => {
            stream.close();
            Err(SynthesisError::Cancelled)
        }
        Drive::TimedOut => {
            let _ = stream.fail("timed out");
            Err(SynthesisError::Timeout(timeout))
        }
        Drive::Finished(Err(err)) => Err(fail_stream(stream, err)),
        Drive::Finished(Ok(())) => finish_stream(stream),
    }
}

fn fail_stream(stream: &mut SpeechStream, err: SynthesisError) -> SynthesisError {
    let started = stream.format().is_some();
    let _ = stream.fail(err.to_string());
    if matches!(err, SynthesisError::Init { .. } | SynthesisError::Aborted(_)) {
        err
    } else if started {
        SynthesisError::Aborted(err.to_string())
    } else {
        SynthesisError::Init {
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

fn finish_stream(stream: &mut SpeechStream) -> Result<StreamReport, SynthesisError> {
    match stream.state() {
        StreamState::Created => {
            let _ = stream.fail("backend returned without starting the stream");
            return Err(SynthesisError::init_permanent(format!(
                "backend returned without starting stream {}",
                stream.request_id()
            )));
        }
        StreamState::Failed => {
            let reason = stream.failure().unwrap_or("stream failed").to_owned();
            return Err(SynthesisError::Aborted(reason));
        }
        StreamState::Initialized | StreamState::Streaming => stream.flush()?,
        StreamState::Flushed | StreamState::Closed => {}
    }
    stream.close();

    let format = stream
        .format()
        .ok_or_else(|| SynthesisError::Aborted("stream closed without a format".into()))?;
    Ok(StreamReport {
        request_id: stream.request_id().to_owned(),
        format,
        chunks: stream.chunks_emitted(),
        bytes: stream.bytes_emitted(),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;

    fn request(text: &str) -> SynthesisRequest {
        SynthesisRequest::new(text, VoiceConfig::default())
    }

    fn stream_with_channel(
        text: &str,
    ) -> (SpeechStream, mpsc::UnboundedReceiver<SinkEvent>) {
        let (sink, rx) = ChannelSink::channel();
        (SpeechStream::new(request(text), Box::new(sink)), rx)
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<SinkEvent>) -> Vec<SinkEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    struct ScriptedBackend {
        chunks: Vec<&'static [u8]>,
        flush: bool,
        fail_before_init: bool,
        fail_after_init: bool,
        skip_init: bool,
        delay: Duration,
    }

    impl Default for ScriptedBackend {
        fn default() -> Self {
            Self {
                chunks: vec![b"ab", b"cd"],
                flush: false,
                fail_before_init: false,
                fail_after_init: false,
                skip_init: false,
                delay: Duration::ZERO,
            }
        }
    }

    #[async_trait]
    impl TtsBackend for ScriptedBackend {
        fn provider(&self) -> &str {
            "scripted"
        }

        async fn synthesize(&self, stream: &mut SpeechStream) -> Result<(), SynthesisError> {
            if self.fail_before_init {
                return Err(SynthesisError::init_permanent("auth rejected"));
            }
            if self.skip_init {
                return Ok(());
            }
            stream.initialize(stream.voice().format())?;
            for chunk in &self.chunks {
                if !self.delay.is_zero() {
                    tokio::time::sleep(self.delay).await;
                }
                stream.push(Bytes::from_static(chunk))?;
            }
            if self.fail_after_init {
                return Err(SynthesisError::Aborted("connection reset".into()));
            }
            if self.flush {
                stream.flush()?;
            }
            Ok(())
        }
    }

    #[test]
    fn request_ids_are_unique() {
        assert_ne!(request("a").request_id, request("a").request_id);
    }

    #[test]
    fn lifecycle_reaches_flushed_then_closed() {
        let (mut stream, mut rx) = stream_with_channel("hello");
        assert_eq!(stream.state(), StreamState::Created);

        stream.initialize(VoiceConfig::default().format()).unwrap();
        assert_eq!(stream.state(), StreamState::Initialized);
        stream.push(Bytes::from_static(b"\x00\x01")).unwrap();
        stream.push(Bytes::from_static(b"\x02\x03")).unwrap();
        assert_eq!(stream.state(), StreamState::Streaming);
        stream.flush().unwrap();
        assert_eq!(stream.state(), StreamState::Flushed);
        stream.close();
        assert_eq!(stream.state(), StreamState::Closed);

        let events = drain(&mut rx);
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], SinkEvent::Start { .. }));
        match (&events[1], &events[2]) {
            (SinkEvent::Chunk(a), SinkEvent::Chunk(b)) => {
                assert_eq!((a.sequence, b.sequence), (0, 1));
                assert_eq!(a.request_id, stream.request_id());
            }
            other => panic!("unexpected events {other:?}"),
        }
        assert!(matches!(events[3], SinkEvent::Flush { .. }));
        assert_eq!(stream.bytes_emitted(), 4);
    }

    #[test]
    fn close_is_idempotent() {
        let (mut stream, _rx) = stream_with_channel("x");
        stream.close();
        stream.close();
        assert_eq!(stream.state(), StreamState::Closed);
    }

    #[test]
    fn failed_stream_stays_failed_on_close() {
        let (mut stream, _rx) = stream_with_channel("x");
        stream.fail("boom").unwrap();
        stream.close();
        assert_eq!(stream.state(), StreamState::Failed);
        assert_eq!(stream.failure(), Some("boom"));
        assert!(stream.fail("again").is_err());
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        let (mut stream, _rx) = stream_with_channel("x");
        let err = stream.push(Bytes::from_static(b"a")).unwrap_err();
        assert_eq!(
            err,
            SynthesisError::InvalidTransition {
                from: StreamState::Created,
                op: "push"
            }
        );
        assert!(stream.flush().is_err());

        stream.initialize(VoiceConfig::default().format()).unwrap();
        assert!(stream.initialize(VoiceConfig::default().format()).is_err());
        stream.flush().unwrap();
        assert!(stream.push(Bytes::from_static(b"a")).is_err());
        assert!(stream.flush().is_err());
    }

    #[test]
    fn empty_push_emits_nothing() {
        let (mut stream, mut rx) = stream_with_channel("x");
        stream.initialize(VoiceConfig::default().format()).unwrap();
        stream.push(Bytes::new()).unwrap();
        assert_eq!(stream.state(), StreamState::Initialized);
        assert_eq!(drain(&mut rx).len(), 1);
    }

    #[test]
    fn error_codes_and_retryability() {
        assert_eq!(SynthesisError::init("x").code(), "SYNTHESIS_INIT_FAILED");
        assert!(SynthesisError::init("x").is_retryable());
        assert!(!SynthesisError::init_permanent("x").is_retryable());
        assert!(SynthesisError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(!SynthesisError::Cancelled.is_retryable());
        assert_eq!(SynthesisError::Cancelled.code(), "SYNTHESIS_CANCELLED");
        assert!(
            SynthesisError::Cancelled
                .to_string()
                .starts_with("[SYNTHESIS_CANCELLED]")
        );
    }

    #[tokio::test]
    async fn drive_flushes_and_closes() {
        let (mut stream, mut rx) = stream_with_channel("hello");
        let report = drive_to_completion(
            &ScriptedBackend::default(),
            &mut stream,
            &CancellationToken::new(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();

        assert_eq!(stream.state(), StreamState::Closed);
        assert_eq!(report.chunks, 2);
        assert_eq!(report.bytes, 4);
        assert_eq!(report.format, VoiceConfig::default().format());
        let events = drain(&mut rx);
        assert!(matches!(events.last(), Some(SinkEvent::Flush { .. })));
    }

    #[tokio::test]
    async fn drive_accepts_backend_that_flushes() {
        let (mut stream, mut rx) = stream_with_channel("hello");
        let backend = ScriptedBackend {
            flush: true,
            ..ScriptedBackend::default()
        };
        drive_to_completion(
            &backend,
            &mut stream,
            &CancellationToken::new(),
            Duration::from_secs(5),
        )
        .await
        .unwrap();
        let flushes = drain(&mut rx)
            .into_iter()
            .filter(|e| matches!(e, SinkEvent::Flush { .. }))
            .count();
        assert_eq!(flushes, 1);
    }

    #[tokio::test]
    async fn failure_before_init_is_init_error() {
        let (mut stream, _rx) = stream_with_channel("hello");
        let backend = ScriptedBackend {
            fail_before_init: true,
            ..ScriptedBackend::default()
        };
        let err = drive_to_completion(
            &backend,
            &mut stream,
            &CancellationToken::new(),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SynthesisError::Init { .. }));
        assert_eq!(stream.state(), StreamState::Failed);
    }

    #[tokio::test]
    async fn failure_after_init_is_aborted() {
        let (mut stream, _rx) = stream_with_channel("hello");
        let backend = ScriptedBackend {
            fail_after_init: true,
            ..ScriptedBackend::default()
        };
        let err = drive_to_completion(
            &backend,
            &mut stream,
            &CancellationToken::new(),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SynthesisError::Aborted(_)));
        assert_eq!(stream.state(), StreamState::Failed);
    }

    #[tokio::test]
    async fn backend_that_never_initializes_is_init_error() {
        let (mut stream, _rx) = stream_with_channel("hello");
        let backend = ScriptedBackend {
            skip_init: true,
            ..ScriptedBackend::default()
        };
        let err = drive_to_completion(
            &backend,
            &mut stream,
            &CancellationToken::new(),
            Duration::from_secs(5),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, SynthesisError::Init { retryable: false, .. }));
    }

    #[tokio::test]
    async fn cancellation_closes_stream() {
        let (mut stream, _rx) = stream_with_channel("hello");
        let backend = ScriptedBackend {
            delay: Duration::from_secs(30),
            ..ScriptedBackend::default()
        };
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = drive_to_completion(&backend, &mut stream, &cancel, Duration::from_secs(60))
            .await
            .unwrap_err();
        assert_eq!(err, SynthesisError::Cancelled);
        assert_eq!(stream.state(), StreamState::Closed);
    }

    #[tokio::test]
    async fn timeout_fails_stream() {
        let (mut stream, _rx) = stream_with_channel("hello");
        let backend = ScriptedBackend {
            delay: Duration::from_secs(30),
            ..ScriptedBackend::default()
        };
        let err = drive_to_completion(
            &backend,
            &mut stream,
            &CancellationToken::new(),
            Duration::from_millis(20),
        )
        .await
        .unwrap_err();
        assert_eq!(err, SynthesisError::Timeout(Duration::from_millis(20)));
        assert_eq!(stream.state(), StreamState::Failed);
    }
}
