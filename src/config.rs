//! Configuration types for the orchestration core.

use crate::error::{Result, SpeechError};
use crate::tts::VoiceConfig;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Sample rates accepted by the synthesis backends.
pub const SUPPORTED_SAMPLE_RATES: &[u32] = &[8_000, 16_000, 22_050, 24_000, 44_100, 48_000];

/// Environment variable overriding [`TtsConfig::api_key`].
pub const ENV_TTS_API_KEY: &str = "PARLEY_TTS_API_KEY";

/// Environment variable overriding [`TtsConfig::api_url`].
pub const ENV_TTS_API_URL: &str = "PARLEY_TTS_API_URL";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParleyConfig {
    /// Speech synthesis settings.
    pub tts: TtsConfig,
    /// Reply generation when no tool is triggered.
    pub reply: ReplyConfig,
    /// Conversation history retention.
    pub memory: MemoryConfig,
    /// Log output settings.
    pub logging: LoggingConfig,
}

/// Which synthesis backend to use.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsProvider {
    /// Deterministic in-process backend emitting PCM silence.
    #[default]
    Local,
    /// Remote streaming synthesis over HTTP.
    Http,
}

/// Audio encoding of a synthesis stream.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioEncoding {
    /// Raw signed 16-bit little-endian PCM.
    #[default]
    Pcm16,
    /// MPEG layer III.
    Mp3,
    /// RIFF/WAVE container.
    Wav,
}

impl AudioEncoding {
    /// MIME type announced to sinks.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Pcm16 => "audio/pcm",
            Self::Mp3 => "audio/mpeg",
            Self::Wav => "audio/wav",
        }
    }

    /// Format name sent to remote synthesis APIs.
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::Pcm16 => "PCM",
            Self::Mp3 => "MP3",
            Self::Wav => "WAV",
        }
    }
}

/// Text-to-speech configuration.
///
/// Every option a synthesis backend recognizes is enumerated here with a
/// default; [`ParleyConfig::validate`] checks the combination.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    /// Backend selection.
    pub provider: TtsProvider,
    /// Streaming endpoint (HTTP provider only).
    pub api_url: String,
    /// API key (HTTP provider only).
    pub api_key: String,
    /// Synthesis model name.
    pub model: String,
    /// Voice identifier.
    pub voice: String,
    /// Default speaking style.
    pub style: String,
    /// Output sample rate in Hz.
    pub sample_rate: u32,
    /// Output channel count (1 = mono).
    pub channels: u16,
    /// Output encoding.
    pub encoding: AudioEncoding,
    /// Upper bound for a single synthesis stream, in seconds.
    pub timeout_secs: u64,
    /// Pick the speaking style from the detected emotion instead of `style`.
    pub emotion_styles: bool,
    /// Delay between chunks for the local backend (ms). Useful to exercise
    /// cancellation against a slow stream.
    pub chunk_delay_ms: u64,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            provider: TtsProvider::default(),
            api_url: "https://api.murf.ai/v1/speech/stream".to_owned(),
            api_key: String::new(),
            model: "FALCON".to_owned(),
            voice: "en-US-matthew".to_owned(),
            style: "Conversation".to_owned(),
            sample_rate: 24_000,
            channels: 1,
            encoding: AudioEncoding::default(),
            timeout_secs: 10,
            emotion_styles: false,
            chunk_delay_ms: 0,
        }
    }
}

impl fmt::Debug for TtsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let api_key = if self.api_key.is_empty() {
            ""
        } else {
            "[REDACTED]"
        };
        f.debug_struct("TtsConfig")
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("api_key", &api_key)
            .field("model", &self.model)
            .field("voice", &self.voice)
            .field("style", &self.style)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .field("encoding", &self.encoding)
            .field("timeout_secs", &self.timeout_secs)
            .field("emotion_styles", &self.emotion_styles)
            .field("chunk_delay_ms", &self.chunk_delay_ms)
            .finish()
    }
}

impl TtsConfig {
    /// Voice settings for a synthesis request using the configured style.
    pub fn voice_config(&self) -> VoiceConfig {
        self.voice_config_with_style(&self.style)
    }

    /// Voice settings for a synthesis request with an explicit style.
    pub fn voice_config_with_style(&self, style: &str) -> VoiceConfig {
        VoiceConfig {
            sample_rate: self.sample_rate,
            channels: self.channels,
            encoding: self.encoding,
            voice_id: self.voice.clone(),
            style: style.to_owned(),
        }
    }
}

/// Reply strategy used when no tool handles the utterance.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplyPolicyKind {
    /// Acknowledge the utterance by echoing it back.
    #[default]
    Echo,
    /// Scripted replies chosen from the detected emotion.
    Emotion,
}

/// Reply generation configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ReplyConfig {
    /// Active reply policy.
    pub policy: ReplyPolicyKind,
}

/// Conversation history configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryConfig {
    /// Maximum turns retained per user; oldest are evicted first.
    ///
    /// 0 keeps every turn for the lifetime of the process.
    pub max_turns_per_user: usize,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub level: String,
    /// Directory for daily rolling log files (stderr only when `None`).
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "parley=info".to_owned(),
            log_dir: None,
        }
    }
}

impl ParleyConfig {
    /// Load configuration from a TOML file, falling back to defaults for missing fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| SpeechError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| SpeechError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path: `~/.config/parley/config.toml`.
    pub fn default_config_path() -> PathBuf {
        if let Some(config) = std::env::var_os("XDG_CONFIG_HOME") {
            PathBuf::from(config).join("parley").join("config.toml")
        } else if let Some(home) = std::env::var_os("HOME") {
            PathBuf::from(home)
                .join(".config")
                .join("parley")
                .join("config.toml")
        } else {
            PathBuf::from("/tmp/parley-config/config.toml")
        }
    }

    /// Overlay secrets and endpoints from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides_from(|key| std::env::var(key).ok());
    }

    /// Overlay values returned by `lookup` for the recognized variables.
    pub fn apply_overrides_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(ENV_TTS_API_KEY).filter(|v| !v.trim().is_empty()) {
            self.tts.api_key = key.trim().to_owned();
        }
        if let Some(url) = lookup(ENV_TTS_API_URL).filter(|v| !v.trim().is_empty()) {
            self.tts.api_url = url.trim().to_owned();
        }
    }

    /// Check option ranges and provider requirements.
    ///
    /// # Errors
    ///
    /// Returns [`SpeechError::Config`] naming the first invalid option.
    pub fn validate(&self) -> Result<()> {
        let tts = &self.tts;
        if !SUPPORTED_SAMPLE_RATES.contains(&tts.sample_rate) {
            return Err(SpeechError::Config(format!(
                "tts.sample_rate {} is not supported (expected one of {:?})",
                tts.sample_rate, SUPPORTED_SAMPLE_RATES
            )));
        }
        if !(1..=2).contains(&tts.channels) {
            return Err(SpeechError::Config(format!(
                "tts.channels must be 1 or 2, got {}",
                tts.channels
            )));
        }
        if tts.timeout_secs == 0 {
            return Err(SpeechError::Config(
                "tts.timeout_secs must be greater than 0".into(),
            ));
        }
        if tts.voice.trim().is_empty() {
            return Err(SpeechError::Config("tts.voice must not be empty".into()));
        }
        if tts.provider == TtsProvider::Local && tts.encoding != AudioEncoding::Pcm16 {
            return Err(SpeechError::Config(
                "tts.encoding must be pcm16 for the local provider".into(),
            ));
        }
        if tts.provider == TtsProvider::Http {
            if tts.api_url.trim().is_empty() {
                return Err(SpeechError::Config(
                    "tts.api_url is required for the http provider".into(),
                ));
            }
            if tts.api_key.trim().is_empty() {
                return Err(SpeechError::Config(format!(
                    "tts.api_key is required for the http provider (or set {ENV_TTS_API_KEY})"
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = ParleyConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tts.provider, TtsProvider::Local);
        assert_eq!(config.reply.policy, ReplyPolicyKind::Echo);
        assert_eq!(config.memory.max_turns_per_user, 0);
    }

    #[test]
    fn save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = ParleyConfig::default();
        config.tts.sample_rate = 44_100;
        config.tts.voice = "en-IN-anisha".to_owned();
        config.reply.policy = ReplyPolicyKind::Emotion;
        config.memory.max_turns_per_user = 20;

        config.save_to_file(&path).unwrap();
        let loaded = ParleyConfig::from_file(&path).unwrap();
        assert_eq!(loaded.tts.sample_rate, 44_100);
        assert_eq!(loaded.tts.voice, "en-IN-anisha");
        assert_eq!(loaded.reply.policy, ReplyPolicyKind::Emotion);
        assert_eq!(loaded.memory.max_turns_per_user, 20);
    }

    #[test]
    fn from_file_nonexistent_returns_error() {
        let result = ParleyConfig::from_file(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn from_file_invalid_toml_returns_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        let result = ParleyConfig::from_file(&path);
        assert!(matches!(result, Err(SpeechError::Config(_))));
    }

    #[test]
    fn partial_toml_uses_defaults() {
        let config: ParleyConfig = toml::from_str(
            r#"
            [tts]
            provider = "http"
            encoding = "mp3"

            [reply]
            policy = "emotion"
            "#,
        )
        .unwrap();
        assert_eq!(config.tts.provider, TtsProvider::Http);
        assert_eq!(config.tts.encoding, AudioEncoding::Mp3);
        assert_eq!(config.tts.sample_rate, 24_000);
        assert_eq!(config.reply.policy, ReplyPolicyKind::Emotion);
        assert_eq!(config.logging.level, "parley=info");
    }

    #[test]
    fn unsupported_sample_rate_is_rejected() {
        let mut config = ParleyConfig::default();
        config.tts.sample_rate = 12_345;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("tts.sample_rate"));
    }

    #[test]
    fn channel_count_is_bounded() {
        let mut config = ParleyConfig::default();
        config.tts.channels = 0;
        assert!(config.validate().is_err());
        config.tts.channels = 3;
        assert!(config.validate().is_err());
        config.tts.channels = 2;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn local_provider_requires_pcm16() {
        let mut config = ParleyConfig::default();
        config.tts.encoding = AudioEncoding::Mp3;
        assert!(config.validate().is_err());
        config.tts.provider = TtsProvider::Http;
        config.tts.api_key = "secret".to_owned();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let mut config = ParleyConfig::default();
        config.tts.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn http_provider_requires_key() {
        let mut config = ParleyConfig::default();
        config.tts.provider = TtsProvider::Http;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("api_key"));

        config.tts.api_key = "secret".to_owned();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn env_overrides_fill_secrets() {
        let mut config = ParleyConfig::default();
        config.apply_overrides_from(|key| match key {
            ENV_TTS_API_KEY => Some(" key-123 ".to_owned()),
            ENV_TTS_API_URL => Some("http://localhost:9000/stream".to_owned()),
            _ => None,
        });
        assert_eq!(config.tts.api_key, "key-123");
        assert_eq!(config.tts.api_url, "http://localhost:9000/stream");
    }

    #[test]
    fn blank_env_values_are_ignored() {
        let mut config = ParleyConfig::default();
        config.tts.api_key = "from-file".to_owned();
        config.apply_overrides_from(|_| Some("   ".to_owned()));
        assert_eq!(config.tts.api_key, "from-file");
    }

    #[test]
    fn debug_redacts_api_key() {
        let config = TtsConfig {
            api_key: "super-secret".to_owned(),
            ..TtsConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn voice_config_carries_stream_format() {
        let config = TtsConfig::default();
        let voice = config.voice_config_with_style("soft");
        assert_eq!(voice.sample_rate, 24_000);
        assert_eq!(voice.channels, 1);
        assert_eq!(voice.encoding, AudioEncoding::Pcm16);
        assert_eq!(voice.voice_id, "en-US-matthew");
        assert_eq!(voice.style, "soft");
    }

    #[test]
    fn default_config_path_ends_with_config_toml() {
        let path = ParleyConfig::default_config_path();
        let path_str = path.to_string_lossy();
        assert!(path_str.ends_with("config.toml"));
        assert!(path_str.contains("parley"));
    }
}
