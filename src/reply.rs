//! Reply generation for utterances no tool handles.

use crate::config::ReplyPolicyKind;

/// Script used when the user sounds stressed or negative.
pub const CALMING_REPLY: &str = "I hear you. It sounds like you are stressed. Take three deep breaths with me. Inhale... Exhale... Would you like a short grounding exercise or a calming story?";
/// Script used when the user sounds happy.
pub const ENCOURAGING_REPLY: &str =
    "That's wonderful to hear! Tell me what's going well, I'm listening.";
/// Script used otherwise.
pub const OPEN_PROMPT_REPLY: &str =
    "Thanks for sharing. Can you tell me one thing that's on your mind right now?";

/// Everything a policy may look at when choosing a reply.
#[derive(Debug, Clone, Copy)]
pub struct ReplyContext<'a> {
    pub transcript: &'a str,
    pub emotion: &'a str,
    pub score: f32,
    /// Turns already recorded for this user.
    pub history_len: usize,
}

/// Produces the reply text for the fallback intent.
pub trait ReplyPolicy: Send + Sync {
    fn reply(&self, ctx: &ReplyContext<'_>) -> String;
}

/// Echoes the utterance back.
#[derive(Debug, Clone, Copy, Default)]
pub struct EchoReplyPolicy;

impl ReplyPolicy for EchoReplyPolicy {
    fn reply(&self, ctx: &ReplyContext<'_>) -> String {
        format!(
            "You said: '{}'. (This is a generic response as no tool was triggered.)",
            ctx.transcript
        )
    }
}

/// Chooses a scripted reply from the detected emotion.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmotionReplyPolicy;

impl ReplyPolicy for EmotionReplyPolicy {
    fn reply(&self, ctx: &ReplyContext<'_>) -> String {
        decide(ctx.emotion, ctx.score, ctx.history_len).to_owned()
    }
}

/// Three-way decision table, evaluated top to bottom.
///
/// `history_len` is accepted for policies that vary by conversation length;
/// the shipped table ignores it.
pub fn decide(emotion: &str, score: f32, _history_len: usize) -> &'static str {
    if emotion.contains("stressed") || score < 0.0 {
        CALMING_REPLY
    } else if emotion.contains("happy") {
        ENCOURAGING_REPLY
    } else {
        OPEN_PROMPT_REPLY
    }
}

/// Policy selected by configuration.
pub fn policy_for(kind: ReplyPolicyKind) -> Box<dyn ReplyPolicy> {
    match kind {
        ReplyPolicyKind::Echo => Box::new(EchoReplyPolicy),
        ReplyPolicyKind::Emotion => Box::new(EmotionReplyPolicy),
    }
}
