use std::collections::HashMap;

use crate::context::ContextStore;
use crate::intent::IntentCandidate;

/// Delivery style hint for the external speaker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Default,
    Success,
    Notify,
    Calm,
    Supportive,
    Soft,
    Story,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Default => "default",
            Tone::Success => "success",
            Tone::Notify => "notify",
            Tone::Calm => "calm",
            Tone::Supportive => "supportive",
            Tone::Soft => "soft",
            Tone::Story => "story",
        }
    }
}

/// What a skill hands back: plain text, or text with a delivery hint.
#[derive(Debug, Clone, PartialEq)]
pub enum SkillResponse {
    Text(String),
    Structured { speak: String, tone: Option<Tone> },
}

impl SkillResponse {
    pub fn text(s: impl Into<String>) -> Self {
        SkillResponse::Text(s.into())
    }

    pub fn with_tone(s: impl Into<String>, tone: Tone) -> Self {
        SkillResponse::Structured {
            speak: s.into(),
            tone: Some(tone),
        }
    }

    pub fn speakable(&self) -> &str {
        match self {
            SkillResponse::Text(s) => s,
            SkillResponse::Structured { speak, .. } => speak,
        }
    }

    pub fn tone(&self) -> Option<Tone> {
        match self {
            SkillResponse::Text(_) => None,
            SkillResponse::Structured { tone, .. } => *tone,
        }
    }
}

/// A skill collaborator. `Ok(None)` means the skill had nothing to say;
/// errors from here are mandatory-stage errors and propagate.
pub trait SkillHandler: Send + Sync {
    fn handle(
        &self,
        intent: &IntentCandidate,
        text: &str,
        ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>>;
}

/// Routing seam, rebindable at runtime through the pipeline registry.
pub trait IntentRouter: Send + Sync {
    fn route(
        &self,
        intent: &IntentCandidate,
        text: &str,
        ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>>;
}

/// Dispatch table from intent name to skill handler.
pub struct CommandRouter {
    handlers: HashMap<String, Box<dyn SkillHandler>>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    pub fn register(&mut self, intent: &str, handler: Box<dyn SkillHandler>) {
        self.handlers.insert(intent.to_string(), handler);
    }

    pub fn knows(&self, intent: &str) -> bool {
        self.handlers.contains_key(intent)
    }
}

impl Default for CommandRouter {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentRouter for CommandRouter {
    fn route(
        &self,
        intent: &IntentCandidate,
        text: &str,
        ctx: &mut ContextStore,
    ) -> anyhow::Result<Option<SkillResponse>> {
        match self.handlers.get(&intent.intent) {
            Some(handler) => handler.handle(intent, text, ctx),
            None => Ok(None),
        }
    }
}

/// Phrases (across languages of phrasing) that mark a skill response as
/// "the lookup found nothing", downgrading the turn to `not_found`.
pub const FAILURE_MARKERS: &[&str] = &[
    "not found",
    "couldn't find",
    "could not find",
    "didn't understand",
    "no results",
    "nahi mila",
    "samajh nahi",
];

/// Case-insensitive scan applied to every collected response,
/// regardless of which stage produced it.
pub fn response_indicates_failure(text: &str) -> bool {
    let t = text.to_lowercase();
    FAILURE_MARKERS.iter().any(|m| t.contains(m))
}
