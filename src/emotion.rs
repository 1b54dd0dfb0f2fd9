pub const USER_EMOTION_KEY: &str = "user_emotion";

/// Lightweight tone signal. Does not replace intent detection; only the
/// driver's tone selection consumes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Emotion {
    Angry,
    Frustrated,
    Sleepy,
    Neutral,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Emotion::Angry => "angry",
            Emotion::Frustrated => "frustrated",
            Emotion::Sleepy => "sleepy",
            Emotion::Neutral => "neutral",
        }
    }
}

/// PURE FUNCTION: text -> emotion. Never fails, never touches context.
pub fn detect_emotion(text: &str) -> Emotion {
    let t = text.to_lowercase();
    let has = |words: &[&str]| words.iter().any(|w| t.contains(w));

    if has(&["angry", "furious", "hate", "stupid", "useless", "shut up"]) {
        Emotion::Angry
    } else if has(&["not working", "why won't", "again and again", "frustrated", "annoying", "fed up"]) {
        Emotion::Frustrated
    } else if has(&["sleepy", "tired", "sleep", "good night", "yawn", "exhausted"]) {
        Emotion::Sleepy
    } else {
        Emotion::Neutral
    }
}
