use thiserror::Error;

/// Canonical working language of the pipeline. All downstream stages
/// (detection, reasoning, routing) operate on text in this language.
pub const WORKING_LANGUAGE: &str = "en";

#[derive(Debug, Error)]
pub enum LanguageError {
    /// Translation was attempted but returned the input unchanged.
    /// This is a hard failure, distinct from "already English".
    #[error("translation made no progress for '{lang}' input")]
    TranslationStalled { lang: String },
}

pub trait LanguageDetector: Send {
    /// Returns a language tag, e.g. "en" or "hi".
    fn detect(&self, text: &str) -> String;
}

pub trait Translator: Send {
    /// Translates `text` from `lang` into the working language.
    /// Contract: returning the input unchanged signals failure.
    fn to_english(&self, text: &str, lang: &str) -> String;
}

/// Script + stopword heuristic. Stands in for an external detection
/// service; good enough for Devanagari and romanized Hindi.
pub struct HeuristicDetector;

const HINDI_STOPWORDS: &[&str] = &[
    "kya", "hai", "hain", "nahi", "karo", "mera", "meri", "aaj", "kal",
    "kitni", "kitna", "hua", "dikhao", "mujhe", "tarikh", "bolo", "chalao",
    "kholo", "wahi", "dubara", "kuch", "bhi", "kyun", "nind", "jaga",
    "dena", "batao", "suno", "acha", "theek", "haan", "samay", "gana",
];

impl LanguageDetector for HeuristicDetector {
    fn detect(&self, text: &str) -> String {
        if text.chars().any(|c| ('\u{0900}'..='\u{097F}').contains(&c)) {
            return "hi".to_string();
        }
        let lowered = text.to_lowercase();
        let hindi_hits = lowered
            .split_whitespace()
            .filter(|w| HINDI_STOPWORDS.contains(w))
            .count();
        if hindi_hits >= 1 {
            "hi".to_string()
        } else {
            WORKING_LANGUAGE.to_string()
        }
    }
}

/// Word-map translator for romanized Hindi. Stands in for an external
/// translation service; unknown words pass through unchanged, which
/// exercises the stall contract end to end.
pub struct DictionaryTranslator;

const PHRASES: &[(&str, &str)] = &[
    ("kuch nahi", "nothing"),
    ("phir se", "again"),
    ("jaga dena", "wake me"),
];

const WORDS: &[(&str, &str)] = &[
    ("kya", "what"),
    ("hai", "is"),
    ("hain", "are"),
    ("hua", "happened"),
    ("nahi", "not"),
    ("karo", "do"),
    ("mera", "my"),
    ("meri", "my"),
    ("aaj", "today"),
    ("kal", "tomorrow"),
    ("ki", "of"),
    ("ka", "of"),
    ("kitni", "how much"),
    ("kitna", "how much"),
    ("dikhao", "show"),
    ("mujhe", "me"),
    ("tarikh", "date"),
    ("din", "day"),
    ("samay", "time"),
    ("bolo", "say"),
    ("batao", "tell"),
    ("suno", "listen"),
    ("gana", "song"),
    ("chalao", "play"),
    ("band", "off"),
    ("kholo", "open"),
    ("wahi", "that same"),
    ("dubara", "again"),
    ("abhi", "now"),
    ("thoda", "a little"),
    ("acha", "good"),
    ("theek", "okay"),
    ("haan", "yes"),
    ("nind", "sleep"),
    ("jaga", "wake"),
    ("dena", "give"),
];

impl Translator for DictionaryTranslator {
    fn to_english(&self, text: &str, _lang: &str) -> String {
        let mut working = text.to_lowercase();
        for (phrase, english) in PHRASES {
            if working.contains(phrase) {
                working = working.replace(phrase, english);
            }
        }
        working
            .split_whitespace()
            .map(|w| {
                WORDS
                    .iter()
                    .find(|(hindi, _)| *hindi == w)
                    .map(|(_, english)| *english)
                    .unwrap_or(w)
            })
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Detect + translate front of the pipeline.
pub struct LanguageNormalizer {
    detector: Box<dyn LanguageDetector>,
    translator: Box<dyn Translator>,
}

impl LanguageNormalizer {
    pub fn new() -> Self {
        Self::with_parts(Box::new(HeuristicDetector), Box::new(DictionaryTranslator))
    }

    pub fn with_parts(detector: Box<dyn LanguageDetector>, translator: Box<dyn Translator>) -> Self {
        Self { detector, translator }
    }

    /// Returns (normalized text, detected language tag).
    ///
    /// Working-language input passes through untouched. For anything
    /// else the translator runs, and an unchanged result is a stall:
    /// the orchestrator must end the turn with a retry request.
    pub fn normalize(&self, text: &str) -> Result<(String, String), LanguageError> {
        let lang = self.detector.detect(text);
        if lang == WORKING_LANGUAGE {
            return Ok((text.to_string(), lang));
        }
        let translated = self.translator.to_english(text, &lang);
        if translated == text {
            return Err(LanguageError::TranslationStalled { lang });
        }
        Ok((translated, lang))
    }
}

impl Default for LanguageNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_passes_through() {
        let norm = LanguageNormalizer::new();
        let (text, lang) = norm.normalize("what is the time").unwrap();
        assert_eq!(lang, "en");
        assert_eq!(text, "what is the time");
    }

    #[test]
    fn romanized_hindi_is_translated() {
        let norm = LanguageNormalizer::new();
        let (text, lang) = norm.normalize("battery kitni hai").unwrap();
        assert_eq!(lang, "hi");
        assert!(text.contains("battery"), "got: {text}");
        assert!(text.contains("how much"), "got: {text}");
    }

    #[test]
    fn untranslatable_input_stalls() {
        struct StuckTranslator;
        impl Translator for StuckTranslator {
            fn to_english(&self, text: &str, _lang: &str) -> String {
                text.to_string()
            }
        }
        struct AlwaysHindi;
        impl LanguageDetector for AlwaysHindi {
            fn detect(&self, _text: &str) -> String {
                "hi".to_string()
            }
        }
        let norm = LanguageNormalizer::with_parts(Box::new(AlwaysHindi), Box::new(StuckTranslator));
        let err = norm.normalize("gibberish input").unwrap_err();
        assert!(matches!(err, LanguageError::TranslationStalled { ref lang } if lang == "hi"));
    }
}
