use crate::context::{ContextStore, ACTIVE_WINDOW_KEY};
use crate::intent::IntentCandidate;
use crate::learning::is_dangerous;

/// Whole-utterance references to the previous action. Matched exactly:
/// "same again" is deliberately not here; a short reply that merely
/// gestures at repetition gets the fallback nudge, not a re-run.
pub const REPEAT_MARKERS: &[&str] = &[
    "again",
    "repeat",
    "repeat that",
    "do it again",
    "once more",
    "that same",
    "play it again",
];

const AMBIGUITY_MARKERS: &[&str] = &["maybe", "perhaps", "i think", "something like"];

const CLARIFY_CONFIDENCE_FLOOR: f32 = 0.6;

/// Re-ranks and resolves intent candidates against conversational
/// context, and gates low-confidence single candidates behind a
/// clarification turn. All decisions are pure functions of their
/// arguments, so a turn replays identically.
pub struct ReasoningEngine;

impl ReasoningEngine {
    pub fn new() -> Self {
        Self
    }

    /// Context refinement. Idempotent for a fixed context snapshot.
    pub fn refine(
        &self,
        mut candidates: Vec<IntentCandidate>,
        text: &str,
        ctx: &ContextStore,
    ) -> Vec<IntentCandidate> {
        let t = text.trim().to_lowercase();

        // "again" / "repeat" with no fresh intent: replay the last
        // recorded action, entities included. Dangerous actions are
        // never replayed implicitly.
        if candidates.is_empty() && REPEAT_MARKERS.contains(&t.as_str()) {
            if let Some(turn) = ctx.last_action_turn() {
                if let Some(name) = turn.intent.as_deref() {
                    if !is_dangerous(name) {
                        candidates.push(IntentCandidate {
                            intent: name.to_string(),
                            confidence: 0.85,
                            entities: turn.entities.clone(),
                        });
                    }
                }
            }
        }

        // Competing candidates: prefer ones that match the active
        // window (a stable partition, so ordering stays deterministic).
        if candidates.len() > 1 {
            if let Some(win) = ctx.get_str(ACTIVE_WINDOW_KEY).map(str::to_lowercase) {
                let (matched, rest): (Vec<_>, Vec<_>) =
                    candidates.into_iter().partition(|c| {
                        c.intent
                            .split('_')
                            .any(|part| part.len() > 3 && win.contains(part))
                            || c.entities.values().any(|v| {
                                v.as_str()
                                    .is_some_and(|s| !s.is_empty() && win.contains(&s.to_lowercase()))
                            })
                    });
                candidates = matched.into_iter().chain(rest).collect();
            }
        }

        // Drop duplicate intent names, keeping the first occurrence.
        let mut seen: Vec<String> = Vec::new();
        candidates.retain(|c| {
            if seen.iter().any(|s| s == &c.intent) {
                false
            } else {
                seen.push(c.intent.clone());
                true
            }
        });

        candidates
    }

    /// Clarify gate. Fires only for exactly one remaining candidate;
    /// multi-candidate ambiguity is handled by routing to all of them.
    pub fn should_clarify(
        &self,
        candidates: &[IntentCandidate],
        text: &str,
        _ctx: &ContextStore,
    ) -> bool {
        if candidates.len() != 1 {
            return false;
        }
        let c = &candidates[0];
        if c.confidence >= CLARIFY_CONFIDENCE_FLOOR {
            return false;
        }
        let t = text.trim().to_lowercase();
        let word_count = t.split_whitespace().count();
        word_count <= 3 || AMBIGUITY_MARKERS.iter().any(|m| t.contains(m))
    }

    /// Optional justification appended after routing when explanation
    /// mode is on. Returning `None` is always safe.
    pub fn explain(&self, intent: &str, text: &str, ctx: &ContextStore) -> Option<String> {
        let t = text.to_lowercase();
        if let Some(word) = intent.split('_').find(|p| p.len() > 3 && t.contains(p)) {
            return Some(format!(
                "I went with {intent} because you mentioned \"{word}\"."
            ));
        }
        ctx.get_str(ACTIVE_WINDOW_KEY)
            .map(|win| format!("I went with {intent} going by your active window ({win})."))
    }
}

impl Default for ReasoningEngine {
    fn default() -> Self {
        Self::new()
    }
}
