use std::collections::HashMap;

use anyhow::bail;
use serde_json::{json, Value};

use crate::context::ContextStore;

pub const WAITING_FOR_CORRECTION_KEY: &str = "waiting_for_correction";

/// Intents that must never become targets of learned corrections.
/// Enforced here at the learner boundary and again in the
/// orchestrator's correction branch.
pub const DANGEROUS_INTENTS: &[&str] = &[
    "shutdown_system",
    "restart_system",
    "lock_system",
    "clear_recycle_bin",
    "delete_file",
    "exit",
];

pub fn is_dangerous(intent: &str) -> bool {
    DANGEROUS_INTENTS.contains(&intent)
}

/// A recorded (original text -> correct intent) training pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Correction {
    pub user_text: String,
    pub correct_intent: String,
    pub wrong_intent: Option<String>,
}

/// Set when the system asks "what should I have done?". Consumed, and
/// the context key cleared, on the very next resolvable turn whether or
/// not learning succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCorrection {
    pub user_text: String,
    pub wrong_intent: Option<String>,
}

impl PendingCorrection {
    pub fn store(&self, ctx: &mut ContextStore) {
        ctx.set(
            WAITING_FOR_CORRECTION_KEY,
            json!({
                "user_text": self.user_text,
                "wrong_intent": self.wrong_intent,
            }),
        );
    }

    pub fn is_pending(ctx: &ContextStore) -> bool {
        ctx.has(WAITING_FOR_CORRECTION_KEY)
    }

    /// Removes the pending correction from context and returns it.
    pub fn take(ctx: &mut ContextStore) -> Option<PendingCorrection> {
        let value = ctx.take(WAITING_FOR_CORRECTION_KEY)?;
        Some(PendingCorrection {
            user_text: value
                .get("user_text")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            wrong_intent: value
                .get("wrong_intent")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

/// Learning seam. The persistence format belongs to an external store;
/// the pipeline only needs these two operations.
pub trait Learner: Send {
    fn learn(
        &mut self,
        original_text: &str,
        correct_intent: &str,
        wrong_intent: Option<&str>,
    ) -> anyhow::Result<()>;

    /// Frequency signal: the same text resolving to the same intent,
    /// counted across successful turns.
    fn record_pattern_use(&mut self, text: &str, intent: &str) -> anyhow::Result<()>;
}

/// In-memory learner used for the live session and for tests.
pub struct MemoryLearner {
    corrections: Vec<Correction>,
    pattern_counts: HashMap<(String, String), u32>,
}

impl MemoryLearner {
    pub fn new() -> Self {
        Self {
            corrections: Vec::new(),
            pattern_counts: HashMap::new(),
        }
    }

    pub fn corrections(&self) -> &[Correction] {
        &self.corrections
    }

    pub fn pattern_count(&self, text: &str, intent: &str) -> u32 {
        self.pattern_counts
            .get(&(text.to_string(), intent.to_string()))
            .copied()
            .unwrap_or(0)
    }
}

impl Default for MemoryLearner {
    fn default() -> Self {
        Self::new()
    }
}

impl Learner for MemoryLearner {
    fn learn(
        &mut self,
        original_text: &str,
        correct_intent: &str,
        wrong_intent: Option<&str>,
    ) -> anyhow::Result<()> {
        if is_dangerous(correct_intent) {
            bail!("refusing to learn dangerous intent '{correct_intent}'");
        }
        self.corrections.push(Correction {
            user_text: original_text.to_string(),
            correct_intent: correct_intent.to_string(),
            wrong_intent: wrong_intent.map(str::to_string),
        });
        Ok(())
    }

    fn record_pattern_use(&mut self, text: &str, intent: &str) -> anyhow::Result<()> {
        *self
            .pattern_counts
            .entry((text.to_string(), intent.to_string()))
            .or_insert(0) += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn learner_refuses_dangerous_targets() {
        let mut learner = MemoryLearner::new();
        assert!(learner.learn("wipe it", "clear_recycle_bin", None).is_err());
        assert!(learner.corrections().is_empty());
    }

    #[test]
    fn pending_correction_roundtrip_clears_key() {
        let mut ctx = ContextStore::new();
        let pending = PendingCorrection {
            user_text: "turn off wifi".to_string(),
            wrong_intent: Some("open_app".to_string()),
        };
        pending.store(&mut ctx);
        assert!(PendingCorrection::is_pending(&ctx));

        let taken = PendingCorrection::take(&mut ctx).unwrap();
        assert_eq!(taken, pending);
        assert!(!PendingCorrection::is_pending(&ctx), "take must clear the key");
    }

    #[test]
    fn pattern_counts_accumulate() {
        let mut learner = MemoryLearner::new();
        learner.record_pattern_use("play lofi", "play_youtube").unwrap();
        learner.record_pattern_use("play lofi", "play_youtube").unwrap();
        assert_eq!(learner.pattern_count("play lofi", "play_youtube"), 2);
        assert_eq!(learner.pattern_count("play lofi", "open_app"), 0);
    }
}
