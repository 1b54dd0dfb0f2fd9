use std::collections::HashMap;

use serde_json::Value;
use uuid::Uuid;

pub const ORIGINAL_UTTERANCE_KEY: &str = "original_utterance";
pub const ACTIVE_WINDOW_KEY: &str = "active_window";

/// Best-effort probe for the currently focused window.
/// The session driver can plug in an OS-specific implementation;
/// failures never abort a turn.
pub trait ActiveWindowProbe: Send {
    fn active_window(&self) -> anyhow::Result<Option<String>>;
}

/// Default probe: reports nothing (headless / test sessions).
pub struct NullProbe;

impl ActiveWindowProbe for NullProbe {
    fn active_window(&self) -> anyhow::Result<Option<String>> {
        Ok(None)
    }
}

/// One completed exchange. Append-only; `seq` is the ordering authority.
#[derive(Debug, Clone)]
pub struct ConversationTurn {
    pub id: Uuid,
    pub seq: u64,
    pub intent: Option<String>,
    pub user_text: String,
    pub response: String,
    pub entities: HashMap<String, Value>,
}

/// Mutable per-session state threaded through every pipeline stage.
/// Owned exclusively by the single active session loop; no persistence.
pub struct ContextStore {
    values: HashMap<String, Value>,
    turns: Vec<ConversationTurn>,
    seq: u64,
    probe: Box<dyn ActiveWindowProbe>,
}

impl ContextStore {
    pub fn new() -> Self {
        Self::with_probe(Box::new(NullProbe))
    }

    pub fn with_probe(probe: Box<dyn ActiveWindowProbe>) -> Self {
        Self {
            values: HashMap::new(),
            turns: Vec::new(),
            seq: 0,
            probe,
        }
    }

    /// Setting `Value::Null` clears the key, so stale flags cannot
    /// dangle into the next turn.
    pub fn set(&mut self, key: &str, value: Value) {
        if value.is_null() {
            self.values.remove(key);
        } else {
            self.values.insert(key.to_string(), value);
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn has(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn clear(&mut self, key: &str) {
        self.values.remove(key);
    }

    /// Removes and returns a key in one step (for consume-once flags).
    pub fn take(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn remember_turn(
        &mut self,
        intent: Option<&str>,
        user_text: &str,
        response: &str,
        entities: HashMap<String, Value>,
    ) {
        self.seq += 1;
        self.turns.push(ConversationTurn {
            id: Uuid::new_v4(),
            seq: self.seq,
            intent: intent.map(str::to_string),
            user_text: user_text.to_string(),
            response: response.to_string(),
            entities,
        });
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Intent name of the most recent turn that carried one.
    /// Drives short-reply disambiguation in refinement and fallback.
    pub fn last_action(&self) -> Option<&str> {
        self.turns
            .iter()
            .rev()
            .find_map(|t| t.intent.as_deref())
    }

    /// Most recent turn that carried an intent, entities included.
    pub fn last_action_turn(&self) -> Option<&ConversationTurn> {
        self.turns.iter().rev().find(|t| t.intent.is_some())
    }

    /// Refreshes the cached active window via the probe.
    /// Callers treat failure as a no-op.
    pub fn refresh_active_window(&mut self) -> anyhow::Result<()> {
        match self.probe.active_window()? {
            Some(win) => self.values.insert(ACTIVE_WINDOW_KEY.to_string(), Value::String(win)),
            None => self.values.remove(ACTIVE_WINDOW_KEY),
        };
        Ok(())
    }
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_value_clears_key() {
        let mut ctx = ContextStore::new();
        ctx.set("flag", json!("on"));
        assert!(ctx.has("flag"));
        ctx.set("flag", Value::Null);
        assert!(!ctx.has("flag"), "Null assignment must clear the key");
    }

    #[test]
    fn last_action_skips_intentless_turns() {
        let mut ctx = ContextStore::new();
        ctx.remember_turn(Some("play_youtube"), "play lofi", "Playing lofi.", HashMap::new());
        ctx.remember_turn(None, "hmm", "Tell me more?", HashMap::new());
        assert_eq!(ctx.last_action(), Some("play_youtube"));
    }

    #[test]
    fn turns_are_ordered_by_seq() {
        let mut ctx = ContextStore::new();
        ctx.remember_turn(Some("greet"), "hi", "Hello!", HashMap::new());
        ctx.remember_turn(Some("get_time"), "time?", "It's noon.", HashMap::new());
        let seqs: Vec<u64> = ctx.turns().iter().map(|t| t.seq).collect();
        assert_eq!(seqs, vec![1, 2]);
    }

    #[test]
    fn failing_probe_leaves_window_untouched() {
        struct BrokenProbe;
        impl ActiveWindowProbe for BrokenProbe {
            fn active_window(&self) -> anyhow::Result<Option<String>> {
                anyhow::bail!("no display")
            }
        }
        let mut ctx = ContextStore::with_probe(Box::new(BrokenProbe));
        ctx.set(ACTIVE_WINDOW_KEY, json!("Editor"));
        assert!(ctx.refresh_active_window().is_err());
        assert_eq!(ctx.get_str(ACTIVE_WINDOW_KEY), Some("Editor"));
    }
}
