pub mod detector;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::ContextStore;

pub use detector::RuleDetector;

/// A structured action hypothesis with extracted slots. Candidate order
/// is significant: the first is primary for correction learning and
/// tone selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentCandidate {
    pub intent: String,
    pub confidence: f32, // 0.0 - 1.0
    #[serde(default)]
    pub entities: HashMap<String, Value>,
}

impl IntentCandidate {
    pub fn new(intent: &str, confidence: f32) -> Self {
        Self {
            intent: intent.to_string(),
            confidence,
            entities: HashMap::new(),
        }
    }

    pub fn with_entity(mut self, slot: &str, value: Value) -> Self {
        self.entities.insert(slot.to_string(), value);
        self
    }

    pub fn entity_str(&self, slot: &str) -> Option<&str> {
        self.entities.get(slot).and_then(Value::as_str)
    }
}

/// Detection seam. An empty vec is the valid "no intent" signal;
/// detectors never report errors. Implementations can be rebound at
/// runtime through the pipeline registry for live retraining.
pub trait IntentDetector: Send + Sync {
    fn detect(&self, text: &str, ctx: &ContextStore) -> Vec<IntentCandidate>;
}
