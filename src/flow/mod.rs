pub mod preempt;

use serde_json::json;

use crate::context::ContextStore;

pub const CONVERSATION_STATE_KEY: &str = "conversation_state";

/// Free-form conversation sub-state machine. While a state other than
/// `None` is active, the orchestrator hands input here before intent
/// detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowState {
    None,
    Question,
    FollowUp,
    Depth,
}

impl FlowState {
    pub fn as_key(&self) -> &'static str {
        match self {
            FlowState::None => "NONE",
            FlowState::Question => "QUESTION",
            FlowState::FollowUp => "FOLLOW_UP",
            FlowState::Depth => "DEPTH",
        }
    }

    pub fn from_key(key: &str) -> FlowState {
        match key {
            "QUESTION" => FlowState::Question,
            "FOLLOW_UP" => FlowState::FollowUp,
            "DEPTH" => FlowState::Depth,
            _ => FlowState::None,
        }
    }

    pub fn read(ctx: &ContextStore) -> FlowState {
        ctx.get_str(CONVERSATION_STATE_KEY)
            .map(FlowState::from_key)
            .unwrap_or(FlowState::None)
    }

    pub fn store(self, ctx: &mut ContextStore) {
        match self {
            FlowState::None => ctx.clear(CONVERSATION_STATE_KEY),
            other => ctx.set(CONVERSATION_STATE_KEY, json!(other.as_key())),
        }
    }
}

const DISENGAGE_MARKERS: &[&str] = &["stop", "enough", "leave it", "drop it", "never mind"];

pub struct ConversationFlow;

impl ConversationFlow {
    /// Attempts to continue an active flow with the user's reply.
    ///
    /// `Ok(Some(text))` ends the turn with that response; `Ok(None)`
    /// means "not handled" and the pipeline falls through to intent
    /// processing. The orchestrator swallows `Err` the same way.
    pub fn handle(&self, text: &str, ctx: &mut ContextStore) -> anyhow::Result<Option<String>> {
        let state = FlowState::read(ctx);
        if state == FlowState::None {
            return Ok(None);
        }

        let t = text.trim().to_lowercase();
        if DISENGAGE_MARKERS.iter().any(|m| t == *m) {
            // User bailed out of the chat. Release the turn back to
            // normal command processing.
            FlowState::None.store(ctx);
            return Ok(None);
        }

        let reply = match state {
            FlowState::Question => {
                FlowState::FollowUp.store(ctx);
                format!("\"{}\", I like that. What got you into it?", text.trim())
            }
            FlowState::FollowUp => {
                FlowState::Depth.store(ctx);
                "That makes sense. Is it something you'd want to do more of?".to_string()
            }
            FlowState::Depth => {
                FlowState::None.store(ctx);
                "Thanks for sharing that. I'm around whenever you want to pick this up again.".to_string()
            }
            FlowState::None => unreachable!("checked above"),
        };
        Ok(Some(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_flow_is_not_handled() {
        let mut ctx = ContextStore::new();
        let resp = ConversationFlow.handle("hello", &mut ctx).unwrap();
        assert!(resp.is_none());
    }

    #[test]
    fn question_advances_to_follow_up() {
        let mut ctx = ContextStore::new();
        FlowState::Question.store(&mut ctx);
        let resp = ConversationFlow.handle("reading", &mut ctx).unwrap();
        assert!(resp.is_some());
        assert_eq!(FlowState::read(&ctx), FlowState::FollowUp);
    }

    #[test]
    fn depth_closes_the_flow() {
        let mut ctx = ContextStore::new();
        FlowState::Depth.store(&mut ctx);
        let resp = ConversationFlow.handle("yes definitely", &mut ctx).unwrap();
        assert!(resp.is_some());
        assert_eq!(FlowState::read(&ctx), FlowState::None);
    }

    #[test]
    fn disengage_releases_the_turn() {
        let mut ctx = ContextStore::new();
        FlowState::FollowUp.store(&mut ctx);
        let resp = ConversationFlow.handle("stop", &mut ctx).unwrap();
        assert!(resp.is_none(), "disengage must fall through to intents");
        assert_eq!(FlowState::read(&ctx), FlowState::None);
    }
}
