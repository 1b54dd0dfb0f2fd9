use std::fmt;
use std::sync::{Arc, Mutex};

use serde_json::json;
use tracing::{debug, warn};

use crate::config::PipelineConfig;
use crate::context::{ContextStore, ORIGINAL_UTTERANCE_KEY};
use crate::emotion::{detect_emotion, USER_EMOTION_KEY};
use crate::fallback::{
    nudge_for, web_search_response, ConversationalFallback, LlmResponder, TemplateResponder,
};
use crate::flow::preempt::{ExclusiveMode, QuizMode};
use crate::flow::ConversationFlow;
use crate::intent::{IntentCandidate, IntentDetector, RuleDetector};
use crate::language::{LanguageError, LanguageNormalizer};
use crate::learning::{is_dangerous, Learner, MemoryLearner, PendingCorrection};
use crate::reasoning::ReasoningEngine;
use crate::router::{response_indicates_failure, IntentRouter, SkillResponse};
use crate::skills;

pub const TRANSLATION_RETRY_MESSAGE: &str =
    "I'm having a bit of trouble with translation right now. Could you please try that in English?";

pub const CLARIFY_PROMPT: &str =
    "Is this what you meant? Give me a little more detail and I'll get it right.";

pub const CORRECTION_REFUSAL: &str =
    "For safety, that's not something I'll learn. Anything else?";

pub const CORRECTION_ACK: &str = "Noted. Next time I'll understand it that way.";

const RESPONDER_DOWN_LINE: &str = "Tell me a bit more and I'll figure it out.";

/// Terminal state of one processed utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnStatus {
    Success,
    Fallback,
    NotFound,
    Failure,
    Clarify,
}

impl TurnStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnStatus::Success => "success",
            TurnStatus::Fallback => "fallback",
            TurnStatus::NotFound => "not_found",
            TurnStatus::Failure => "failure",
            TurnStatus::Clarify => "clarify",
        }
    }
}

impl fmt::Display for TurnStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the orchestrator hands back to its caller, per turn. The caller
/// owns speech output and turn logging.
#[derive(Debug)]
pub struct TurnOutcome {
    pub responses: Vec<SkillResponse>,
    pub language: String,
    pub intents: Option<Vec<IntentCandidate>>,
    pub status: TurnStatus,
}

impl TurnOutcome {
    pub fn combined_speech(&self) -> String {
        self.responses
            .iter()
            .map(|r| r.speakable().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn primary_intent(&self) -> Option<&IntentCandidate> {
        self.intents.as_deref().and_then(|cands| cands.first())
    }

    pub fn has_intent(&self, name: &str) -> bool {
        self.intents
            .as_deref()
            .is_some_and(|cands| cands.iter().any(|c| c.intent == name))
    }

    fn short_circuit(responses: Vec<SkillResponse>, language: String, status: TurnStatus) -> Self {
        Self {
            responses,
            language,
            intents: None,
            status,
        }
    }
}

/// Sequences the whole command pipeline for one utterance at a time.
///
/// The detector and router sit behind rebindable handles so retrained
/// implementations can be swapped in between turns without restarting
/// the session (and without touching its context).
pub struct Pipeline {
    config: PipelineConfig,
    normalizer: LanguageNormalizer,
    flow: ConversationFlow,
    modes: Vec<Box<dyn ExclusiveMode>>,
    detector: Arc<dyn IntentDetector>,
    router: Arc<dyn IntentRouter>,
    reasoning: ReasoningEngine,
    learner: Arc<Mutex<dyn Learner>>,
    responder: Box<dyn ConversationalFallback>,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Self {
        let responder: Box<dyn ConversationalFallback> = match &config.llm_url {
            Some(url) => Box::new(LlmResponder::new(url.clone())),
            None => Box::new(TemplateResponder),
        };
        Self {
            config,
            normalizer: LanguageNormalizer::new(),
            flow: ConversationFlow,
            modes: vec![Box::new(QuizMode)],
            detector: Arc::new(RuleDetector::new()),
            router: Arc::new(skills::default_router()),
            reasoning: ReasoningEngine::new(),
            learner: Arc::new(Mutex::new(MemoryLearner::new())),
            responder,
        }
    }

    pub fn with_learner(mut self, learner: Arc<Mutex<dyn Learner>>) -> Self {
        self.learner = learner;
        self
    }

    pub fn with_responder(mut self, responder: Box<dyn ConversationalFallback>) -> Self {
        self.responder = responder;
        self
    }

    /// Live-retraining hook: swap the detection strategy between turns.
    pub fn rebind_detector(&mut self, detector: Arc<dyn IntentDetector>) {
        self.detector = detector;
    }

    /// Live-retraining hook: swap the routing strategy between turns.
    pub fn rebind_router(&mut self, router: Arc<dyn IntentRouter>) {
        self.router = router;
    }

    /// Appends an exclusive mode to the fixed pre-emption order.
    pub fn register_mode(&mut self, mode: Box<dyn ExclusiveMode>) {
        self.modes.push(mode);
    }

    /// Processes one utterance through the full pipeline and returns
    /// the normalized turn result. Mandatory-stage errors (router
    /// dispatch) propagate; optional stages degrade to no-ops.
    pub fn process_command(
        &mut self,
        text: &str,
        ctx: &mut ContextStore,
    ) -> anyhow::Result<TurnOutcome> {
        ctx.set(ORIGINAL_UTTERANCE_KEY, json!(text));
        if let Err(e) = ctx.refresh_active_window() {
            warn!("active window refresh failed: {e}");
        }

        // === 1. TRANSLATE + NORMALIZE ===
        let (text_en, lang) = match self.normalizer.normalize(text) {
            Ok(pair) => pair,
            Err(LanguageError::TranslationStalled { lang }) => {
                // Hard failure: nothing downstream can work with text
                // we couldn't bring into the working language.
                return Ok(TurnOutcome::short_circuit(
                    vec![SkillResponse::text(TRANSLATION_RETRY_MESSAGE)],
                    lang,
                    TurnStatus::Failure,
                ));
            }
        };

        // === 2. EMOTION SIGNAL ===
        // Lightweight tone hint for the driver; never replaces intent.
        ctx.set(USER_EMOTION_KEY, json!(detect_emotion(&text_en).as_str()));

        // === 3. CONVERSATION FLOW ===
        match self.flow.handle(&text_en, ctx) {
            Ok(Some(reply)) if !reply.is_empty() => {
                return Ok(TurnOutcome::short_circuit(
                    vec![SkillResponse::text(reply)],
                    lang,
                    TurnStatus::Success,
                ));
            }
            Ok(_) => {}
            Err(e) => warn!("conversation flow failed, falling through: {e}"),
        }

        // === 4. EXCLUSIVE MODES ===
        // Fixed order; the first active mode that claims the input
        // ends the turn.
        for mode in &self.modes {
            if !mode.is_active(ctx) {
                continue;
            }
            match mode.handle(&text_en, ctx) {
                Ok(Some(reply)) if !reply.is_empty() => {
                    return Ok(TurnOutcome::short_circuit(
                        vec![SkillResponse::text(reply)],
                        lang,
                        TurnStatus::Success,
                    ));
                }
                Ok(_) => {}
                Err(e) => warn!(mode = mode.name(), "exclusive mode failed: {e}"),
            }
        }

        // === 5. DETECT + REFINE ===
        let detected = self.detector.detect(&text_en, ctx);
        let intents = self.reasoning.refine(detected, &text_en, ctx);

        // === 6. SELF-CORRECTION ===
        // A pending correction consumes the whole turn; it never
        // reaches routing, whatever the detected intent was.
        if !intents.is_empty() {
            if let Some(pending) = PendingCorrection::take(ctx) {
                let correct_intent = intents[0].intent.clone();
                if is_dangerous(&correct_intent) {
                    return Ok(TurnOutcome {
                        responses: vec![SkillResponse::text(CORRECTION_REFUSAL)],
                        language: lang,
                        intents: Some(intents),
                        status: TurnStatus::Success,
                    });
                }
                if !pending.user_text.is_empty() {
                    match self.learner.lock() {
                        Ok(mut learner) => {
                            if let Err(e) = learner.learn(
                                &pending.user_text,
                                &correct_intent,
                                pending.wrong_intent.as_deref(),
                            ) {
                                warn!("correction learning failed: {e}");
                            }
                        }
                        Err(_) => warn!("learner lock poisoned; correction dropped"),
                    }
                }
                return Ok(TurnOutcome {
                    responses: vec![SkillResponse::text(CORRECTION_ACK)],
                    language: lang,
                    intents: Some(intents),
                    status: TurnStatus::Success,
                });
            }
        }

        if !intents.is_empty() {
            // === 7. CLARIFY GATE ===
            // Only a single low-confidence candidate asks; competing
            // candidates are all routed instead.
            if intents.len() == 1 && self.reasoning.should_clarify(&intents, &text_en, ctx) {
                return Ok(TurnOutcome {
                    responses: vec![SkillResponse::text(CLARIFY_PROMPT)],
                    language: lang,
                    intents: Some(intents),
                    status: TurnStatus::Clarify,
                });
            }

            // === 8. ROUTE ===
            let mut responses: Vec<SkillResponse> = Vec::new();
            for cand in &intents {
                match self.router.route(cand, &text_en, ctx)? {
                    Some(resp) => {
                        responses.push(resp);
                        if self.config.reason_explanation_mode {
                            if let Some(explanation) =
                                self.reasoning.explain(&cand.intent, &text_en, ctx)
                            {
                                responses.push(SkillResponse::text(explanation));
                            }
                        }
                    }
                    None => debug!(intent = %cand.intent, "no handler response"),
                }
            }

            // Scan every collected response for failure markers,
            // whichever stage produced it.
            let mut status = TurnStatus::Success;
            if responses
                .iter()
                .any(|r| response_indicates_failure(r.speakable()))
            {
                status = TurnStatus::NotFound;
            }

            // Frequency learning only counts fully successful turns;
            // a recording failure never touches the returned result.
            if !responses.is_empty() && status == TurnStatus::Success {
                match self.learner.lock() {
                    Ok(mut learner) => {
                        if let Err(e) = learner.record_pattern_use(&text_en, &intents[0].intent) {
                            warn!("pattern recording failed: {e}");
                        }
                    }
                    Err(_) => warn!("learner lock poisoned; pattern use dropped"),
                }
            }

            return Ok(TurnOutcome {
                responses,
                language: lang,
                intents: Some(intents),
                status,
            });
        }

        // === 9. FALLBACK CASCADE ===
        // Short vague replies get a nudge, real questions get a search,
        // everything else goes to the conversational responder.
        let query = text_en.trim();
        let word_count = query.split_whitespace().count();
        let mut responses: Vec<SkillResponse> = Vec::new();

        let nudge = if word_count <= 3 && !query.is_empty() {
            ctx.last_action().map(nudge_for)
        } else {
            None
        };
        if let Some(nudge) = nudge {
            responses.push(SkillResponse::text(nudge));
        } else if query.len() >= 2 && word_count > 3 {
            responses.push(SkillResponse::text(web_search_response(query)));
        } else {
            match self.responder.reply(query, ctx) {
                Ok(Some(reply)) => responses.push(SkillResponse::text(reply)),
                Ok(None) => responses.push(SkillResponse::text(RESPONDER_DOWN_LINE)),
                Err(e) => {
                    warn!("conversational fallback failed: {e}");
                    responses.push(SkillResponse::text(RESPONDER_DOWN_LINE));
                }
            }
        }

        Ok(TurnOutcome {
            responses,
            language: lang,
            intents: Some(intents),
            status: TurnStatus::Fallback,
        })
    }
}
