use serde_json::json;

use crate::context::ContextStore;

/// An exclusive interactive mode (e.g. a running quiz). While active it
/// claims raw input before intent detection. Modes are checked in a
/// fixed order; the first one that claims the input ends the turn.
pub trait ExclusiveMode: Send {
    fn name(&self) -> &'static str;
    fn is_active(&self, ctx: &ContextStore) -> bool;
    /// `Ok(Some(_))` claims the input and ends the turn. `Ok(None)`
    /// declines it; errors are swallowed by the orchestrator.
    fn handle(&self, text: &str, ctx: &mut ContextStore) -> anyhow::Result<Option<String>>;
}

pub const QUIZ_INDEX_KEY: &str = "quiz_index";
pub const QUIZ_SCORE_KEY: &str = "quiz_score";

pub const QUIZ_QUESTIONS: &[(&str, &str)] = &[
    ("If two pencils cost 8 rupees, how much do five cost?", "20"),
    ("What comes next: 2, 4, 8, 16?", "32"),
    ("A kilo of iron or a kilo of cotton, which is heavier?", "neither"),
];

const QUIZ_STOP_MARKERS: &[&str] = &["stop quiz", "quit quiz", "stop", "enough"];

/// Running quiz: while `quiz_index` is set, every utterance is treated
/// as an answer to the current question.
pub struct QuizMode;

impl QuizMode {
    fn index(ctx: &ContextStore) -> usize {
        ctx.get(QUIZ_INDEX_KEY)
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0) as usize
    }

    fn score(ctx: &ContextStore) -> u64 {
        ctx.get(QUIZ_SCORE_KEY)
            .and_then(serde_json::Value::as_u64)
            .unwrap_or(0)
    }

    fn finish(ctx: &mut ContextStore) -> String {
        let score = Self::score(ctx);
        let total = QUIZ_QUESTIONS.len();
        ctx.clear(QUIZ_INDEX_KEY);
        ctx.clear(QUIZ_SCORE_KEY);
        format!("Quiz over! You got {score} of {total}.")
    }
}

impl ExclusiveMode for QuizMode {
    fn name(&self) -> &'static str {
        "quiz"
    }

    fn is_active(&self, ctx: &ContextStore) -> bool {
        ctx.has(QUIZ_INDEX_KEY)
    }

    fn handle(&self, text: &str, ctx: &mut ContextStore) -> anyhow::Result<Option<String>> {
        let t = text.trim().to_lowercase();
        if QUIZ_STOP_MARKERS.iter().any(|m| t == *m) {
            return Ok(Some(Self::finish(ctx)));
        }

        let idx = Self::index(ctx);
        let Some((_, expected)) = QUIZ_QUESTIONS.get(idx) else {
            // Index ran past the table somehow; close out cleanly.
            return Ok(Some(Self::finish(ctx)));
        };

        let correct = t.contains(expected);
        let verdict = if correct {
            ctx.set(QUIZ_SCORE_KEY, json!(Self::score(ctx) + 1));
            "Correct!".to_string()
        } else {
            format!("Not quite. The answer was {expected}.")
        };

        let next = idx + 1;
        let reply = match QUIZ_QUESTIONS.get(next) {
            Some((question, _)) => {
                ctx.set(QUIZ_INDEX_KEY, json!(next));
                format!("{verdict} Next one: {question}")
            }
            None => format!("{verdict} {}", Self::finish(ctx)),
        };
        Ok(Some(reply))
    }
}
